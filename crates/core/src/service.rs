//! Result-or-error envelope returned by remote service calls

use crate::ServiceError;

/// Outcome of one remote call.
///
/// `ApplicationError` means the service answered with an error status,
/// `ExecutionError` means the request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceResponse<T> {
    Success { status: u16, body: T },
    ApplicationError { status: u16, message: String },
    ExecutionError(String),
}

impl<T> ServiceResponse<T> {
    /// Wrap a successful 200 response
    pub fn ok(body: T) -> Self {
        Self::Success { status: 200, body }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } | Self::ApplicationError { status, .. } => Some(*status),
            Self::ExecutionError(_) => None,
        }
    }

    /// Unwrap the body, or fail with the wrapped error
    pub fn flatten_result(self) -> Result<T, ServiceError> {
        match self {
            Self::Success { body, .. } => Ok(body),
            Self::ApplicationError { status, message } => {
                Err(ServiceError::Application { status, message })
            }
            Self::ExecutionError(message) => Err(ServiceError::Execution(message)),
        }
    }
}
