use thiserror::Error;

use crate::{DonationErrorSource, PaymentErrorCode, PaymentId, PaymentSourceType};

/// Why creating or confirming a payment intent failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentSetupError {
    #[error("payment declined ({0})")]
    Declined(String),

    #[error("payment failed ({0})")]
    Failed(String),

    #[error("payment cancelled by user")]
    Cancelled,

    #[error("{0}")]
    Generic(String),
}

/// Why a gift recipient was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipientVerificationError {
    #[error("Selected recipient is invalid")]
    SelectedRecipientIsInvalid,
}

/// Errors surfaced to callers of the one-time payment flow.
///
/// Callers distinguish "try again" (`RedemptionTimeout`), "come back later"
/// (`RedemptionPending`) and "definitively failed" (`RedemptionFailed`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DonationError {
    #[error("Payment setup failed for {origin:?} via {method}: {reason}")]
    PaymentSetup {
        origin: DonationErrorSource,
        method: PaymentSourceType,
        reason: PaymentSetupError,
    },

    #[error("Recipient verification failed: {0}")]
    RecipientVerification(#[from] RecipientVerificationError),

    #[error("Timed out waiting for redemption token ({origin:?})")]
    RedemptionTimeout { origin: DonationErrorSource },

    #[error("Donation for {payment_id} is still pending ({origin:?})")]
    RedemptionPending {
        origin: DonationErrorSource,
        payment_id: PaymentId,
    },

    #[error("Redemption failed: {0}")]
    RedemptionFailed(PaymentErrorCode),

    #[error("Redemption already in flight for {0}")]
    RedemptionInFlight(PaymentId),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Scheduling error: {0}")]
    Scheduling(String),
}

impl DonationError {
    /// The caller may re-invoke the same operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RedemptionTimeout { .. } | Self::RedemptionInFlight(_))
    }

    /// The payment is still clearing and should be polled later
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::RedemptionPending { .. })
    }
}

/// Failures of the remote donation configuration service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service returned {status}: {message}")]
    Application { status: u16, message: String },

    #[error("Request failed: {0}")]
    Execution(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Failures of the payment or recipient store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("Payment already exists: {0}")]
    DuplicatePayment(PaymentId),

    #[error("Recipient not found: {0}")]
    RecipientNotFound(crate::RecipientId),

    #[error("State regression for {id}: {from:?} -> {to:?}")]
    StateRegression {
        id: PaymentId,
        from: crate::InAppPaymentState,
        to: crate::InAppPaymentState,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for DonationError {
    fn from(err: StoreError) -> Self {
        DonationError::Storage(err.to_string())
    }
}

/// Failures of the background job system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Job queue rejected chain: {0}")]
    Rejected(String),

    #[error("Job queue unavailable")]
    Unavailable,
}

impl From<JobError> for DonationError {
    fn from(err: JobError) -> Self {
        DonationError::Scheduling(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DonationError>;
