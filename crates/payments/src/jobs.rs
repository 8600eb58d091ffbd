//! Job chain descriptors handed to the background job system

use donations_core::{InAppPayment, PaymentId};

/// A single job in a redemption chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Converts the confirmed payment intent into a receipt credential
    OneTimeContext,
    /// Redeems the receipt credential for the badge and ends the payment
    Redemption,
}

/// Ordered sequence of jobs for one payment.
///
/// Jobs in a chain run one after another on a queue dedicated to the
/// payment, so two chains for the same payment never interleave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobChain {
    pub payment_id: PaymentId,
    /// Queue the chain is serialized on
    pub queue: String,
    pub jobs: Vec<JobKind>,
}

impl JobChain {
    /// Chain that redeems a confirmed one-time payment
    pub fn one_time_redemption(payment: &InAppPayment) -> Self {
        Self {
            payment_id: payment.id,
            queue: format!("in-app-payment-redemption-{}", payment.id.0),
            jobs: vec![JobKind::OneTimeContext, JobKind::Redemption],
        }
    }
}
