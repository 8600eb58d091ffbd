//! Collaborator traits for the one-time payment coordinator.
//!
//! Each trait stands in for a subsystem owned elsewhere in the app. The
//! coordinator only ever talks to them through these seams.

use async_trait::async_trait;
use futures::stream::BoxStream;

use donations_core::{
    DonationsConfiguration, InAppPayment, JobError, PaymentId, Recipient, RecipientId,
    ServiceResponse, StoreError,
};

use crate::JobChain;

/// Persistent store of in-app payments.
///
/// Updates to a single record are atomic. Implementations should refuse
/// updates that move a payment's state backwards.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert a new payment record
    async fn insert(&self, payment: InAppPayment) -> Result<(), StoreError>;

    /// Read a payment by id
    async fn get(&self, id: PaymentId) -> Result<Option<InAppPayment>, StoreError>;

    /// Replace the stored record with `payment`
    async fn update(&self, payment: InAppPayment) -> Result<(), StoreError>;

    /// Live snapshots of one payment.
    ///
    /// The stream yields the current snapshot first, then one snapshot per
    /// subsequent update. Records are never removed, so the stream stays open
    /// until the subscriber drops it; an implementation that does end it early
    /// makes the redemption wait fail with a storage error.
    async fn observe_updates(
        &self,
        id: PaymentId,
    ) -> Result<BoxStream<'static, InAppPayment>, StoreError>;
}

/// Background job system that runs job chains independently of the caller
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Hand a chain to the job system. Returns once the chain is accepted.
    async fn enqueue(&self, chain: JobChain) -> Result<(), JobError>;
}

/// Remote donation configuration service
#[async_trait]
pub trait DonationsService: Send + Sync {
    /// Fetch the configuration payload for `locale`
    async fn donations_configuration(
        &self,
        locale: &str,
    ) -> ServiceResponse<DonationsConfiguration>;
}

/// Recipient/contact store
#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Resolve a recipient id to its record
    async fn resolve(&self, id: RecipientId) -> Result<Recipient, StoreError>;
}
