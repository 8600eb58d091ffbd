//! Donation Payments
//!
//! Coordination of one-time in-app payments (boosts and gifts).
//!
//! ## One-Time Payment Flow
//!
//! 1. **Configure**: The caller fetches boost amounts, the boost badge and
//!    per-currency minimums to populate the amount picker.
//! 2. **Verify**: Before a gift is allowed, the recipient is checked. Self,
//!    non-individual and unregistered recipients are rejected.
//! 3. **Pay**: The payment intent is created and confirmed outside this crate.
//!    Setup failures are translated into a [`DonationError`](donations_core::DonationError)
//!    tagged with whether the donation was for self or a gift.
//! 4. **Redeem**: The payment record is moved into redemption (`Init` stage),
//!    the redemption job chain is enqueued, and the caller waits up to 10
//!    seconds for the record to reach `End`.
//!
//! Collaborators (payment store, job queue, configuration service, recipient
//! store) are passed in as trait objects. The [`mock`] module provides
//! in-memory implementations for development and tests.

mod coordinator;
mod jobs;
pub mod mock;
mod traits;

pub use coordinator::{
    CoordinatorConfig, IntentError, OneTimePaymentCoordinator, REDEMPTION_TIMEOUT,
};
pub use jobs::{JobChain, JobKind};
pub use traits::{DonationsService, JobQueue, PaymentStore, RecipientStore};
