//! One-time payment coordinator
//!
//! Orchestrates a single donation across error translation, recipient
//! verification, configuration retrieval and the redemption wait.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use donations_core::{
    Badge, Boost, Currency, DonationError, DonationErrorSource, DonationsConfiguration,
    FiatMoney, InAppPayment, PaymentId, PaymentSetupError, PaymentSourceType, RecipientId,
    RecipientVerificationError, RedemptionState, ServiceError,
};

use crate::{DonationsService, JobChain, JobQueue, PaymentStore, RecipientStore};

/// How long to wait for a redeemed payment to reach `End`
pub const REDEMPTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Locale sent with configuration requests
    pub locale: String,
    /// Upper bound on the redemption wait
    pub redemption_timeout: Duration,
    /// Payment methods usable on this device. Currencies none of them can pay
    /// in are left out of configuration results.
    pub available_payment_methods: Vec<PaymentSourceType>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            redemption_timeout: REDEMPTION_TIMEOUT,
            available_payment_methods: PaymentSourceType::ALL.to_vec(),
        }
    }
}

/// Failure while creating or confirming a payment intent
#[derive(Error, Debug)]
pub enum IntentError {
    /// Already translated, passed through unchanged
    #[error(transparent)]
    Donation(#[from] DonationError),

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment processor failure: {0}")]
    Failed(String),

    #[error("Payment cancelled by user")]
    Cancelled,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Other(String),
}

impl IntentError {
    fn into_setup_reason(self) -> PaymentSetupError {
        match self {
            IntentError::Declined(code) => PaymentSetupError::Declined(code),
            IntentError::Failed(code) => PaymentSetupError::Failed(code),
            IntentError::Cancelled => PaymentSetupError::Cancelled,
            other => PaymentSetupError::Generic(other.to_string()),
        }
    }
}

/// Marks a payment as being awaited; released on drop
struct InFlightGuard {
    registry: Arc<Mutex<HashSet<PaymentId>>>,
    id: PaymentId,
}

impl InFlightGuard {
    fn acquire(
        registry: &Arc<Mutex<HashSet<PaymentId>>>,
        id: PaymentId,
    ) -> donations_core::Result<Self> {
        let mut in_flight = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(id) {
            return Err(DonationError::RedemptionInFlight(id));
        }
        Ok(Self {
            registry: Arc::clone(registry),
            id,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.remove(&self.id);
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Coordinates one-time donations and gifts.
///
/// All collaborators are injected. Clones share the same collaborators and
/// the same in-flight registry.
#[derive(Clone)]
pub struct OneTimePaymentCoordinator {
    config: CoordinatorConfig,
    payments: Arc<dyn PaymentStore>,
    jobs: Arc<dyn JobQueue>,
    donations: Arc<dyn DonationsService>,
    recipients: Arc<dyn RecipientStore>,
    in_flight: Arc<Mutex<HashSet<PaymentId>>>,
}

impl OneTimePaymentCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        payments: Arc<dyn PaymentStore>,
        jobs: Arc<dyn JobQueue>,
        donations: Arc<dyn DonationsService>,
        recipients: Arc<dyn RecipientStore>,
    ) -> Self {
        Self {
            config,
            payments,
            jobs,
            donations,
            recipients,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Whether a redemption wait is currently running for `id`
    pub fn is_redemption_in_flight(&self, id: PaymentId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    // =========================================================================
    // Error translation
    // =========================================================================

    /// Translate a payment intent failure into a [`DonationError`].
    ///
    /// Already-translated errors pass through unchanged. Anything else becomes
    /// a payment setup error tagged `OneTime` when `recipient_id` is the local
    /// user and `Gift` otherwise.
    pub async fn translate_setup_error(
        &self,
        error: IntentError,
        recipient_id: RecipientId,
        method: PaymentSourceType,
    ) -> DonationError {
        if let IntentError::Donation(donation_error) = error {
            return donation_error;
        }

        let origin = match self.recipients.resolve(recipient_id).await {
            Ok(recipient) if recipient.is_self => DonationErrorSource::OneTime,
            Ok(_) => DonationErrorSource::Gift,
            Err(e) => {
                warn!("Could not resolve {} while translating setup error: {}", recipient_id, e);
                DonationErrorSource::Gift
            }
        };

        DonationError::PaymentSetup {
            origin,
            method,
            reason: error.into_setup_reason(),
        }
    }

    // =========================================================================
    // Recipient verification
    // =========================================================================

    /// Check that `recipient_id` may receive a gift.
    ///
    /// Self, non-individual, unregistered and unknown recipients are rejected
    /// with `SelectedRecipientIsInvalid`.
    pub async fn verify_recipient_can_receive_gift(
        &self,
        recipient_id: RecipientId,
    ) -> donations_core::Result<()> {
        let recipients = Arc::clone(&self.recipients);
        let invalid = || {
            DonationError::RecipientVerification(
                RecipientVerificationError::SelectedRecipientIsInvalid,
            )
        };

        off_caller(async move {
            debug!("Verifying {} can receive a gift", recipient_id);

            let recipient = match recipients.resolve(recipient_id).await {
                Ok(recipient) => recipient,
                Err(e) => {
                    warn!("Gift recipient {} could not be resolved: {}", recipient_id, e);
                    return Err(invalid());
                }
            };

            if recipient.is_self {
                warn!("Cannot send a gift to self");
                return Err(invalid());
            }

            if !recipient.is_individual() || !recipient.is_registered() {
                warn!(
                    "Invalid gift recipient {} ({:?}, {:?})",
                    recipient_id, recipient.kind, recipient.registered
                );
                return Err(invalid());
            }

            debug!("{} can receive a gift", recipient_id);
            Ok(())
        })
        .await
        .map_err(|e| DonationError::Scheduling(format!("verification task failed: {}", e)))?
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Boost amounts per currency
    pub async fn get_boosts(&self) -> Result<BTreeMap<Currency, Vec<Boost>>, ServiceError> {
        let available = self.config.available_payment_methods.clone();
        self.fetch_configuration(move |config| Ok(config.boost_amounts(&available)))
            .await
    }

    /// Badge awarded for boosts
    pub async fn get_boost_badge(&self) -> Result<Badge, ServiceError> {
        self.fetch_configuration(|config| {
            config
                .boost_badges()
                .into_iter()
                .next()
                .ok_or_else(|| {
                    ServiceError::MalformedPayload("no boost badge configured".to_string())
                })
        })
        .await
    }

    /// Minimum one-time amount per currency
    pub async fn get_minimum_donation_amounts(
        &self,
    ) -> Result<BTreeMap<Currency, FiatMoney>, ServiceError> {
        let available = self.config.available_payment_methods.clone();
        self.fetch_configuration(move |config| Ok(config.minimum_donation_amounts(&available)))
            .await
    }

    async fn fetch_configuration<T, F>(&self, map: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(DonationsConfiguration) -> Result<T, ServiceError> + Send + 'static,
    {
        let donations = Arc::clone(&self.donations);
        let locale = self.config.locale.clone();

        off_caller(async move {
            let response = donations.donations_configuration(&locale).await;
            debug!(
                "Configuration response for {} (status: {:?})",
                locale,
                response.status()
            );
            response.flatten_result().and_then(map)
        })
        .await
        .map_err(|e| ServiceError::Execution(format!("configuration task failed: {}", e)))?
    }

    // =========================================================================
    // Redemption
    // =========================================================================

    /// Wait for a confirmed one-time payment to be redeemed.
    ///
    /// Records the `Init` redemption stage with `payment_intent_id`, enqueues
    /// the redemption job chain, then waits for the payment to reach `End`.
    /// The store write always completes before the chain is enqueued and is
    /// never rolled back.
    ///
    /// Fails with `RedemptionPending` for long-running payment methods and
    /// `RedemptionTimeout` otherwise when `End` is not observed in time, and
    /// with `RedemptionFailed` when the payment ended carrying an error code.
    /// A concurrent call for the same payment fails with `RedemptionInFlight`.
    pub async fn await_redemption(
        &self,
        payment: InAppPayment,
        payment_intent_id: &str,
    ) -> donations_core::Result<()> {
        let payment_id = payment.id;
        let origin = payment.kind.error_source();
        let is_long_running = payment.payment_method.is_long_running();

        let timeout_error = if is_long_running {
            DonationError::RedemptionPending { origin, payment_id }
        } else {
            DonationError::RedemptionTimeout { origin }
        };

        let _guard = InFlightGuard::acquire(&self.in_flight, payment_id)?;

        info!(
            "Awaiting redemption of {} via {} (long-running: {})",
            payment_id, payment.payment_method, is_long_running
        );

        let mut pending = payment;
        pending.redemption = Some(RedemptionState::init(payment_intent_id));
        pending.updated_at = unix_now();
        self.payments.update(pending.clone()).await?;

        self.jobs.enqueue(JobChain::one_time_redemption(&pending)).await?;

        let mut updates = self.payments.observe_updates(payment_id).await?;
        let terminal = tokio::time::timeout(self.config.redemption_timeout, async {
            while let Some(snapshot) = updates.next().await {
                if snapshot.state.is_terminal() {
                    return Some(snapshot);
                }
            }
            None
        })
        .await;

        match terminal {
            Err(_) => {
                warn!(
                    "No terminal update for {} within {:?}",
                    payment_id, self.config.redemption_timeout
                );
                Err(timeout_error)
            }
            Ok(None) => Err(DonationError::Storage(format!(
                "update stream for {} closed before redemption ended",
                payment_id
            ))),
            Ok(Some(ended)) => match ended.error {
                Some(code) => {
                    warn!("Redemption of {} failed: {}", payment_id, code);
                    Err(DonationError::RedemptionFailed(code))
                }
                None => {
                    info!("Redemption of {} complete", payment_id);
                    Ok(())
                }
            },
        }
    }
}

/// Run `fut` on a runtime worker instead of the calling task
async fn off_caller<F>(fut: F) -> Result<F::Output, tokio::task::JoinError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(fut).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{
        demo_configuration, demo_recipients, InMemoryPaymentStore, InMemoryRecipientStore,
        MockDonationsService, MockJobQueue, RedemptionScript,
    };
    use donations_core::{
        InAppPaymentState, InAppPaymentType, PaymentErrorCode, PaymentErrorKind, RedemptionStage,
        ServiceResponse,
    };
    use tokio::time::Instant;

    struct Harness {
        coordinator: OneTimePaymentCoordinator,
        store: Arc<InMemoryPaymentStore>,
        queue: Arc<MockJobQueue>,
        service: Arc<MockDonationsService>,
    }

    fn harness_with(
        queue: impl FnOnce(Arc<InMemoryPaymentStore>) -> MockJobQueue,
        response: ServiceResponse<DonationsConfiguration>,
    ) -> Harness {
        let store = Arc::new(InMemoryPaymentStore::new());
        let queue = Arc::new(queue(Arc::clone(&store)));
        let service = Arc::new(MockDonationsService::new(response));
        let coordinator = OneTimePaymentCoordinator::new(
            CoordinatorConfig::default(),
            store.clone(),
            queue.clone(),
            service.clone(),
            Arc::new(InMemoryRecipientStore::demo()),
        );
        Harness { coordinator, store, queue, service }
    }

    fn harness(script: Option<RedemptionScript>) -> Harness {
        harness_with(
            move |store| match script {
                Some(script) => MockJobQueue::simulating(store, script),
                None => MockJobQueue::recording(store),
            },
            ServiceResponse::ok(demo_configuration()),
        )
    }

    async fn pending_payment(
        store: &InMemoryPaymentStore,
        id: u64,
        method: PaymentSourceType,
    ) -> InAppPayment {
        let payment = InAppPayment::pending(
            PaymentId(id),
            InAppPaymentType::OneTimeDonation,
            method,
            FiatMoney::new(500, Currency::new("eur")),
        );
        store.insert(payment.clone()).await.unwrap();
        payment
    }

    // ==================== Error Translation Tests ====================

    #[tokio::test]
    async fn test_translate_passes_donation_errors_through() {
        let h = harness(None);
        let original = DonationError::RedemptionTimeout { origin: DonationErrorSource::Gift };

        let translated = h
            .coordinator
            .translate_setup_error(
                original.clone().into(),
                demo_recipients::SELF,
                PaymentSourceType::PayPal,
            )
            .await;

        assert_eq!(translated, original);
    }

    #[tokio::test]
    async fn test_translate_self_recipient_is_one_time() {
        let h = harness(None);
        let translated = h
            .coordinator
            .translate_setup_error(
                IntentError::Declined("card_declined".to_string()),
                demo_recipients::SELF,
                PaymentSourceType::CreditCard,
            )
            .await;

        assert_eq!(
            translated,
            DonationError::PaymentSetup {
                origin: DonationErrorSource::OneTime,
                method: PaymentSourceType::CreditCard,
                reason: PaymentSetupError::Declined("card_declined".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_translate_other_recipient_is_gift() {
        let h = harness(None);
        let translated = h
            .coordinator
            .translate_setup_error(
                IntentError::Cancelled,
                demo_recipients::FRIEND,
                PaymentSourceType::GooglePay,
            )
            .await;

        assert!(matches!(
            translated,
            DonationError::PaymentSetup {
                origin: DonationErrorSource::Gift,
                reason: PaymentSetupError::Cancelled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_translate_generic_error_keeps_message() {
        let h = harness(None);
        let translated = h
            .coordinator
            .translate_setup_error(
                IntentError::Service(ServiceError::Execution("socket closed".to_string())),
                demo_recipients::FRIEND,
                PaymentSourceType::PayPal,
            )
            .await;

        match translated {
            DonationError::PaymentSetup { reason: PaymentSetupError::Generic(message), .. } => {
                assert_eq!(message, "Request failed: socket closed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_translate_unknown_recipient_is_gift() {
        let h = harness(None);
        let translated = h
            .coordinator
            .translate_setup_error(
                IntentError::Other("boom".to_string()),
                RecipientId(404),
                PaymentSourceType::Ideal,
            )
            .await;

        assert!(matches!(
            translated,
            DonationError::PaymentSetup {
                origin: DonationErrorSource::Gift,
                ..
            }
        ));
    }

    // ==================== Verification Tests ====================

    #[tokio::test]
    async fn test_verify_rejects_self() {
        let h = harness(None);
        assert_eq!(
            h.coordinator.verify_recipient_can_receive_gift(demo_recipients::SELF).await,
            Err(RecipientVerificationError::SelectedRecipientIsInvalid.into())
        );
    }

    #[tokio::test]
    async fn test_verify_rejects_unregistered() {
        let h = harness(None);
        assert_eq!(
            h.coordinator.verify_recipient_can_receive_gift(demo_recipients::UNREGISTERED).await,
            Err(RecipientVerificationError::SelectedRecipientIsInvalid.into())
        );
    }

    #[tokio::test]
    async fn test_verify_rejects_group_and_unknown() {
        let h = harness(None);
        for recipient in [demo_recipients::GROUP, RecipientId(404)] {
            let result = h.coordinator.verify_recipient_can_receive_gift(recipient).await;
            assert!(result.is_err(), "{}", recipient);
        }
    }

    #[tokio::test]
    async fn test_verify_accepts_registered_friend() {
        let h = harness(None);
        let result = h
            .coordinator
            .verify_recipient_can_receive_gift(demo_recipients::FRIEND)
            .await;
        assert_eq!(result, Ok(()));
    }

    // ==================== Configuration Tests ====================

    #[tokio::test]
    async fn test_get_boosts() {
        let h = harness(None);
        let boosts = h.coordinator.get_boosts().await.unwrap();

        assert_eq!(boosts.len(), 3);
        assert_eq!(boosts[&Currency::new("USD")][0].price.amount_minor, 300);
        assert_eq!(h.service.locales(), vec!["en-US".to_string()]);
    }

    #[tokio::test]
    async fn test_get_boost_badge() {
        let h = harness(None);
        let badge = h.coordinator.get_boost_badge().await.unwrap();
        assert_eq!(badge.id, "BOOST");
    }

    #[tokio::test]
    async fn test_get_boost_badge_missing() {
        let h = harness_with(
            MockJobQueue::recording,
            ServiceResponse::ok(DonationsConfiguration::default()),
        );
        assert!(matches!(
            h.coordinator.get_boost_badge().await,
            Err(ServiceError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_get_minimums() {
        let h = harness(None);
        let minimums = h.coordinator.get_minimum_donation_amounts().await.unwrap();
        assert_eq!(minimums[&Currency::new("JPY")].amount_minor, 400);
        assert_eq!(minimums[&Currency::new("JPY")].to_string(), "400 JPY");
    }

    #[tokio::test]
    async fn test_fetch_surfaces_envelope_error() {
        let h = harness_with(
            MockJobQueue::recording,
            ServiceResponse::ApplicationError { status: 500, message: "oops".to_string() },
        );

        assert_eq!(
            h.coordinator.get_boosts().await,
            Err(ServiceError::Application { status: 500, message: "oops".to_string() })
        );
        assert_eq!(h.service.calls(), 1);
    }

    // ==================== Redemption Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_redemption_completes_when_end_arrives() {
        let h = harness(Some(RedemptionScript::redeem_after(Duration::from_secs(3))));
        let payment = pending_payment(&h.store, 1, PaymentSourceType::CreditCard).await;

        let started = Instant::now();
        h.coordinator.await_redemption(payment, "pi_card").await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(4));

        let ended = h.store.snapshot(PaymentId(1)).unwrap();
        assert_eq!(ended.state, InAppPaymentState::End);
        assert_eq!(ended.redemption.unwrap().stage, RedemptionStage::Redeemed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redemption_timeout_for_instant_method() {
        let h = harness(None);
        let payment = pending_payment(&h.store, 1, PaymentSourceType::CreditCard).await;

        let started = Instant::now();
        let result = h.coordinator.await_redemption(payment, "pi_card").await;

        assert_eq!(
            result,
            Err(DonationError::RedemptionTimeout {
                origin: DonationErrorSource::OneTime
            })
        );
        assert!(started.elapsed() >= REDEMPTION_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redemption_pending_for_long_running_method() {
        let h = harness(Some(RedemptionScript::stall()));
        let payment = pending_payment(&h.store, 1, PaymentSourceType::SepaDebit).await;

        let result = h.coordinator.await_redemption(payment, "pi_sepa").await;

        assert_eq!(
            result,
            Err(DonationError::RedemptionPending {
                origin: DonationErrorSource::OneTime,
                payment_id: PaymentId(1),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_redemption_failure_wraps_error_code() {
        let code = PaymentErrorCode::new(PaymentErrorKind::Redemption, Some("X".to_string()));
        let h = harness(Some(RedemptionScript::fail_after(Duration::from_secs(1), code.clone())));
        let payment = pending_payment(&h.store, 1, PaymentSourceType::PayPal).await;

        let result = h.coordinator.await_redemption(payment, "pi_paypal").await;

        assert_eq!(result, Err(DonationError::RedemptionFailed(code)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_stage_written_before_enqueue() {
        let h = harness(Some(RedemptionScript::redeem_after(Duration::from_secs(1))));
        let payment = pending_payment(&h.store, 1, PaymentSourceType::Ideal).await;

        h.coordinator.await_redemption(payment, "pi_ideal").await.unwrap();

        let enqueued = h.queue.enqueued();
        assert_eq!(enqueued.len(), 1);
        assert_eq!(enqueued[0].chain.payment_id, PaymentId(1));
        assert_eq!(enqueued[0].redemption_at_enqueue, Some(RedemptionState::init("pi_ideal")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_ended_payment_completes_immediately() {
        let h = harness(None);
        let mut payment = pending_payment(&h.store, 1, PaymentSourceType::CreditCard).await;
        payment.state = InAppPaymentState::End;
        h.store.update(payment.clone()).await.unwrap();

        let started = Instant::now();
        h.coordinator.await_redemption(payment, "pi_done").await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_enqueue_failure_keeps_init_stage() {
        let h = harness_with(MockJobQueue::unavailable, ServiceResponse::ok(demo_configuration()));
        let payment = pending_payment(&h.store, 1, PaymentSourceType::CreditCard).await;

        let result = h.coordinator.await_redemption(payment, "pi_card").await;

        assert!(matches!(result, Err(DonationError::Scheduling(_))));
        let stored = h.store.snapshot(PaymentId(1)).unwrap();
        assert_eq!(stored.redemption, Some(RedemptionState::init("pi_card")));
        assert!(!h.coordinator.is_redemption_in_flight(PaymentId(1)));
    }

    #[tokio::test]
    async fn test_missing_payment_is_storage_error() {
        let h = harness(None);
        let payment = InAppPayment::pending(
            PaymentId(77),
            InAppPaymentType::OneTimeGift,
            PaymentSourceType::CreditCard,
            FiatMoney::new(500, Currency::new("usd")),
        );

        let result = h.coordinator.await_redemption(payment, "pi_missing").await;

        assert!(matches!(result, Err(DonationError::Storage(_))));
        assert!(h.queue.enqueued().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_redemption_rejected() {
        let h = harness(Some(RedemptionScript::redeem_after(Duration::from_secs(5))));
        let payment = pending_payment(&h.store, 1, PaymentSourceType::CreditCard).await;

        let coordinator = h.coordinator.clone();
        let first_payment = payment.clone();
        let first =
            tokio::spawn(async move { coordinator.await_redemption(first_payment, "pi_1").await });

        // Let the first call reach its wait
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.coordinator.is_redemption_in_flight(PaymentId(1)));

        let second = h.coordinator.await_redemption(payment, "pi_1").await;
        assert_eq!(second, Err(DonationError::RedemptionInFlight(PaymentId(1))));
        assert_eq!(h.queue.enqueued().len(), 1);

        assert_eq!(first.await.unwrap(), Ok(()));
        assert!(!h.coordinator.is_redemption_in_flight(PaymentId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_releases_guard_and_keeps_side_effects() {
        let h = harness(None);
        let payment = pending_payment(&h.store, 1, PaymentSourceType::CreditCard).await;

        let abandoned = tokio::time::timeout(
            Duration::from_secs(2),
            h.coordinator.await_redemption(payment, "pi_abandoned"),
        )
        .await;
        assert!(abandoned.is_err());

        assert!(!h.coordinator.is_redemption_in_flight(PaymentId(1)));
        assert_eq!(h.queue.enqueued().len(), 1);
        assert_eq!(
            h.store.snapshot(PaymentId(1)).unwrap().redemption,
            Some(RedemptionState::init("pi_abandoned"))
        );
    }
}
