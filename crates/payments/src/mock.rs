//! In-memory collaborators for development and tests.
//!
//! - [`InMemoryPaymentStore`]: per-record atomic updates with live snapshots
//!   backed by a `tokio::sync::watch` channel per payment.
//! - [`MockJobQueue`]: records enqueued chains and optionally simulates the
//!   redemption chain on a spawned task.
//! - [`MockDonationsService`]: returns a canned configuration response.
//! - [`InMemoryRecipientStore`]: a fixed set of recipients.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use donations_core::{
    Badge, BadgeCategory, CurrencyConfiguration, DonationsConfiguration, InAppPayment,
    InAppPaymentState, JobError, LevelConfiguration, PaymentErrorCode, PaymentId, Recipient,
    RecipientId, RecipientKind, RedemptionStage, RedemptionState, RegisteredState,
    ServiceResponse, StoreError, BOOST_LEVEL,
};

use crate::{DonationsService, JobChain, JobQueue, PaymentStore, RecipientStore};

fn poisoned(name: &str) -> StoreError {
    StoreError::Unavailable(format!("{} lock poisoned", name))
}

// =============================================================================
// PAYMENT STORE
// =============================================================================

/// Payment store kept in memory
#[derive(Default)]
pub struct InMemoryPaymentStore {
    records: RwLock<HashMap<PaymentId, watch::Sender<InAppPayment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot without going through the async trait
    pub fn snapshot(&self, id: PaymentId) -> Option<InAppPayment> {
        let records = self.records.read().ok()?;
        records.get(&id).map(|sender| sender.borrow().clone())
    }
}

fn watch_stream(rx: watch::Receiver<InAppPayment>) -> BoxStream<'static, InAppPayment> {
    stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first {
            rx.changed().await.ok()?;
        }
        let snapshot = rx.borrow_and_update().clone();
        Some((snapshot, (rx, false)))
    })
    .boxed()
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: InAppPayment) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned("payment store"))?;
        if records.contains_key(&payment.id) {
            return Err(StoreError::DuplicatePayment(payment.id));
        }
        debug!("[MOCK] Inserted {} ({:?})", payment.id, payment.state);
        let (sender, _) = watch::channel(payment.clone());
        records.insert(payment.id, sender);
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<InAppPayment>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("payment store"))?;
        Ok(records.get(&id).map(|sender| sender.borrow().clone()))
    }

    async fn update(&self, payment: InAppPayment) -> Result<(), StoreError> {
        let records = self.records.read().map_err(|_| poisoned("payment store"))?;
        let id = payment.id;
        let sender = records.get(&id).ok_or(StoreError::PaymentNotFound(id))?;

        let mut result = Ok(());
        sender.send_if_modified(|current| {
            if payment.state < current.state {
                result = Err(StoreError::StateRegression {
                    id,
                    from: current.state,
                    to: payment.state,
                });
                return false;
            }
            *current = payment;
            true
        });

        if result.is_ok() {
            debug!("[MOCK] Updated {}", id);
        }
        result
    }

    async fn observe_updates(
        &self,
        id: PaymentId,
    ) -> Result<BoxStream<'static, InAppPayment>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned("payment store"))?;
        let sender = records.get(&id).ok_or(StoreError::PaymentNotFound(id))?;
        Ok(watch_stream(sender.subscribe()))
    }
}

// =============================================================================
// JOB QUEUE
// =============================================================================

/// How the simulated redemption chain ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionOutcome {
    /// Reach `End` with the badge redeemed
    Redeem,
    /// Reach `End` carrying the given error code
    Fail(PaymentErrorCode),
    /// Never reach `End` (bank transfer still clearing)
    Stall,
}

/// Script for the simulated redemption chain
#[derive(Debug, Clone)]
pub struct RedemptionScript {
    /// Time between the chain starting and the payment ending
    pub delay: Duration,
    pub outcome: RedemptionOutcome,
}

impl RedemptionScript {
    pub fn redeem_after(delay: Duration) -> Self {
        Self { delay, outcome: RedemptionOutcome::Redeem }
    }

    pub fn fail_after(delay: Duration, code: PaymentErrorCode) -> Self {
        Self { delay, outcome: RedemptionOutcome::Fail(code) }
    }

    pub fn stall() -> Self {
        Self { delay: Duration::ZERO, outcome: RedemptionOutcome::Stall }
    }
}

/// A chain accepted by [`MockJobQueue`], with the payment's redemption
/// sub-state as the store held it at the moment of enqueue
#[derive(Debug, Clone)]
pub struct EnqueuedChain {
    pub chain: JobChain,
    pub redemption_at_enqueue: Option<RedemptionState>,
}

/// Job queue that records chains and simulates the redemption chain
pub struct MockJobQueue {
    store: Arc<InMemoryPaymentStore>,
    script: Option<RedemptionScript>,
    available: bool,
    enqueued: Mutex<Vec<EnqueuedChain>>,
}

impl MockJobQueue {
    /// Record chains without running them
    pub fn recording(store: Arc<InMemoryPaymentStore>) -> Self {
        Self {
            store,
            script: None,
            available: true,
            enqueued: Mutex::new(Vec::new()),
        }
    }

    /// Record chains and drive each payment according to `script`
    pub fn simulating(store: Arc<InMemoryPaymentStore>, script: RedemptionScript) -> Self {
        Self {
            script: Some(script),
            ..Self::recording(store)
        }
    }

    /// Reject every chain with `JobError::Unavailable`
    pub fn unavailable(store: Arc<InMemoryPaymentStore>) -> Self {
        Self {
            available: false,
            ..Self::recording(store)
        }
    }

    /// Chains accepted so far, in order
    pub fn enqueued(&self) -> Vec<EnqueuedChain> {
        self.enqueued
            .lock()
            .map(|chains| chains.clone())
            .unwrap_or_default()
    }

    async fn run_chain(store: Arc<InMemoryPaymentStore>, id: PaymentId, script: RedemptionScript) {
        let advance = |stage: RedemptionStage,
                       state: InAppPaymentState,
                       error: Option<PaymentErrorCode>| {
            let mut payment = store.snapshot(id)?;
            payment.state = state;
            payment.error = error;
            if let Some(redemption) = payment.redemption.as_mut() {
                redemption.stage = stage;
            }
            Some(payment)
        };

        let started = advance(
            RedemptionStage::ConversionStarted,
            InAppPaymentState::Transacting,
            None,
        );
        if let Some(payment) = started {
            if let Err(e) = store.update(payment).await {
                warn!("[MOCK] Redemption chain for {} could not start: {}", id, e);
            }
        }

        if script.outcome == RedemptionOutcome::Stall {
            debug!("[MOCK] Redemption chain for {} stalled", id);
            return;
        }

        tokio::time::sleep(script.delay).await;

        let finished = match script.outcome {
            RedemptionOutcome::Fail(code) => {
                advance(RedemptionStage::RedemptionStarted, InAppPaymentState::End, Some(code))
            }
            _ => advance(RedemptionStage::Redeemed, InAppPaymentState::End, None),
        };
        if let Some(payment) = finished {
            let error = payment.error.clone();
            match store.update(payment).await {
                Ok(()) => info!("[MOCK] Redemption chain for {} ended (error: {:?})", id, error),
                Err(e) => warn!("[MOCK] Redemption chain for {} could not end: {}", id, e),
            }
        }
    }
}

#[async_trait]
impl JobQueue for MockJobQueue {
    async fn enqueue(&self, chain: JobChain) -> Result<(), JobError> {
        if !self.available {
            return Err(JobError::Unavailable);
        }

        let id = chain.payment_id;
        let redemption_at_enqueue = self
            .store
            .snapshot(id)
            .and_then(|payment| payment.redemption);

        self.enqueued
            .lock()
            .map_err(|_| JobError::Rejected("job queue lock poisoned".to_string()))?
            .push(EnqueuedChain { chain, redemption_at_enqueue });

        info!("[MOCK] Enqueued redemption chain for {}", id);

        if let Some(script) = self.script.clone() {
            tokio::spawn(Self::run_chain(Arc::clone(&self.store), id, script));
        }
        Ok(())
    }
}

// =============================================================================
// DONATIONS SERVICE
// =============================================================================

/// Configuration service that always returns the same response
pub struct MockDonationsService {
    response: ServiceResponse<DonationsConfiguration>,
    calls: AtomicUsize,
    locales: Mutex<Vec<String>>,
}

impl MockDonationsService {
    pub fn new(response: ServiceResponse<DonationsConfiguration>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            locales: Mutex::new(Vec::new()),
        }
    }

    pub fn with_configuration(configuration: DonationsConfiguration) -> Self {
        Self::new(ServiceResponse::ok(configuration))
    }

    /// Number of remote calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Locales requested so far, in order
    pub fn locales(&self) -> Vec<String> {
        self.locales
            .lock()
            .map(|locales| locales.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DonationsService for MockDonationsService {
    async fn donations_configuration(
        &self,
        locale: &str,
    ) -> ServiceResponse<DonationsConfiguration> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut locales) = self.locales.lock() {
            locales.push(locale.to_string());
        }
        self.response.clone()
    }
}

/// Configuration with USD, EUR and JPY boost amounts and a boost badge
pub fn demo_configuration() -> DonationsConfiguration {
    let currency = |minimum: u64, amounts: Vec<u64>, methods: &[&str]| CurrencyConfiguration {
        minimum,
        one_time: BTreeMap::from([(BOOST_LEVEL, amounts)]),
        supported_payment_methods: methods.iter().map(|m| m.to_string()).collect(),
    };

    DonationsConfiguration {
        currencies: BTreeMap::from([
            (
                "usd".to_string(),
                currency(300, vec![300, 500, 1000, 2000, 5000, 10000], &["CARD", "PAYPAL"]),
            ),
            (
                "eur".to_string(),
                currency(
                    300,
                    vec![300, 500, 1000, 2000, 5000, 10000],
                    &["CARD", "PAYPAL", "SEPA_DEBIT", "IDEAL"],
                ),
            ),
            (
                "jpy".to_string(),
                currency(400, vec![400, 700, 1400], &["CARD"]),
            ),
        ]),
        levels: BTreeMap::from([(
            BOOST_LEVEL,
            LevelConfiguration {
                name: "Boost".to_string(),
                badge: Badge {
                    id: "BOOST".to_string(),
                    category: BadgeCategory::Donor,
                    name: "Boost".to_string(),
                    description: "Support the project with a one-time donation".to_string(),
                    image_url: None,
                    duration_secs: 30 * 24 * 60 * 60,
                },
            },
        )]),
    }
}

// =============================================================================
// RECIPIENT STORE
// =============================================================================

/// Recipient store kept in memory
#[derive(Default)]
pub struct InMemoryRecipientStore {
    recipients: RwLock<HashMap<RecipientId, Recipient>>,
}

/// Ids used by [`InMemoryRecipientStore::demo`]
pub mod demo_recipients {
    use donations_core::RecipientId;

    pub const SELF: RecipientId = RecipientId(1);
    pub const FRIEND: RecipientId = RecipientId(2);
    pub const UNREGISTERED: RecipientId = RecipientId(3);
    pub const GROUP: RecipientId = RecipientId(4);
}

impl InMemoryRecipientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the local user, a registered friend, an
    /// unregistered contact and a group
    pub fn demo() -> Self {
        let store = Self::new();
        let seed = [
            (demo_recipients::SELF, true, RecipientKind::Individual, RegisteredState::Registered),
            (
                demo_recipients::FRIEND,
                false,
                RecipientKind::Individual,
                RegisteredState::Registered,
            ),
            (
                demo_recipients::UNREGISTERED,
                false,
                RecipientKind::Individual,
                RegisteredState::NotRegistered,
            ),
            (demo_recipients::GROUP, false, RecipientKind::Group, RegisteredState::Registered),
        ];
        for (id, is_self, kind, registered) in seed {
            store.insert(Recipient { id, is_self, kind, registered });
        }
        store
    }

    pub fn insert(&self, recipient: Recipient) {
        if let Ok(mut recipients) = self.recipients.write() {
            recipients.insert(recipient.id, recipient);
        }
    }
}

#[async_trait]
impl RecipientStore for InMemoryRecipientStore {
    async fn resolve(&self, id: RecipientId) -> Result<Recipient, StoreError> {
        let recipients = self.recipients.read().map_err(|_| poisoned("recipient store"))?;
        recipients
            .get(&id)
            .cloned()
            .ok_or(StoreError::RecipientNotFound(id))
    }
}
