use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FiatMoney;

/// Row identifier of an in-app payment in the payment store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaymentId(pub u64);

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payment#{}", self.0)
    }
}

/// Identifier of a recipient in the contact store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipientId(pub u64);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recipient#{}", self.0)
    }
}

/// Where a donation error originated, as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationErrorSource {
    /// A one-time donation for the local user
    OneTime,
    /// A one-time donation gifted to someone else
    Gift,
}

/// Kind of one-time in-app payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InAppPaymentType {
    /// Boost donation that rewards the local user
    OneTimeDonation,
    /// Boost donation sent as a gift to another recipient
    OneTimeGift,
}

impl InAppPaymentType {
    /// Error source used when a payment of this type fails
    pub fn error_source(&self) -> DonationErrorSource {
        match self {
            Self::OneTimeDonation => DonationErrorSource::OneTime,
            Self::OneTimeGift => DonationErrorSource::Gift,
        }
    }
}

/// Lifecycle state of an in-app payment.
///
/// States are ordered and only ever move forward. `End` is terminal: the
/// payment either redeemed successfully or carries a stored error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InAppPaymentState {
    /// Created locally, no payment intent yet
    Created,
    /// Waiting on the user (3DS, bank redirect)
    RequiresAction,
    /// Payment confirmed, waiting for background work
    Pending,
    /// Background job chain is redeeming the payment
    Transacting,
    /// Terminal
    End,
}

impl InAppPaymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End)
    }
}

/// Payment method used to fund a donation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSourceType {
    PayPal,
    CreditCard,
    GooglePay,
    SepaDebit,
    Ideal,
}

impl PaymentSourceType {
    /// All payment methods, in display order
    pub const ALL: [PaymentSourceType; 5] = [
        Self::PayPal,
        Self::CreditCard,
        Self::GooglePay,
        Self::SepaDebit,
        Self::Ideal,
    ];

    /// Bank transfers clear over days instead of seconds
    pub fn is_bank_transfer(&self) -> bool {
        matches!(self, Self::SepaDebit | Self::Ideal)
    }

    /// Whether settlement may take far longer than a redemption wait
    pub fn is_long_running(&self) -> bool {
        self.is_bank_transfer()
    }

    /// Method name used by the donation configuration payload
    pub fn method_code(&self) -> &'static str {
        match self {
            Self::PayPal => "PAYPAL",
            Self::CreditCard | Self::GooglePay => "CARD",
            Self::SepaDebit => "SEPA_DEBIT",
            Self::Ideal => "IDEAL",
        }
    }
}

impl fmt::Display for PaymentSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PayPal => "PayPal",
            Self::CreditCard => "credit card",
            Self::GooglePay => "Google Pay",
            Self::SepaDebit => "SEPA debit",
            Self::Ideal => "iDEAL",
        };
        f.write_str(name)
    }
}

/// Progress of the redemption job chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RedemptionStage {
    /// Recorded by the coordinator before the job chain starts
    Init,
    /// Payment intent is being converted into a receipt credential
    ConversionStarted,
    /// Receipt credential is being redeemed for the badge
    RedemptionStarted,
    /// Badge has been awarded
    Redeemed,
}

/// Redemption sub-state stored on a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionState {
    pub stage: RedemptionStage,
    /// Confirmed payment intent being redeemed
    pub payment_intent_id: String,
}

impl RedemptionState {
    /// Initial state written before the job chain is enqueued
    pub fn init(payment_intent_id: impl Into<String>) -> Self {
        Self {
            stage: RedemptionStage::Init,
            payment_intent_id: payment_intent_id.into(),
        }
    }
}

/// Category of a stored payment error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorKind {
    Unknown,
    PaymentSetup,
    PaymentProcessing,
    CredentialValidation,
    Redemption,
}

/// Terminal error recorded on a payment by the redemption job chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentErrorCode {
    pub kind: PaymentErrorKind,
    /// Processor-specific detail, e.g. a decline code
    #[serde(default)]
    pub data: Option<String>,
}

impl PaymentErrorCode {
    pub fn new(kind: PaymentErrorKind, data: Option<String>) -> Self {
        Self { kind, data }
    }
}

impl fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Some(data) => write!(f, "{:?}({})", self.kind, data),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

/// A single one-time donation attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InAppPayment {
    pub id: PaymentId,
    pub kind: InAppPaymentType,
    pub state: InAppPaymentState,
    pub payment_method: PaymentSourceType,
    /// Gift recipient, `None` for a self donation
    #[serde(default)]
    pub recipient: Option<RecipientId>,
    pub amount: FiatMoney,
    /// Set by the job chain when the payment ends in failure
    #[serde(default)]
    pub error: Option<PaymentErrorCode>,
    #[serde(default)]
    pub redemption: Option<RedemptionState>,
    /// Unix timestamp (seconds) of the last update
    pub updated_at: u64,
}

impl InAppPayment {
    /// Create a payment in the `Pending` state, ready for redemption
    pub fn pending(
        id: PaymentId,
        kind: InAppPaymentType,
        payment_method: PaymentSourceType,
        amount: FiatMoney,
    ) -> Self {
        Self {
            id,
            kind,
            state: InAppPaymentState::Pending,
            payment_method,
            recipient: None,
            amount,
            error: None,
            redemption: None,
            updated_at: 0,
        }
    }

    /// Attach a gift recipient
    pub fn with_recipient(mut self, recipient: RecipientId) -> Self {
        self.recipient = Some(recipient);
        self
    }
}

/// Classification of a recipient record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientKind {
    Individual,
    Group,
    DistributionList,
}

/// Whether a recipient is registered with the messaging service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegisteredState {
    #[default]
    Unknown,
    Registered,
    NotRegistered,
}

/// Resolved recipient record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    /// True for the local user
    pub is_self: bool,
    pub kind: RecipientKind,
    pub registered: RegisteredState,
}

impl Recipient {
    pub fn is_individual(&self) -> bool {
        self.kind == RecipientKind::Individual
    }

    pub fn is_registered(&self) -> bool {
        self.registered == RegisteredState::Registered
    }
}
