//! Donations CLI
//!
//! Drives the one-time payment coordinator against in-memory collaborators.
//! Useful for exercising the redemption flow without a backend.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use donations_core::{
    Currency, DonationError, FiatMoney, InAppPayment, InAppPaymentType, PaymentErrorCode,
    PaymentErrorKind, PaymentId, PaymentSourceType, RecipientId,
};
use donations_logging::LogLevel;
use donations_payments::mock::{
    demo_configuration, InMemoryPaymentStore, InMemoryRecipientStore,
    MockDonationsService, MockJobQueue, RedemptionScript,
};
use donations_payments::{CoordinatorConfig, OneTimePaymentCoordinator, PaymentStore};
use donations_scaffold::{AppBarAction, Navigation, SettingsScaffold, TopAppBarState};
use donations_settings::Settings;

/// Donations - one-time donation and gift flows
#[derive(Parser)]
#[command(name = "donations")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List boost amounts per currency
    Boosts {
        /// Only show this currency
        #[arg(long)]
        currency: Option<String>,
    },

    /// Show the badge awarded for boosts
    Badge,

    /// List minimum one-time amounts per currency
    Minimums,

    /// Check whether a recipient can receive a gift
    Verify {
        /// Recipient id (1 = self, 2 = friend, 3 = unregistered, 4 = group)
        recipient: u64,
    },

    /// Simulate a payment and wait for its redemption
    Redeem {
        /// Payment method
        #[arg(short, long, value_enum, default_value = "credit-card")]
        method: MethodArg,

        /// Gift recipient id; omit for a self donation
        #[arg(short, long)]
        recipient: Option<u64>,

        /// Amount in minor units
        #[arg(long, default_value = "500")]
        amount: u64,

        /// Currency code
        #[arg(long, default_value = "USD")]
        currency: String,

        /// Seconds until the simulated job chain ends the payment
        #[arg(long, default_value = "2")]
        delay_secs: u64,

        /// End the payment with this error instead of redeeming it
        #[arg(long, value_enum)]
        fail_with: Option<ErrorKindArg>,

        /// Never end the payment (bank transfer still clearing)
        #[arg(long)]
        never_complete: bool,
    },

    /// Render the donation settings page frame as JSON
    Page {
        /// Scroll delta applied before rendering (negative scrolls content up)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        scroll: f32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    #[value(name = "paypal")]
    PayPal,
    CreditCard,
    GooglePay,
    SepaDebit,
    Ideal,
}

impl From<MethodArg> for PaymentSourceType {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::PayPal => PaymentSourceType::PayPal,
            MethodArg::CreditCard => PaymentSourceType::CreditCard,
            MethodArg::GooglePay => PaymentSourceType::GooglePay,
            MethodArg::SepaDebit => PaymentSourceType::SepaDebit,
            MethodArg::Ideal => PaymentSourceType::Ideal,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ErrorKindArg {
    PaymentProcessing,
    CredentialValidation,
    Redemption,
}

impl From<ErrorKindArg> for PaymentErrorKind {
    fn from(kind: ErrorKindArg) -> Self {
        match kind {
            ErrorKindArg::PaymentProcessing => PaymentErrorKind::PaymentProcessing,
            ErrorKindArg::CredentialValidation => PaymentErrorKind::CredentialValidation,
            ErrorKindArg::Redemption => PaymentErrorKind::Redemption,
        }
    }
}

/// Collaborators wired for one CLI invocation
struct Backend {
    coordinator: OneTimePaymentCoordinator,
    store: Arc<InMemoryPaymentStore>,
}

fn coordinator_config(settings: &Settings) -> CoordinatorConfig {
    CoordinatorConfig {
        locale: settings.donations.locale.clone(),
        redemption_timeout: settings.donations.redemption_timeout(),
        available_payment_methods: settings.donations.available_payment_methods.clone(),
    }
}

fn backend(settings: &Settings, script: Option<RedemptionScript>) -> Backend {
    let store = Arc::new(InMemoryPaymentStore::new());
    let queue = match script {
        Some(script) => MockJobQueue::simulating(Arc::clone(&store), script),
        None => MockJobQueue::recording(Arc::clone(&store)),
    };

    let coordinator = OneTimePaymentCoordinator::new(
        coordinator_config(settings),
        store.clone(),
        Arc::new(queue),
        Arc::new(MockDonationsService::with_configuration(demo_configuration())),
        Arc::new(InMemoryRecipientStore::demo()),
    );

    Backend { coordinator, store }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    donations_logging::init(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn });

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load_or_default(),
    }
    .context("loading settings")?;

    match cli.command {
        Commands::Boosts { currency } => {
            boosts(&settings, currency).await?;
        }
        Commands::Badge => {
            badge(&settings).await?;
        }
        Commands::Minimums => {
            minimums(&settings).await?;
        }
        Commands::Verify { recipient } => {
            verify(&settings, RecipientId(recipient)).await?;
        }
        Commands::Redeem {
            method,
            recipient,
            amount,
            currency,
            delay_secs,
            fail_with,
            never_complete,
        } => {
            let delay = Duration::from_secs(delay_secs);
            let script = if never_complete {
                RedemptionScript::stall()
            } else if let Some(kind) = fail_with {
                RedemptionScript::fail_after(delay, PaymentErrorCode::new(kind.into(), None))
            } else {
                RedemptionScript::redeem_after(delay)
            };
            let amount = FiatMoney::new(amount, Currency::new(currency));
            redeem(&settings, method.into(), recipient.map(RecipientId), amount, script).await?;
        }
        Commands::Page { scroll } => {
            page(&settings, scroll).await?;
        }
    }

    Ok(())
}

// ============================================================================
// Configuration
// ============================================================================

async fn boosts(settings: &Settings, currency: Option<String>) -> Result<()> {
    let backend = backend(settings, None);
    let boosts = backend.coordinator.get_boosts().await?;
    let wanted = currency.map(Currency::new);

    for (currency, amounts) in boosts {
        if wanted.as_ref().is_some_and(|w| *w != currency) {
            continue;
        }
        let amounts: Vec<String> = amounts.iter().map(|b| b.price.to_string()).collect();
        println!("{}: {}", currency, amounts.join(", "));
    }
    Ok(())
}

async fn badge(settings: &Settings) -> Result<()> {
    let backend = backend(settings, None);
    let badge = backend.coordinator.get_boost_badge().await?;

    println!("Badge: {} ({})", badge.name, badge.id);
    if !badge.description.is_empty() {
        println!("{}", badge.description);
    }
    println!("Duration: {} days", badge.duration_secs / 86_400);
    Ok(())
}

async fn minimums(settings: &Settings) -> Result<()> {
    let backend = backend(settings, None);
    for (currency, minimum) in backend.coordinator.get_minimum_donation_amounts().await? {
        println!("{}: {}", currency, minimum);
    }
    Ok(())
}

// ============================================================================
// Gifts and redemption
// ============================================================================

async fn verify(settings: &Settings, recipient: RecipientId) -> Result<()> {
    let backend = backend(settings, None);
    match backend.coordinator.verify_recipient_can_receive_gift(recipient).await {
        Ok(()) => println!("{} can receive a gift", recipient),
        Err(e) => println!("{} cannot receive a gift: {}", recipient, e),
    }
    Ok(())
}

async fn redeem(
    settings: &Settings,
    method: PaymentSourceType,
    recipient: Option<RecipientId>,
    amount: FiatMoney,
    script: RedemptionScript,
) -> Result<()> {
    let backend = backend(settings, Some(script));

    let payment = match recipient {
        Some(recipient) => {
            backend.coordinator.verify_recipient_can_receive_gift(recipient).await?;
            InAppPayment::pending(PaymentId(1), InAppPaymentType::OneTimeGift, method, amount)
                .with_recipient(recipient)
        }
        None => {
            InAppPayment::pending(PaymentId(1), InAppPaymentType::OneTimeDonation, method, amount)
        }
    };
    backend.store.insert(payment.clone()).await?;

    info!("Submitting {} via {}", payment.amount, method);
    let payment_intent_id = format!("pi_demo_{}", payment.id.0);

    match backend.coordinator.await_redemption(payment, &payment_intent_id).await {
        Ok(()) => println!("Donation redeemed"),
        Err(e @ DonationError::RedemptionPending { .. }) => {
            println!("Donation is still processing, check back later ({})", e)
        }
        Err(e @ DonationError::RedemptionTimeout { .. }) => {
            println!("Timed out waiting for redemption, try again ({})", e)
        }
        Err(e) => println!("Donation failed: {}", e),
    }

    if let Some(stored) = backend.store.get(PaymentId(1)).await? {
        println!(
            "Final state: {:?}, redemption: {:?}",
            stored.state,
            stored.redemption.map(|r| r.stage)
        );
    }
    Ok(())
}

// ============================================================================
// Presentation
// ============================================================================

async fn page(settings: &Settings, scroll: f32) -> Result<()> {
    let backend = backend(settings, None);
    let boosts = backend.coordinator.get_boosts().await?;

    let scaffold = SettingsScaffold::new("Donate")
        .navigation(Navigation::Back)
        .action(AppBarAction::new("help", "Help"))
        .theme(settings.ui.theme, false);

    let mut state = TopAppBarState::new();
    state.on_scroll(scroll);

    let frame = scaffold.render(&state, |_| {
        boosts
            .iter()
            .map(|(currency, amounts)| format!("{}: {} amounts", currency, amounts.len()))
            .collect::<Vec<_>>()
    });

    println!("{}", serde_json::to_string_pretty(&frame)?);
    Ok(())
}
