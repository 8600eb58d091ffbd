//! Donation configuration payload and the domain shapes derived from it
//!
//! The configuration service returns one payload per locale. Amounts are
//! expressed in minor units of their currency (cents for USD, whole yen for JPY).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PaymentSourceType;

/// Configuration level that holds one-time (boost) amounts and the boost badge
pub const BOOST_LEVEL: u32 = 1;

/// ISO 4217 currency code, always upper-case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().to_ascii_uppercase())
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Number of decimal digits in one major unit (ISO 4217 exponent)
    pub fn minor_digits(&self) -> u32 {
        match self.0.as_str() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "MGA" | "PYG"
            | "RWF" | "UGX" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount of fiat money in minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatMoney {
    pub amount_minor: u64,
    pub currency: Currency,
}

impl FiatMoney {
    pub fn new(amount_minor: u64, currency: Currency) -> Self {
        Self { amount_minor, currency }
    }
}

impl fmt::Display for FiatMoney {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.currency.minor_digits();
        if digits == 0 {
            return write!(f, "{} {}", self.amount_minor, self.currency);
        }
        let scale = 10u64.pow(digits);
        write!(
            f,
            "{}.{:0width$} {}",
            self.amount_minor / scale,
            self.amount_minor % scale,
            self.currency,
            width = digits as usize
        )
    }
}

/// One selectable one-time donation amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boost {
    pub price: FiatMoney,
}

/// Badge category as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Donor,
    #[default]
    Other,
}

/// Badge awarded for a donation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    #[serde(default)]
    pub category: BadgeCategory,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// How long the badge stays on the profile
    #[serde(default)]
    pub duration_secs: u64,
}

/// Per-currency section of the configuration payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyConfiguration {
    /// Minimum one-time amount, minor units
    pub minimum: u64,
    /// Preset one-time amounts keyed by level
    #[serde(default)]
    pub one_time: BTreeMap<u32, Vec<u64>>,
    /// Payment method codes accepted for this currency
    #[serde(default)]
    pub supported_payment_methods: Vec<String>,
}

impl CurrencyConfiguration {
    /// Whether any of the available methods can pay in this currency
    pub fn supports_any(&self, available: &[PaymentSourceType]) -> bool {
        available.iter().any(|method| {
            self.supported_payment_methods
                .iter()
                .any(|code| code.eq_ignore_ascii_case(method.method_code()))
        })
    }
}

/// Per-level section of the configuration payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfiguration {
    pub name: String,
    pub badge: Badge,
}

/// Versioned donation configuration payload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DonationsConfiguration {
    /// Keyed by lower-case currency code as sent by the service
    #[serde(default)]
    pub currencies: BTreeMap<String, CurrencyConfiguration>,
    #[serde(default)]
    pub levels: BTreeMap<u32, LevelConfiguration>,
}

impl DonationsConfiguration {
    /// Currencies payable with `available`, keyed by normalized code.
    ///
    /// Payload keys that differ only in case name the same currency. Among
    /// those, the key that sorts last (the lower-case one) wins.
    fn filtered_currencies<'a>(
        &'a self,
        available: &'a [PaymentSourceType],
    ) -> impl Iterator<Item = (Currency, &'a CurrencyConfiguration)> + 'a {
        self.currencies
            .iter()
            .filter(move |(_, config)| config.supports_any(available))
            .map(|(code, config)| (Currency::new(code), config))
    }

    /// Boost amounts per currency, limited to currencies payable with `available`
    pub fn boost_amounts(&self, available: &[PaymentSourceType]) -> BTreeMap<Currency, Vec<Boost>> {
        self.filtered_currencies(available)
            .map(|(currency, config)| {
                let boosts = config
                    .one_time
                    .get(&BOOST_LEVEL)
                    .map(|amounts| {
                        amounts
                            .iter()
                            .map(|amount| Boost {
                                price: FiatMoney::new(*amount, currency.clone()),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                (currency, boosts)
            })
            .collect()
    }

    /// Badges configured for the boost level
    pub fn boost_badges(&self) -> Vec<Badge> {
        self.levels
            .iter()
            .filter(|(level, _)| **level == BOOST_LEVEL)
            .map(|(_, config)| config.badge.clone())
            .collect()
    }

    /// Minimum one-time amount per currency, limited to currencies payable with `available`
    pub fn minimum_donation_amounts(
        &self,
        available: &[PaymentSourceType],
    ) -> BTreeMap<Currency, FiatMoney> {
        self.filtered_currencies(available)
            .map(|(currency, config)| {
                let minimum = FiatMoney::new(config.minimum, currency.clone());
                (currency, minimum)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "currencies": {
            "usd": {
                "minimum": 300,
                "oneTime": { "1": [300, 500, 1000], "100": [2500] },
                "supportedPaymentMethods": ["CARD", "PAYPAL"]
            },
            "eur": {
                "minimum": 250,
                "oneTime": { "1": [250, 1000] },
                "supportedPaymentMethods": ["CARD", "SEPA_DEBIT", "IDEAL"]
            },
            "brl": {
                "minimum": 1500,
                "oneTime": {},
                "supportedPaymentMethods": ["PAYPAL"]
            }
        },
        "levels": {
            "1": {
                "name": "Boost",
                "badge": {
                    "id": "BOOST",
                    "category": "donor",
                    "name": "Boost",
                    "durationSecs": 2592000
                }
            },
            "100": { "name": "Gift", "badge": { "id": "GIFT", "name": "Gift" } }
        }
    }"#;

    fn config() -> DonationsConfiguration {
        serde_json::from_str(PAYLOAD).unwrap()
    }

    #[test]
    fn test_currency_is_upper_case() {
        assert_eq!(Currency::new("eur").code(), "EUR");
        assert_eq!(Currency::new("eur"), Currency::new("EUR"));
    }

    #[test]
    fn test_fiat_money_display() {
        let money = FiatMoney::new(1050, Currency::new("usd"));
        assert_eq!(money.to_string(), "10.50 USD");
    }

    #[test]
    fn test_fiat_money_display_zero_decimal_currency() {
        assert_eq!(Currency::new("jpy").minor_digits(), 0);
        assert_eq!(FiatMoney::new(500, Currency::new("jpy")).to_string(), "500 JPY");
        assert_eq!(FiatMoney::new(400, Currency::new("KRW")).to_string(), "400 KRW");
    }

    #[test]
    fn test_fiat_money_display_three_decimal_currency() {
        assert_eq!(FiatMoney::new(1005, Currency::new("kwd")).to_string(), "1.005 KWD");
    }

    #[test]
    fn test_boost_amounts_use_boost_level() {
        let boosts = config().boost_amounts(&PaymentSourceType::ALL);

        let usd = &boosts[&Currency::new("usd")];
        let amounts: Vec<u64> = usd.iter().map(|b| b.price.amount_minor).collect();
        assert_eq!(amounts, vec![300, 500, 1000]);
        assert!(usd.iter().all(|b| b.price.currency == Currency::new("USD")));
    }

    #[test]
    fn test_boost_amounts_missing_level_is_empty() {
        let boosts = config().boost_amounts(&PaymentSourceType::ALL);
        assert!(boosts[&Currency::new("brl")].is_empty());
    }

    #[test]
    fn test_boost_badges_only_boost_level() {
        let badges = config().boost_badges();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].id, "BOOST");
        assert_eq!(badges[0].category, BadgeCategory::Donor);
        assert_eq!(badges[0].duration_secs, 2_592_000);
    }

    #[test]
    fn test_case_variant_keys_merge_into_one_currency() {
        let mut config = config();
        let mut upper = config.currencies["usd"].clone();
        upper.minimum = 999;
        config.currencies.insert("USD".to_string(), upper);

        let minimums = config.minimum_donation_amounts(&PaymentSourceType::ALL);
        assert_eq!(minimums.len(), 3);
        assert_eq!(minimums[&Currency::new("usd")].amount_minor, 300);
    }

    #[test]
    fn test_minimum_amounts() {
        let minimums = config().minimum_donation_amounts(&PaymentSourceType::ALL);
        assert_eq!(minimums.len(), 3);
        assert_eq!(minimums[&Currency::new("eur")].amount_minor, 250);
    }

    #[test]
    fn test_availability_filters_currencies() {
        let only_bank = [PaymentSourceType::SepaDebit];
        let minimums = config().minimum_donation_amounts(&only_bank);
        assert_eq!(minimums.keys().collect::<Vec<_>>(), vec![&Currency::new("EUR")]);

        let google_pay = [PaymentSourceType::GooglePay];
        let boosts = config().boost_amounts(&google_pay);
        assert!(boosts.contains_key(&Currency::new("USD")));
        assert!(boosts.contains_key(&Currency::new("EUR")));
        assert!(!boosts.contains_key(&Currency::new("BRL")));
    }

    #[test]
    fn test_no_available_methods_yields_nothing() {
        assert!(config().boost_amounts(&[]).is_empty());
    }
}
