//! The currencies the tracker can display amounts in, and the globally
//! selected currency preference.
//!
//! The preference affects display formatting only. It is not persisted
//! against the user's identity and carries no invariants of its own.

use numfmt::{Formatter, Precision};
use serde::{Deserialize, Serialize};

/// A currency the tracker can format amounts in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// US Dollar.
    #[default]
    Usd,
    /// Euro.
    Eur,
    /// British Pound.
    Gbp,
    /// Japanese Yen.
    Jpy,
    /// Indian Rupee.
    Inr,
    /// Canadian Dollar.
    Cad,
    /// Australian Dollar.
    Aud,
    /// Swiss Franc.
    Chf,
    /// Nigerian Naira.
    Ngn,
}

impl Currency {
    /// Every supported currency, in menu order.
    pub const ALL: [Currency; 9] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Inr,
        Currency::Cad,
        Currency::Aud,
        Currency::Chf,
        Currency::Ngn,
    ];

    /// The ISO 4217 code, e.g. "USD".
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Inr => "INR",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Chf => "CHF",
            Currency::Ngn => "NGN",
        }
    }

    /// The symbol amounts are prefixed with, e.g. "$".
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
            Currency::Inr => "₹",
            Currency::Cad => "C$",
            Currency::Aud => "A$",
            Currency::Chf => "Fr",
            Currency::Ngn => "₦",
        }
    }

    /// The human-readable name shown in the currency menu.
    pub fn name(&self) -> &'static str {
        match self {
            Currency::Usd => "US Dollar",
            Currency::Eur => "Euro",
            Currency::Gbp => "British Pound",
            Currency::Jpy => "Japanese Yen",
            Currency::Inr => "Indian Rupee",
            Currency::Cad => "Canadian Dollar",
            Currency::Aud => "Australian Dollar",
            Currency::Chf => "Swiss Franc",
            Currency::Ngn => "Nigerian Naira",
        }
    }
}

/// The globally selected display currency.
///
/// Owned by the application root and passed down to views, the same way the
/// session holder is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CurrencyPreference {
    selected: Currency,
}

impl CurrencyPreference {
    /// Create a preference with the default currency (US Dollar).
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently selected currency.
    pub fn selected(&self) -> Currency {
        self.selected
    }

    /// Change the selected currency.
    pub fn select(&mut self, currency: Currency) {
        self.selected = currency;
    }

    /// Format `amount` with the selected currency's symbol and two decimal
    /// places, e.g. `$1,234.50`. Negative amounts place the sign before the
    /// symbol. Amounts are rounded to the nearest cent; sub-cent magnitudes
    /// render as zero.
    pub fn format_amount(&self, amount: f64) -> String {
        let symbol = self.selected.symbol();

        // Rounding first keeps numfmt away from the scientific notation it
        // uses for tiny magnitudes.
        let amount = (amount * 100.0).round() / 100.0;

        if amount == 0.0 {
            // Zero is hardcoded because numfmt renders it as a bare "0".
            return format!("{symbol}0.00");
        }

        let prefix = if amount < 0.0 {
            format!("-{symbol}")
        } else {
            symbol.to_string()
        };

        let formatter = Formatter::currency(&prefix)
            .unwrap()
            .precision(Precision::Decimals(2));

        let mut formatted = formatter.fmt_string(amount.abs());

        // numfmt omits the final trailing zero ("12.30" renders as "12.3"),
        // so it must be added back.
        match formatted.rfind('.') {
            Some(dot) if formatted.len() - dot == 2 => formatted.push('0'),
            Some(_) => {}
            None => formatted.push_str(".00"),
        }

        formatted
    }
}

#[cfg(test)]
mod currency_tests {
    use super::{Currency, CurrencyPreference};

    #[test]
    fn default_currency_is_us_dollar() {
        let preference = CurrencyPreference::new();

        assert_eq!(preference.selected(), Currency::Usd);
    }

    #[test]
    fn all_lists_nine_currencies_without_duplicates() {
        for (index, currency) in Currency::ALL.iter().enumerate() {
            for other in &Currency::ALL[index + 1..] {
                assert_ne!(currency.code(), other.code());
            }
        }

        assert_eq!(Currency::ALL.len(), 9);
    }

    #[test]
    fn format_amount_uses_the_selected_symbol() {
        let mut preference = CurrencyPreference::new();
        preference.select(Currency::Eur);

        assert_eq!(preference.format_amount(45.67), "€45.67");
    }

    #[test]
    fn format_amount_pads_to_two_decimals() {
        let preference = CurrencyPreference::new();

        assert_eq!(preference.format_amount(12.3), "$12.30");
        assert_eq!(preference.format_amount(2500.0), "$2,500.00");
    }

    #[test]
    fn format_amount_handles_zero_and_negatives() {
        let preference = CurrencyPreference::new();

        assert_eq!(preference.format_amount(0.0), "$0.00");
        assert_eq!(preference.format_amount(-120.0), "-$120.00");
    }

    #[test]
    fn format_amount_rounds_sub_cent_magnitudes_to_zero() {
        let preference = CurrencyPreference::new();

        assert_eq!(preference.format_amount(0.001), "$0.00");
        assert_eq!(preference.format_amount(-0.004), "$0.00");
        assert_eq!(preference.format_amount(0.005), "$0.01");
    }
}
