//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Always round to the stored minor-unit scale
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use spendflow_shared::types::money::MINOR_UNIT_SCALE;
use spendflow_shared::types::{CurrencyCode, Money};

use crate::workflow::error::WorkflowError;

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
/// Returns `None` if the product overflows `Decimal`.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
    amount
        .checked_mul(rate)
        .map(|converted| {
            converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
        })
}

/// Converts `money` into `company_currency`.
///
/// `rate` is units of company currency per unit of `money.currency`. It is
/// ignored, and treated as 1, when both currencies are the same.
///
/// # Returns
/// The converted amount and the rate actually applied.
///
/// # Errors
///
/// Returns `WorkflowError::InvalidAmount` if the amount is negative, the
/// rate is not strictly positive, or the converted amount is out of range.
pub fn to_company_currency(
    money: Money,
    company_currency: CurrencyCode,
    rate: Decimal,
) -> Result<(Money, Decimal), WorkflowError> {
    if money.is_negative() {
        return Err(WorkflowError::InvalidAmount(format!(
            "amount {} must not be negative",
            money.amount
        )));
    }

    let applied = if money.currency == company_currency {
        Decimal::ONE
    } else if rate > Decimal::ZERO {
        rate
    } else {
        return Err(WorkflowError::InvalidAmount(format!(
            "exchange rate {rate} from {} to {company_currency} must be positive",
            money.currency
        )));
    };

    let converted = convert_amount(money.amount, applied, MINOR_UNIT_SCALE)
        .ok_or_else(|| WorkflowError::InvalidAmount("amount is out of range".into()))?;
    Ok((Money::new(converted, company_currency), applied))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[test]
    fn test_convert_amount() {
        // 100 USD * 15000 = 1,500,000 IDR
        let result = convert_amount(dec!(100), dec!(15000), 0);
        assert_eq!(result, Some(dec!(1500000)));
    }

    #[test]
    fn test_convert_with_rounding() {
        // 100.50 * 15000.5 = 1,507,550.25 -> 1,507,550
        let result = convert_amount(dec!(100.50), dec!(15000.5), 0);
        assert_eq!(result, Some(dec!(1507550)));
    }

    #[test]
    fn test_bankers_rounding() {
        assert_eq!(convert_amount(dec!(1), dec!(2.5), 0), Some(dec!(2)));
        assert_eq!(convert_amount(dec!(1), dec!(3.5), 0), Some(dec!(4)));
    }

    #[test]
    fn test_convert_overflow_is_none() {
        assert_eq!(convert_amount(Decimal::MAX, dec!(2), 2), None);
    }

    #[test]
    fn test_overflowing_conversion_rejected() {
        let huge = Money::new(dec!(10000000000000000000000000000), code("EUR"));
        let err = to_company_currency(huge, code("USD"), dec!(1000)).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidAmount(_)));
    }

    #[test]
    fn test_same_currency_ignores_rate() {
        let money = Money::new(dec!(42.10), code("USD"));
        let (converted, rate) = to_company_currency(money, code("usd"), dec!(0)).unwrap();
        assert_eq!(converted.amount, dec!(42.10));
        assert_eq!(rate, Decimal::ONE);
    }

    #[test]
    fn test_foreign_currency_converted() {
        let money = Money::new(dec!(12.50), code("EUR"));
        let (converted, rate) = to_company_currency(money, code("INR"), dec!(90.123456)).unwrap();
        // 12.50 * 90.123456 = 1126.5432
        assert_eq!(converted.amount, dec!(1126.54));
        assert_eq!(converted.currency, code("INR"));
        assert_eq!(rate, dec!(90.123456));
    }

    #[test]
    fn test_invalid_inputs() {
        let eur = Money::new(dec!(10), code("EUR"));
        assert!(to_company_currency(eur, code("USD"), dec!(0)).is_err());
        assert!(to_company_currency(eur, code("USD"), dec!(-1.2)).is_err());

        let negative = Money::new(dec!(-1), code("USD"));
        let err = to_company_currency(negative, code("USD"), Decimal::ONE).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AMOUNT");
    }
}
