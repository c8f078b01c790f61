//! Ledger primitives: line totals and rounding.
//!
//! All amounts are `Decimal`; rounding is half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::{ServiceError, ServiceResult};
use crate::models::{DocumentTotals, LineTotals};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round4(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Totals of one line. The net amount after discount is clamped at zero, so an
/// over-discounted line contributes nothing rather than a negative amount.
pub fn compute_line_totals(
    quantity: Decimal,
    unit_price_excl_tax: Decimal,
    tax_rate_percent: Decimal,
    discount: Decimal,
) -> LineTotals {
    let gross = quantity * unit_price_excl_tax - discount;
    let total_excl_tax = round2(gross.max(Decimal::ZERO));
    let total_tax = round2(total_excl_tax * tax_rate_percent / HUNDRED);
    LineTotals {
        total_excl_tax,
        total_tax,
        total_incl_tax: round2(total_excl_tax + total_tax),
    }
}

/// Unit price excluding tax from a tax-inclusive catalog price.
pub fn price_excl_tax(price_incl_tax: Decimal, tax_rate_percent: Decimal) -> Decimal {
    let divisor = Decimal::ONE + tax_rate_percent / HUNDRED;
    if divisor.is_zero() {
        return round2(price_incl_tax);
    }
    round2(price_incl_tax / divisor)
}

/// Sums line totals. The global discount is taken off the tax-inclusive total
/// only; it is not spread back over the lines.
pub fn sum_totals<'a>(
    lines: impl IntoIterator<Item = &'a LineTotals>,
    global_discount: Decimal,
) -> DocumentTotals {
    let (ht, tva) = lines
        .into_iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(ht, tva), line| {
            (ht + line.total_excl_tax, tva + line.total_tax)
        });
    DocumentTotals {
        total_excl_tax: round2(ht),
        total_tax: round2(tva),
        total_incl_tax: round2(ht + tva - global_discount),
    }
}

pub fn ensure_non_negative(field: &str, value: Decimal) -> ServiceResult<()> {
    if value < Decimal::ZERO {
        return Err(ServiceError::InvalidInput(format!(
            "{field} must not be negative (got {value})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::dec;

    #[test]
    fn test_line_totals_basic() {
        let totals = compute_line_totals(dec("3"), dec("100"), dec("20"), dec("0"));
        assert_eq!(totals.total_excl_tax, dec("300"));
        assert_eq!(totals.total_tax, dec("60"));
        assert_eq!(totals.total_incl_tax, dec("360"));
    }

    #[test]
    fn test_line_totals_round_half_away_from_zero() {
        // 1 x 10.125 -> 10.13 HT; 10.13 x 7% = 0.7091 -> 0.71
        let totals = compute_line_totals(dec("1"), dec("10.125"), dec("7"), dec("0"));
        assert_eq!(totals.total_excl_tax, dec("10.13"));
        assert_eq!(totals.total_tax, dec("0.71"));
        assert_eq!(totals.total_incl_tax, dec("10.84"));
    }

    #[test]
    fn test_over_discount_is_clamped_to_zero() {
        let totals = compute_line_totals(dec("2"), dec("50"), dec("20"), dec("150"));
        assert_eq!(totals, LineTotals::default());
    }

    #[test]
    fn test_price_excl_tax() {
        assert_eq!(price_excl_tax(dec("120"), dec("20")), dec("100"));
        assert_eq!(price_excl_tax(dec("99.99"), dec("20")), dec("83.33"));
        assert_eq!(price_excl_tax(dec("50"), dec("0")), dec("50"));
    }

    #[test]
    fn test_sum_totals_applies_global_discount_after_tax() {
        let lines = [
            compute_line_totals(dec("1"), dec("100"), dec("20"), dec("0")),
            compute_line_totals(dec("2"), dec("25"), dec("10"), dec("0")),
        ];
        let totals = sum_totals(&lines, dec("10"));
        assert_eq!(totals.total_excl_tax, dec("150"));
        assert_eq!(totals.total_tax, dec("25"));
        assert_eq!(totals.total_incl_tax, dec("165"));
    }

    #[test]
    fn test_ensure_non_negative() {
        assert!(ensure_non_negative("quantity", dec("0")).is_ok());
        assert!(matches!(
            ensure_non_negative("quantity", dec("-1")),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
