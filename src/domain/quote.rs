//! Stay pricing.
//!
//! Fees are applied in a fixed order and the backend recomputes the same
//! breakdown on its side, so the arithmetic here must not be reordered:
//!
//! 1. `subtotal    = nightly_rate * nights`
//! 2. `cleaning    = fixed fee`
//! 3. `service     = subtotal * service_fee_rate`
//! 4. `taxes       = (subtotal + cleaning + service) * tax_rate`
//! 5. `total       = subtotal + cleaning + service + taxes`
//!
//! All amounts are exact decimals; nothing is rounded, so the value shown
//! to the guest is the value submitted with the booking.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::property::Property;
use crate::error::ReservationError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Fee constants applied on top of the nightly subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub cleaning_fee: BigDecimal,
    pub service_fee_rate: BigDecimal,
    pub tax_rate: BigDecimal,
}

impl FeeSchedule {
    pub fn new(cleaning_fee: BigDecimal, service_fee_rate: BigDecimal, tax_rate: BigDecimal) -> Self {
        Self {
            cleaning_fee,
            service_fee_rate,
            tax_rate,
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::new(
            BigDecimal::new(5000.into(), 2),
            BigDecimal::new(10.into(), 2),
            BigDecimal::new(18.into(), 2),
        )
    }
}

/// Priced breakdown for a prospective stay. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub property_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: u32,
    pub nights: u32,
    pub currency: String,
    pub nightly_rate: BigDecimal,
    pub subtotal: BigDecimal,
    pub cleaning_fee: BigDecimal,
    pub service_fee: BigDecimal,
    pub taxes: BigDecimal,
    pub total: BigDecimal,
}

/// Whole nights between two dates, rounded up.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> Result<u32, ReservationError> {
    let seconds = check_out.signed_duration_since(check_in).num_seconds();
    if seconds <= 0 {
        return Err(ReservationError::InvalidDateRange { check_in, check_out });
    }

    let nights = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u32::try_from(nights).map_err(|_| ReservationError::InvalidDateRange { check_in, check_out })
}

/// Local checks that must pass before any backend call is made.
pub fn validate_stay(
    check_in: NaiveDate,
    check_out: NaiveDate,
    guest_count: u32,
) -> Result<u32, ReservationError> {
    let nights = nights_between(check_in, check_out)?;
    if guest_count == 0 {
        return Err(ReservationError::InvalidGuestCount {
            requested: guest_count,
            max: None,
        });
    }
    Ok(nights)
}

pub fn compute_quote(
    property: &Property,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guest_count: u32,
    fees: &FeeSchedule,
) -> Result<Quote, ReservationError> {
    let nights = validate_stay(check_in, check_out, guest_count)?;

    if let Some(max) = property.max_guests {
        if guest_count > max {
            return Err(ReservationError::InvalidGuestCount {
                requested: guest_count,
                max: Some(max),
            });
        }
    }

    let zero = BigDecimal::from(0);
    if property.nightly_rate < zero {
        return Err(ReservationError::PropertyUnavailable(format!(
            "unit {} has a negative nightly rate",
            property.id
        )));
    }

    let subtotal = &property.nightly_rate * BigDecimal::from(nights);
    let cleaning_fee = fees.cleaning_fee.clone();
    let service_fee = &subtotal * &fees.service_fee_rate;
    let taxable = &subtotal + &cleaning_fee + &service_fee;
    let taxes = &taxable * &fees.tax_rate;
    let total = &taxable + &taxes;

    Ok(Quote {
        property_id: property.id.clone(),
        check_in,
        check_out,
        guest_count,
        nights,
        currency: property.currency.clone(),
        nightly_rate: property.nightly_rate.clone(),
        subtotal,
        cleaning_fee,
        service_fee,
        taxes,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(raw: &str) -> BigDecimal {
        BigDecimal::from_str(raw).unwrap()
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn property(rate: &str) -> Property {
        Property {
            id: "unit-1".to_string(),
            title: "Casa Barranco".to_string(),
            address: None,
            nightly_rate: dec(rate),
            currency: "PEN".to_string(),
            max_guests: Some(4),
        }
    }

    #[test]
    fn test_default_fee_schedule() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.cleaning_fee, dec("50.00"));
        assert_eq!(fees.service_fee_rate, dec("0.10"));
        assert_eq!(fees.tax_rate, dec("0.18"));
    }

    #[test]
    fn test_week_long_stay_breakdown() {
        let quote = compute_quote(
            &property("100.00"),
            date("2026-03-01"),
            date("2026-03-08"),
            2,
            &FeeSchedule::default(),
        )
        .unwrap();

        assert_eq!(quote.nights, 7);
        assert_eq!(quote.subtotal, dec("700.00"));
        assert_eq!(quote.cleaning_fee, dec("50.00"));
        assert_eq!(quote.service_fee, dec("70.00"));
        assert_eq!(quote.taxes, dec("147.60"));
        assert_eq!(quote.total, dec("967.60"));
    }

    #[test]
    fn test_total_is_exact_sum_of_components() {
        let fees = FeeSchedule::default();
        for (rate, nights) in [("99.99", 1), ("133.37", 3), ("0.01", 30), ("1234.56", 11)] {
            let check_in = date("2026-01-01");
            let check_out = check_in + chrono::Duration::days(nights);
            let quote = compute_quote(&property(rate), check_in, check_out, 1, &fees).unwrap();

            let sum = &quote.subtotal + &quote.cleaning_fee + &quote.service_fee + &quote.taxes;
            assert_eq!(quote.total, sum);
            assert_eq!(quote.service_fee, &quote.subtotal * dec("0.10"));
            assert_eq!(
                quote.taxes,
                (&quote.subtotal + &quote.cleaning_fee + &quote.service_fee) * dec("0.18")
            );
        }
    }

    #[test]
    fn test_tax_is_charged_on_fees_too() {
        let fees = FeeSchedule::new(dec("0"), dec("0.10"), dec("0.18"));
        let quote =
            compute_quote(&property("100"), date("2026-05-01"), date("2026-05-02"), 1, &fees).unwrap();

        // (100 + 0 + 10) * 0.18
        assert_eq!(quote.taxes, dec("19.80"));
        assert_eq!(quote.total, dec("129.80"));
    }

    #[test]
    fn test_same_day_checkout_is_rejected() {
        let result = compute_quote(
            &property("100"),
            date("2026-03-01"),
            date("2026-03-01"),
            1,
            &FeeSchedule::default(),
        );
        assert!(matches!(result, Err(ReservationError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_checkout_before_checkin_is_rejected() {
        assert!(matches!(
            nights_between(date("2026-03-05"), date("2026-03-01")),
            Err(ReservationError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_guest_count_bounds() {
        let fees = FeeSchedule::default();
        let zero = compute_quote(&property("100"), date("2026-03-01"), date("2026-03-02"), 0, &fees);
        assert!(matches!(zero, Err(ReservationError::InvalidGuestCount { max: None, .. })));

        let over = compute_quote(&property("100"), date("2026-03-01"), date("2026-03-02"), 5, &fees);
        assert!(matches!(
            over,
            Err(ReservationError::InvalidGuestCount { requested: 5, max: Some(4) })
        ));
    }

    #[test]
    fn test_quote_is_idempotent() {
        let fees = FeeSchedule::default();
        let p = property("87.25");
        let a = compute_quote(&p, date("2026-07-10"), date("2026-07-14"), 3, &fees).unwrap();
        let b = compute_quote(&p, date("2026-07-10"), date("2026-07-14"), 3, &fees).unwrap();
        assert_eq!(a, b);
    }
}
