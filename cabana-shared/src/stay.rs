use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Price breakdown for a requested stay.
///
/// Both the reservation form (client-side estimate) and the lifecycle manager
/// (authoritative price) derive this through [`compute_stay`], so the number a
/// guest sees and the number the server charges come from the same arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayQuote {
    pub nights: u32,
    pub total_centavos: i64,
}

/// Pure stay pricing: calendar-night count times the nightly rate.
///
/// Returns `None` when `check_out <= check_in` — a same-day checkout is not a
/// bookable stay. No rounding beyond the currency minor unit: rates are
/// already integer centavos.
pub fn compute_stay(
    check_in: NaiveDate,
    check_out: NaiveDate,
    nightly_rate_centavos: i64,
) -> Option<StayQuote> {
    let nights = (check_out - check_in).num_days();
    if nights < 1 {
        return None;
    }

    Some(StayQuote {
        nights: nights as u32,
        total_centavos: nights * nightly_rate_centavos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_two_night_stay() {
        let quote = compute_stay(d(2025, 8, 1), d(2025, 8, 3), 100_000).unwrap();
        assert_eq!(quote.nights, 2);
        assert_eq!(quote.total_centavos, 200_000);
    }

    #[test]
    fn test_single_night_stay() {
        let quote = compute_stay(d(2025, 8, 1), d(2025, 8, 2), 150_050).unwrap();
        assert_eq!(quote.nights, 1);
        assert_eq!(quote.total_centavos, 150_050);
    }

    #[test]
    fn test_no_quote_for_same_day_or_inverted_dates() {
        assert!(compute_stay(d(2025, 8, 1), d(2025, 8, 1), 100_000).is_none());
        assert!(compute_stay(d(2025, 8, 3), d(2025, 8, 1), 100_000).is_none());
    }

    #[test]
    fn test_deterministic_across_calls() {
        let first = compute_stay(d(2025, 12, 30), d(2026, 1, 2), 99_900);
        let second = compute_stay(d(2025, 12, 30), d(2026, 1, 2), 99_900);
        assert_eq!(first, second);
        assert_eq!(first.unwrap().nights, 3);
    }
}
