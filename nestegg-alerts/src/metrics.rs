//! Derived numbers for goals and budgets
//!
//! Pure functions over raw record values. No I/O, no clock access: callers
//! pass `now` explicitly.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Goals due within this many days (inclusive) are "nearing deadline"
pub const DEADLINE_WINDOW_DAYS: i64 = 30;

/// Lower bound (inclusive) of the near-limit budget band, in percent
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// Usage at or above this percentage counts as exceeded
pub const EXCEEDED_PERCENT: f64 = 100.0;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Goal progress as a percentage of the target, capped at 100
///
/// A zero target yields 0 instead of dividing by zero. Negative progress is
/// passed through unchanged.
pub fn goal_progress_percent(current: f64, target: f64) -> f64 {
    if target == 0.0 {
        return 0.0;
    }
    (current / target * 100.0).min(100.0)
}

/// Whole days left until `target_date` (taken at midnight UTC), rounded up
///
/// Never negative: a date in the past yields 0.
pub fn days_remaining(target_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let target = target_date.and_time(NaiveTime::MIN).and_utc();
    let millis = (target - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Share of the budget limit already spent, in percent
///
/// `limit` is positive by construction (budgets are created with a required
/// positive limit), so there is no zero guard.
pub fn budget_usage_percent(spent: f64, limit: f64) -> f64 {
    spent / limit * 100.0
}

/// Which alert band a budget usage falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetBand {
    /// Below the near-limit threshold
    Comfortable,
    /// `[80, 100)`
    NearLimit,
    /// `100` and above
    Exceeded,
}

/// Classify a usage percentage; the bands never overlap
pub fn budget_band(usage_percent: f64) -> BudgetBand {
    if usage_percent >= EXCEEDED_PERCENT {
        BudgetBand::Exceeded
    } else if usage_percent >= NEAR_LIMIT_PERCENT {
        BudgetBand::NearLimit
    } else {
        BudgetBand::Comfortable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_progress_is_clamped_to_100() {
        assert_eq!(goal_progress_percent(150.0, 100.0), 100.0);
        assert_eq!(goal_progress_percent(100.0, 100.0), 100.0);
    }

    #[test]
    fn test_progress_zero_target_guard() {
        assert_eq!(goal_progress_percent(50.0, 0.0), 0.0);
    }

    #[test]
    fn test_progress_partial_and_negative() {
        assert_eq!(goal_progress_percent(25.0, 200.0), 12.5);
        assert_eq!(goal_progress_percent(-10.0, 100.0), -10.0);
    }

    #[test]
    fn test_days_remaining_past_date_is_zero() {
        let now = noon(2024, 6, 15);
        let past = now.date_naive() - Duration::days(10);
        assert_eq!(days_remaining(past, now), 0);
    }

    #[test]
    fn test_days_remaining_today_is_zero() {
        let now = noon(2024, 6, 15);
        assert_eq!(days_remaining(now.date_naive(), now), 0);
    }

    #[test]
    fn test_days_remaining_rounds_partial_days_up() {
        // 4.5 days until midnight of the 20th
        let now = noon(2024, 6, 15);
        let target = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        assert_eq!(days_remaining(target, now), 5);
    }

    #[test]
    fn test_days_remaining_exact_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let target = NaiveDate::from_ymd_opt(2024, 6, 18).unwrap();
        assert_eq!(days_remaining(target, now), 3);
    }

    #[test]
    fn test_budget_usage_percent() {
        assert_eq!(budget_usage_percent(50.0, 200.0), 25.0);
        assert_eq!(budget_usage_percent(600.0, 500.0), 120.0);
    }

    #[test]
    fn test_budget_band_boundaries() {
        assert_eq!(budget_band(79.99), BudgetBand::Comfortable);
        assert_eq!(budget_band(80.0), BudgetBand::NearLimit);
        assert_eq!(budget_band(99.99), BudgetBand::NearLimit);
        assert_eq!(budget_band(100.0), BudgetBand::Exceeded);
        assert_eq!(budget_band(250.0), BudgetBand::Exceeded);
    }
}
