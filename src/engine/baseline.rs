// Baseline statistics for a route: median of daily minimums, trailing
// rolling mean, and departure-weekday mean/stddev.
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::BTreeMap;

/// Window for the median-of-daily-minimums baseline.
pub const BASELINE_WINDOW_DAYS: i64 = 90;
/// Day buckets feeding the trailing rolling mean.
pub const ROLLING_WINDOW_DAYS: usize = 30;
/// Window for the departure-weekday statistics.
pub const WEEKDAY_WINDOW_DAYS: i64 = 90;
/// Aggregates older than this are pruned.
pub const AGG_RETENTION_DAYS: i64 = 60;

/// Collapse raw observations into one minimum price per calendar day,
/// ordered by day. A single expensive search result cannot skew the baseline
/// upward when a cheaper same-day offer exists.
pub fn daily_minimums(observations: &[(NaiveDate, Decimal)]) -> Vec<(NaiveDate, Decimal)> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for &(day, price) in observations {
        by_day
            .entry(day)
            .and_modify(|min| {
                if price < *min {
                    *min = price;
                }
            })
            .or_insert(price);
    }
    by_day.into_iter().collect()
}

/// Median of per-day minimum prices. Zero means "no baseline available".
pub fn median_of_daily_minimums(day_minimums: &[(NaiveDate, Decimal)]) -> Decimal {
    let mut prices: Vec<Decimal> = day_minimums.iter().map(|&(_, price)| price).collect();
    if prices.is_empty() {
        return Decimal::ZERO;
    }
    prices.sort();
    let mid = prices.len() / 2;
    if prices.len() % 2 == 0 {
        (prices[mid - 1] + prices[mid]) / Decimal::TWO
    } else {
        prices[mid]
    }
}

/// Trailing mean over the most recent day buckets, at most
/// [`ROLLING_WINDOW_DAYS`] of them. `None` when there is no history.
pub fn rolling_mean(day_minimums: &[(NaiveDate, Decimal)]) -> Option<Decimal> {
    if day_minimums.is_empty() {
        return None;
    }
    let mut days = day_minimums.to_vec();
    days.sort_by_key(|&(day, _)| day);
    let tail: Vec<Decimal> = days
        .iter()
        .rev()
        .take(ROLLING_WINDOW_DAYS)
        .map(|&(_, price)| price)
        .collect();
    let sum: Decimal = tail.iter().copied().sum();
    Some(sum / Decimal::from(tail.len()))
}

pub fn mean(prices: &[Decimal]) -> Option<Decimal> {
    if prices.is_empty() {
        return None;
    }
    let sum: Decimal = prices.iter().copied().sum();
    Some(sum / Decimal::from(prices.len()))
}

/// Population standard deviation (divisor n, not n-1).
pub fn population_std_dev(prices: &[Decimal]) -> Option<Decimal> {
    let mean = mean(prices)?;
    let variance: Decimal = prices
        .iter()
        .map(|price| (price - mean) * (price - mean))
        .sum::<Decimal>()
        / Decimal::from(prices.len());
    variance.sqrt()
}

/// Canonical weekday numbering: Monday = 0 through Sunday = 6. Both the
/// aggregation write path and the steal lookup path go through here.
pub fn weekday_index(day: NaiveDate) -> u32 {
    day.weekday().num_days_from_monday()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap() + chrono::Duration::days(offset)
    }

    #[test]
    fn daily_minimums_keep_cheapest_per_day() {
        let observations = vec![
            (day(-2), dec!(100)),
            (day(-2), dec!(150)),
            (day(-1), dec!(250)),
            (day(-1), dec!(200)),
            (day(0), dec!(300)),
            (day(0), dec!(400)),
        ];
        let minimums = daily_minimums(&observations);
        assert_eq!(
            minimums,
            vec![(day(-2), dec!(100)), (day(-1), dec!(200)), (day(0), dec!(300))]
        );
    }

    #[test]
    fn median_of_three_daily_minimums() {
        let observations = vec![
            (day(-2), dec!(100)),
            (day(-2), dec!(150)),
            (day(-1), dec!(200)),
            (day(-1), dec!(250)),
            (day(0), dec!(300)),
            (day(0), dec!(400)),
        ];
        let baseline = median_of_daily_minimums(&daily_minimums(&observations));
        assert_eq!(baseline, dec!(200));
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        let minimums = vec![(day(-1), dec!(100)), (day(0), dec!(300))];
        assert_eq!(median_of_daily_minimums(&minimums), dec!(200));
    }

    #[test]
    fn empty_history_means_no_baseline() {
        assert_eq!(median_of_daily_minimums(&[]), Decimal::ZERO);
        assert_eq!(rolling_mean(&[]), None);
    }

    #[test]
    fn rolling_mean_takes_most_recent_buckets_only() {
        // 40 day buckets at price 100, the newest 30 at price 200: only the
        // newest 30 may contribute.
        let mut minimums = Vec::new();
        for i in 0..40 {
            minimums.push((day(-70 + i), dec!(100)));
        }
        for i in 0..30 {
            minimums.push((day(-30 + i), dec!(200)));
        }
        assert_eq!(rolling_mean(&minimums), Some(dec!(200)));
    }

    #[test]
    fn rolling_mean_with_short_history_uses_what_exists() {
        let minimums = vec![(day(-1), dec!(100)), (day(0), dec!(300))];
        assert_eq!(rolling_mean(&minimums), Some(dec!(200)));
    }

    #[test]
    fn population_std_dev_matches_hand_computation() {
        let prices = vec![dec!(800), dec!(1000), dec!(1200)];
        let sd = population_std_dev(&prices).unwrap();
        // sqrt(80000/3) ≈ 163.299
        assert!((sd - dec!(163.299)).abs() < dec!(0.01), "std dev was {sd}");
    }

    #[test]
    fn baseline_recomputation_is_deterministic() {
        let observations = vec![
            (day(-2), dec!(120)),
            (day(-1), dec!(180)),
            (day(0), dec!(240)),
        ];
        let first = median_of_daily_minimums(&daily_minimums(&observations));
        let second = median_of_daily_minimums(&daily_minimums(&observations));
        assert_eq!(first, second);
        assert_eq!(rolling_mean(&observations), rolling_mean(&observations));
    }

    #[test]
    fn weekday_index_is_monday_based() {
        // 2024-01-03 is a Wednesday.
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(weekday_index(wednesday), 2);
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(weekday_index(monday), 0);
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(weekday_index(sunday), 6);
    }
}
