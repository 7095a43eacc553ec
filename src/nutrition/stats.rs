use serde::Serialize;

use crate::docs::DailyLog;

/// Fallback when a user has no stored target or the stored value is
/// malformed.
pub const DEFAULT_CALORIES_TARGET: f64 = 2000.0;

/// A day counts toward the goal when it reaches 95% of the target.
const GOAL_TOLERANCE: f64 = 0.95;

/// Days of history shown in the weekly chart window.
const WEEKLY_WINDOW: usize = 7;

/// Display label derived from average calories vs. target. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NutritionStatus {
    Exceeded,
    Near,
    Average,
    Under,
    #[default]
    NoData,
}

/// Per-user aggregate over all daily logs. Values are plain floats; rounding
/// is the presentation layer's concern.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NutritionStats {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub calories_target: f64,
    pub average_calories: f64,
    pub average_protein: f64,
    pub average_fat: f64,
    pub average_carbs: f64,
    pub days_tracked: u32,
    pub days_reached_goal: u32,
    pub goal_achievement_rate: f64,
    pub status: NutritionStatus,
    /// Most recent min(7, n) logs, oldest first, for charting.
    pub weekly_logs: Vec<DailyLog>,
}

pub(super) struct Totals {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub tracked: u32,
    pub reached: u32,
}

/// Accumulate sums over every log. A zero-calorie day is "not tracked", not
/// "tracked with zero intake", even when other macros are present.
pub(super) fn accumulate(logs: &[DailyLog], target: f64) -> Totals {
    let goal_floor = target * GOAL_TOLERANCE;
    let mut totals = Totals {
        calories: 0.0,
        protein: 0.0,
        fat: 0.0,
        carbs: 0.0,
        tracked: 0,
        reached: 0,
    };
    for log in logs {
        if log.calories <= 0.0 {
            continue;
        }
        totals.tracked += 1;
        totals.calories += log.calories;
        totals.protein += log.protein;
        totals.fat += log.fat;
        totals.carbs += log.carbs;
        if log.calories >= goal_floor {
            totals.reached += 1;
        }
    }
    totals
}

/// Build the stats for a user from their target and full ascending log
/// history. Averages and the achievement rate stay zero when no day was
/// tracked.
pub(super) fn build_stats(
    user_id: &str,
    target: f64,
    logs: Vec<DailyLog>,
) -> NutritionStats {
    let mut stats = NutritionStats {
        user_id: user_id.to_string(),
        calories_target: target,
        ..Default::default()
    };
    if logs.is_empty() {
        return stats;
    }

    let totals = accumulate(&logs, target);
    stats.days_tracked = totals.tracked;
    stats.days_reached_goal = totals.reached;
    if totals.tracked > 0 {
        let n = totals.tracked as f64;
        stats.average_calories = totals.calories / n;
        stats.average_protein = totals.protein / n;
        stats.average_fat = totals.fat / n;
        stats.average_carbs = totals.carbs / n;
        stats.goal_achievement_rate = totals.reached as f64 * 100.0 / n;
    }
    stats.status = classify(stats.average_calories, target);

    let start = logs.len().saturating_sub(WEEKLY_WINDOW);
    let mut logs = logs;
    stats.weekly_logs = logs.split_off(start);

    stats
}

pub fn classify(average_calories: f64, target: f64) -> NutritionStatus {
    if average_calories <= 0.0 {
        return NutritionStatus::NoData;
    }
    let ratio = average_calories / target;
    if ratio >= 1.0 {
        NutritionStatus::Exceeded
    } else if ratio >= 0.9 {
        NutritionStatus::Near
    } else if ratio >= 0.7 {
        NutritionStatus::Average
    } else {
        NutritionStatus::Under
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(date: &str, calories: f64) -> DailyLog {
        DailyLog {
            date: date.to_string(),
            calories,
            protein: 10.0,
            fat: 5.0,
            carbs: 20.0,
            updated_at_ms: None,
        }
    }

    #[test]
    fn worked_example_week() {
        let calories = [1800.0, 0.0, 2100.0, 1900.0, 2200.0, 1850.0, 2000.0];
        let logs: Vec<DailyLog> = calories
            .iter()
            .enumerate()
            .map(|(i, c)| log(&format!("2025-01-0{}", i + 1), *c))
            .collect();

        let stats = build_stats("u1", 2000.0, logs);
        assert_eq!(stats.days_tracked, 6);
        assert_eq!(stats.days_reached_goal, 4);
        assert!((stats.goal_achievement_rate - 400.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn goal_boundary_is_inclusive_at_95_percent() {
        let target = 2000.0;
        let at_floor = build_stats("u", target, vec![log("2025-01-01", 1900.0)]);
        assert_eq!(at_floor.days_reached_goal, 1);

        let just_under = build_stats("u", target, vec![log("2025-01-01", 1899.999)]);
        assert_eq!(just_under.days_reached_goal, 0);
    }

    #[test]
    fn average_calories_stays_within_the_logged_range() {
        let values = [1500.0, 1800.0, 2600.0, 2100.0];
        let logs: Vec<DailyLog> = values
            .iter()
            .enumerate()
            .map(|(i, c)| log(&format!("2025-02-0{}", i + 1), *c))
            .collect();
        let stats = build_stats("u", 2000.0, logs);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(stats.average_calories >= min && stats.average_calories <= max);
    }

    #[test]
    fn zero_calorie_days_are_not_tracked_even_with_macros() {
        let mut zero_day = log("2025-03-01", 0.0);
        zero_day.protein = 90.0;
        let logs = vec![zero_day, log("2025-03-02", 2000.0)];

        let stats = build_stats("u", 2000.0, logs);
        assert_eq!(stats.days_tracked, 1);
        // The zero day's protein is excluded from the average too.
        assert!((stats.average_protein - 10.0).abs() < 1e-9);
    }

    #[test]
    fn no_tracked_days_means_all_zero_and_no_division() {
        let logs = vec![log("2025-04-01", 0.0), log("2025-04-02", 0.0)];
        let stats = build_stats("u", 2000.0, logs);
        assert_eq!(stats.days_tracked, 0);
        assert_eq!(stats.days_reached_goal, 0);
        assert_eq!(stats.average_calories, 0.0);
        assert_eq!(stats.goal_achievement_rate, 0.0);
        assert_eq!(stats.status, NutritionStatus::NoData);
        // The weekly window still shows the (untracked) history.
        assert_eq!(stats.weekly_logs.len(), 2);
    }

    #[test]
    fn empty_history_yields_default_stats() {
        let stats = build_stats("u", 1800.0, Vec::new());
        assert_eq!(stats.calories_target, 1800.0);
        assert_eq!(stats.days_tracked, 0);
        assert!(stats.weekly_logs.is_empty());
        assert_eq!(stats.status, NutritionStatus::NoData);
    }

    #[test]
    fn weekly_window_holds_the_most_recent_seven() {
        let logs: Vec<DailyLog> = (1..=10)
            .map(|d| log(&format!("2025-05-{d:02}"), 2000.0))
            .collect();
        let stats = build_stats("u", 2000.0, logs);
        assert_eq!(stats.weekly_logs.len(), 7);
        assert_eq!(stats.weekly_logs[0].date, "2025-05-04");
        assert_eq!(stats.weekly_logs[6].date, "2025-05-10");
    }

    #[test]
    fn status_thresholds() {
        let target = 2000.0;
        assert_eq!(classify(2000.0, target), NutritionStatus::Exceeded);
        assert_eq!(classify(1999.0, target), NutritionStatus::Near);
        assert_eq!(classify(1800.0, target), NutritionStatus::Near);
        assert_eq!(classify(1799.0, target), NutritionStatus::Average);
        assert_eq!(classify(1400.0, target), NutritionStatus::Average);
        assert_eq!(classify(1399.0, target), NutritionStatus::Under);
        assert_eq!(classify(0.0, target), NutritionStatus::NoData);
    }
}
