use tracing::warn;

use crate::docs::{DailyLog, DocError, DocumentStore};

use super::stats::{build_stats, NutritionStats, DEFAULT_CALORIES_TARGET};

/// Most recent `limit` daily logs, re-ordered oldest first for charting.
/// An empty user id yields an empty list, not an error.
pub async fn user_daily_logs(
    docs: &dyn DocumentStore,
    user_id: &str,
    limit: u32,
) -> Result<Vec<DailyLog>, DocError> {
    if user_id.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut logs = docs.daily_logs(user_id, Some(limit)).await?;
    logs.reverse();
    Ok(logs)
}

/// Full log history, ascending by date.
pub async fn all_user_daily_logs(
    docs: &dyn DocumentStore,
    user_id: &str,
) -> Result<Vec<DailyLog>, DocError> {
    if user_id.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut logs = docs.daily_logs(user_id, None).await?;
    logs.reverse();
    Ok(logs)
}

/// Per-user calorie target; absent or malformed values fall back to the
/// default.
pub async fn user_calories_target(
    docs: &dyn DocumentStore,
    user_id: &str,
) -> Result<f64, DocError> {
    let user = docs.get_user(user_id).await?;
    Ok(user
        .and_then(|u| u.calories_target)
        .unwrap_or(DEFAULT_CALORIES_TARGET))
}

/// Aggregate one user's full history into display stats. Identity lookup is
/// best effort; a user with no logs gets zeroed stats rather than an error.
pub async fn calculate_stats(
    docs: &dyn DocumentStore,
    user_id: &str,
) -> Result<NutritionStats, DocError> {
    let mut display_name = String::new();
    let mut email = String::new();

    match docs.get_user(user_id).await {
        Ok(Some(user)) => {
            display_name = user.full_name.or(user.username).unwrap_or_default();
            email = user.email.unwrap_or_default();
        }
        Ok(None) => {}
        Err(e) => {
            warn!(error = %e, %user_id, "user lookup failed; stats keep blank identity");
        }
    }

    let target = user_calories_target(docs, user_id)
        .await
        .unwrap_or(DEFAULT_CALORIES_TARGET);
    let logs = all_user_daily_logs(docs, user_id).await?;
    let mut stats = build_stats(user_id, target, logs);
    stats.display_name = display_name;
    stats.email = email;
    Ok(stats)
}

/// Stats for every user with at least one daily log. One user's failure is
/// logged and skipped; only a failure to list users reaches the caller.
pub async fn all_users_stats(
    docs: &dyn DocumentStore,
) -> Result<Vec<NutritionStats>, DocError> {
    let users = docs.list_users().await?;
    let mut out = Vec::with_capacity(users.len());
    for user in users {
        match calculate_stats(docs, &user.id).await {
            // The weekly window is empty exactly when the user has no logs.
            Ok(stats) if !stats.weekly_logs.is_empty() => out.push(stats),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, user_id = %user.id, "skipping user stats");
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::docs::memory::MemoryDocs;
    use crate::docs::DocUser;
    use crate::nutrition::stats::NutritionStatus;

    use super::*;

    fn log(date: &str, calories: f64) -> DailyLog {
        DailyLog {
            date: date.to_string(),
            calories,
            protein: 0.0,
            fat: 0.0,
            carbs: 0.0,
            updated_at_ms: None,
        }
    }

    fn store() -> MemoryDocs {
        let docs = MemoryDocs::default();
        *docs.users.lock().unwrap() = vec![
            DocUser {
                id: "u1".into(),
                full_name: Some("Ann Example".into()),
                email: Some("ann@example.com".into()),
                calories_target: Some(1800.0),
                ..Default::default()
            },
            DocUser {
                id: "u2".into(),
                ..Default::default()
            },
        ];
        docs.logs.lock().unwrap().insert(
            "u1".into(),
            vec![
                log("2025-01-03", 1800.0),
                log("2025-01-01", 1700.0),
                log("2025-01-02", 1900.0),
                log("2025-01-04", 2000.0),
            ],
        );
        docs
    }

    #[tokio::test]
    async fn limited_logs_come_from_the_most_recent_dates_ascending() {
        let docs = store();
        let logs = user_daily_logs(&docs, "u1", 2).await.expect("logs");
        let dates: Vec<&str> = logs.iter().map(|l| l.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-03", "2025-01-04"]);
    }

    #[tokio::test]
    async fn empty_user_id_returns_empty_not_error() {
        let docs = store();
        assert!(user_daily_logs(&docs, "", 5).await.expect("ok").is_empty());
        assert!(all_user_daily_logs(&docs, "  ")
            .await
            .expect("ok")
            .is_empty());
    }

    #[tokio::test]
    async fn target_defaults_when_absent() {
        let docs = store();
        assert_eq!(user_calories_target(&docs, "u1").await.expect("t"), 1800.0);
        assert_eq!(user_calories_target(&docs, "u2").await.expect("t"), 2000.0);
        assert_eq!(
            user_calories_target(&docs, "missing").await.expect("t"),
            2000.0
        );
    }

    #[tokio::test]
    async fn stats_use_the_stored_target_and_identity() {
        let docs = store();
        let stats = calculate_stats(&docs, "u1").await.expect("stats");
        assert_eq!(stats.display_name, "Ann Example");
        assert_eq!(stats.email, "ann@example.com");
        assert_eq!(stats.calories_target, 1800.0);
        assert_eq!(stats.days_tracked, 4);
        // goal floor 1710: 1800, 1900, 2000 reach it; 1700 does not
        assert_eq!(stats.days_reached_goal, 3);
        assert_eq!(stats.status, NutritionStatus::Exceeded);
    }

    #[tokio::test]
    async fn stats_for_unknown_user_are_zeroed() {
        let docs = store();
        let stats = calculate_stats(&docs, "ghost").await.expect("stats");
        assert_eq!(stats.days_tracked, 0);
        assert_eq!(stats.calories_target, 2000.0);
        assert!(stats.display_name.is_empty());
        assert_eq!(stats.status, NutritionStatus::NoData);
    }

    #[tokio::test]
    async fn all_users_stats_only_includes_users_with_logs() {
        let docs = store();
        let all = all_users_stats(&docs).await.expect("stats");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user_id, "u1");
    }
}
