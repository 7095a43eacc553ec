use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::docs::{DocError, DocUser, DocumentStore};

use super::push::{AdminMessage, PushClient, PushError};

/// Users created within this window count as "new".
const NEW_USER_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    All,
    Active,
    New,
}

pub async fn send_to_all(
    docs: &dyn DocumentStore,
    push: &dyn PushClient,
    title: &str,
    message: &str,
) -> Result<u32, DocError> {
    send(docs, push, Audience::All, title, message).await
}

pub async fn send_to_active(
    docs: &dyn DocumentStore,
    push: &dyn PushClient,
    title: &str,
    message: &str,
) -> Result<u32, DocError> {
    send(docs, push, Audience::Active, title, message).await
}

pub async fn send_to_new(
    docs: &dyn DocumentStore,
    push: &dyn PushClient,
    title: &str,
    message: &str,
) -> Result<u32, DocError> {
    send(docs, push, Audience::New, title, message).await
}

/// Resolve the audience and fan the message out. Only a failure to enumerate
/// the audience reaches the caller; per-token failures are contained inside
/// the batch. Returns the number of accepted deliveries.
///
/// "Active" is defined by token presence: a user who can be reached is a user
/// worth reaching, so today it resolves to the same audience as "all".
pub async fn send(
    docs: &dyn DocumentStore,
    push: &dyn PushClient,
    audience: Audience,
    title: &str,
    message: &str,
) -> Result<u32, DocError> {
    let users = docs.list_users().await?;
    let recipients: Vec<DocUser> = match audience {
        Audience::All | Audience::Active => users,
        Audience::New => {
            let now_ms =
                (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
            users
                .into_iter()
                .filter(|u| is_new(u.created_at_ms, now_ms))
                .collect()
        }
    };

    let payload = AdminMessage {
        title: title.to_string(),
        body: message.to_string(),
    };
    Ok(fan_out(docs, push, &recipients, &payload).await)
}

/// Sequential dispatch: one provider call per token, unregistered tokens
/// queued and cleared from their user documents after the batch.
async fn fan_out(
    docs: &dyn DocumentStore,
    push: &dyn PushClient,
    recipients: &[DocUser],
    message: &AdminMessage,
) -> u32 {
    let mut sent = 0u32;
    let mut stale: Vec<&DocUser> = Vec::new();

    for user in recipients {
        let token = match user.device_token.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => continue,
        };
        match push.send(token, message).await {
            Ok(()) => sent += 1,
            Err(PushError::Unregistered) => {
                debug!(user_id = %user.id, "device token no longer registered");
                stale.push(user);
            }
            Err(e) => {
                warn!(error = %e, user_id = %user.id, "push delivery failed");
            }
        }
    }

    for user in stale {
        if let Err(e) = docs.clear_device_token(&user.id).await {
            warn!(error = %e, user_id = %user.id, "failed to clear stale device token");
        }
    }

    sent
}

/// Missing creation timestamps are conservatively treated as new.
fn is_new(created_at_ms: Option<i64>, now_ms: i64) -> bool {
    match created_at_ms {
        Some(ms) => now_ms - ms <= NEW_USER_WINDOW_DAYS * 24 * 60 * 60 * 1000,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::async_trait;

    use crate::docs::memory::MemoryDocs;

    use super::*;

    /// Push client scripted per token.
    struct ScriptedPush {
        unregistered: Vec<&'static str>,
        flaky: Vec<&'static str>,
        sent_to: Mutex<Vec<String>>,
    }

    impl ScriptedPush {
        fn new(unregistered: Vec<&'static str>, flaky: Vec<&'static str>) -> Self {
            Self {
                unregistered,
                flaky,
                sent_to: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PushClient for ScriptedPush {
        async fn send(&self, token: &str, _message: &AdminMessage) -> Result<(), PushError> {
            if self.unregistered.contains(&token) {
                return Err(PushError::Unregistered);
            }
            if self.flaky.contains(&token) {
                return Err(PushError::Provider("InternalServerError".into()));
            }
            self.sent_to.lock().unwrap().push(token.to_string());
            Ok(())
        }
    }

    fn user(id: &str, token: Option<&str>, created_at_ms: Option<i64>) -> DocUser {
        DocUser {
            id: id.to_string(),
            device_token: token.map(str::to_string),
            created_at_ms,
            ..Default::default()
        }
    }

    fn store_with(users: Vec<DocUser>) -> MemoryDocs {
        let docs = MemoryDocs::default();
        *docs.users.lock().unwrap() = users;
        docs
    }

    #[tokio::test]
    async fn unregistered_tokens_are_pruned_and_absent_on_repeat() {
        let docs = store_with(vec![
            user("ua", Some("A"), None),
            user("ub", Some("B"), None),
            user("uc", Some("C"), None),
        ]);
        let push = ScriptedPush::new(vec!["B"], vec![]);

        let sent = send_to_all(&docs, &push, "hello", "world")
            .await
            .expect("send");
        assert_eq!(sent, 2);
        assert_eq!(*push.sent_to.lock().unwrap(), vec!["A", "C"]);

        // B's token was cleared, so a repeat send only reaches A and C.
        let sent_again = send_to_all(&docs, &push, "hello", "again")
            .await
            .expect("send");
        assert_eq!(sent_again, 2);
        let tokens: Vec<Option<String>> = docs
            .users
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.device_token.clone())
            .collect();
        assert_eq!(
            tokens,
            vec![Some("A".to_string()), None, Some("C".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_tokens_are_skipped_silently() {
        let docs = store_with(vec![
            user("u1", Some("tok"), None),
            user("u2", Some(""), None),
            user("u3", Some("   "), None),
            user("u4", None, None),
        ]);
        let push = ScriptedPush::new(vec![], vec![]);

        let sent = send_to_all(&docs, &push, "t", "m").await.expect("send");
        assert_eq!(sent, 1);
        assert_eq!(*push.sent_to.lock().unwrap(), vec!["tok"]);
    }

    #[tokio::test]
    async fn transient_provider_errors_do_not_abort_the_batch_or_prune() {
        let docs = store_with(vec![
            user("u1", Some("A"), None),
            user("u2", Some("B"), None),
            user("u3", Some("C"), None),
        ]);
        let push = ScriptedPush::new(vec![], vec!["B"]);

        let sent = send_to_all(&docs, &push, "t", "m").await.expect("send");
        assert_eq!(sent, 2);
        // B keeps its token; only permanently-invalid tokens are cleared.
        assert!(docs.users.lock().unwrap()[1].device_token.is_some());
    }

    #[tokio::test]
    async fn new_audience_keeps_recent_and_timestampless_users() {
        let now_ms = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        let day_ms = 24 * 60 * 60 * 1000;
        let docs = store_with(vec![
            user("recent", Some("R"), Some(now_ms - 5 * day_ms)),
            user("old", Some("O"), Some(now_ms - 45 * day_ms)),
            user("unknown", Some("U"), None),
        ]);
        let push = ScriptedPush::new(vec![], vec![]);

        let sent = send_to_new(&docs, &push, "t", "m").await.expect("send");
        assert_eq!(sent, 2);
        assert_eq!(*push.sent_to.lock().unwrap(), vec!["R", "U"]);
    }

    #[tokio::test]
    async fn unreachable_store_raises_instead_of_reporting_zero() {
        let docs = MemoryDocs {
            unreachable: true,
            ..Default::default()
        };
        let push = ScriptedPush::new(vec![], vec![]);

        let err = send_to_all(&docs, &push, "t", "m").await.unwrap_err();
        assert!(matches!(err, DocError::Unavailable(_)));
    }

    #[test]
    fn new_user_window_boundaries() {
        let day_ms = 24 * 60 * 60 * 1000;
        let now = 100 * day_ms;
        assert!(is_new(Some(now - 30 * day_ms), now));
        assert!(!is_new(Some(now - 30 * day_ms - 1), now));
        assert!(is_new(None, now));
    }

}
