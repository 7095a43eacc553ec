use axum::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod firestore;

pub use firestore::FirestoreDocs;

/// Failure kinds for document store operations. "No data" is never an error:
/// reads return `Ok(None)` / `Ok(vec![])` so callers can tell an empty
/// collection from an unreachable store.
#[derive(Debug, Error)]
pub enum DocError {
    #[error("document store unreachable: {0}")]
    Unavailable(String),

    #[error("malformed document data: {0}")]
    Malformed(String),
}

/// A mobile-app user as stored in the document store. Every field besides the
/// id is authored by the mobile client and treated as best-effort.
#[derive(Debug, Clone, Default)]
pub struct DocUser {
    pub id: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub device_token: Option<String>,
    pub calories_target: Option<f64>,
    pub created_at_ms: Option<i64>,
}

/// One day's aggregated macro intake, keyed by ISO date string. Upserted by
/// the mobile client; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLog {
    pub date: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub updated_at_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: String,
    pub user_id: Option<String>,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub like_count: Option<i64>,
    pub created_at_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: String,
    pub user_id: Option<String>,
    pub food_id: Option<String>,
    pub rating: Option<f64>,
    pub comment: Option<String>,
    pub created_at_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRecipe {
    pub id: String,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at_ms: Option<i64>,
}

/// Record-store user projected into the mirror collection.
#[derive(Debug, Clone)]
pub struct UserMirror {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryMirror {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Food projected into the mirror collection; carries the denormalized
/// category id/name pair so the mobile client never joins.
#[derive(Debug, Clone)]
pub struct FoodMirror {
    pub id: String,
    pub name: String,
    pub calories: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: String,
    pub category_name: String,
    pub available: bool,
    pub rating: f64,
    pub review_count: i64,
    pub unit: Option<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<DocUser>, DocError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<DocUser>, DocError>;

    /// Daily logs for one user, newest first, truncated to `limit` when given.
    async fn daily_logs(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<DailyLog>, DocError>;

    /// Clear the stored device token on a user document, leaving every other
    /// field untouched.
    async fn clear_device_token(&self, user_id: &str) -> Result<(), DocError>;

    async fn upsert_user(&self, user: &UserMirror) -> Result<(), DocError>;
    async fn delete_user(&self, user_id: &str) -> Result<(), DocError>;
    async fn upsert_category(&self, category: &CategoryMirror) -> Result<(), DocError>;
    async fn delete_category(&self, category_id: &str) -> Result<(), DocError>;
    async fn upsert_food(&self, food: &FoodMirror) -> Result<(), DocError>;
    async fn delete_food(&self, food_id: &str) -> Result<(), DocError>;

    /// Mobile-authored content, soft-deleted entries excluded.
    async fn list_posts(&self) -> Result<Vec<Post>, DocError>;
    async fn list_reviews(&self) -> Result<Vec<Review>, DocError>;
    async fn list_recipes(&self) -> Result<Vec<UserRecipe>, DocError>;
    async fn soft_delete_post(&self, id: &str) -> Result<(), DocError>;
    async fn soft_delete_review(&self, id: &str) -> Result<(), DocError>;
    async fn soft_delete_recipe(&self, id: &str) -> Result<(), DocError>;
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory store for tests. Mirror and moderation writes are recorded
    /// so tests can assert on them.
    #[derive(Default)]
    pub struct MemoryDocs {
        pub users: Mutex<Vec<DocUser>>,
        pub logs: Mutex<HashMap<String, Vec<DailyLog>>>,
        pub posts: Mutex<Vec<Post>>,
        pub unreachable: bool,
        pub mirror_writes: Mutex<Vec<String>>,
        pub soft_deleted: Mutex<Vec<String>>,
    }

    impl MemoryDocs {
        fn check(&self) -> Result<(), DocError> {
            if self.unreachable {
                Err(DocError::Unavailable("memory store down".into()))
            } else {
                Ok(())
            }
        }

        fn record(&self, op: String) -> Result<(), DocError> {
            self.check()?;
            self.mirror_writes.lock().unwrap().push(op);
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryDocs {
        async fn list_users(&self) -> Result<Vec<DocUser>, DocError> {
            self.check()?;
            Ok(self.users.lock().unwrap().clone())
        }

        async fn get_user(&self, user_id: &str) -> Result<Option<DocUser>, DocError> {
            self.check()?;
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == user_id)
                .cloned())
        }

        async fn daily_logs(
            &self,
            user_id: &str,
            limit: Option<u32>,
        ) -> Result<Vec<DailyLog>, DocError> {
            self.check()?;
            let mut logs = self
                .logs
                .lock()
                .unwrap()
                .get(user_id)
                .cloned()
                .unwrap_or_default();
            logs.sort_by(|a, b| b.date.cmp(&a.date));
            if let Some(limit) = limit {
                logs.truncate(limit as usize);
            }
            Ok(logs)
        }

        async fn clear_device_token(&self, user_id: &str) -> Result<(), DocError> {
            self.check()?;
            let mut users = self.users.lock().unwrap();
            if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
                user.device_token = None;
            }
            Ok(())
        }

        async fn upsert_user(&self, user: &UserMirror) -> Result<(), DocError> {
            self.record(format!("upsert_user:{}", user.id))
        }

        async fn delete_user(&self, user_id: &str) -> Result<(), DocError> {
            self.record(format!("delete_user:{user_id}"))
        }

        async fn upsert_category(&self, category: &CategoryMirror) -> Result<(), DocError> {
            self.record(format!("upsert_category:{}", category.id))
        }

        async fn delete_category(&self, category_id: &str) -> Result<(), DocError> {
            self.record(format!("delete_category:{category_id}"))
        }

        async fn upsert_food(&self, food: &FoodMirror) -> Result<(), DocError> {
            self.record(format!("upsert_food:{}", food.id))
        }

        async fn delete_food(&self, food_id: &str) -> Result<(), DocError> {
            self.record(format!("delete_food:{food_id}"))
        }

        async fn list_posts(&self) -> Result<Vec<Post>, DocError> {
            self.check()?;
            Ok(self.posts.lock().unwrap().clone())
        }

        async fn list_reviews(&self) -> Result<Vec<Review>, DocError> {
            self.check()?;
            Ok(Vec::new())
        }

        async fn list_recipes(&self) -> Result<Vec<UserRecipe>, DocError> {
            self.check()?;
            Ok(Vec::new())
        }

        async fn soft_delete_post(&self, id: &str) -> Result<(), DocError> {
            self.check()?;
            self.soft_deleted.lock().unwrap().push(format!("post:{id}"));
            Ok(())
        }

        async fn soft_delete_review(&self, id: &str) -> Result<(), DocError> {
            self.check()?;
            self.soft_deleted
                .lock()
                .unwrap()
                .push(format!("review:{id}"));
            Ok(())
        }

        async fn soft_delete_recipe(&self, id: &str) -> Result<(), DocError> {
            self.check()?;
            self.soft_deleted
                .lock()
                .unwrap()
                .push(format!("recipe:{id}"));
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
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

        #[tokio::test]
        async fn daily_logs_come_back_newest_first_with_limit() {
            let docs = MemoryDocs::default();
            docs.logs.lock().unwrap().insert(
                "u1".into(),
                vec![log("2025-01-01", 1.0), log("2025-01-03", 3.0)],
            );
            let logs = docs.daily_logs("u1", Some(1)).await.expect("logs");
            assert_eq!(logs.len(), 1);
            assert_eq!(logs[0].date, "2025-01-03");
        }
    }
}
