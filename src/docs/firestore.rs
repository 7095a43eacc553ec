use std::time::Duration;

use axum::async_trait;
use serde_json::{json, Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::DocStoreConfig;

use super::{
    CategoryMirror, DailyLog, DocError, DocUser, DocumentStore, FoodMirror, Post, Review,
    UserMirror, UserRecipe,
};

const PAGE_SIZE: u32 = 300;

/// Firestore REST client. Documents live under
/// `projects/{p}/databases/(default)/documents/{collection}/{id}`; field
/// values are wrapped in typed envelopes which the codec below folds back
/// into plain Rust values.
pub struct FirestoreDocs {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl FirestoreDocs {
    pub fn new(config: &DocStoreConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        let base = format!(
            "{}/projects/{}/databases/(default)/documents",
            config.endpoint.trim_end_matches('/'),
            config.project_id
        );
        Ok(Self {
            http,
            base,
            token: config.token.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn get_doc(&self, path: &str) -> Result<Option<Value>, DocError> {
        let resp = self
            .request(reqwest::Method::GET, format!("{}/{path}", self.base))
            .send()
            .await
            .map_err(|e| DocError::Unavailable(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp)?;
        let doc = resp
            .json::<Value>()
            .await
            .map_err(|e| DocError::Malformed(e.to_string()))?;
        Ok(Some(doc))
    }

    /// All documents of a collection, following page tokens.
    async fn list_collection(&self, path: &str) -> Result<Vec<Value>, DocError> {
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self
                .request(reqwest::Method::GET, format!("{}/{path}", self.base))
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }
            let resp = req
                .send()
                .await
                .map_err(|e| DocError::Unavailable(e.to_string()))?;
            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                // Collection never written to; Firestore has no empty
                // collections, only absent ones.
                return Ok(docs);
            }
            let resp = check_status(resp)?;
            let body = resp
                .json::<Value>()
                .await
                .map_err(|e| DocError::Malformed(e.to_string()))?;
            if let Some(page) = body.get("documents").and_then(Value::as_array) {
                docs.extend(page.iter().cloned());
            }
            match body.get("nextPageToken").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => return Ok(docs),
            }
        }
    }

    /// PATCH without an update mask replaces the whole document, creating it
    /// when missing.
    async fn put_doc(&self, path: &str, fields: Value) -> Result<(), DocError> {
        let resp = self
            .request(reqwest::Method::PATCH, format!("{}/{path}", self.base))
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| DocError::Unavailable(e.to_string()))?;
        check_status(resp)?;
        Ok(())
    }

    /// Field-masked patch; fields outside the mask are left untouched.
    async fn patch_fields(
        &self,
        path: &str,
        fields: Value,
        mask: &[&str],
    ) -> Result<(), DocError> {
        let mut req = self
            .request(reqwest::Method::PATCH, format!("{}/{path}", self.base))
            .json(&json!({ "fields": fields }));
        for field in mask {
            req = req.query(&[("updateMask.fieldPaths", *field)]);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| DocError::Unavailable(e.to_string()))?;
        check_status(resp)?;
        Ok(())
    }

    async fn delete_doc(&self, path: &str) -> Result<(), DocError> {
        let resp = self
            .request(reqwest::Method::DELETE, format!("{}/{path}", self.base))
            .send()
            .await
            .map_err(|e| DocError::Unavailable(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(resp)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocs {
    async fn list_users(&self) -> Result<Vec<DocUser>, DocError> {
        let docs = self.list_collection("users").await?;
        Ok(docs.iter().filter_map(decode_user).collect())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<DocUser>, DocError> {
        if user_id.trim().is_empty() {
            return Ok(None);
        }
        let doc = self.get_doc(&format!("users/{user_id}")).await?;
        Ok(doc.as_ref().and_then(decode_user))
    }

    async fn daily_logs(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<DailyLog>, DocError> {
        if user_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let docs = self
            .list_collection(&format!("users/{user_id}/daily_logs"))
            .await?;
        let mut logs: Vec<DailyLog> = docs.iter().filter_map(decode_daily_log).collect();
        // Log documents are keyed by ISO date, so date order is day order.
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(limit) = limit {
            logs.truncate(limit as usize);
        }
        Ok(logs)
    }

    async fn clear_device_token(&self, user_id: &str) -> Result<(), DocError> {
        self.patch_fields(
            &format!("users/{user_id}"),
            json!({ "fcmToken": { "nullValue": null } }),
            &["fcmToken"],
        )
        .await
    }

    async fn upsert_user(&self, user: &UserMirror) -> Result<(), DocError> {
        self.put_doc(&format!("users/{}", user.id), user_fields(user))
            .await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), DocError> {
        self.delete_doc(&format!("users/{user_id}")).await
    }

    async fn upsert_category(&self, category: &CategoryMirror) -> Result<(), DocError> {
        self.put_doc(
            &format!("categories/{}", category.id),
            category_fields(category),
        )
        .await
    }

    async fn delete_category(&self, category_id: &str) -> Result<(), DocError> {
        self.delete_doc(&format!("categories/{category_id}")).await
    }

    async fn upsert_food(&self, food: &FoodMirror) -> Result<(), DocError> {
        self.put_doc(&format!("foodItems/{}", food.id), food_fields(food))
            .await
    }

    async fn delete_food(&self, food_id: &str) -> Result<(), DocError> {
        self.delete_doc(&format!("foodItems/{food_id}")).await
    }

    async fn list_posts(&self) -> Result<Vec<Post>, DocError> {
        let docs = self.list_collection("posts").await?;
        Ok(docs
            .iter()
            .filter(|d| !is_soft_deleted(d))
            .filter_map(decode_post)
            .collect())
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, DocError> {
        let docs = self.list_collection("reviews").await?;
        Ok(docs
            .iter()
            .filter(|d| !is_soft_deleted(d))
            .filter_map(decode_review)
            .collect())
    }

    async fn list_recipes(&self) -> Result<Vec<UserRecipe>, DocError> {
        let docs = self.list_collection("userRecipes").await?;
        Ok(docs
            .iter()
            .filter(|d| !is_soft_deleted(d))
            .filter_map(decode_recipe)
            .collect())
    }

    async fn soft_delete_post(&self, id: &str) -> Result<(), DocError> {
        self.patch_fields(
            &format!("posts/{id}"),
            json!({ "deleted": { "booleanValue": true } }),
            &["deleted"],
        )
        .await
    }

    async fn soft_delete_review(&self, id: &str) -> Result<(), DocError> {
        self.patch_fields(
            &format!("reviews/{id}"),
            json!({ "deleted": { "booleanValue": true } }),
            &["deleted"],
        )
        .await
    }

    async fn soft_delete_recipe(&self, id: &str) -> Result<(), DocError> {
        self.patch_fields(
            &format!("userRecipes/{id}"),
            json!({ "deleted": { "booleanValue": true } }),
            &["deleted"],
        )
        .await
    }
}

fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, DocError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(DocError::Unavailable(format!("status {status}")))
    }
}

// --- field codec ---

fn fields_of(doc: &Value) -> Option<&Map<String, Value>> {
    doc.get("fields").and_then(Value::as_object)
}

/// Last segment of the resource name, i.e. the document id.
fn doc_id(doc: &Value) -> Option<&str> {
    doc.get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
}

fn str_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)?
        .get("stringValue")?
        .as_str()
        .map(str::to_string)
}

/// Numeric field: a `doubleValue` number or an `integerValue` (which the
/// REST surface serializes as a string). Anything else decodes to `None`.
fn f64_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = fields.get(key)?;
    if let Some(double) = value.get("doubleValue") {
        return double.as_f64();
    }
    let integer = value.get("integerValue")?;
    match integer {
        Value::String(s) => s.parse().ok(),
        other => other.as_f64(),
    }
}

fn i64_field(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    let integer = fields.get(key)?.get("integerValue")?;
    match integer {
        Value::String(s) => s.parse().ok(),
        other => other.as_i64(),
    }
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    fields.get(key)?.get("booleanValue")?.as_bool()
}

/// Timestamps arrive either as a store-native `timestampValue` (RFC 3339) or
/// as plain epoch-millisecond numbers written by the mobile client.
fn millis_field(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    if let Some(millis) = i64_field(fields, key) {
        return Some(millis);
    }
    if let Some(millis) = f64_field(fields, key) {
        return Some(millis as i64);
    }
    let stamp = fields.get(key)?.get("timestampValue")?.as_str()?;
    let parsed = OffsetDateTime::parse(stamp, &Rfc3339).ok()?;
    Some((parsed.unix_timestamp_nanos() / 1_000_000) as i64)
}

fn is_soft_deleted(doc: &Value) -> bool {
    fields_of(doc)
        .and_then(|f| bool_field(f, "deleted"))
        .unwrap_or(false)
}

fn decode_user(doc: &Value) -> Option<DocUser> {
    let id = doc_id(doc)?.to_string();
    let empty = Map::new();
    let f = fields_of(doc).unwrap_or(&empty);
    Some(DocUser {
        id,
        username: str_field(f, "username"),
        full_name: str_field(f, "fullName"),
        email: str_field(f, "email"),
        device_token: str_field(f, "fcmToken"),
        calories_target: f64_field(f, "caloriesTarget"),
        created_at_ms: millis_field(f, "createdAt"),
    })
}

fn decode_daily_log(doc: &Value) -> Option<DailyLog> {
    let date = doc_id(doc)?.to_string();
    let empty = Map::new();
    let f = fields_of(doc).unwrap_or(&empty);
    Some(DailyLog {
        date,
        calories: f64_field(f, "calories").unwrap_or(0.0),
        protein: f64_field(f, "protein").unwrap_or(0.0),
        fat: f64_field(f, "fat").unwrap_or(0.0),
        carbs: f64_field(f, "carbs").unwrap_or(0.0),
        updated_at_ms: millis_field(f, "updatedAt"),
    })
}

fn decode_post(doc: &Value) -> Option<Post> {
    let id = doc_id(doc)?.to_string();
    let empty = Map::new();
    let f = fields_of(doc).unwrap_or(&empty);
    Some(Post {
        id,
        user_id: str_field(f, "userId"),
        text: str_field(f, "text"),
        image_url: str_field(f, "imageUrl"),
        like_count: i64_field(f, "likeCount"),
        created_at_ms: millis_field(f, "createdAt"),
    })
}

fn decode_review(doc: &Value) -> Option<Review> {
    let id = doc_id(doc)?.to_string();
    let empty = Map::new();
    let f = fields_of(doc).unwrap_or(&empty);
    Some(Review {
        id,
        user_id: str_field(f, "userId"),
        food_id: str_field(f, "foodId"),
        rating: f64_field(f, "rating"),
        comment: str_field(f, "comment"),
        created_at_ms: millis_field(f, "createdAt"),
    })
}

fn decode_recipe(doc: &Value) -> Option<UserRecipe> {
    let id = doc_id(doc)?.to_string();
    let empty = Map::new();
    let f = fields_of(doc).unwrap_or(&empty);
    Some(UserRecipe {
        id,
        user_id: str_field(f, "userId"),
        title: str_field(f, "title"),
        description: str_field(f, "description"),
        image_url: str_field(f, "imageUrl"),
        created_at_ms: millis_field(f, "createdAt"),
    })
}

fn sv(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn dv(f: f64) -> Value {
    json!({ "doubleValue": f })
}

fn iv(i: i64) -> Value {
    json!({ "integerValue": i.to_string() })
}

fn bv(b: bool) -> Value {
    json!({ "booleanValue": b })
}

fn user_fields(user: &UserMirror) -> Value {
    let mut f = Map::new();
    f.insert("username".into(), sv(&user.username));
    f.insert("fullName".into(), sv(&user.full_name));
    f.insert("email".into(), sv(&user.email));
    f.insert("role".into(), sv(&user.role));
    if let Some(avatar) = &user.avatar_url {
        f.insert("avatarUrl".into(), sv(avatar));
    }
    Value::Object(f)
}

fn category_fields(category: &CategoryMirror) -> Value {
    let mut f = Map::new();
    f.insert("name".into(), sv(&category.name));
    if let Some(description) = &category.description {
        f.insert("description".into(), sv(description));
    }
    if let Some(icon) = &category.icon {
        f.insert("icon".into(), sv(icon));
    }
    if let Some(color) = &category.color {
        f.insert("color".into(), sv(color));
    }
    Value::Object(f)
}

fn food_fields(food: &FoodMirror) -> Value {
    let mut f = Map::new();
    f.insert("name".into(), sv(&food.name));
    f.insert("calories".into(), sv(&food.calories));
    f.insert("categoryId".into(), sv(&food.category_id));
    f.insert("categoryName".into(), sv(&food.category_name));
    f.insert("available".into(), bv(food.available));
    f.insert("rating".into(), dv(food.rating));
    f.insert("reviewCount".into(), iv(food.review_count));
    if let Some(description) = &food.description {
        f.insert("description".into(), sv(description));
    }
    if let Some(image_url) = &food.image_url {
        f.insert("imageUrl".into(), sv(image_url));
    }
    if let Some(unit) = &food.unit {
        f.insert("unit".into(), sv(unit));
    }
    Value::Object(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_doc() -> Value {
        json!({
            "name": "projects/p/databases/(default)/documents/users/u1",
            "fields": {
                "username": { "stringValue": "ann" },
                "fullName": { "stringValue": "Ann Example" },
                "email": { "stringValue": "ann@example.com" },
                "fcmToken": { "stringValue": "tok-1" },
                "caloriesTarget": { "integerValue": "1800" },
                "createdAt": { "timestampValue": "2025-06-01T00:00:00Z" }
            }
        })
    }

    #[test]
    fn decodes_a_user_document() {
        let user = decode_user(&user_doc()).expect("decode");
        assert_eq!(user.id, "u1");
        assert_eq!(user.username.as_deref(), Some("ann"));
        assert_eq!(user.calories_target, Some(1800.0));
        // 2025-06-01T00:00:00Z in epoch millis
        assert_eq!(user.created_at_ms, Some(1_748_736_000_000));
    }

    #[test]
    fn malformed_numeric_fields_decode_to_none() {
        let doc = json!({
            "name": "x/users/u2",
            "fields": {
                "caloriesTarget": { "stringValue": "not a number" }
            }
        });
        let user = decode_user(&doc).expect("decode");
        assert_eq!(user.calories_target, None);
    }

    #[test]
    fn timestamps_accept_epoch_millis_numbers() {
        let doc = json!({
            "name": "x/users/u3",
            "fields": { "createdAt": { "integerValue": "1748736000000" } }
        });
        let user = decode_user(&doc).expect("decode");
        assert_eq!(user.created_at_ms, Some(1_748_736_000_000));
    }

    #[test]
    fn daily_log_takes_its_date_from_the_document_id() {
        let doc = json!({
            "name": "x/users/u1/daily_logs/2025-01-03",
            "fields": {
                "calories": { "doubleValue": 2100.0 },
                "protein": { "integerValue": "80" }
            }
        });
        let log = decode_daily_log(&doc).expect("decode");
        assert_eq!(log.date, "2025-01-03");
        assert_eq!(log.calories, 2100.0);
        assert_eq!(log.protein, 80.0);
        assert_eq!(log.fat, 0.0);
    }

    #[test]
    fn soft_deleted_documents_are_detected() {
        let doc = json!({
            "name": "x/posts/p1",
            "fields": { "deleted": { "booleanValue": true } }
        });
        assert!(is_soft_deleted(&doc));
        assert!(!is_soft_deleted(&user_doc()));
    }

    #[test]
    fn mirror_encoding_skips_absent_optionals() {
        let category = CategoryMirror {
            id: "c1".into(),
            name: "Salads".into(),
            description: None,
            icon: Some("leaf".into()),
            color: None,
        };
        let fields = category_fields(&category);
        let obj = fields.as_object().expect("object");
        assert!(obj.contains_key("name"));
        assert!(obj.contains_key("icon"));
        assert!(!obj.contains_key("description"));
        assert!(!obj.contains_key("color"));
    }
}
