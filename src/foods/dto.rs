use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{FoodFields, FoodItem};

/// Body for creating or fully updating a food. `actor_id` identifies the
/// acting admin for the audit trail (session auth lives in the gateway).
#[derive(Debug, Deserialize)]
pub struct FoodRequest {
    pub name: String,
    pub calories: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub user_id: Option<Uuid>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: i32,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
    pub cholesterol: Option<f64>,
    pub sodium: Option<f64>,
    pub vitamin_a: Option<f64>,
    pub vitamin_c: Option<f64>,
    pub vitamin_d: Option<f64>,
    pub unit: Option<String>,
    pub actor_id: Option<Uuid>,
}

fn default_available() -> bool {
    true
}

impl FoodRequest {
    pub fn fields(&self) -> FoodFields {
        FoodFields {
            name: self.name.trim().to_string(),
            calories: self.calories.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            category_id: self.category_id,
            user_id: self.user_id,
            available: self.available,
            rating: self.rating,
            review_count: self.review_count,
            fat: self.fat,
            carbs: self.carbs,
            protein: self.protein,
            cholesterol: self.cholesterol,
            sodium: self.sodium,
            vitamin_a: self.vitamin_a,
            vitamin_c: self.vitamin_c,
            vitamin_d: self.vitamin_d,
            unit: self.unit.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteFoodRequest {
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct FoodResponse {
    pub id: Uuid,
    pub name: String,
    pub calories: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub user_id: Option<Uuid>,
    pub available: bool,
    pub rating: f64,
    pub review_count: i32,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
    pub cholesterol: Option<f64>,
    pub sodium: Option<f64>,
    pub vitamin_a: Option<f64>,
    pub vitamin_c: Option<f64>,
    pub vitamin_d: Option<f64>,
    pub unit: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<FoodItem> for FoodResponse {
    fn from(f: FoodItem) -> Self {
        Self {
            id: f.id,
            name: f.name,
            calories: f.calories,
            description: f.description,
            image_url: f.image_url,
            category_id: f.category_id,
            user_id: f.user_id,
            available: f.available,
            rating: f.rating,
            review_count: f.review_count,
            fat: f.fat,
            carbs: f.carbs,
            protein: f.protein,
            cholesterol: f.cholesterol,
            sodium: f.sodium,
            vitamin_a: f.vitamin_a,
            vitamin_c: f.vitamin_c,
            vitamin_d: f.vitamin_d,
            unit: f.unit,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}
