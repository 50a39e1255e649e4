use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A purchasable menu item.
///
/// Products are sourced from the catalog document and are never mutated by the
/// cart subsystem; the cart only holds references to them alongside a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price in major currency units (e.g. 24.50).
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    /// Display tags such as "New" or "Chef Recommends".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        rename = "nutritionalInfo",
        skip_serializing_if = "Option::is_none"
    )]
    pub nutritional_info: Option<NutritionalInfo>,
}

/// Free-form weight/calorie strings shown on the menu card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NutritionalInfo {
    pub weight: String,
    pub calories: String,
}
