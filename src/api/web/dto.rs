use chrono::offset::FixedOffset;
use chrono::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Cart lines arrive from several storefront client versions which never
// agreed on one field label for the product key, all historical spellings
// are accepted here and reconciled in `model::CartItemView`.
#[derive(Deserialize, Serialize)]
pub struct CartItemReqDto {
    #[serde(default, alias = "productId")]
    pub product_id: Option<u64>,
    #[serde(default)]
    pub product: Option<u64>,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, alias = "categoryId")]
    pub category_id: Option<u32>,
    #[serde(default, alias = "categoryName", alias = "category")]
    pub category_name: Option<String>,
    #[serde(default, alias = "selectedVariation")]
    pub variation: Option<String>,
}

#[derive(Deserialize)]
pub struct PromoCodeValidateReqDto {
    pub code: String,
    #[serde(default)]
    pub items: Vec<CartItemReqDto>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromoScopeLabel {
    Product,
    Category,
}

#[derive(Deserialize, Serialize)]
pub struct PromoAssignmentDto {
    pub scope: PromoScopeLabel,
    pub product_id: Option<u64>,
    pub category_id: Option<u32>,
    pub category_name: Option<String>,
    pub variation_names: Option<Vec<String>>,
    pub max_discount: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct PromoCodeCreateReqDto {
    pub code: String,
    pub discount_percent: u8,
    pub is_active: Option<bool>,
    pub expires_at: Option<DateTime<FixedOffset>>,
    pub usage_limit: Option<u32>,
    pub assignments: Option<Vec<PromoAssignmentDto>>,
}

#[derive(Deserialize, Default)]
pub struct PromoCodeEditReqDto {
    pub discount_percent: Option<u8>,
    pub is_active: Option<bool>,
    pub expires_at: Option<DateTime<FixedOffset>>,
    pub usage_limit: Option<u32>,
}

#[derive(Deserialize, Serialize)]
pub struct PromoCodeRespDto {
    pub id: String,
    pub code: String,
    pub discount_percent: u8,
    pub is_active: bool,
    pub expires_at: Option<DateTime<FixedOffset>>,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    pub assignments: Vec<PromoAssignmentDto>,
}

#[derive(Serialize)]
pub struct PromoValidatedDataDto {
    pub code: String,
    pub discount_percent: u8,
    // every assignment saved on the code, empty for storewide codes
    pub assignments: Vec<PromoAssignmentDto>,
    // present only when the code is restricted and one assignment matched
    pub matched_assignment: Option<PromoAssignmentDto>,
}

#[derive(Serialize)]
pub struct PromoValidateRespDto {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<PromoValidatedDataDto>,
}

#[derive(Serialize)]
pub struct VariationPriceRespDto {
    pub current: Decimal,
    pub original: Decimal,
    pub sale_active: bool,
}

#[derive(Serialize)]
pub struct VariationRespDto {
    pub name: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub sale_price_expires_at: Option<DateTime<FixedOffset>>,
    pub resolved: VariationPriceRespDto,
}

#[derive(Serialize)]
pub struct ProductRespDto {
    pub id: u64,
    pub name: String,
    pub category_id: Option<u32>,
    pub category_name: Option<String>,
    pub lowest_price: Option<Decimal>,
    pub highest_price: Option<Decimal>,
    pub variations: Vec<VariationRespDto>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct QuotaResourceErrorDto {
    pub given: usize,
    pub max_: u32,
}

#[derive(Deserialize)]
pub struct ProductBatchQryDto {
    // comma-separated numeric IDs, e.g. `ids=29,31,84`
    pub ids: String,
}
