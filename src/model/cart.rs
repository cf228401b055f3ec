use crate::api::web::dto::CartItemReqDto;

// Snapshot of one cart line, normalized once at the web boundary so the
// promo-eligibility code never has to re-trim or case-fold user input.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: Option<u64>,
    pub category_id: Option<u32>,
    pub category_name: Option<String>,
    pub variation: Option<String>,
}

fn normalize_label(orig: &str) -> Option<String> {
    let trimmed = orig.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

impl From<&CartItemReqDto> for CartItemView {
    fn from(value: &CartItemReqDto) -> Self {
        // clients historically sent the product key under different labels,
        // precedence here follows the order the storefront published them
        let product_id = value.product_id.or(value.product).or(value.id);
        let category_name = value
            .category_name
            .as_deref()
            .and_then(normalize_label);
        let variation = value.variation.as_deref().and_then(normalize_label);
        Self {
            product_id,
            category_id: value.category_id,
            category_name,
            variation,
        }
    }
}

impl CartItemView {
    pub fn from_requests(data: &[CartItemReqDto]) -> Vec<Self> {
        data.iter().map(Self::from).collect::<Vec<_>>()
    }
}
