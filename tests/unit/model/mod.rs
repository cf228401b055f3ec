mod promo_code;

use chrono::{DateTime, FixedOffset};

use storefront::api::web::dto::CartItemReqDto;
use storefront::model::CartItemView;

pub(crate) fn ut_time(raw: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(raw).unwrap()
}

// cart lines always enter the model layer through the web DTO, tests
// build them the same way so boundary normalization is exercised
pub(crate) fn ut_cart_item(
    product_id: Option<u64>,
    category_id: Option<u32>,
    category_name: Option<&str>,
    variation: Option<&str>,
) -> CartItemView {
    let d = CartItemReqDto {
        product_id,
        product: None,
        id: None,
        category_id,
        category_name: category_name.map(str::to_string),
        variation: variation.map(str::to_string),
    };
    CartItemView::from(&d)
}
