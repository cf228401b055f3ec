pub(super) mod product;
pub(super) mod promo_code;
