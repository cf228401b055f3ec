mod manage_promo_code;
mod validate_promo_code;
mod view_products;

pub use manage_promo_code::{
    CreatePromoCodeUseCase, CreatePromoUsKsResult, DeletePromoCodeUseCase, DeletePromoUsKsResult,
    EditPromoCodeUseCase, EditPromoUsKsResult, ListPromoCodesUseCase, ListPromoUsKsResult,
    RedeemPromoCodeUseCase, RedeemPromoUsKsResult,
};
pub use validate_promo_code::{ValidatePromoCodeUseCase, ValidatePromoUsKsResult};
pub use view_products::{ViewProductsUseCase, ViewProductsUsKsResult};
