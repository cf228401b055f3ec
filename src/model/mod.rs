mod cart;
mod product;
mod promo_code;

pub use cart::CartItemView;
pub use product::{ProductModel, ProductVariationModel, VariationPriceModel};
pub use promo_code::{
    DiscountModel, PromoAssignmentModel, PromoAssignmentScope, PromoCodeModel, PromoRejectReason,
};
