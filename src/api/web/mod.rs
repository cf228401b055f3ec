use std::collections::HashMap;

use axum::routing::{delete, get, patch, post, MethodRouter};

use crate::constant::api::web as WebConst;
use crate::{AppSharedState, WebApiHdlrLabel};

pub mod dto;
mod product;
mod promo_code;

pub type ApiRouteType = MethodRouter<AppSharedState>;
pub type ApiRouteTableType = HashMap<WebApiHdlrLabel, ApiRouteType>;

pub fn route_table() -> ApiRouteTableType {
    let mut out: ApiRouteTableType = HashMap::new();
    out.insert(
        WebConst::VALIDATE_PROMO_CODE,
        post(promo_code::validate_handler),
    );
    out.insert(WebConst::LIST_PROMO_CODES, get(promo_code::list_handler));
    out.insert(WebConst::CREATE_PROMO_CODE, post(promo_code::create_handler));
    out.insert(WebConst::TOGGLE_PROMO_CODE, patch(promo_code::edit_handler));
    out.insert(
        WebConst::DELETE_PROMO_CODE,
        delete(promo_code::delete_handler),
    );
    out.insert(WebConst::REDEEM_PROMO_CODE, patch(promo_code::redeem_handler));
    out.insert(
        WebConst::BATCH_READ_PRODUCTS,
        get(product::batch_read_handler),
    );
    out
}
