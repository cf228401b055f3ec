mod manage_promo_code;
mod validate_promo_code;
mod view_products;

use std::boxed::Box;
use std::sync::Arc;

use storefront::constant::app_meta;
use storefront::repository::{
    AbsProductRepo, AbsPromoCodeRepo, ProductInMemRepo, PromoCodeInMemRepo,
};
use storefront::{
    AppAuthClaimPermission, AppAuthClaimQuota, AppAuthPermissionCode, AppAuthQuotaMatCode,
    AppAuthedClaim, AppDataStoreContext,
};

use crate::repository::in_mem_ds_ctx_setup;

pub(crate) fn ut_ds_ctx() -> Arc<AppDataStoreContext> {
    in_mem_ds_ctx_setup(50)
}

// usecases consume themselves on `execute()`, tests create one repo
// instance per call over the same shared datastore
pub(crate) async fn ut_promo_repo(ds: &Arc<AppDataStoreContext>) -> Box<dyn AbsPromoCodeRepo> {
    let inmem = ds.in_mem.as_ref().unwrap().clone();
    Box::new(PromoCodeInMemRepo::new(inmem).await.unwrap())
}

pub(crate) async fn ut_product_repo(ds: &Arc<AppDataStoreContext>) -> Box<dyn AbsProductRepo> {
    let inmem = ds.in_mem.as_ref().unwrap().clone();
    Box::new(ProductInMemRepo::new(inmem).await.unwrap())
}

pub(crate) fn ut_authed_claim(can_manage: bool, promo_quota: Option<u32>) -> AppAuthedClaim {
    let perms = if can_manage {
        vec![AppAuthClaimPermission {
            app_code: app_meta::RESOURCE_QUOTA_AP_CODE,
            codename: AppAuthPermissionCode::can_manage_promo_code,
        }]
    } else {
        Vec::new()
    };
    let quota = promo_quota
        .map(|maxnum| {
            vec![AppAuthClaimQuota {
                app_code: app_meta::RESOURCE_QUOTA_AP_CODE,
                mat_code: AppAuthQuotaMatCode::NumPromoCodes,
                maxnum,
            }]
        })
        .unwrap_or_default();
    AppAuthedClaim {
        profile: 185,
        iat: 0,
        exp: 0,
        aud: vec![app_meta::LABEL.to_string()],
        perms,
        quota,
    }
} // end of fn ut_authed_claim
