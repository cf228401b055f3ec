use chrono::DateTime;

use storefront::api::web::dto::{
    PromoAssignmentDto, PromoCodeCreateReqDto, PromoCodeEditReqDto, PromoScopeLabel,
};
use storefront::usecase::{
    CreatePromoCodeUseCase, CreatePromoUsKsResult, DeletePromoCodeUseCase, DeletePromoUsKsResult,
    EditPromoCodeUseCase, EditPromoUsKsResult, ListPromoCodesUseCase, ListPromoUsKsResult,
    RedeemPromoCodeUseCase, RedeemPromoUsKsResult,
};

use super::{ut_authed_claim, ut_ds_ctx, ut_promo_repo};
use crate::ut_logctx;

fn ut_create_req(code: &str, percent: u8, usage_limit: Option<u32>) -> PromoCodeCreateReqDto {
    PromoCodeCreateReqDto {
        code: code.to_string(),
        discount_percent: percent,
        is_active: Some(true),
        expires_at: Some(DateTime::parse_from_rfc3339("2099-06-30T23:59:59+00:00").unwrap()),
        usage_limit,
        assignments: Some(vec![PromoAssignmentDto {
            scope: PromoScopeLabel::Product,
            product_id: Some(29),
            category_id: None,
            category_name: None,
            variation_names: None,
            max_discount: None,
        }]),
    }
}

#[tokio::test]
async fn create_ok() {
    let ds = ut_ds_ctx();
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc.execute(ut_create_req("  save20 ", 20, Some(5))).await;
    if let CreatePromoUsKsResult::Created(d) = result {
        assert_eq!(d.code.as_str(), "SAVE20");
        assert_eq!(d.discount_percent, 20);
        assert_eq!(d.usage_limit, Some(5));
        assert_eq!(d.usage_count, 0);
        assert_eq!(d.id.len(), 32);
        assert_eq!(d.assignments.len(), 1);
        assert_eq!(d.assignments[0].product_id, Some(29));
    } else {
        panic!("valid request should create the code");
    }
    // saved copy is visible through the listing
    let uc = ListPromoCodesUseCase {
        repo: ut_promo_repo(&ds).await,
        authed_usr: ut_authed_claim(true, None),
    };
    if let ListPromoUsKsResult::Success(all) = uc.execute().await {
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].code.as_str(), "SAVE20");
    } else {
        panic!("listing should succeed");
    }
} // end of fn create_ok

#[tokio::test]
async fn create_without_permission() {
    let ds = ut_ds_ctx();
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(false, None),
    };
    let result = uc.execute(ut_create_req("SAVE20", 20, None)).await;
    assert!(matches!(result, CreatePromoUsKsResult::PermissionDenied));
}

#[tokio::test]
async fn create_duplicate_code() {
    let ds = ut_ds_ctx();
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc.execute(ut_create_req("SAVE20", 20, None)).await;
    assert!(matches!(result, CreatePromoUsKsResult::Created(_)));
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    // same label, different surrounding whitespace and letter case
    let result = uc.execute(ut_create_req(" save20", 35, None)).await;
    assert!(matches!(result, CreatePromoUsKsResult::Duplicate));
}

#[tokio::test]
async fn create_invalid_percent() {
    let ds = ut_ds_ctx();
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc.execute(ut_create_req("SAVE200", 101, None)).await;
    assert!(matches!(result, CreatePromoUsKsResult::InvalidInput(_)));
}

#[tokio::test]
async fn create_quota_exceeded() {
    let ds = ut_ds_ctx();
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, Some(1)),
    };
    let result = uc.execute(ut_create_req("FIRST", 20, None)).await;
    assert!(matches!(result, CreatePromoUsKsResult::Created(_)));
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, Some(1)),
    };
    let result = uc.execute(ut_create_req("SECOND", 20, None)).await;
    if let CreatePromoUsKsResult::QuotaExceed(d) = result {
        assert_eq!(d.given, 2);
        assert_eq!(d.max_, 1);
    } else {
        panic!("second create should exceed the quota");
    }
}

#[tokio::test]
async fn edit_ok_then_unknown_id() {
    let ds = ut_ds_ctx();
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let saved_id = match uc.execute(ut_create_req("SAVE20", 20, Some(5))).await {
        CreatePromoUsKsResult::Created(d) => d.id,
        _ => panic!("setup create failed"),
    };
    let uc = EditPromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let patch = PromoCodeEditReqDto {
        discount_percent: Some(45),
        is_active: Some(false),
        ..Default::default()
    };
    let result = uc.execute(saved_id.clone(), patch).await;
    if let EditPromoUsKsResult::Success(d) = result {
        assert_eq!(d.id, saved_id);
        assert_eq!(d.discount_percent, 45);
        assert!(!d.is_active);
        assert_eq!(d.usage_limit, Some(5));
    } else {
        panic!("patch on an existing code should succeed");
    }
    let uc = EditPromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc
        .execute(
            "ffffffffffffffffffffffffffffffff".to_string(),
            PromoCodeEditReqDto::default(),
        )
        .await;
    assert!(matches!(result, EditPromoUsKsResult::NotFound));
    // malformed ID is reported the same way as an absent one
    let uc = EditPromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc
        .execute("not-a-hex-id".to_string(), PromoCodeEditReqDto::default())
        .await;
    assert!(matches!(result, EditPromoUsKsResult::NotFound));
} // end of fn edit_ok_then_unknown_id

#[tokio::test]
async fn edit_invalid_percent() {
    let ds = ut_ds_ctx();
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let saved_id = match uc.execute(ut_create_req("SAVE20", 20, None)).await {
        CreatePromoUsKsResult::Created(d) => d.id,
        _ => panic!("setup create failed"),
    };
    let uc = EditPromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let patch = PromoCodeEditReqDto {
        discount_percent: Some(150),
        ..Default::default()
    };
    let result = uc.execute(saved_id, patch).await;
    assert!(matches!(result, EditPromoUsKsResult::InvalidInput(_)));
}

#[tokio::test]
async fn delete_then_gone() {
    let ds = ut_ds_ctx();
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let saved_id = match uc.execute(ut_create_req("SAVE20", 20, None)).await {
        CreatePromoUsKsResult::Created(d) => d.id,
        _ => panic!("setup create failed"),
    };
    let uc = DeletePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc.execute(saved_id.clone()).await;
    assert!(matches!(result, DeletePromoUsKsResult::Success));
    let uc = DeletePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc.execute(saved_id).await;
    assert!(matches!(result, DeletePromoUsKsResult::NotFound));
}

#[tokio::test]
async fn redeem_until_conflict() {
    let ds = ut_ds_ctx();
    let uc = CreatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc.execute(ut_create_req("ONESHOT", 20, Some(1))).await;
    assert!(matches!(result, CreatePromoUsKsResult::Created(_)));
    let uc = RedeemPromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc.execute(" oneshot ".to_string()).await;
    assert!(matches!(result, RedeemPromoUsKsResult::Success));
    let uc = RedeemPromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc.execute("ONESHOT".to_string()).await;
    assert!(matches!(result, RedeemPromoUsKsResult::Conflict));
}

#[tokio::test]
async fn redeem_unknown_code() {
    let ds = ut_ds_ctx();
    let uc = RedeemPromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(true, None),
    };
    let result = uc.execute("NOSUCH".to_string()).await;
    assert!(matches!(result, RedeemPromoUsKsResult::NotFound));
}

#[tokio::test]
async fn redeem_without_permission() {
    let ds = ut_ds_ctx();
    let uc = RedeemPromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(false, None),
    };
    let result = uc.execute("SAVE20".to_string()).await;
    assert!(matches!(result, RedeemPromoUsKsResult::PermissionDenied));
}

#[tokio::test]
async fn list_without_permission() {
    let ds = ut_ds_ctx();
    let uc = ListPromoCodesUseCase {
        repo: ut_promo_repo(&ds).await,
        authed_usr: ut_authed_claim(false, None),
    };
    let result = uc.execute().await;
    assert!(matches!(result, ListPromoUsKsResult::PermissionDenied));
}
