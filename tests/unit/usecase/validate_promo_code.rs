use chrono::{Duration, Local};

use storefront::api::web::dto::{CartItemReqDto, PromoCodeValidateReqDto};
use storefront::model::{PromoAssignmentModel, PromoAssignmentScope, PromoCodeModel};
use storefront::usecase::{ValidatePromoCodeUseCase, ValidatePromoUsKsResult};

use super::{ut_ds_ctx, ut_promo_repo};
use crate::ut_logctx;

fn ut_cart_line(product_id: Option<u64>, variation: Option<&str>) -> CartItemReqDto {
    CartItemReqDto {
        product_id,
        product: None,
        id: None,
        category_id: None,
        category_name: None,
        variation: variation.map(str::to_string),
    }
}

fn ut_saved_promo(code: &str, assignments: Vec<PromoAssignmentModel>) -> PromoCodeModel {
    PromoCodeModel {
        id: "11112222333344445555666677778888".to_string(),
        code: code.to_string(),
        discount_percent: 10,
        is_active: true,
        expires_at: None,
        usage_limit: None,
        usage_count: 0,
        assignments,
    }
}

#[tokio::test]
async fn accepted_storewide_case_insensitive() {
    let ds = ut_ds_ctx();
    let repo = ut_promo_repo(&ds).await;
    repo.create(ut_saved_promo("SAVE10", Vec::new()))
        .await
        .unwrap();
    let uc = ValidatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let req = PromoCodeValidateReqDto {
        code: "  sAvE10 ".to_string(),
        items: vec![ut_cart_line(Some(7), None)],
    };
    let result = uc.execute(req).await;
    if let ValidatePromoUsKsResult::Accepted(d) = result {
        assert_eq!(d.code.as_str(), "SAVE10");
        assert_eq!(d.discount_percent, 10);
        assert!(d.assignments.is_empty());
        assert!(d.matched_assignment.is_none());
    } else {
        panic!("storewide code should be accepted");
    }
} // end of fn accepted_storewide_case_insensitive

#[tokio::test]
async fn accepted_with_matched_assignment() {
    let ds = ut_ds_ctx();
    let repo = ut_promo_repo(&ds).await;
    let assignments = vec![PromoAssignmentModel {
        scope: PromoAssignmentScope::Product(29),
        variation_names: vec!["large".to_string()],
        max_discount: None,
    }];
    repo.create(ut_saved_promo("SHOES29", assignments))
        .await
        .unwrap();
    let uc = ValidatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let req = PromoCodeValidateReqDto {
        code: "SHOES29".to_string(),
        items: vec![
            ut_cart_line(Some(7), None),
            ut_cart_line(Some(29), Some("Large")),
        ],
    };
    let result = uc.execute(req).await;
    if let ValidatePromoUsKsResult::Accepted(d) = result {
        // the payload always lists the code's own assignments
        assert_eq!(d.assignments.len(), 1);
        assert_eq!(d.assignments[0].product_id, Some(29));
        let a = d.matched_assignment.expect("assignment should be echoed");
        assert_eq!(a.product_id, Some(29));
    } else {
        panic!("matching cart line should be accepted");
    }
}

#[tokio::test]
async fn rejected_inactive() {
    let ds = ut_ds_ctx();
    let repo = ut_promo_repo(&ds).await;
    let mut m = ut_saved_promo("SAVE10", Vec::new());
    m.is_active = false;
    repo.create(m).await.unwrap();
    let uc = ValidatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let req = PromoCodeValidateReqDto {
        code: "SAVE10".to_string(),
        items: Vec::new(),
    };
    let result = uc.execute(req).await;
    if let ValidatePromoUsKsResult::Rejected(reason) = result {
        assert_eq!(reason, "inactive");
    } else {
        panic!("inactive code should be rejected");
    }
}

#[tokio::test]
async fn rejected_expired() {
    let ds = ut_ds_ctx();
    let repo = ut_promo_repo(&ds).await;
    let mut m = ut_saved_promo("SAVE10", Vec::new());
    m.expires_at = Some(Local::now().fixed_offset() - Duration::hours(1));
    repo.create(m).await.unwrap();
    let uc = ValidatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let req = PromoCodeValidateReqDto {
        code: "SAVE10".to_string(),
        items: Vec::new(),
    };
    let result = uc.execute(req).await;
    if let ValidatePromoUsKsResult::Rejected(reason) = result {
        assert_eq!(reason, "expired");
    } else {
        panic!("expired code should be rejected");
    }
}

#[tokio::test]
async fn rejected_out_of_scope() {
    let ds = ut_ds_ctx();
    let repo = ut_promo_repo(&ds).await;
    let assignments = vec![PromoAssignmentModel {
        scope: PromoAssignmentScope::Product(29),
        variation_names: Vec::new(),
        max_discount: None,
    }];
    repo.create(ut_saved_promo("SHOES29", assignments))
        .await
        .unwrap();
    let uc = ValidatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let req = PromoCodeValidateReqDto {
        code: "SHOES29".to_string(),
        items: vec![ut_cart_line(Some(7), None)],
    };
    let result = uc.execute(req).await;
    if let ValidatePromoUsKsResult::Rejected(reason) = result {
        assert_eq!(reason, "not-applicable-to-cart");
    } else {
        panic!("unrelated cart should be rejected");
    }
}

#[tokio::test]
async fn unknown_code_not_found() {
    let ds = ut_ds_ctx();
    let uc = ValidatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let req = PromoCodeValidateReqDto {
        code: "NOSUCH".to_string(),
        items: Vec::new(),
    };
    let result = uc.execute(req).await;
    assert!(matches!(result, ValidatePromoUsKsResult::NotFound));
    // blank code never matches anything either
    let uc = ValidatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let req = PromoCodeValidateReqDto {
        code: "   ".to_string(),
        items: Vec::new(),
    };
    let result = uc.execute(req).await;
    assert!(matches!(result, ValidatePromoUsKsResult::NotFound));
}

#[tokio::test]
async fn oversized_cart_refused() {
    let ds = ut_ds_ctx();
    let uc = ValidatePromoCodeUseCase {
        repo: ut_promo_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let items = (0..201u64)
        .map(|n| ut_cart_line(Some(n), None))
        .collect::<Vec<_>>();
    let req = PromoCodeValidateReqDto {
        code: "SAVE10".to_string(),
        items,
    };
    let result = uc.execute(req).await;
    if let ValidatePromoUsKsResult::ExceedingLimit(given) = result {
        assert_eq!(given, 201);
    } else {
        panic!("oversized cart should hit the limit");
    }
}
