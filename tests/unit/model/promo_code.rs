use std::str::FromStr;

use chrono::{Duration, Local};
use rust_decimal::Decimal;

use storefront::api::web::dto::{
    PromoAssignmentDto, PromoCodeCreateReqDto, PromoCodeEditReqDto, PromoScopeLabel,
};
use storefront::error::AppErrorCode;
use storefront::model::{
    PromoAssignmentModel, PromoAssignmentScope, PromoCodeModel, PromoRejectReason,
};

use super::{ut_cart_item, ut_time};

fn ut_create_req(code: &str, percent: u8) -> PromoCodeCreateReqDto {
    PromoCodeCreateReqDto {
        code: code.to_string(),
        discount_percent: percent,
        is_active: None,
        expires_at: None,
        usage_limit: None,
        assignments: None,
    }
}

fn ut_saved_code(assignments: Vec<PromoAssignmentModel>) -> PromoCodeModel {
    PromoCodeModel {
        id: "0192837465abcdef0192837465abcdef".to_string(),
        code: "SAVE10".to_string(),
        discount_percent: 10,
        is_active: true,
        expires_at: None,
        usage_limit: None,
        usage_count: 0,
        assignments,
    }
}

fn ut_product_assignment(
    product_id: u64,
    variation_names: Vec<&str>,
    max_discount: Option<Decimal>,
) -> PromoAssignmentModel {
    PromoAssignmentModel {
        scope: PromoAssignmentScope::Product(product_id),
        variation_names: variation_names.into_iter().map(str::to_string).collect(),
        max_discount,
    }
}

#[test]
fn create_normalizes_code_label() {
    let data = ut_create_req("  sAve10 ", 25);
    let result = PromoCodeModel::try_from_new("mock-id".to_string(), data);
    assert!(result.is_ok());
    if let Ok(m) = result {
        assert_eq!(m.code.as_str(), "SAVE10");
        assert_eq!(m.discount_percent, 25);
        assert!(m.is_active);
        assert_eq!(m.usage_count, 0);
        assert!(m.assignments.is_empty());
    }
}

#[test]
fn create_rejects_blank_code() {
    let data = ut_create_req("   ", 25);
    let result = PromoCodeModel::try_from_new("mock-id".to_string(), data);
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.code, AppErrorCode::EmptyInputData);
    }
}

#[test]
fn discount_percent_bounds() {
    for bad in [0u8, 101u8, 200u8] {
        let data = ut_create_req("SAVE", bad);
        let result = PromoCodeModel::try_from_new("mock-id".to_string(), data);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.code, AppErrorCode::InvalidInput);
        }
    }
    for good in [1u8, 55u8, 100u8] {
        let data = ut_create_req("SAVE", good);
        let result = PromoCodeModel::try_from_new("mock-id".to_string(), data);
        assert!(result.is_ok());
    }
}

#[test]
fn assignment_requires_scope_key() {
    let data = PromoCodeCreateReqDto {
        assignments: Some(vec![PromoAssignmentDto {
            scope: PromoScopeLabel::Product,
            product_id: None,
            category_id: None,
            category_name: None,
            variation_names: None,
            max_discount: None,
        }]),
        ..ut_create_req("SAVE", 10)
    };
    let result = PromoCodeModel::try_from_new("mock-id".to_string(), data);
    assert!(result.is_err());

    let data = PromoCodeCreateReqDto {
        assignments: Some(vec![PromoAssignmentDto {
            scope: PromoScopeLabel::Category,
            product_id: None,
            category_id: None,
            category_name: Some("  ".to_string()),
            variation_names: None,
            max_discount: None,
        }]),
        ..ut_create_req("SAVE", 10)
    };
    let result = PromoCodeModel::try_from_new("mock-id".to_string(), data);
    assert!(result.is_err());
}

#[test]
fn verify_inactive() {
    let mut m = ut_saved_code(Vec::new());
    m.is_active = false;
    let now = Local::now().fixed_offset();
    let result = m.verify(&[], now);
    assert_eq!(result.unwrap_err(), PromoRejectReason::Inactive);
}

#[test]
fn verify_expired_boundary() {
    let mut m = ut_saved_code(Vec::new());
    let now = ut_time("2025-03-05T10:00:00+00:00");
    // a code is still usable at its exact expiry instant
    m.expires_at = Some(now);
    assert!(m.check_validity(now).is_ok());
    m.expires_at = Some(now - Duration::seconds(1));
    let result = m.check_validity(now);
    assert_eq!(result.unwrap_err(), PromoRejectReason::Expired);
}

#[test]
fn verify_usage_exhausted_at_limit() {
    let mut m = ut_saved_code(Vec::new());
    m.usage_limit = Some(5);
    m.usage_count = 4;
    let now = Local::now().fixed_offset();
    assert!(m.check_validity(now).is_ok());
    m.usage_count = 5;
    let result = m.check_validity(now);
    assert_eq!(result.unwrap_err(), PromoRejectReason::UsageExhausted);
}

#[test]
fn global_code_applies_to_any_cart() {
    let m = ut_saved_code(Vec::new());
    let now = Local::now().fixed_offset();
    let items = [ut_cart_item(Some(7), None, None, None)];
    let result = m.verify(&items, now);
    assert!(result.unwrap().is_none());
    // even an empty cart passes the scope check for a storewide code
    let result = m.verify(&[], now);
    assert!(result.unwrap().is_none());
}

#[test]
fn product_scope_matches_one_of_many_items() {
    let m = ut_saved_code(vec![ut_product_assignment(29, vec![], None)]);
    let now = Local::now().fixed_offset();
    let items = [
        ut_cart_item(Some(7), None, None, None),
        ut_cart_item(Some(29), None, None, None),
    ];
    let result = m.verify(&items, now);
    let matched = result.unwrap();
    assert!(matched.is_some());
    if let Some(a) = matched {
        assert_eq!(a.scope, PromoAssignmentScope::Product(29));
    }
}

#[test]
fn product_scope_rejects_unrelated_cart() {
    let m = ut_saved_code(vec![ut_product_assignment(29, vec![], None)]);
    let now = Local::now().fixed_offset();
    let items = [ut_cart_item(Some(7), None, None, None)];
    let result = m.verify(&items, now);
    assert_eq!(result.unwrap_err(), PromoRejectReason::RestrictedScope);
}

#[test]
fn variation_allowlist() {
    let m = ut_saved_code(vec![ut_product_assignment(29, vec!["Large"], None)]);
    let now = Local::now().fixed_offset();
    // matching product but unlisted variation
    let items = [ut_cart_item(Some(29), None, None, Some("small"))];
    let result = m.verify(&items, now);
    assert_eq!(result.unwrap_err(), PromoRejectReason::RestrictedScope);
    // matching product without any chosen variation
    let items = [ut_cart_item(Some(29), None, None, None)];
    let result = m.verify(&items, now);
    assert_eq!(result.unwrap_err(), PromoRejectReason::RestrictedScope);
    // the comparison is case-insensitive on both sides
    let items = [ut_cart_item(Some(29), None, None, Some(" LARGE "))];
    let result = m.verify(&items, now);
    assert!(result.unwrap().is_some());
}

#[test]
fn category_scope_id_precedes_name() {
    let assignment = PromoAssignmentModel {
        scope: PromoAssignmentScope::Category {
            id: Some(3),
            name: Some("Footwear".to_string()),
        },
        variation_names: Vec::new(),
        max_discount: None,
    };
    let m = ut_saved_code(vec![assignment]);
    let now = Local::now().fixed_offset();
    // both carry numeric ids, the mismatching name is irrelevant
    let items = [ut_cart_item(Some(7), Some(3), Some("hats"), None)];
    assert!(m.verify(&items, now).unwrap().is_some());
    let items = [ut_cart_item(Some(7), Some(4), Some("footwear"), None)];
    let result = m.verify(&items, now);
    assert_eq!(result.unwrap_err(), PromoRejectReason::RestrictedScope);
    // item lacks the numeric category id, labels are compared case-insensitively
    let items = [ut_cart_item(Some(7), None, Some("  FOOTWEAR "), None)];
    assert!(m.verify(&items, now).unwrap().is_some());
}

#[test]
fn item_without_product_id_never_matches() {
    let assignment = PromoAssignmentModel {
        scope: PromoAssignmentScope::Category {
            id: Some(3),
            name: Some("footwear".to_string()),
        },
        variation_names: Vec::new(),
        max_discount: None,
    };
    let m = ut_saved_code(vec![assignment]);
    let now = Local::now().fixed_offset();
    // the line carries matching category data, the absent product id
    // disqualifies it from every assignment path
    let items = [ut_cart_item(None, Some(3), Some("footwear"), None)];
    let result = m.verify(&items, now);
    assert_eq!(result.unwrap_err(), PromoRejectReason::RestrictedScope);
    // same for a product scoped assignment
    let m = ut_saved_code(vec![ut_product_assignment(29, vec![], None)]);
    let items = [ut_cart_item(None, None, None, None)];
    let result = m.verify(&items, now);
    assert_eq!(result.unwrap_err(), PromoRejectReason::RestrictedScope);
}

#[test]
fn estimate_discount_capped() {
    let mut m = ut_saved_code(vec![ut_product_assignment(
        29,
        vec![],
        Some(Decimal::from_str("50").unwrap()),
    )]);
    m.discount_percent = 20;
    let subtotal = Decimal::from_str("500").unwrap();
    let assignment = m.assignments.first();
    let d = m.estimate_discount(subtotal, assignment);
    // 20% of 500 is 100, the assignment cap lowers it to 50
    assert_eq!(d.amount, Decimal::from_str("50").unwrap());
    assert_eq!(d.total_after, Decimal::from_str("450").unwrap());
}

#[test]
fn estimate_discount_rounding() {
    let mut m = ut_saved_code(Vec::new());
    m.discount_percent = 10;
    let subtotal = Decimal::from_str("10.05").unwrap();
    let d = m.estimate_discount(subtotal, None);
    // 1.005 rounds half-away-from-zero to 1.01
    assert_eq!(d.amount, Decimal::from_str("1.01").unwrap());
    assert_eq!(d.total_after, Decimal::from_str("9.04").unwrap());
}

#[test]
fn patch_percent_validated() {
    let mut m = ut_saved_code(Vec::new());
    let data = PromoCodeEditReqDto {
        discount_percent: Some(150),
        ..Default::default()
    };
    let result = m.apply_patch(data);
    assert!(result.is_err());
    assert_eq!(m.discount_percent, 10);
    let data = PromoCodeEditReqDto {
        discount_percent: Some(35),
        is_active: Some(false),
        ..Default::default()
    };
    assert!(m.apply_patch(data).is_ok());
    assert_eq!(m.discount_percent, 35);
    assert!(!m.is_active);
}
