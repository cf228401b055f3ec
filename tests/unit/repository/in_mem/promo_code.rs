use std::boxed::Box;
use std::str::FromStr;

use chrono::DateTime;
use rust_decimal::Decimal;

use storefront::error::AppErrorCode;
use storefront::model::{PromoAssignmentModel, PromoAssignmentScope, PromoCodeModel};
use storefront::repository::{AbsPromoCodeRepo, PromoCodeInMemRepo};

use super::super::in_mem_ds_ctx_setup;

async fn in_mem_repo_setup(max_items: u32) -> Box<dyn AbsPromoCodeRepo> {
    let ds_ctx = in_mem_ds_ctx_setup(max_items);
    let inmem = ds_ctx.in_mem.as_ref().unwrap().clone();
    let result = PromoCodeInMemRepo::new(inmem).await;
    assert!(result.is_ok());
    Box::new(result.unwrap())
}

fn ut_promo_code(id: &str, code: &str, usage_limit: Option<u32>) -> PromoCodeModel {
    PromoCodeModel {
        id: id.to_string(),
        code: code.to_string(),
        discount_percent: 15,
        is_active: true,
        expires_at: Some(DateTime::parse_from_rfc3339("2099-06-30T23:59:59+00:00").unwrap()),
        usage_limit,
        usage_count: 0,
        assignments: vec![PromoAssignmentModel {
            scope: PromoAssignmentScope::Product(29),
            variation_names: vec!["large".to_string()],
            max_discount: Some(Decimal::from_str("50").unwrap()),
        }],
    }
}

#[tokio::test]
async fn create_then_fetch_ok() {
    let repo = in_mem_repo_setup(20).await;
    let m = ut_promo_code("11112222333344445555666677778888", "SAVE15", Some(10));
    let result = repo.create(m).await;
    assert!(result.is_ok());
    let result = repo.fetch_by_code("SAVE15").await;
    assert!(result.is_ok());
    let fetched = result.unwrap();
    assert!(fetched.is_some());
    if let Some(f) = fetched {
        assert_eq!(f.id.as_str(), "11112222333344445555666677778888");
        assert_eq!(f.code.as_str(), "SAVE15");
        assert_eq!(f.discount_percent, 15);
        assert!(f.is_active);
        assert_eq!(f.usage_limit, Some(10));
        assert_eq!(f.usage_count, 0);
        assert_eq!(f.assignments.len(), 1);
        let a = &f.assignments[0];
        assert_eq!(a.scope, PromoAssignmentScope::Product(29));
        assert_eq!(a.variation_names, vec!["large".to_string()]);
        assert_eq!(a.max_discount, Some(Decimal::from_str("50").unwrap()));
        let expect_t = DateTime::parse_from_rfc3339("2099-06-30T23:59:59+00:00").unwrap();
        assert_eq!(f.expires_at, Some(expect_t));
    }
    let result = repo.fetch_by_id("11112222333344445555666677778888").await;
    assert!(result.unwrap().is_some());
    let result = repo.fetch_by_code("NOSUCHCODE").await;
    assert!(result.unwrap().is_none());
} // end of fn create_then_fetch_ok

// code lookup goes through the key-filter hook of the datastore, the
// spawn forces the whole lookup future to stay Send across threads
#[tokio::test(flavor = "multi_thread")]
async fn fetch_by_code_from_spawned_task() {
    let repo = in_mem_repo_setup(20).await;
    let m = ut_promo_code("11112222333344445555666677778888", "SAVE15", None);
    repo.create(m).await.unwrap();
    let handle = tokio::spawn(async move {
        let f = repo.fetch_by_code("SAVE15").await.unwrap();
        f.map(|m| m.code)
    });
    let fetched = handle.await.unwrap();
    assert_eq!(fetched.as_deref(), Some("SAVE15"));
}

#[tokio::test]
async fn create_duplicate_code_error() {
    let repo = in_mem_repo_setup(20).await;
    let m = ut_promo_code("11112222333344445555666677778888", "SAVE15", None);
    repo.create(m).await.unwrap();
    let m2 = ut_promo_code("aaaabbbbccccddddeeeeffff00001111", "SAVE15", None);
    let result = repo.create(m2).await;
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.code, AppErrorCode::InvalidInput);
    }
}

#[tokio::test]
async fn save_overwrites_existing() {
    let repo = in_mem_repo_setup(20).await;
    let m = ut_promo_code("11112222333344445555666677778888", "SAVE15", Some(3));
    repo.create(m).await.unwrap();
    let mut modified = ut_promo_code("11112222333344445555666677778888", "SAVE15", Some(3));
    modified.discount_percent = 40;
    modified.is_active = false;
    repo.save(modified).await.unwrap();
    let f = repo.fetch_by_code("SAVE15").await.unwrap().unwrap();
    assert_eq!(f.discount_percent, 40);
    assert!(!f.is_active);
}

#[tokio::test]
async fn fetch_all_sorted_by_code() {
    let repo = in_mem_repo_setup(20).await;
    let raw = [
        ("11112222333344445555666677778888", "ZETA"),
        ("aaaabbbbccccddddeeeeffff00001111", "ALPHA"),
        ("99998888777766665555444433332222", "MIDWAY"),
    ];
    for (id, code) in raw {
        repo.create(ut_promo_code(id, code, None)).await.unwrap();
    }
    let all = repo.fetch_all().await.unwrap();
    let codes = all.iter().map(|m| m.code.as_str()).collect::<Vec<_>>();
    assert_eq!(codes, vec!["ALPHA", "MIDWAY", "ZETA"]);
}

#[tokio::test]
async fn delete_existing_and_missing() {
    let repo = in_mem_repo_setup(20).await;
    let m = ut_promo_code("11112222333344445555666677778888", "SAVE15", None);
    repo.create(m).await.unwrap();
    let result = repo.delete("11112222333344445555666677778888").await;
    assert!(result.unwrap());
    let result = repo.fetch_by_code("SAVE15").await;
    assert!(result.unwrap().is_none());
    let result = repo.delete("11112222333344445555666677778888").await;
    assert!(!result.unwrap());
}

#[tokio::test]
async fn increment_usage_until_limit() {
    let repo = in_mem_repo_setup(20).await;
    let m = ut_promo_code("11112222333344445555666677778888", "SAVE15", Some(2));
    repo.create(m).await.unwrap();
    assert!(repo.try_increment_usage("SAVE15").await.unwrap());
    assert!(repo.try_increment_usage("SAVE15").await.unwrap());
    // the limit is reached, further attempts are refused
    assert!(!repo.try_increment_usage("SAVE15").await.unwrap());
    let f = repo.fetch_by_code("SAVE15").await.unwrap().unwrap();
    assert_eq!(f.usage_count, 2);
}

#[tokio::test]
async fn increment_usage_unlimited() {
    let repo = in_mem_repo_setup(20).await;
    let m = ut_promo_code("11112222333344445555666677778888", "SAVE15", None);
    repo.create(m).await.unwrap();
    for _ in 0..7 {
        assert!(repo.try_increment_usage("SAVE15").await.unwrap());
    }
    let f = repo.fetch_by_code("SAVE15").await.unwrap().unwrap();
    assert_eq!(f.usage_count, 7);
    assert!(!repo.try_increment_usage("NOSUCHCODE").await.unwrap());
}
