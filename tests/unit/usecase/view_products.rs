use std::str::FromStr;

use rust_decimal::Decimal;

use storefront::model::{ProductModel, ProductVariationModel};
use storefront::usecase::{ViewProductsUseCase, ViewProductsUsKsResult};

use super::{ut_ds_ctx, ut_product_repo};
use crate::ut_logctx;

fn ut_product(id: u64, name: &str) -> ProductModel {
    ProductModel {
        id,
        name: name.to_string(),
        category_id: Some(3),
        category_name: Some("footwear".to_string()),
        variations: vec![ProductVariationModel {
            name: "default".to_string(),
            list_price: Decimal::from_str("49.99").unwrap(),
            sale_price: None,
            sale_expires_at: None,
        }],
    }
}

#[tokio::test]
async fn batch_keeps_request_order_skips_unknown() {
    let ds = ut_ds_ctx();
    let repo = ut_product_repo(&ds).await;
    repo.save(vec![
        ut_product(29, "trail shoe"),
        ut_product(31, "city boot"),
        ut_product(84, "wool sock"),
    ])
    .await
    .unwrap();
    let uc = ViewProductsUseCase {
        repo: ut_product_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    // id 999 is absent from the catalog and silently dropped
    let result = uc.execute("84, 29,999".to_string()).await;
    if let ViewProductsUsKsResult::Success(out) = result {
        let ids = out.iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![84, 29]);
        assert_eq!(out[0].name.as_str(), "wool sock");
        assert_eq!(
            out[0].lowest_price,
            Some(Decimal::from_str("49.99").unwrap())
        );
    } else {
        panic!("well-formed query should succeed");
    }
} // end of fn batch_keeps_request_order_skips_unknown

#[tokio::test]
async fn non_numeric_query_refused() {
    let ds = ut_ds_ctx();
    let uc = ViewProductsUseCase {
        repo: ut_product_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let result = uc.execute("29,abc".to_string()).await;
    assert!(matches!(result, ViewProductsUsKsResult::InvalidQuery));
    let uc = ViewProductsUseCase {
        repo: ut_product_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let result = uc.execute("".to_string()).await;
    assert!(matches!(result, ViewProductsUsKsResult::InvalidQuery));
}

#[tokio::test]
async fn oversized_batch_refused() {
    let ds = ut_ds_ctx();
    let uc = ViewProductsUseCase {
        repo: ut_product_repo(&ds).await,
        log_ctx: ut_logctx(),
    };
    let raw = (0..41u64)
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let result = uc.execute(raw).await;
    if let ViewProductsUsKsResult::ExceedingLimit(given) = result {
        assert_eq!(given, 41);
    } else {
        panic!("oversized batch should hit the limit");
    }
}
