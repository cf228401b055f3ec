use std::boxed::Box;
use std::str::FromStr;

use chrono::DateTime;
use rust_decimal::Decimal;

use storefront::error::AppErrorCode;
use storefront::model::{ProductModel, ProductVariationModel};
use storefront::repository::{AbsProductRepo, ProductInMemRepo};

use super::super::in_mem_ds_ctx_setup;

async fn in_mem_repo_setup(max_items: u32) -> Box<dyn AbsProductRepo> {
    let ds_ctx = in_mem_ds_ctx_setup(max_items);
    let inmem = ds_ctx.in_mem.as_ref().unwrap().clone();
    let result = ProductInMemRepo::new(inmem).await;
    assert!(result.is_ok());
    Box::new(result.unwrap())
}

fn ut_product(id: u64, name: &str, category_id: Option<u32>) -> ProductModel {
    ProductModel {
        id,
        name: name.to_string(),
        category_id,
        category_name: category_id.map(|_| "footwear".to_string()),
        variations: vec![
            ProductVariationModel {
                name: "small".to_string(),
                list_price: Decimal::from_str("49.99").unwrap(),
                sale_price: None,
                sale_expires_at: None,
            },
            ProductVariationModel {
                name: "large".to_string(),
                list_price: Decimal::from_str("62").unwrap(),
                sale_price: Some(Decimal::from_str("55").unwrap()),
                sale_expires_at: Some(
                    DateTime::parse_from_rfc3339("2099-01-01T00:00:00+00:00").unwrap(),
                ),
            },
        ],
    }
}

#[tokio::test]
async fn save_then_fetch_many_ok() {
    let repo = in_mem_repo_setup(20).await;
    let items = vec![
        ut_product(29, "trail shoe", Some(3)),
        ut_product(31, "city boot", Some(3)),
        ut_product(84, "wool sock", None),
    ];
    repo.save(items).await.unwrap();
    // id 999 is absent from the catalog and silently skipped
    let fetched = repo.fetch_many(vec![31, 999, 29]).await.unwrap();
    assert_eq!(fetched.len(), 2);
    let m = fetched.iter().find(|m| m.id == 29).unwrap();
    assert_eq!(m.name.as_str(), "trail shoe");
    assert_eq!(m.category_id, Some(3));
    assert_eq!(m.category_name.as_deref(), Some("footwear"));
    assert_eq!(m.variations.len(), 2);
    let v = m.variations.iter().find(|v| v.name == "large").unwrap();
    assert_eq!(v.sale_price, Some(Decimal::from_str("55").unwrap()));
    assert!(v.sale_expires_at.is_some());
    let m = fetched.iter().find(|m| m.id == 31).unwrap();
    assert_eq!(m.name.as_str(), "city boot");
} // end of fn save_then_fetch_many_ok

#[tokio::test]
async fn fetch_many_none_present() {
    let repo = in_mem_repo_setup(20).await;
    let fetched = repo.fetch_many(vec![5, 6]).await.unwrap();
    assert!(fetched.is_empty());
}

#[tokio::test]
async fn save_empty_input_error() {
    let repo = in_mem_repo_setup(20).await;
    let result = repo.save(Vec::new()).await;
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.code, AppErrorCode::EmptyInputData);
    }
}

#[tokio::test]
async fn save_overwrites_category() {
    let repo = in_mem_repo_setup(20).await;
    repo.save(vec![ut_product(29, "trail shoe", Some(3))])
        .await
        .unwrap();
    repo.save(vec![ut_product(29, "trail shoe v2", None)])
        .await
        .unwrap();
    let fetched = repo.fetch_many(vec![29]).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].name.as_str(), "trail shoe v2");
    assert!(fetched[0].category_id.is_none());
    assert!(fetched[0].category_name.is_none());
}
