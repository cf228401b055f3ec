use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, AppErrorCode};
use crate::model::{ProductModel, PromoCodeModel};
use crate::AppDataStoreContext;

mod in_mem;
// make in-memory repos visible for testing purpose
pub use in_mem::product::ProductInMemRepo;
pub use in_mem::promo_code::PromoCodeInMemRepo;

#[cfg(feature = "mariadb")]
mod mariadb;

#[cfg(feature = "mariadb")]
use mariadb::product::ProductMariaDbRepo;

#[cfg(feature = "mariadb")]
use mariadb::promo_code::PromoCodeMariaDbRepo;

// the repository instance may be used across an await,
// the future created by app callers has to be able to pass to different threads
// , it is the reason to add `Send` and `Sync` as super-traits
#[async_trait]
pub trait AbsPromoCodeRepo: Sync + Send {
    async fn create(&self, m: PromoCodeModel) -> DefaultResult<(), AppError>;

    async fn save(&self, m: PromoCodeModel) -> DefaultResult<(), AppError>;

    async fn fetch_by_id(&self, id: &str) -> DefaultResult<Option<PromoCodeModel>, AppError>;

    async fn fetch_by_code(&self, code: &str) -> DefaultResult<Option<PromoCodeModel>, AppError>;

    async fn fetch_all(&self) -> DefaultResult<Vec<PromoCodeModel>, AppError>;

    async fn delete(&self, id: &str) -> DefaultResult<bool, AppError>;

    // conditional increment of the usage counter, the check and the write
    // happen atomically in the underlying store, `false` means the remaining
    // quota was consumed by concurrent requests
    async fn try_increment_usage(&self, code: &str) -> DefaultResult<bool, AppError>;
} // end of trait AbsPromoCodeRepo

#[async_trait]
pub trait AbsProductRepo: Sync + Send {
    // missing IDs are silently skipped, the order of fetched models is
    // not guaranteed, callers re-sort on their own demand
    async fn fetch_many(&self, ids: Vec<u64>) -> DefaultResult<Vec<ProductModel>, AppError>;

    async fn save(&self, items: Vec<ProductModel>) -> DefaultResult<(), AppError>;
}

pub async fn app_repo_promo_code(
    ds: Arc<AppDataStoreContext>,
) -> DefaultResult<Box<dyn AbsPromoCodeRepo>, AppError> {
    #[cfg(feature = "mariadb")]
    if let Some(dbs) = ds.sql_dbs.as_ref() {
        let obj = PromoCodeMariaDbRepo::new(dbs)?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::FeatureDisabled,
            detail: Some("mariadb".to_string()),
        })
    }
    #[cfg(not(feature = "mariadb"))]
    if let Some(m) = ds.in_mem.as_ref() {
        let obj = PromoCodeInMemRepo::new(m.clone()).await?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("unknown-type".to_string()),
        })
    }
}

pub async fn app_repo_product(
    ds: Arc<AppDataStoreContext>,
) -> DefaultResult<Box<dyn AbsProductRepo>, AppError> {
    #[cfg(feature = "mariadb")]
    if let Some(dbs) = ds.sql_dbs.as_ref() {
        let obj = ProductMariaDbRepo::new(dbs)?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::FeatureDisabled,
            detail: Some("mariadb".to_string()),
        })
    }
    #[cfg(not(feature = "mariadb"))]
    if let Some(m) = ds.in_mem.as_ref() {
        let obj = ProductInMemRepo::new(m.clone()).await?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("unknown-type".to_string()),
        })
    }
}
