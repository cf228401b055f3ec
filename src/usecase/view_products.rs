use std::boxed::Box;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local as LocalTime;

use crate::api::web::dto::ProductRespDto;
use crate::constant::hard_limit;
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::repository::AbsProductRepo;
use crate::error::AppError;

pub struct ViewProductsUseCase {
    pub repo: Box<dyn AbsProductRepo>,
    pub log_ctx: Arc<AppLogContext>,
}

pub enum ViewProductsUsKsResult {
    Success(Vec<ProductRespDto>),
    InvalidQuery,
    ExceedingLimit(usize),
    ServerError(AppError),
}

impl ViewProductsUseCase {
    // `ids_raw` is the comma-separated query value, IDs which fail numeric
    // parsing invalidate the whole request, IDs absent from the catalog are
    // skipped, response order follows the request order
    pub async fn execute(self, ids_raw: String) -> ViewProductsUsKsResult {
        let mut ids = Vec::new();
        for tok in ids_raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match tok.parse::<u64>() {
                Ok(v) => ids.push(v),
                Err(_e) => return ViewProductsUsKsResult::InvalidQuery,
            }
        }
        if ids.is_empty() {
            return ViewProductsUsKsResult::InvalidQuery;
        }
        if ids.len() > hard_limit::MAX_NUM_PRODUCT_IDS_PER_REQ {
            return ViewProductsUsKsResult::ExceedingLimit(ids.len());
        }
        ids.dedup();
        let fetched = match self.repo.fetch_many(ids.clone()).await {
            Ok(ms) => ms,
            Err(e) => {
                let logctx = &self.log_ctx;
                app_log_event!(logctx, AppLogLevel::ERROR, "num-ids:{}, {:?}", ids.len(), e);
                return ViewProductsUsKsResult::ServerError(e);
            }
        };
        let now = LocalTime::now().fixed_offset();
        let mut by_id = fetched
            .into_iter()
            .map(|m| (m.id, m))
            .collect::<HashMap<_, _>>();
        let out = ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .map(|m| m.into_dto(now))
            .collect::<Vec<_>>();
        ViewProductsUsKsResult::Success(out)
    } // end of fn execute
} // end of impl ViewProductsUseCase
