use axum::debug_handler;
use axum::extract::{Query as ExtractQuery, State as ExtractState};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;

use crate::constant::HTTP_CONTENT_TYPE_JSON;
use crate::logging::{app_log_event, AppLogLevel};
use crate::repository::app_repo_product;
use crate::usecase::{ViewProductsUsKsResult, ViewProductsUseCase};
use crate::AppSharedState;

use super::dto::ProductBatchQryDto;

#[debug_handler(state = AppSharedState)]
pub(super) async fn batch_read_handler(
    ExtractQuery(qry): ExtractQuery<ProductBatchQryDto>,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let hdr_map = {
        let resp_ctype_val = HeaderValue::from_str(HTTP_CONTENT_TYPE_JSON).unwrap();
        let mut hmap = HeaderMap::new();
        hmap.insert(header::CONTENT_TYPE, resp_ctype_val);
        hmap
    };
    let default_body = "[]".to_string();
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_product(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = ViewProductsUseCase {
        repo,
        log_ctx: logctx.clone(),
    };
    let (status, resp_body) = match uc.execute(qry.ids).await {
        ViewProductsUsKsResult::Success(v) => (StatusCode::OK, serde_json::to_string(&v).unwrap()),
        ViewProductsUsKsResult::InvalidQuery => (StatusCode::BAD_REQUEST, default_body),
        ViewProductsUsKsResult::ExceedingLimit(given) => {
            app_log_event!(logctx, AppLogLevel::WARNING, "num-product-ids:{given}");
            (StatusCode::BAD_REQUEST, default_body)
        }
        ViewProductsUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
} // end of fn batch_read_handler
