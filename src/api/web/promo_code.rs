use axum::debug_handler;
use axum::extract::{Json as ExtractJson, Path as ExtractPath, State as ExtractState};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;

use crate::constant::HTTP_CONTENT_TYPE_JSON;
use crate::logging::{app_log_event, AppLogLevel};
use crate::repository::app_repo_promo_code;
use crate::usecase::{
    CreatePromoCodeUseCase, CreatePromoUsKsResult, DeletePromoCodeUseCase, DeletePromoUsKsResult,
    EditPromoCodeUseCase, EditPromoUsKsResult, ListPromoCodesUseCase, ListPromoUsKsResult,
    RedeemPromoCodeUseCase, RedeemPromoUsKsResult, ValidatePromoCodeUseCase,
    ValidatePromoUsKsResult,
};
use crate::{AppAuthedClaim, AppSharedState};

use super::dto::{
    PromoCodeCreateReqDto, PromoCodeEditReqDto, PromoCodeValidateReqDto, PromoValidateRespDto,
};

fn json_headers() -> HeaderMap {
    let resp_ctype_val = HeaderValue::from_str(HTTP_CONTENT_TYPE_JSON).unwrap();
    let mut hdr_map = HeaderMap::new();
    hdr_map.insert(header::CONTENT_TYPE, resp_ctype_val);
    hdr_map
}

fn envelope(success: bool, message: Option<&str>) -> String {
    let d = PromoValidateRespDto {
        success,
        message: message.map(str::to_string),
        data: None,
    };
    serde_json::to_string(&d).unwrap()
}

#[debug_handler(state = AppSharedState)]
pub(super) async fn validate_handler(
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<PromoCodeValidateReqDto>,
) -> impl IntoResponse {
    let hdr_map = json_headers();
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_promo_code(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, "{}".to_string());
        }
    };
    let uc = ValidatePromoCodeUseCase {
        repo,
        log_ctx: logctx.clone(),
    };
    let (status, resp_body) = match uc.execute(req_body).await {
        ValidatePromoUsKsResult::Accepted(d) => {
            let out = PromoValidateRespDto {
                success: true,
                message: None,
                data: Some(d),
            };
            (StatusCode::OK, serde_json::to_string(&out).unwrap())
        }
        ValidatePromoUsKsResult::Rejected(reason) => {
            (StatusCode::BAD_REQUEST, envelope(false, Some(reason)))
        }
        ValidatePromoUsKsResult::NotFound => (
            StatusCode::NOT_FOUND,
            envelope(false, Some("invalid-promo-code")),
        ),
        ValidatePromoUsKsResult::ExceedingLimit(given) => {
            app_log_event!(logctx, AppLogLevel::WARNING, "num-cart-items:{given}");
            (
                StatusCode::BAD_REQUEST,
                envelope(false, Some("too-many-cart-items")),
            )
        }
        ValidatePromoUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "{}".to_string())
        }
    };
    (status, hdr_map, resp_body)
} // end of fn validate_handler

#[debug_handler(state = AppSharedState)]
pub(super) async fn list_handler(
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let hdr_map = json_headers();
    let default_body = "{}".to_string();
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_promo_code(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = ListPromoCodesUseCase { repo, authed_usr };
    let (status, resp_body) = match uc.execute().await {
        ListPromoUsKsResult::Success(v) => (StatusCode::OK, serde_json::to_string(&v).unwrap()),
        ListPromoUsKsResult::PermissionDenied => (StatusCode::UNAUTHORIZED, default_body),
        ListPromoUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
}

#[debug_handler(state = AppSharedState)]
pub(super) async fn create_handler(
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<PromoCodeCreateReqDto>,
) -> impl IntoResponse {
    let hdr_map = json_headers();
    let default_body = "{}".to_string();
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_promo_code(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = CreatePromoCodeUseCase {
        repo,
        log_ctx: logctx.clone(),
        authed_usr,
    };
    let (status, resp_body) = match uc.execute(req_body).await {
        CreatePromoUsKsResult::Created(d) => {
            (StatusCode::CREATED, serde_json::to_string(&d).unwrap())
        }
        CreatePromoUsKsResult::Duplicate => (
            StatusCode::BAD_REQUEST,
            envelope(false, Some("duplicate-promo-code")),
        ),
        CreatePromoUsKsResult::InvalidInput(e) => {
            let msg = e.detail.unwrap_or("invalid-input".to_string());
            (StatusCode::BAD_REQUEST, envelope(false, Some(msg.as_str())))
        }
        CreatePromoUsKsResult::QuotaExceed(d) => {
            (StatusCode::FORBIDDEN, serde_json::to_string(&d).unwrap())
        }
        CreatePromoUsKsResult::PermissionDenied => (StatusCode::UNAUTHORIZED, default_body),
        CreatePromoUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
} // end of fn create_handler

#[debug_handler(state = AppSharedState)]
pub(super) async fn edit_handler(
    ExtractPath(id): ExtractPath<String>,
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<PromoCodeEditReqDto>,
) -> impl IntoResponse {
    let hdr_map = json_headers();
    let default_body = "{}".to_string();
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_promo_code(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = EditPromoCodeUseCase {
        repo,
        log_ctx: logctx.clone(),
        authed_usr,
    };
    let (status, resp_body) = match uc.execute(id, req_body).await {
        EditPromoUsKsResult::Success(d) => (StatusCode::OK, serde_json::to_string(&d).unwrap()),
        EditPromoUsKsResult::NotFound => (StatusCode::NOT_FOUND, default_body),
        EditPromoUsKsResult::InvalidInput(e) => {
            let msg = e.detail.unwrap_or("invalid-input".to_string());
            (StatusCode::BAD_REQUEST, envelope(false, Some(msg.as_str())))
        }
        EditPromoUsKsResult::PermissionDenied => (StatusCode::UNAUTHORIZED, default_body),
        EditPromoUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
} // end of fn edit_handler

#[debug_handler(state = AppSharedState)]
pub(super) async fn delete_handler(
    ExtractPath(id): ExtractPath<String>,
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_promo_code(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new());
        }
    };
    let uc = DeletePromoCodeUseCase { repo, authed_usr };
    let status = match uc.execute(id).await {
        DeletePromoUsKsResult::Success => StatusCode::NO_CONTENT,
        DeletePromoUsKsResult::NotFound => StatusCode::NOT_FOUND,
        DeletePromoUsKsResult::PermissionDenied => StatusCode::UNAUTHORIZED,
        DeletePromoUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, HeaderMap::new())
}

#[debug_handler(state = AppSharedState)]
pub(super) async fn redeem_handler(
    ExtractPath(code): ExtractPath<String>,
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let hdr_map = json_headers();
    let default_body = "{}".to_string();
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_promo_code(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = RedeemPromoCodeUseCase {
        repo,
        log_ctx: logctx.clone(),
        authed_usr,
    };
    let (status, resp_body) = match uc.execute(code).await {
        RedeemPromoUsKsResult::Success => (StatusCode::OK, envelope(true, None)),
        RedeemPromoUsKsResult::Conflict => (
            StatusCode::GONE,
            envelope(false, Some("usage-limit-reached")),
        ),
        RedeemPromoUsKsResult::NotFound => (
            StatusCode::NOT_FOUND,
            envelope(false, Some("invalid-promo-code")),
        ),
        RedeemPromoUsKsResult::PermissionDenied => (StatusCode::UNAUTHORIZED, default_body),
        RedeemPromoUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
} // end of fn redeem_handler
