use std::boxed::Box;
use std::sync::Arc;

use crate::api::web::dto::{
    PromoCodeCreateReqDto, PromoCodeEditReqDto, PromoCodeRespDto, QuotaResourceErrorDto,
};
use crate::constant::app_meta;
use crate::error::{AppError, AppErrorCode};
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::PromoCodeModel;
use crate::repository::AbsPromoCodeRepo;
use crate::{generate_custom_uid, AppAuthPermissionCode, AppAuthQuotaMatCode, AppAuthedClaim};

pub struct CreatePromoCodeUseCase {
    pub repo: Box<dyn AbsPromoCodeRepo>,
    pub log_ctx: Arc<AppLogContext>,
    pub authed_usr: AppAuthedClaim,
}
pub struct ListPromoCodesUseCase {
    pub repo: Box<dyn AbsPromoCodeRepo>,
    pub authed_usr: AppAuthedClaim,
}
pub struct EditPromoCodeUseCase {
    pub repo: Box<dyn AbsPromoCodeRepo>,
    pub log_ctx: Arc<AppLogContext>,
    pub authed_usr: AppAuthedClaim,
}
pub struct DeletePromoCodeUseCase {
    pub repo: Box<dyn AbsPromoCodeRepo>,
    pub authed_usr: AppAuthedClaim,
}
pub struct RedeemPromoCodeUseCase {
    pub repo: Box<dyn AbsPromoCodeRepo>,
    pub log_ctx: Arc<AppLogContext>,
    pub authed_usr: AppAuthedClaim,
}

pub enum CreatePromoUsKsResult {
    Created(PromoCodeRespDto),
    Duplicate,
    InvalidInput(AppError),
    QuotaExceed(QuotaResourceErrorDto),
    PermissionDenied,
    ServerError(AppError),
}
pub enum ListPromoUsKsResult {
    Success(Vec<PromoCodeRespDto>),
    PermissionDenied,
    ServerError(AppError),
}
pub enum EditPromoUsKsResult {
    Success(PromoCodeRespDto),
    NotFound,
    InvalidInput(AppError),
    PermissionDenied,
    ServerError(AppError),
}
pub enum DeletePromoUsKsResult {
    Success,
    NotFound,
    PermissionDenied,
    ServerError(AppError),
}
pub enum RedeemPromoUsKsResult {
    Success,
    // the remaining quota was consumed by a concurrent checkout
    Conflict,
    NotFound,
    PermissionDenied,
    ServerError(AppError),
}

fn can_manage(authed_usr: &AppAuthedClaim) -> bool {
    authed_usr.contain_permission(AppAuthPermissionCode::can_manage_promo_code)
}

impl CreatePromoCodeUseCase {
    pub async fn execute(self, data: PromoCodeCreateReqDto) -> CreatePromoUsKsResult {
        if !can_manage(&self.authed_usr) {
            return CreatePromoUsKsResult::PermissionDenied;
        }
        let max_limit = self
            .authed_usr
            .quota_limit(AppAuthQuotaMatCode::NumPromoCodes);
        if max_limit > 0 {
            let num_saved = match self.repo.fetch_all().await {
                Ok(ms) => ms.len(),
                Err(e) => return CreatePromoUsKsResult::ServerError(e),
            };
            if num_saved >= max_limit as usize {
                let d = QuotaResourceErrorDto {
                    given: num_saved + 1,
                    max_: max_limit,
                };
                return CreatePromoUsKsResult::QuotaExceed(d);
            }
        }
        let id = generate_custom_uid(app_meta::MACHINE_CODE).simple().to_string();
        let m = match PromoCodeModel::try_from_new(id, data) {
            Ok(v) => v,
            Err(e) => return CreatePromoUsKsResult::InvalidInput(e),
        };
        match self.repo.fetch_by_code(m.code.as_str()).await {
            Ok(Some(_)) => return CreatePromoUsKsResult::Duplicate,
            Ok(None) => (),
            Err(e) => return CreatePromoUsKsResult::ServerError(e),
        }
        let resp = PromoCodeRespDto::from(&m);
        match self.repo.create(m).await {
            Ok(()) => CreatePromoUsKsResult::Created(resp),
            Err(e) if e.code == AppErrorCode::InvalidInput => CreatePromoUsKsResult::Duplicate,
            Err(e) => {
                let logctx = &self.log_ctx;
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                CreatePromoUsKsResult::ServerError(e)
            }
        }
    } // end of fn execute
} // end of impl CreatePromoCodeUseCase

impl ListPromoCodesUseCase {
    pub async fn execute(self) -> ListPromoUsKsResult {
        if !can_manage(&self.authed_usr) {
            return ListPromoUsKsResult::PermissionDenied;
        }
        match self.repo.fetch_all().await {
            Ok(ms) => {
                let d = ms.iter().map(PromoCodeRespDto::from).collect();
                ListPromoUsKsResult::Success(d)
            }
            Err(e) => ListPromoUsKsResult::ServerError(e),
        }
    }
}

impl EditPromoCodeUseCase {
    pub async fn execute(self, id: String, data: PromoCodeEditReqDto) -> EditPromoUsKsResult {
        if !can_manage(&self.authed_usr) {
            return EditPromoUsKsResult::PermissionDenied;
        }
        let mut m = match self.repo.fetch_by_id(id.as_str()).await {
            Ok(Some(v)) => v,
            Ok(None) => return EditPromoUsKsResult::NotFound,
            Err(e) if e.code == AppErrorCode::InvalidInput => {
                // malformed hex ID given by the client
                return EditPromoUsKsResult::NotFound;
            }
            Err(e) => return EditPromoUsKsResult::ServerError(e),
        };
        if let Err(e) = m.apply_patch(data) {
            return EditPromoUsKsResult::InvalidInput(e);
        }
        let resp = PromoCodeRespDto::from(&m);
        match self.repo.save(m).await {
            Ok(()) => EditPromoUsKsResult::Success(resp),
            Err(e) => {
                let logctx = &self.log_ctx;
                app_log_event!(logctx, AppLogLevel::ERROR, "id:{}, {:?}", id, e);
                EditPromoUsKsResult::ServerError(e)
            }
        }
    } // end of fn execute
} // end of impl EditPromoCodeUseCase

impl DeletePromoCodeUseCase {
    pub async fn execute(self, id: String) -> DeletePromoUsKsResult {
        if !can_manage(&self.authed_usr) {
            return DeletePromoUsKsResult::PermissionDenied;
        }
        match self.repo.delete(id.as_str()).await {
            Ok(true) => DeletePromoUsKsResult::Success,
            Ok(false) => DeletePromoUsKsResult::NotFound,
            Err(e) if e.code == AppErrorCode::InvalidInput => DeletePromoUsKsResult::NotFound,
            Err(e) => DeletePromoUsKsResult::ServerError(e),
        }
    }
}

impl RedeemPromoCodeUseCase {
    pub async fn execute(self, code: String) -> RedeemPromoUsKsResult {
        if !can_manage(&self.authed_usr) {
            return RedeemPromoUsKsResult::PermissionDenied;
        }
        let code = code.trim().to_uppercase();
        let saved = match self.repo.fetch_by_code(code.as_str()).await {
            Ok(v) => v,
            Err(e) => return RedeemPromoUsKsResult::ServerError(e),
        };
        if saved.is_none() {
            return RedeemPromoUsKsResult::NotFound;
        }
        match self.repo.try_increment_usage(code.as_str()).await {
            Ok(true) => RedeemPromoUsKsResult::Success,
            Ok(false) => RedeemPromoUsKsResult::Conflict,
            Err(e) => {
                let logctx = &self.log_ctx;
                app_log_event!(logctx, AppLogLevel::ERROR, "code:{}, {:?}", code, e);
                RedeemPromoUsKsResult::ServerError(e)
            }
        }
    } // end of fn execute
} // end of impl RedeemPromoCodeUseCase
