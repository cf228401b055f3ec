use std::boxed::Box;
use std::sync::Arc;

use chrono::Local as LocalTime;

use crate::api::web::dto::{PromoCodeValidateReqDto, PromoValidatedDataDto};
use crate::constant::hard_limit;
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::{CartItemView, PromoAssignmentModel};
use crate::repository::AbsPromoCodeRepo;
use crate::error::AppError;

pub struct ValidatePromoCodeUseCase {
    pub repo: Box<dyn AbsPromoCodeRepo>,
    pub log_ctx: Arc<AppLogContext>,
}

pub enum ValidatePromoUsKsResult {
    Accepted(PromoValidatedDataDto),
    Rejected(&'static str),
    NotFound,
    ExceedingLimit(usize),
    ServerError(AppError),
}

impl ValidatePromoCodeUseCase {
    pub async fn execute(self, data: PromoCodeValidateReqDto) -> ValidatePromoUsKsResult {
        if data.items.len() > hard_limit::MAX_ITEMS_PER_CART_REQ {
            return ValidatePromoUsKsResult::ExceedingLimit(data.items.len());
        }
        let code = data.code.trim().to_uppercase();
        if code.is_empty() {
            return ValidatePromoUsKsResult::NotFound;
        }
        let saved = match self.repo.fetch_by_code(code.as_str()).await {
            Ok(v) => v,
            Err(e) => {
                let logctx = &self.log_ctx;
                app_log_event!(logctx, AppLogLevel::ERROR, "code:{}, {:?}", code, e);
                return ValidatePromoUsKsResult::ServerError(e);
            }
        };
        let promo = match saved {
            Some(v) => v,
            None => return ValidatePromoUsKsResult::NotFound,
        };
        let items = CartItemView::from_requests(&data.items);
        let now = LocalTime::now().fixed_offset();
        match promo.verify(&items, now) {
            Ok(matched) => {
                let matched_assignment = matched.map(PromoAssignmentModel::to_dto);
                let assignments = promo
                    .assignments
                    .iter()
                    .map(PromoAssignmentModel::to_dto)
                    .collect::<Vec<_>>();
                ValidatePromoUsKsResult::Accepted(PromoValidatedDataDto {
                    code: promo.code.clone(),
                    discount_percent: promo.discount_percent,
                    assignments,
                    matched_assignment,
                })
            }
            Err(reason) => {
                let logctx = &self.log_ctx;
                app_log_event!(
                    logctx,
                    AppLogLevel::DEBUG,
                    "code:{}, reject:{}",
                    code,
                    reason.label()
                );
                ValidatePromoUsKsResult::Rejected(reason.label())
            }
        }
    } // end of fn execute
} // end of impl ValidatePromoCodeUseCase
