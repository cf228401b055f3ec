use chrono::offset::FixedOffset;
use chrono::DateTime;
use rust_decimal::prelude::Zero;
use rust_decimal::{Decimal, RoundingStrategy};
use std::result::Result as DefaultResult;

use crate::api::web::dto::{
    PromoAssignmentDto, PromoCodeCreateReqDto, PromoCodeEditReqDto, PromoCodeRespDto,
    PromoScopeLabel,
};
use crate::constant::hard_limit;
use crate::error::{AppError, AppErrorCode};
use crate::model::CartItemView;

#[derive(Debug, Clone, PartialEq)]
pub enum PromoAssignmentScope {
    Product(u64),
    Category {
        id: Option<u32>,
        name: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct PromoAssignmentModel {
    pub scope: PromoAssignmentScope,
    // empty list means every variation of the matched product qualifies
    pub variation_names: Vec<String>,
    pub max_discount: Option<Decimal>,
}

pub struct PromoCodeModel {
    pub id: String,
    pub code: String,
    pub discount_percent: u8,
    pub is_active: bool,
    pub expires_at: Option<DateTime<FixedOffset>>,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    // empty list means the code applies storewide
    pub assignments: Vec<PromoAssignmentModel>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PromoRejectReason {
    Inactive,
    Expired,
    UsageExhausted,
    RestrictedScope,
}

impl PromoRejectReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Expired => "expired",
            Self::UsageExhausted => "usage-limit-reached",
            Self::RestrictedScope => "not-applicable-to-cart",
        }
    }
}

pub struct DiscountModel {
    pub amount: Decimal,
    pub total_after: Decimal,
}

impl PromoAssignmentModel {
    fn variation_allowed(&self, item: &CartItemView) -> bool {
        if self.variation_names.is_empty() {
            return true;
        }
        match item.variation.as_deref() {
            Some(chosen) => self
                .variation_names
                .iter()
                .any(|n| n.trim().to_lowercase() == chosen),
            None => false,
        }
    }

    pub fn matches(&self, item: &CartItemView) -> bool {
        // a line without a product id is not a purchasable unit, it can
        // never satisfy any assignment, category scoped ones included
        if item.product_id.is_none() {
            return false;
        }
        let scope_hit = match &self.scope {
            PromoAssignmentScope::Product(pid) => item.product_id == Some(*pid),
            PromoAssignmentScope::Category { id, name } => match (id, item.category_id) {
                (Some(aid), Some(cid)) => *aid == cid,
                // either side lacks a numeric id, fall back to the label
                _ => match (name.as_deref(), item.category_name.as_deref()) {
                    (Some(a), Some(c)) => a.trim().to_lowercase() == c,
                    _ => false,
                },
            },
        };
        scope_hit && self.variation_allowed(item)
    } // end of fn matches

    pub(crate) fn try_from_dto(value: &PromoAssignmentDto) -> DefaultResult<Self, AppError> {
        let scope = match value.scope {
            PromoScopeLabel::Product => match value.product_id {
                Some(pid) => PromoAssignmentScope::Product(pid),
                None => {
                    return Err(AppError {
                        code: AppErrorCode::InvalidInput,
                        detail: Some("assignment-missing-product-id".to_string()),
                    })
                }
            },
            PromoScopeLabel::Category => {
                let name = value
                    .category_name
                    .as_ref()
                    .filter(|s| !s.trim().is_empty())
                    .cloned();
                if value.category_id.is_none() && name.is_none() {
                    return Err(AppError {
                        code: AppErrorCode::InvalidInput,
                        detail: Some("assignment-missing-category".to_string()),
                    });
                }
                PromoAssignmentScope::Category {
                    id: value.category_id,
                    name,
                }
            }
        };
        if let Some(cap) = value.max_discount.as_ref() {
            if cap.is_sign_negative() {
                return Err(AppError {
                    code: AppErrorCode::InvalidInput,
                    detail: Some("assignment-negative-max-discount".to_string()),
                });
            }
        }
        Ok(Self {
            scope,
            variation_names: value.variation_names.clone().unwrap_or_default(),
            max_discount: value.max_discount,
        })
    } // end of fn try_from_dto

    pub(crate) fn to_dto(&self) -> PromoAssignmentDto {
        let (scope, product_id, category_id, category_name) = match &self.scope {
            PromoAssignmentScope::Product(pid) => (PromoScopeLabel::Product, Some(*pid), None, None),
            PromoAssignmentScope::Category { id, name } => {
                (PromoScopeLabel::Category, None, *id, name.clone())
            }
        };
        PromoAssignmentDto {
            scope,
            product_id,
            category_id,
            category_name,
            variation_names: if self.variation_names.is_empty() {
                None
            } else {
                Some(self.variation_names.clone())
            },
            max_discount: self.max_discount,
        }
    }
} // end of impl PromoAssignmentModel

impl PromoCodeModel {
    pub fn try_from_new(id: String, data: PromoCodeCreateReqDto) -> DefaultResult<Self, AppError> {
        let code = data.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(AppError {
                code: AppErrorCode::EmptyInputData,
                detail: Some("promo-code-label".to_string()),
            });
        }
        Self::check_percent(data.discount_percent)?;
        let assignments = data
            .assignments
            .unwrap_or_default()
            .iter()
            .map(PromoAssignmentModel::try_from_dto)
            .collect::<DefaultResult<Vec<_>, AppError>>()?;
        Ok(Self {
            id,
            code,
            discount_percent: data.discount_percent,
            is_active: data.is_active.unwrap_or(true),
            expires_at: data.expires_at,
            usage_limit: data.usage_limit,
            usage_count: 0,
            assignments,
        })
    } // end of fn try_from_new

    fn check_percent(p: u8) -> DefaultResult<(), AppError> {
        if (hard_limit::MIN_DISCOUNT_PERCENT..=hard_limit::MAX_DISCOUNT_PERCENT).contains(&p) {
            Ok(())
        } else {
            Err(AppError {
                code: AppErrorCode::InvalidInput,
                detail: Some(format!("discount-percent-out-of-range: {p}")),
            })
        }
    }

    pub fn apply_patch(&mut self, data: PromoCodeEditReqDto) -> DefaultResult<(), AppError> {
        if let Some(p) = data.discount_percent {
            Self::check_percent(p)?;
            self.discount_percent = p;
        }
        if let Some(a) = data.is_active {
            self.is_active = a;
        }
        if let Some(t) = data.expires_at {
            self.expires_at = Some(t);
        }
        if let Some(l) = data.usage_limit {
            self.usage_limit = Some(l);
        }
        Ok(())
    }

    pub fn check_validity(&self, now: DateTime<FixedOffset>) -> DefaultResult<(), PromoRejectReason> {
        if !self.is_active {
            return Err(PromoRejectReason::Inactive);
        }
        if let Some(t) = self.expires_at.as_ref() {
            if *t < now {
                return Err(PromoRejectReason::Expired);
            }
        }
        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                return Err(PromoRejectReason::UsageExhausted);
            }
        }
        Ok(())
    } // end of fn check_validity

    // a code without assignments applies storewide, otherwise one matching
    // (assignment, cart-item) pair is enough
    pub fn applicable_scope(
        &self,
        items: &[CartItemView],
    ) -> DefaultResult<Option<&PromoAssignmentModel>, PromoRejectReason> {
        if self.assignments.is_empty() {
            return Ok(None);
        }
        let matched = self
            .assignments
            .iter()
            .find(|a| items.iter().any(|it| a.matches(it)));
        match matched {
            Some(a) => Ok(Some(a)),
            None => Err(PromoRejectReason::RestrictedScope),
        }
    }

    pub fn verify(
        &self,
        items: &[CartItemView],
        now: DateTime<FixedOffset>,
    ) -> DefaultResult<Option<&PromoAssignmentModel>, PromoRejectReason> {
        self.check_validity(now)?;
        self.applicable_scope(items)
    }

    pub fn estimate_discount(
        &self,
        subtotal: Decimal,
        assignment: Option<&PromoAssignmentModel>,
    ) -> DiscountModel {
        let percent = Decimal::from(self.discount_percent);
        let mut amount = (subtotal * percent / Decimal::from(100u8))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if let Some(cap) = assignment.and_then(|a| a.max_discount.as_ref()) {
            amount = amount.min(*cap);
        }
        if amount.is_sign_negative() {
            amount = Decimal::zero();
        }
        let total_after = (subtotal - amount).max(Decimal::zero());
        DiscountModel {
            amount,
            total_after,
        }
    } // end of fn estimate_discount
} // end of impl PromoCodeModel

impl From<&PromoCodeModel> for PromoCodeRespDto {
    fn from(value: &PromoCodeModel) -> Self {
        let assignments = value
            .assignments
            .iter()
            .map(PromoAssignmentModel::to_dto)
            .collect::<Vec<_>>();
        Self {
            id: value.id.clone(),
            code: value.code.clone(),
            discount_percent: value.discount_percent,
            is_active: value.is_active,
            expires_at: value.expires_at,
            usage_limit: value.usage_limit,
            usage_count: value.usage_count,
            assignments,
        }
    }
} // end of impl From<&PromoCodeModel>
