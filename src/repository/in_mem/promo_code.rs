use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;

use crate::adapter::datastore::{
    AbsDStoreFilterKeyOp, AbstInMemoryDStore, AppInMemFetchedSingleRow,
};
use crate::api::web::dto::PromoAssignmentDto;
use crate::error::{AppError, AppErrorCode};
use crate::model::{PromoAssignmentModel, PromoCodeModel};
use crate::repository::AbsPromoCodeRepo;

const TABLE_LABEL: &str = "promo_code";

enum InMemColIdx {
    Code,
    DiscountPercent,
    IsActive,
    ExpiresAt,
    UsageLimit,
    UsageCount,
    Assignments,
    TotNumColumns,
}

impl From<InMemColIdx> for usize {
    fn from(value: InMemColIdx) -> usize {
        match value {
            InMemColIdx::Code => 0,
            InMemColIdx::DiscountPercent => 1,
            InMemColIdx::IsActive => 2,
            InMemColIdx::ExpiresAt => 3,
            InMemColIdx::UsageLimit => 4,
            InMemColIdx::UsageCount => 5,
            InMemColIdx::Assignments => 6,
            InMemColIdx::TotNumColumns => 7,
        }
    }
}

struct CodeEqualFilterOp {
    code: String,
}

impl AbsDStoreFilterKeyOp for CodeEqualFilterOp {
    fn filter(&self, _k: &String, v: &AppInMemFetchedSingleRow) -> bool {
        let idx: usize = InMemColIdx::Code.into();
        v.get(idx).map(|c| c == &self.code).unwrap_or(false)
    }
}

// runs while the table-level lock is held, the limit check and the
// increment cannot interleave with other requests
fn usage_increment_cb(row: &mut AppInMemFetchedSingleRow) -> bool {
    let limit_idx: usize = InMemColIdx::UsageLimit.into();
    let cnt_idx: usize = InMemColIdx::UsageCount.into();
    let limit = row
        .get(limit_idx)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<u32>().ok());
    let cnt = row
        .get(cnt_idx)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(u32::MAX);
    match limit {
        Some(l) if cnt >= l => false,
        _ => {
            row[cnt_idx] = cnt.saturating_add(1).to_string();
            true
        }
    }
}

pub struct PromoCodeInMemRepo {
    datastore: Arc<Box<dyn AbstInMemoryDStore>>,
}

impl PromoCodeInMemRepo {
    pub async fn new(m: Arc<Box<dyn AbstInMemoryDStore>>) -> DefaultResult<Self, AppError> {
        m.create_table(TABLE_LABEL).await?;
        Ok(Self { datastore: m })
    }

    fn render_row(m: &PromoCodeModel) -> AppInMemFetchedSingleRow {
        let num_cols: usize = InMemColIdx::TotNumColumns.into();
        let mut row = (0..num_cols).map(|_n| String::new()).collect::<Vec<_>>();
        let assignments_serial = {
            let d = m
                .assignments
                .iter()
                .map(PromoAssignmentModel::to_dto)
                .collect::<Vec<_>>();
            serde_json::to_string(&d).unwrap()
        };
        let _ = [
            (InMemColIdx::Code, m.code.clone()),
            (InMemColIdx::DiscountPercent, m.discount_percent.to_string()),
            (
                InMemColIdx::IsActive,
                if m.is_active { "1" } else { "0" }.to_string(),
            ),
            (
                InMemColIdx::ExpiresAt,
                m.expires_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ),
            (
                InMemColIdx::UsageLimit,
                m.usage_limit.map(|v| v.to_string()).unwrap_or_default(),
            ),
            (InMemColIdx::UsageCount, m.usage_count.to_string()),
            (InMemColIdx::Assignments, assignments_serial),
        ]
        .into_iter()
        .map(|(idx, val)| {
            let idx: usize = idx.into();
            row[idx] = val;
        })
        .count();
        row
    } // end of fn render_row

    fn parse_row(
        id: String,
        row: &AppInMemFetchedSingleRow,
    ) -> DefaultResult<PromoCodeModel, AppError> {
        let getcol = |idx: InMemColIdx| -> DefaultResult<&str, AppError> {
            let idx: usize = idx.into();
            row.get(idx).map(String::as_str).ok_or(AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(format!("promo-code-row-col: {idx}")),
            })
        };
        let corrupt = |field: &str| AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(format!("promo-code-row-field: {field}")),
        };
        let code = getcol(InMemColIdx::Code)?.to_string();
        let discount_percent = getcol(InMemColIdx::DiscountPercent)?
            .parse::<u8>()
            .map_err(|_e| corrupt("discount-percent"))?;
        let is_active = getcol(InMemColIdx::IsActive)? == "1";
        let expires_at = {
            let raw = getcol(InMemColIdx::ExpiresAt)?;
            if raw.is_empty() {
                None
            } else {
                let t = DateTime::parse_from_rfc3339(raw).map_err(|_e| corrupt("expires-at"))?;
                Some(t)
            }
        };
        let usage_limit = {
            let raw = getcol(InMemColIdx::UsageLimit)?;
            if raw.is_empty() {
                None
            } else {
                let v = raw.parse::<u32>().map_err(|_e| corrupt("usage-limit"))?;
                Some(v)
            }
        };
        let usage_count = getcol(InMemColIdx::UsageCount)?
            .parse::<u32>()
            .map_err(|_e| corrupt("usage-count"))?;
        let assignments = {
            let raw = getcol(InMemColIdx::Assignments)?;
            let d = serde_json::from_str::<Vec<PromoAssignmentDto>>(raw)
                .map_err(|_e| corrupt("assignments"))?;
            d.iter()
                .map(PromoAssignmentModel::try_from_dto)
                .collect::<DefaultResult<Vec<_>, AppError>>()?
        };
        Ok(PromoCodeModel {
            id,
            code,
            discount_percent,
            is_active,
            expires_at,
            usage_limit,
            usage_count,
            assignments,
        })
    } // end of fn parse_row

    async fn find_key_by_code(&self, code: &str) -> DefaultResult<Option<String>, AppError> {
        let op = CodeEqualFilterOp {
            code: code.to_string(),
        };
        let mut keys = self
            .datastore
            .filter_keys(TABLE_LABEL.to_string(), &op)
            .await?;
        Ok(keys.pop())
    }

    async fn save_common(&self, m: &PromoCodeModel) -> DefaultResult<(), AppError> {
        let mut rows = HashMap::new();
        rows.insert(m.id.clone(), Self::render_row(m));
        let mut data = HashMap::new();
        data.insert(TABLE_LABEL.to_string(), rows);
        let _num = self.datastore.save(data).await?;
        Ok(())
    }
} // end of impl PromoCodeInMemRepo

#[async_trait]
impl AbsPromoCodeRepo for PromoCodeInMemRepo {
    async fn create(&self, m: PromoCodeModel) -> DefaultResult<(), AppError> {
        if self.find_key_by_code(m.code.as_str()).await?.is_some() {
            return Err(AppError {
                code: AppErrorCode::InvalidInput,
                detail: Some("duplicate-promo-code".to_string()),
            });
        }
        self.save_common(&m).await
    }

    async fn save(&self, m: PromoCodeModel) -> DefaultResult<(), AppError> {
        self.save_common(&m).await
    }

    async fn fetch_by_id(&self, id: &str) -> DefaultResult<Option<PromoCodeModel>, AppError> {
        let mut info = HashMap::new();
        info.insert(TABLE_LABEL.to_string(), vec![id.to_string()]);
        let mut raw = self.datastore.fetch(info).await?;
        let out = match raw.remove(TABLE_LABEL).and_then(|mut t| t.remove(id)) {
            Some(row) => Some(Self::parse_row(id.to_string(), &row)?),
            None => None,
        };
        Ok(out)
    }

    async fn fetch_by_code(&self, code: &str) -> DefaultResult<Option<PromoCodeModel>, AppError> {
        match self.find_key_by_code(code).await? {
            Some(key) => self.fetch_by_id(key.as_str()).await,
            None => Ok(None),
        }
    }

    async fn fetch_all(&self) -> DefaultResult<Vec<PromoCodeModel>, AppError> {
        let table = self.datastore.fetch_all(TABLE_LABEL.to_string()).await?;
        let mut out = table
            .into_iter()
            .map(|(key, row)| Self::parse_row(key, &row))
            .collect::<DefaultResult<Vec<_>, AppError>>()?;
        out.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(out)
    }

    async fn delete(&self, id: &str) -> DefaultResult<bool, AppError> {
        let existed = self.fetch_by_id(id).await?.is_some();
        if existed {
            let mut info = HashMap::new();
            info.insert(TABLE_LABEL.to_string(), vec![id.to_string()]);
            let _num = self.datastore.delete(info).await?;
        }
        Ok(existed)
    }

    async fn try_increment_usage(&self, code: &str) -> DefaultResult<bool, AppError> {
        match self.find_key_by_code(code).await? {
            Some(key) => {
                self.datastore
                    .fetch_update_one(TABLE_LABEL.to_string(), key, usage_increment_cb)
                    .await
            }
            None => Ok(false),
        }
    }
} // end of impl AbsPromoCodeRepo for PromoCodeInMemRepo
