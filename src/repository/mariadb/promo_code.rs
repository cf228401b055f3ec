use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDateTime, Utc};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::{Acquire, Arguments, Executor, Row, Statement};

use crate::adapter::datastore::AppMariaDbStore;
use crate::api::web::dto::PromoAssignmentDto;
use crate::error::{AppError, AppErrorCode};
use crate::model::{PromoAssignmentModel, PromoCodeModel};
use crate::repository::AbsPromoCodeRepo;

use super::{run_query_once, PromoIdBytes, DATETIME_FORMAT};

struct InsertPromoArg(PromoCodeModel);
struct UpdatePromoArg(PromoCodeModel);
struct FetchByCodeArg(String);
struct FetchByIdArg(PromoIdBytes);
struct FetchAllArg;
struct DeleteOneArg(PromoIdBytes);
struct IncrementUsageArg(String);

#[rustfmt::skip]
const SELECT_COLUMN_SEQ: [&str; 8] = [
    "`id`", "`code`", "`discount_percent`", "`is_active`",
    "`expires_at`", "`usage_limit`", "`usage_count`", "`assignments`",
];

fn assignments_serial(m: &PromoCodeModel) -> String {
    let d = m
        .assignments
        .iter()
        .map(PromoAssignmentModel::to_dto)
        .collect::<Vec<_>>();
    serde_json::to_string(&d).unwrap()
}

fn expiry_column(m: &PromoCodeModel) -> Option<String> {
    m.expires_at
        .map(|t| t.with_timezone(&Utc).format(DATETIME_FORMAT).to_string())
}

impl InsertPromoArg {
    fn try_into_parts(self) -> DefaultResult<(String, MySqlArguments), AppError> {
        let sql_patt = format!(
            "INSERT INTO `promo_code`({}) VALUES (?,?,?,?,?,?,?,?)",
            SELECT_COLUMN_SEQ.join(",")
        );
        let m = self.0;
        let id_b = PromoIdBytes::try_from(m.id.as_str())?;
        let mut args = MySqlArguments::default();
        args.add(id_b.as_column()).unwrap();
        args.add(m.code.as_str()).unwrap();
        args.add(m.discount_percent).unwrap();
        args.add(m.is_active).unwrap();
        args.add(expiry_column(&m)).unwrap();
        args.add(m.usage_limit).unwrap();
        args.add(m.usage_count).unwrap();
        args.add(assignments_serial(&m)).unwrap();
        Ok((sql_patt, args))
    }
}

impl UpdatePromoArg {
    // the usage counter is deliberately not touched here, only the
    // conditional-increment statement modifies it
    fn try_into_parts(self) -> DefaultResult<(String, MySqlArguments), AppError> {
        let sql_patt = "UPDATE `promo_code` SET `discount_percent`=?,`is_active`=?,\
             `expires_at`=?,`usage_limit`=?,`assignments`=? WHERE `id`=?"
            .to_string();
        let m = self.0;
        let id_b = PromoIdBytes::try_from(m.id.as_str())?;
        let mut args = MySqlArguments::default();
        args.add(m.discount_percent).unwrap();
        args.add(m.is_active).unwrap();
        args.add(expiry_column(&m)).unwrap();
        args.add(m.usage_limit).unwrap();
        args.add(assignments_serial(&m)).unwrap();
        args.add(id_b.as_column()).unwrap();
        Ok((sql_patt, args))
    }
}

impl From<FetchByCodeArg> for (String, MySqlArguments) {
    fn from(value: FetchByCodeArg) -> (String, MySqlArguments) {
        let sql_patt = format!(
            "SELECT {} FROM `promo_code` WHERE `code`=?",
            SELECT_COLUMN_SEQ.join(",")
        );
        let mut args = MySqlArguments::default();
        args.add(value.0).unwrap();
        (sql_patt, args)
    }
}

impl From<FetchByIdArg> for (String, MySqlArguments) {
    fn from(value: FetchByIdArg) -> (String, MySqlArguments) {
        let sql_patt = format!(
            "SELECT {} FROM `promo_code` WHERE `id`=?",
            SELECT_COLUMN_SEQ.join(",")
        );
        let mut args = MySqlArguments::default();
        args.add(value.0.as_column()).unwrap();
        (sql_patt, args)
    }
}

impl From<FetchAllArg> for (String, MySqlArguments) {
    fn from(_value: FetchAllArg) -> (String, MySqlArguments) {
        let sql_patt = format!(
            "SELECT {} FROM `promo_code` ORDER BY `code`",
            SELECT_COLUMN_SEQ.join(",")
        );
        (sql_patt, MySqlArguments::default())
    }
}

impl From<DeleteOneArg> for (String, MySqlArguments) {
    fn from(value: DeleteOneArg) -> (String, MySqlArguments) {
        let sql_patt = "DELETE FROM `promo_code` WHERE `id`=?".to_string();
        let mut args = MySqlArguments::default();
        args.add(value.0.as_column()).unwrap();
        (sql_patt, args)
    }
}

impl From<IncrementUsageArg> for (String, MySqlArguments) {
    fn from(value: IncrementUsageArg) -> (String, MySqlArguments) {
        // the limit check and the increment run in one statement, the row
        // lock taken by the storage engine rules out double spending
        let sql_patt = "UPDATE `promo_code` SET `usage_count` = `usage_count` + 1 \
             WHERE `code`=? AND (`usage_limit` IS NULL OR `usage_count` < `usage_limit`)"
            .to_string();
        let mut args = MySqlArguments::default();
        args.add(value.0).unwrap();
        (sql_patt, args)
    }
}

impl TryFrom<MySqlRow> for PromoCodeModel {
    type Error = AppError;
    fn try_from(value: MySqlRow) -> DefaultResult<Self, Self::Error> {
        let id = PromoIdBytes::to_app_oid(&value, 0)?;
        let code = value.try_get::<String, usize>(1)?;
        let discount_percent = value.try_get::<u8, usize>(2)?;
        let is_active = value.try_get::<bool, usize>(3)?;
        let expires_at = value
            .try_get::<Option<NaiveDateTime>, usize>(4)?
            .map(|raw| {
                let utc_tz = FixedOffset::east_opt(0).unwrap();
                raw.and_local_timezone(utc_tz).unwrap()
            });
        let usage_limit = value.try_get::<Option<u32>, usize>(5)?;
        let usage_count = value.try_get::<u32, usize>(6)?;
        let assignments = {
            let raw = value.try_get::<&[u8], usize>(7)?;
            let serial = std::str::from_utf8(raw).map_err(|e| AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(format!("cvt-promo-assignments: {}", e)),
            })?;
            let d = serde_json::from_str::<Vec<PromoAssignmentDto>>(serial).map_err(|e| {
                AppError {
                    code: AppErrorCode::DataCorruption,
                    detail: Some(format!("decode-promo-assignments: {}", e)),
                }
            })?;
            d.iter()
                .map(PromoAssignmentModel::try_from_dto)
                .collect::<DefaultResult<Vec<_>, AppError>>()?
        };
        Ok(Self {
            id,
            code,
            discount_percent,
            is_active,
            expires_at,
            usage_limit,
            usage_count,
            assignments,
        })
    } // end of fn try-from
} // end of impl try-from for PromoCodeModel

pub(crate) struct PromoCodeMariaDbRepo {
    db: Arc<AppMariaDbStore>,
}

impl PromoCodeMariaDbRepo {
    pub(crate) fn new(dbs: &Vec<Arc<AppMariaDbStore>>) -> DefaultResult<Self, AppError> {
        if let Some(db) = dbs.first() {
            Ok(Self { db: db.clone() })
        } else {
            Err(AppError {
                code: AppErrorCode::MissingDataStore,
                detail: Some("mariadb".to_string()),
            })
        }
    }

    async fn _fetch_common(
        &self,
        sql_patt: String,
        args: MySqlArguments,
    ) -> DefaultResult<Vec<MySqlRow>, AppError> {
        let mut conn = self.db.acquire().await?;
        let stmt = conn.prepare(sql_patt.as_str()).await?;
        let query = stmt.query_with(args);
        let exec = conn.as_mut();
        let rows = query.fetch_all(exec).await?;
        Ok(rows)
    }

    async fn _write_common(
        &self,
        sql_patt: String,
        args: MySqlArguments,
        expect_num_affected: Option<usize>,
    ) -> DefaultResult<u64, AppError> {
        let mut conn = self.db.acquire().await?;
        let mut tx = conn.begin().await?;
        let resultset = run_query_once(&mut tx, sql_patt, args, expect_num_affected).await?;
        tx.commit().await?;
        Ok(resultset.rows_affected())
    }
} // end of impl PromoCodeMariaDbRepo

#[async_trait]
impl AbsPromoCodeRepo for PromoCodeMariaDbRepo {
    async fn create(&self, m: PromoCodeModel) -> DefaultResult<(), AppError> {
        let (sql_patt, args) = InsertPromoArg(m).try_into_parts()?;
        let _num = self._write_common(sql_patt, args, Some(1)).await?;
        Ok(())
    }

    async fn save(&self, m: PromoCodeModel) -> DefaultResult<(), AppError> {
        let (sql_patt, args) = UpdatePromoArg(m).try_into_parts()?;
        let _num = self._write_common(sql_patt, args, None).await?;
        Ok(())
    }

    async fn fetch_by_id(&self, id: &str) -> DefaultResult<Option<PromoCodeModel>, AppError> {
        let id_b = PromoIdBytes::try_from(id)?;
        let (sql_patt, args) = FetchByIdArg(id_b).into();
        let mut rows = self._fetch_common(sql_patt, args).await?;
        match rows.pop() {
            Some(row) => Ok(Some(PromoCodeModel::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_by_code(&self, code: &str) -> DefaultResult<Option<PromoCodeModel>, AppError> {
        let (sql_patt, args) = FetchByCodeArg(code.to_string()).into();
        let mut rows = self._fetch_common(sql_patt, args).await?;
        match rows.pop() {
            Some(row) => Ok(Some(PromoCodeModel::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_all(&self) -> DefaultResult<Vec<PromoCodeModel>, AppError> {
        let (sql_patt, args) = FetchAllArg.into();
        let rows = self._fetch_common(sql_patt, args).await?;
        rows.into_iter()
            .map(PromoCodeModel::try_from)
            .collect::<DefaultResult<Vec<_>, AppError>>()
    }

    async fn delete(&self, id: &str) -> DefaultResult<bool, AppError> {
        let id_b = PromoIdBytes::try_from(id)?;
        let (sql_patt, args) = DeleteOneArg(id_b).into();
        let num = self._write_common(sql_patt, args, None).await?;
        Ok(num > 0)
    }

    async fn try_increment_usage(&self, code: &str) -> DefaultResult<bool, AppError> {
        let (sql_patt, args) = IncrementUsageArg(code.to_string()).into();
        let mut conn = self.db.acquire().await?;
        let stmt = conn.prepare(sql_patt.as_str()).await?;
        let query = stmt.query_with(args);
        let exec = conn.as_mut();
        let resultset = query.execute(exec).await?;
        Ok(resultset.rows_affected() == 1)
    }
} // end of impl AbsPromoCodeRepo for PromoCodeMariaDbRepo
