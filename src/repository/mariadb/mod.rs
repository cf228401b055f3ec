pub(super) mod product;
pub(super) mod promo_code;

use sqlx::error::Error;
use sqlx::mysql::{MySqlArguments, MySqlQueryResult, MySqlRow};
use sqlx::{Executor, MySql, Row, Statement, Transaction};
use std::io::ErrorKind;
use std::ops::DerefMut;
use std::result::Result as DefaultResult;

use crate::error::{AppError, AppErrorCode};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%6f";
const PROMO_ID_BYTE_LENGTH: usize = 16;

impl From<Error> for AppError {
    fn from(value: Error) -> Self {
        let (code, detail) = match value {
            Error::Configuration(e) => (
                AppErrorCode::InvalidInput,
                e.to_string() + " invalid-db-config",
            ),
            Error::Io(e) => (
                AppErrorCode::IOerror(e.kind()),
                e.to_string() + " io-err-mariadb",
            ),
            Error::Database(e) => (AppErrorCode::RemoteDbServerFailure, e.to_string()),
            Error::Protocol(errmsg) => (AppErrorCode::IOerror(ErrorKind::InvalidData), errmsg),
            Error::Decode(e) => (AppErrorCode::DataCorruption, e.to_string()),
            Error::ColumnDecode { index, source } => (
                AppErrorCode::DataCorruption,
                source.to_string() + ", when decoding column at idx " + index.as_str(),
            ),
            Error::Tls(e) => (AppErrorCode::IOerror(ErrorKind::NotConnected), e.to_string()),
            Error::TypeNotFound { type_name } => {
                (AppErrorCode::InvalidInput, type_name + " wrong-col-typ")
            }
            Error::ColumnNotFound(col_name) => {
                (AppErrorCode::IOerror(ErrorKind::NotFound), col_name + " no-col")
            }
            Error::RowNotFound => (AppErrorCode::IOerror(ErrorKind::NotFound), "no-row".to_string()),
            Error::ColumnIndexOutOfBounds { index, len } => (
                AppErrorCode::InvalidInput,
                format!("req-idx:{}, limit:{}", index, len),
            ),
            Error::PoolTimedOut => (
                AppErrorCode::DatabaseServerBusy,
                "no-conn-avail".to_string(),
            ),
            Error::PoolClosed => (AppErrorCode::Unknown, "pool-closed".to_string()),
            Error::WorkerCrashed => (
                AppErrorCode::Unknown,
                "low-level-db-worker-crashed".to_string(),
            ),
            _others => (
                AppErrorCode::Unknown,
                "internal-implementation-issue".to_string(),
            ),
        };
        Self {
            code,
            detail: Some(detail),
        }
    } // end of fn from
} // end of impl AppError

// promo-code IDs are 128-bit UUIDs kept as lowercase hex strings at the
// application level and `BINARY(16)` columns at the database level
struct PromoIdBytes([u8; PROMO_ID_BYTE_LENGTH]);

impl<'a> TryFrom<&'a str> for PromoIdBytes {
    type Error = AppError;
    fn try_from(value: &'a str) -> DefaultResult<Self, Self::Error> {
        if value.len() != (PROMO_ID_BYTE_LENGTH * 2) {
            let detail = format!("size-not-fit: {value}");
            return Err(AppError {
                code: AppErrorCode::InvalidInput,
                detail: Some(detail),
            });
        }
        let mut dst = [0u8; PROMO_ID_BYTE_LENGTH];
        for (nth, chunk) in dst.iter_mut().enumerate() {
            let pos = nth << 1;
            let hx = value.get(pos..pos + 2).ok_or(AppError {
                code: AppErrorCode::InvalidInput,
                detail: Some(format!("no-chars-at-idx: {pos}")),
            })?;
            *chunk = u8::from_str_radix(hx, 16).map_err(|_e| AppError {
                code: AppErrorCode::InvalidInput,
                detail: Some(format!("not-hex-string: {hx}")),
            })?;
        }
        Ok(Self(dst))
    }
}

impl PromoIdBytes {
    fn as_column(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn to_app_oid(row: &MySqlRow, idx: usize) -> DefaultResult<String, AppError> {
        let raw = row.try_get::<Vec<u8>, usize>(idx)?;
        if raw.len() != PROMO_ID_BYTE_LENGTH {
            let detail = format!("fetched-id-len: {}", raw.len());
            Err(AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(detail),
            })
        } else {
            let out = raw.into_iter().map(|b| format!("{:02x}", b)).collect();
            Ok(out)
        }
    }
}

#[test]
fn verify_hex_to_promo_id_bytes() {
    let PromoIdBytes(actual) = PromoIdBytes::try_from("0902900390049005a004a005a006a007").unwrap();
    let expect = [
        0x09, 0x02, 0x90, 0x03, 0x90, 0x04, 0x90, 0x05, 0xa0, 0x04, 0xa0, 0x05, 0xa0, 0x06, 0xa0,
        0x07,
    ];
    assert_eq!(actual, expect);
    let result = PromoIdBytes::try_from("800EFF41");
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.code, AppErrorCode::InvalidInput);
    }
    let result = PromoIdBytes::try_from("z9029003900490z5a004a005a006a007");
    assert!(result.is_err());
}

async fn run_query_once(
    tx: &mut Transaction<'_, MySql>,
    sql_patt: String,
    args: MySqlArguments,
    maybe_num_batch: Option<usize>,
) -> DefaultResult<MySqlQueryResult, AppError> {
    let stmt = tx.prepare(sql_patt.as_str()).await?;
    let query = stmt.query_with(args);
    let exec = tx.deref_mut();
    let resultset = query.execute(exec).await?;
    if let Some(num_batch) = maybe_num_batch {
        let num_affected = resultset.rows_affected() as usize;
        if num_affected == num_batch {
            Ok(resultset)
        } else {
            let detail = format!("num_affected, actual:{}, expect:{}", num_affected, num_batch);
            Err(AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(detail),
            })
        }
    } else {
        Ok(resultset)
    }
}
