use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::{Acquire, Arguments, Executor, Row, Statement};

use crate::adapter::datastore::AppMariaDbStore;
use crate::error::{AppError, AppErrorCode};
use crate::model::ProductModel;
use crate::repository::AbsProductRepo;

use super::run_query_once;

struct FetchManyArg(Vec<u64>);
struct UpsertProductArg(Vec<ProductModel>);

#[rustfmt::skip]
const SELECT_COLUMN_SEQ: [&str; 5] = [
    "`id`", "`name`", "`category_id`", "`category_name`", "`variations`",
];

impl FetchManyArg {
    fn sql_pattern(num_batch: usize) -> String {
        let id_ph = (0..num_batch).map(|_| "?").collect::<Vec<_>>().join(",");
        format!(
            "SELECT {} FROM `product` WHERE `id` IN ({})",
            SELECT_COLUMN_SEQ.join(","),
            id_ph
        )
    }
}
impl From<FetchManyArg> for (String, MySqlArguments) {
    fn from(value: FetchManyArg) -> (String, MySqlArguments) {
        let num_batch = value.0.len();
        assert!(num_batch > 0);
        let mut args = MySqlArguments::default();
        value
            .0
            .into_iter()
            .map(|product_id| {
                args.add(product_id).unwrap();
            })
            .count();
        (FetchManyArg::sql_pattern(num_batch), args)
    }
}

impl UpsertProductArg {
    fn sql_pattern(num_batch: usize) -> String {
        const ITEM: &str = "(?,?,?,?,?)";
        let items = (0..num_batch).map(|_| ITEM).collect::<Vec<_>>();
        format!(
            "INSERT INTO `product`({}) VALUES {} ON DUPLICATE KEY UPDATE \
             `name`=VALUES(`name`), `category_id`=VALUES(`category_id`), \
             `category_name`=VALUES(`category_name`), `variations`=VALUES(`variations`)",
            SELECT_COLUMN_SEQ.join(","),
            items.join(",")
        )
    }
}
impl From<UpsertProductArg> for (String, MySqlArguments) {
    fn from(value: UpsertProductArg) -> (String, MySqlArguments) {
        let num_batch = value.0.len();
        let mut args = MySqlArguments::default();
        value
            .0
            .into_iter()
            .map(|m| {
                let variations_serial = ProductModel::render_variations(&m.variations);
                args.add(m.id).unwrap();
                args.add(m.name).unwrap();
                args.add(m.category_id).unwrap();
                args.add(m.category_name).unwrap();
                args.add(variations_serial).unwrap();
            })
            .count();
        (UpsertProductArg::sql_pattern(num_batch), args)
    }
}

impl TryFrom<MySqlRow> for ProductModel {
    type Error = AppError;
    fn try_from(value: MySqlRow) -> DefaultResult<Self, Self::Error> {
        let id = value.try_get::<u64, usize>(0)?;
        let name = value.try_get::<String, usize>(1)?;
        let category_id = value.try_get::<Option<u32>, usize>(2)?;
        let category_name = value.try_get::<Option<String>, usize>(3)?;
        let variations = {
            let raw = value.try_get::<&[u8], usize>(4)?;
            let serial = std::str::from_utf8(raw).map_err(|e| AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(format!("cvt-product-variations: {}", e)),
            })?;
            ProductModel::parse_variations(serial)
        };
        Ok(Self {
            id,
            name,
            category_id,
            category_name,
            variations,
        })
    }
} // end of impl try-from for ProductModel

pub(crate) struct ProductMariaDbRepo {
    db: Arc<AppMariaDbStore>,
}

impl ProductMariaDbRepo {
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
} // end of impl ProductMariaDbRepo

#[async_trait]
impl AbsProductRepo for ProductMariaDbRepo {
    async fn fetch_many(&self, ids: Vec<u64>) -> DefaultResult<Vec<ProductModel>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let (sql_patt, args) = FetchManyArg(ids).into();
        let mut conn = self.db.acquire().await?;
        let stmt = conn.prepare(sql_patt.as_str()).await?;
        let query = stmt.query_with(args);
        let exec = conn.as_mut();
        let rows = query.fetch_all(exec).await?;
        rows.into_iter()
            .map(ProductModel::try_from)
            .collect::<DefaultResult<Vec<_>, AppError>>()
    }

    async fn save(&self, items: Vec<ProductModel>) -> DefaultResult<(), AppError> {
        if items.is_empty() {
            return Err(AppError {
                code: AppErrorCode::EmptyInputData,
                detail: Some("save-product".to_string()),
            });
        }
        let (sql_patt, args) = UpsertProductArg(items).into();
        let mut conn = self.db.acquire().await?;
        let mut tx = conn.begin().await?;
        let _resultset = run_query_once(&mut tx, sql_patt, args, None).await?;
        tx.commit().await?;
        Ok(())
    }
} // end of impl AbsProductRepo for ProductMariaDbRepo
