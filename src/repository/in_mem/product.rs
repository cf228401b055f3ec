use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::datastore::{AbstInMemoryDStore, AppInMemFetchedSingleRow};
use crate::error::{AppError, AppErrorCode};
use crate::model::ProductModel;
use crate::repository::AbsProductRepo;

const TABLE_LABEL: &str = "product_catalog";

enum InMemColIdx {
    Name,
    CategoryId,
    CategoryName,
    Variations,
    TotNumColumns,
}

impl From<InMemColIdx> for usize {
    fn from(value: InMemColIdx) -> usize {
        match value {
            InMemColIdx::Name => 0,
            InMemColIdx::CategoryId => 1,
            InMemColIdx::CategoryName => 2,
            InMemColIdx::Variations => 3,
            InMemColIdx::TotNumColumns => 4,
        }
    }
}

pub struct ProductInMemRepo {
    datastore: Arc<Box<dyn AbstInMemoryDStore>>,
}

impl ProductInMemRepo {
    pub async fn new(m: Arc<Box<dyn AbstInMemoryDStore>>) -> DefaultResult<Self, AppError> {
        m.create_table(TABLE_LABEL).await?;
        Ok(Self { datastore: m })
    }

    fn render_row(m: &ProductModel) -> AppInMemFetchedSingleRow {
        let num_cols: usize = InMemColIdx::TotNumColumns.into();
        let mut row = (0..num_cols).map(|_n| String::new()).collect::<Vec<_>>();
        let _ = [
            (InMemColIdx::Name, m.name.clone()),
            (
                InMemColIdx::CategoryId,
                m.category_id.map(|v| v.to_string()).unwrap_or_default(),
            ),
            (
                InMemColIdx::CategoryName,
                m.category_name.clone().unwrap_or_default(),
            ),
            (
                InMemColIdx::Variations,
                ProductModel::render_variations(&m.variations),
            ),
        ]
        .into_iter()
        .map(|(idx, val)| {
            let idx: usize = idx.into();
            row[idx] = val;
        })
        .count();
        row
    }

    fn parse_row(
        key: &str,
        row: &AppInMemFetchedSingleRow,
    ) -> DefaultResult<ProductModel, AppError> {
        let corrupt = |field: &str| AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(format!("product-row-field: {field}")),
        };
        let id = key.parse::<u64>().map_err(|_e| corrupt("id"))?;
        let getcol = |idx: InMemColIdx| -> &str {
            let idx: usize = idx.into();
            row.get(idx).map(String::as_str).unwrap_or("")
        };
        let category_id = {
            let raw = getcol(InMemColIdx::CategoryId);
            if raw.is_empty() {
                None
            } else {
                let v = raw.parse::<u32>().map_err(|_e| corrupt("category-id"))?;
                Some(v)
            }
        };
        let category_name = {
            let raw = getcol(InMemColIdx::CategoryName);
            if raw.is_empty() {
                None
            } else {
                Some(raw.to_string())
            }
        };
        Ok(ProductModel {
            id,
            name: getcol(InMemColIdx::Name).to_string(),
            category_id,
            category_name,
            variations: ProductModel::parse_variations(getcol(InMemColIdx::Variations)),
        })
    } // end of fn parse_row
} // end of impl ProductInMemRepo

#[async_trait]
impl AbsProductRepo for ProductInMemRepo {
    async fn fetch_many(&self, ids: Vec<u64>) -> DefaultResult<Vec<ProductModel>, AppError> {
        let allkeys = ids.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        let mut info = HashMap::new();
        info.insert(TABLE_LABEL.to_string(), allkeys);
        let mut raw = self.datastore.fetch(info).await?;
        let table = raw.remove(TABLE_LABEL).unwrap_or_default();
        let out = table
            .iter()
            .map(|(key, row)| Self::parse_row(key.as_str(), row))
            .collect::<DefaultResult<Vec<_>, AppError>>()?;
        Ok(out)
    }

    async fn save(&self, items: Vec<ProductModel>) -> DefaultResult<(), AppError> {
        if items.is_empty() {
            return Err(AppError {
                code: AppErrorCode::EmptyInputData,
                detail: Some("save-product".to_string()),
            });
        }
        let kv_pairs = items.iter().map(|m| (m.id.to_string(), Self::render_row(m)));
        let rows = HashMap::from_iter(kv_pairs);
        let mut data = HashMap::new();
        data.insert(TABLE_LABEL.to_string(), rows);
        let _num = self.datastore.save(data).await?;
        Ok(())
    }
} // end of impl AbsProductRepo for ProductInMemRepo
