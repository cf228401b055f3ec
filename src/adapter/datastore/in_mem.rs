use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::config::AppInMemoryDbCfg;
use crate::error::{AppError, AppErrorCode};

// simple implementation of in-memory data storage, mainly for
// development and automated tests

// application callers are responsible to maintain the structure
// of each row in each table. Each element of a row is stringified
// regardless of its original type (integer, timestamp, decimal)
pub type AppInMemFetchedSingleRow = Vec<String>;
pub type AppInMemFetchedSingleTable = HashMap<String, AppInMemFetchedSingleRow>;
type AllTable = HashMap<String, AppInMemFetchedSingleTable>;
pub type AppInMemUpdateData = AllTable;
pub type AppInMemDeleteInfo = AppInMemFetchedSingleTable; // list of IDs per table
pub type AppInMemFetchKeys = AppInMemFetchedSingleTable; // list of IDs per table
pub type AppInMemFetchedData = AllTable;

// the callback returns whether the modified row should be written back,
// declared as plain function pointer so the trait stays object-safe
pub type AppInMemRowUpdateFn = fn(&mut AppInMemFetchedSingleRow) -> bool;

// filter objects cross await points while borrowed, so they must be Sync
pub trait AbsDStoreFilterKeyOp: Sync {
    fn filter(&self, k: &String, v: &AppInMemFetchedSingleRow) -> bool;
}

#[async_trait]
pub trait AbstInMemoryDStore: Send + Sync {
    async fn create_table(&self, label: &str) -> DefaultResult<(), AppError>;

    async fn save(&self, data: AppInMemUpdateData) -> DefaultResult<usize, AppError>;

    async fn delete(&self, info: AppInMemDeleteInfo) -> DefaultResult<usize, AppError>;

    async fn fetch(&self, keys: AppInMemFetchKeys) -> DefaultResult<AppInMemFetchedData, AppError>;

    async fn fetch_all(
        &self,
        table: String,
    ) -> DefaultResult<AppInMemFetchedSingleTable, AppError>;

    async fn filter_keys(
        &self,
        table: String,
        op: &dyn AbsDStoreFilterKeyOp,
    ) -> DefaultResult<Vec<String>, AppError>;

    // read-modify-write on a single row while the table-level lock is held,
    // this is the primitive for conditional updates such as usage counters
    async fn fetch_update_one(
        &self,
        table: String,
        key: String,
        usr_cb: AppInMemRowUpdateFn,
    ) -> DefaultResult<bool, AppError>;
}

pub struct AppInMemoryDStore {
    max_items_per_table: u32,
    table_map: Mutex<AllTable>,
}

impl AppInMemoryDStore {
    pub fn new(cfg: &AppInMemoryDbCfg) -> Self {
        let t_map = Mutex::new(HashMap::new());
        Self {
            table_map: t_map,
            max_items_per_table: cfg.max_items,
        }
    }

    fn try_get_table(&self) -> DefaultResult<MutexGuard<AllTable>, AppError> {
        match self.table_map.lock() {
            Ok(guard) => Ok(guard),
            Err(e) => Err(AppError {
                detail: Some(e.to_string()),
                code: AppErrorCode::AcquireLockFailure,
            }),
        }
    }

    fn _check_capacity(&self, _map: &AllTable) -> DefaultResult<(), AppError> {
        let mut invalid = _map
            .iter()
            .filter(|(_, table)| self.max_items_per_table as usize <= table.len());
        if let Some((label, _)) = invalid.next() {
            let msg = format!("{}, {}, {}", module_path!(), line!(), label);
            Err(AppError {
                detail: Some(msg),
                code: AppErrorCode::ExceedingMaxLimit,
            })
        } else {
            Ok(())
        }
    }

    fn _check_table_existence(_map: &AllTable, keys: Vec<&String>) -> DefaultResult<(), AppError> {
        let mut invalid = keys.iter().filter(|label| !_map.contains_key(label.as_str()));
        if let Some(d) = invalid.next() {
            Err(AppError {
                detail: Some(d.to_string()),
                code: AppErrorCode::DataTableNotExist,
            })
        } else {
            Ok(())
        }
    }
} // end of impl AppInMemoryDStore

#[async_trait]
impl AbstInMemoryDStore for AppInMemoryDStore {
    async fn create_table(&self, label: &str) -> DefaultResult<(), AppError> {
        let mut _map = self.try_get_table()?;
        if !_map.contains_key(label) {
            let newtable = HashMap::new();
            _map.insert(label.to_string(), newtable);
        }
        Ok(())
    }

    async fn save(&self, data: AppInMemUpdateData) -> DefaultResult<usize, AppError> {
        let mut _map = self.try_get_table()?;
        let unchecked_labels = data.keys().collect::<Vec<&String>>();
        Self::_check_table_existence(&_map, unchecked_labels)?;
        self._check_capacity(&_map)?;
        let tot_cnt = data
            .iter()
            .map(|(label, d_grp)| {
                let table = _map.get_mut(label.as_str()).unwrap();
                d_grp
                    .iter()
                    .map(|(id, row)| {
                        table.insert(id.clone(), row.clone());
                    })
                    .count()
            })
            .sum();
        self._check_capacity(&_map)?;
        Ok(tot_cnt)
    } // end of fn save

    async fn delete(&self, info: AppInMemDeleteInfo) -> DefaultResult<usize, AppError> {
        let mut _map = self.try_get_table()?;
        let unchecked_labels = info.keys().collect::<Vec<&String>>();
        Self::_check_table_existence(&_map, unchecked_labels)?;
        let tot_cnt = info
            .iter()
            .map(|(label, ids)| {
                let table = _map.get_mut(label.as_str()).unwrap();
                ids.iter()
                    .map(|id| {
                        table.remove(id);
                    })
                    .count()
            })
            .sum();
        Ok(tot_cnt)
    }

    async fn fetch(&self, keys: AppInMemFetchKeys) -> DefaultResult<AppInMemFetchedData, AppError> {
        let _map = self.try_get_table()?;
        let unchecked_labels = keys.keys().collect::<Vec<&String>>();
        Self::_check_table_existence(&_map, unchecked_labels)?;
        let rs_a = keys
            .iter()
            .map(|(label, ids)| {
                let table = _map.get(label.as_str()).unwrap();
                let rs_t = ids
                    .iter()
                    .filter(|id| table.contains_key(id.as_str()))
                    .map(|id| {
                        let row = table.get(id).unwrap();
                        (id.clone(), row.clone())
                    })
                    .collect::<AppInMemFetchedSingleTable>();
                (label.clone(), rs_t)
            })
            .collect::<Vec<(String, AppInMemFetchedSingleTable)>>();
        let rs_a = HashMap::from_iter(rs_a);
        Ok(rs_a)
    }

    async fn fetch_all(
        &self,
        table: String,
    ) -> DefaultResult<AppInMemFetchedSingleTable, AppError> {
        let _map = self.try_get_table()?;
        Self::_check_table_existence(&_map, vec![&table])?;
        let t = _map.get(table.as_str()).unwrap();
        Ok(t.clone())
    }

    async fn filter_keys(
        &self,
        table: String,
        op: &dyn AbsDStoreFilterKeyOp,
    ) -> DefaultResult<Vec<String>, AppError> {
        let _map = self.try_get_table()?;
        Self::_check_table_existence(&_map, vec![&table])?;
        let t = _map.get(table.as_str()).unwrap();
        let out = t
            .iter()
            .filter(|(k, v)| op.filter(k, v))
            .map(|(k, _v)| k.clone())
            .collect();
        Ok(out)
    }

    async fn fetch_update_one(
        &self,
        table: String,
        key: String,
        usr_cb: AppInMemRowUpdateFn,
    ) -> DefaultResult<bool, AppError> {
        let mut _map = self.try_get_table()?;
        Self::_check_table_existence(&_map, vec![&table])?;
        let t = _map.get_mut(table.as_str()).unwrap();
        if let Some(row) = t.get_mut(key.as_str()) {
            let mut modifying = row.clone();
            if usr_cb(&mut modifying) {
                *row = modifying;
                Ok(true)
            } else {
                Ok(false)
            }
        } else {
            Ok(false)
        }
    } // the table lock is held for the whole read-modify-write cycle
} // end of impl AppInMemoryDStore
