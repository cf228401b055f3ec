
use std::boxed::Box;
use std::sync::Arc;

use storefront::datastore::{AbstInMemoryDStore, AppInMemoryDStore};
use storefront::{AppDataStoreContext, AppInMemoryDbCfg};

pub(crate) fn in_mem_ds_ctx_setup(max_items: u32) -> Arc<AppDataStoreContext> {
    let d = AppInMemoryDbCfg {
        alias: "utest".to_string(),
        max_items,
    };
    let obj = AppInMemoryDStore::new(&d);
    let obj: Box<dyn AbstInMemoryDStore> = Box::new(obj);
    Arc::new(AppDataStoreContext {
        in_mem: Some(Arc::new(obj)),
        sql_dbs: None,
    })
}
