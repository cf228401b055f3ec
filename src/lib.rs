use std::sync::atomic::{AtomicBool, AtomicU32};
use std::sync::Arc;

use uuid::{Builder, NoContext, Timestamp, Uuid};

pub mod api;
pub mod confidentiality;
pub mod constant;
pub mod error;
pub mod logging;
pub mod model;
pub mod network;
pub mod repository;
pub mod usecase;

mod config;
pub use config::{
    ApiServerCfg, AppAuthCfg, AppBasepathCfg, AppConfidentialCfg, AppConfig, AppDataStoreCfg,
    AppDbServerCfg, AppInMemoryDbCfg, AppLogHandlerCfg, AppLoggerCfg, AppLoggingCfg,
    WebApiListenCfg, WebApiRouteCfg,
};

mod auth;
pub use auth::{
    AbstractAuthKeystore, AppAuthClaimPermission, AppAuthClaimQuota, AppAuthKeystore,
    AppAuthPermissionCode, AppAuthQuotaMatCode, AppAuthedClaim, AppKeystoreRefreshResult,
    AuthJwtError,
};

mod adapter;
pub use adapter::datastore;

use confidentiality::AbstractConfidentiality;

type WebApiPath = String;
type WebApiHdlrLabel = &'static str;
type AppLogAlias = Arc<String>;

pub struct AppDataStoreContext {
    pub in_mem: Option<Arc<Box<dyn datastore::AbstInMemoryDStore>>>,
    pub sql_dbs: Option<Vec<Arc<datastore::AppMariaDbStore>>>,
}

// global state shared by all threads
pub struct AppSharedState {
    _cfg: Arc<AppConfig>,
    _log: Arc<logging::AppLogContext>,
    dstore: Arc<AppDataStoreContext>,
    _auth_keys: Arc<Box<dyn AbstractAuthKeystore>>,
    _shutdown: Arc<AtomicBool>,
    _num_reqs_processing: Arc<AtomicU32>,
}

impl AppSharedState {
    pub fn new(
        cfg: AppConfig,
        log: logging::AppLogContext,
        confidential: Box<dyn AbstractConfidentiality>,
    ) -> Self {
        // TODO, should return error on invalid key-store config
        let confidential = Arc::new(confidential);
        let log = Arc::new(log);
        let (in_mem, sql_dbs) =
            datastore::build_context(log.clone(), &cfg.api_server.data_store, confidential);
        let in_mem = in_mem.map(Arc::new);
        let sql_dbs = sql_dbs.map(|m| m.into_iter().map(Arc::new).collect());
        let ds_ctx = Arc::new(AppDataStoreContext { in_mem, sql_dbs });
        let auth_keys = AppAuthKeystore::try_create(&cfg.api_server.auth).unwrap();
        Self {
            _cfg: Arc::new(cfg),
            _log: log,
            dstore: ds_ctx,
            _auth_keys: Arc::new(Box::new(auth_keys)),
            _shutdown: Arc::new(AtomicBool::new(false)),
            _num_reqs_processing: Arc::new(AtomicU32::new(0)),
        }
    } // end of fn new

    pub fn config(&self) -> &Arc<AppConfig> {
        &self._cfg
    }

    pub fn log_context(&self) -> &Arc<logging::AppLogContext> {
        &self._log
    }

    pub fn datastore(&self) -> Arc<AppDataStoreContext> {
        self.dstore.clone()
    }

    pub fn auth_keystore(&self) -> Arc<Box<dyn AbstractAuthKeystore>> {
        self._auth_keys.clone()
    }

    pub fn shutdown(&self) -> Arc<AtomicBool> {
        self._shutdown.clone()
    }

    /// return atomic field which represents current number of processing requests
    pub fn num_requests(&self) -> Arc<AtomicU32> {
        self._num_reqs_processing.clone()
    }
} // end of impl AppSharedState

impl Clone for AppSharedState {
    fn clone(&self) -> Self {
        Self {
            _cfg: self._cfg.clone(),
            _log: self._log.clone(),
            dstore: self.dstore.clone(),
            _auth_keys: self._auth_keys.clone(),
            _shutdown: self._shutdown.clone(),
            _num_reqs_processing: self._num_reqs_processing.clone(),
        }
    }
}

fn generate_custom_uid(machine_code: u8) -> Uuid {
    // UUIDv7 suits single-node applications, this one has to stay unique
    // across multiple nodes, UUIDv8 allows a custom layout so one byte of
    // the node field carries the machine code, the rest keeps timestamp
    // with random byte sequence
    let ts_ctx = NoContext;
    let (secs, nano) = Timestamp::now(ts_ctx).to_unix();
    let millis = (secs * 1000).saturating_add((nano as u64) / 1_000_000);
    let mut node_id = rand::random::<[u8; 10]>();
    node_id[0] = machine_code;
    let builder = Builder::from_unix_timestamp_millis(millis, &node_id);
    builder.into_uuid()
}
