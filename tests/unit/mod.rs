mod model;
mod repository;
mod usecase;

use std::sync::Arc;

use storefront::logging::AppLogContext;
use storefront::{AppBasepathCfg, AppLoggingCfg};

// logger without any configured handler, events fall back to stdout,
// good enough for exercising use-case code paths
pub(crate) fn ut_logctx() -> Arc<AppLogContext> {
    let basepath = AppBasepathCfg {
        system: String::new(),
        service: String::new(),
    };
    let cfg = AppLoggingCfg {
        handlers: Vec::new(),
        loggers: Vec::new(),
    };
    Arc::new(AppLogContext::new(&basepath, &cfg))
}
