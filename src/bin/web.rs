use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::env;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::runtime::Builder as RuntimeBuilder;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::map_response_body::MapResponseBodyLayer;

use storefront::api::web::route_table;
use storefront::confidentiality::{self, AbstractConfidentiality};
use storefront::constant::EXPECTED_ENV_VAR_LABELS;
use storefront::logging::{app_log_event, AppLogContext, AppLogLevel};
use storefront::network::{app_web_service, middleware, net_listener};
use storefront::{AppConfig, AppSharedState};

fn start_keystore_refresh(shr_state: &AppSharedState) {
    let keystore = shr_state.auth_keystore();
    let log_ctx = shr_state.log_context().clone();
    tokio::task::spawn(async move {
        loop {
            let wait_secs = match keystore.refresh().await {
                Ok(r) => {
                    if r.num_added > 0 || r.num_discarded > 0 {
                        app_log_event!(
                            log_ctx,
                            AppLogLevel::INFO,
                            "auth keys refreshed, added:{}, discarded:{}",
                            r.num_added,
                            r.num_discarded
                        );
                    }
                    r.period_next_op.num_seconds().max(1) as u64
                }
                Err(e) => {
                    app_log_event!(log_ctx, AppLogLevel::WARNING, "auth key refresh, {:?}", e);
                    keystore.update_period().num_seconds().max(1) as u64
                }
            };
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }
    });
} // end of fn start_keystore_refresh

async fn wait_for_shutdown(shr_state: AppSharedState) {
    let log_ctx = shr_state.log_context().clone();
    if let Err(e) = tokio::signal::ctrl_c().await {
        app_log_event!(log_ctx, AppLogLevel::ERROR, "shutdown signal, {:?}", e);
    }
    shr_state.shutdown().store(true, Ordering::Relaxed);
    let num_reqs = shr_state.num_requests();
    while num_reqs.load(Ordering::Relaxed) > 0 {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    app_log_event!(log_ctx, AppLogLevel::INFO, "all in-flight requests done");
}

async fn start_server(shr_state: AppSharedState) {
    let log_ctx_p = shr_state.log_context().clone();
    let cfg = shr_state.config().clone();
    let routes = route_table();
    let listener_cfg = &cfg.api_server.listen;
    let (service, num_applied) = app_web_service(listener_cfg, routes, shr_state.clone());
    if num_applied == 0 {
        app_log_event!(
            log_ctx_p,
            AppLogLevel::ERROR,
            "no route created, web API server failed to start"
        );
        return;
    }
    start_keystore_refresh(&shr_state);
    let result = net_listener(listener_cfg.host.clone(), listener_cfg.port).await;
    match result {
        Ok(tcp_listener) => {
            let reqlm = middleware::req_body_limit(cfg.api_server.limit_req_body_in_bytes);
            let cors_cfg_fullpath =
                cfg.basepath.system.clone() + "/" + listener_cfg.cors.as_str();
            let co = match middleware::cors(cors_cfg_fullpath) {
                Ok(v) => v,
                Err(e) => {
                    app_log_event!(
                        log_ctx_p,
                        AppLogLevel::ERROR,
                        "cors layer init error, detail: {:?}",
                        e
                    );
                    CorsLayer::new()
                }
            };
            let sh_detect = middleware::ShutdownDetectionLayer::new(
                shr_state.shutdown(),
                shr_state.num_requests(),
            );
            // shutdown detection has to stay innermost, right above the final
            // route whose response body type it expects, the map-layer converts
            // its body type back before the other layers see the response
            let middlewares = ServiceBuilder::new()
                .layer(reqlm)
                .layer(co)
                .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                .layer(sh_detect);
            let final_service = service.layer(middlewares);
            let ratelm = middleware::rate_limit(listener_cfg.max_connections);
            let make_service = ServiceBuilder::new()
                .layer(ratelm) // rate-limit layer is not allowed to clone
                .service(final_service.into_make_service());
            let sr = axum::serve(tcp_listener, make_service)
                .with_graceful_shutdown(wait_for_shutdown(shr_state));
            let _ = sr.await;
            app_log_event!(log_ctx_p, AppLogLevel::WARNING, "API server terminating ");
        }
        Err(e) => {
            app_log_event!(
                log_ctx_p,
                AppLogLevel::ERROR,
                "API server failed to start, {} ",
                e
            );
        }
    }
} // end of fn start_server

fn start_async_runtime(cfg: AppConfig, confidential: Box<dyn AbstractConfidentiality>) {
    let log_ctx = AppLogContext::new(&cfg.basepath, &cfg.api_server.logging);
    let shr_state = AppSharedState::new(cfg, log_ctx, confidential);
    let cfg = shr_state.config();
    let log_ctx = shr_state.log_context().clone();
    let log_ctx2 = log_ctx.clone();
    let stack_nbytes: usize = (cfg.api_server.stack_sz_kb as usize) << 10;
    let result = RuntimeBuilder::new_multi_thread()
        .worker_threads(cfg.api_server.num_workers as usize)
        .on_thread_start(move || {
            // invoked once per spawned worker thread, everything moved
            // into this closure has to be clonable
            let log_cpy = log_ctx.clone();
            app_log_event!(log_cpy, AppLogLevel::INFO, "[API server] worker started");
        })
        .on_thread_stop(move || {
            let log_cpy = log_ctx2.clone();
            app_log_event!(log_cpy, AppLogLevel::INFO, "[API server] worker terminating");
        })
        .thread_stack_size(stack_nbytes)
        .thread_name("web-api-worker")
        // manage low-level I/O drivers used by network types
        .enable_io()
        // rate limiter in crate `tower` requires the timer in the runtime builder
        .enable_time()
        .build();
    match result {
        Ok(rt) => {
            // new worker threads spawned
            rt.block_on(async move {
                start_server(shr_state).await;
            }); // runtime started
        }
        Err(e) => {
            let log_ctx_p = shr_state.log_context();
            app_log_event!(
                log_ctx_p,
                AppLogLevel::ERROR,
                "async runtime failed to build, {} ",
                e
            );
        }
    };
} // end of fn start_async_runtime

fn main() {
    let iter = env::vars().filter(|(k, _v)| EXPECTED_ENV_VAR_LABELS.contains(&k.as_str()));
    let arg_map: HashMap<String, String, RandomState> = HashMap::from_iter(iter);
    match AppConfig::new(arg_map) {
        Ok(cfg) => match confidentiality::build_context(&cfg) {
            Ok(confidential) => start_async_runtime(cfg, confidential),
            Err(e) => {
                println!("app failed to init confidentiality handler, error code: {e} ");
            }
        },
        Err(e) => {
            println!("app failed to configure, error code: {e} ");
        }
    };
} // end of main
