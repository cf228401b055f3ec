pub mod app_meta {
    pub const LABEL: &'static str = "storefront";
    pub const MACHINE_CODE: u8 = 1;
    // TODO, machine code to UUID generator should be configurable
    pub const RESOURCE_QUOTA_AP_CODE: u8 = 6;
}

pub const ENV_VAR_SYS_BASE_PATH: &'static str = "SYS_BASE_PATH";
pub const ENV_VAR_SERVICE_BASE_PATH: &'static str = "SERVICE_BASE_PATH";
pub const ENV_VAR_CONFIG_FILE_PATH: &'static str = "CONFIG_FILE_PATH";

pub const EXPECTED_ENV_VAR_LABELS: [&'static str; 3] = [
    ENV_VAR_SYS_BASE_PATH,
    ENV_VAR_SERVICE_BASE_PATH,
    ENV_VAR_CONFIG_FILE_PATH,
];

pub mod hard_limit {
    pub const MAX_ITEMS_STORED_PER_MODEL: u32 = 2200u32;
    pub const MAX_ITEMS_PER_CART_REQ: usize = 200;
    pub const MAX_NUM_PRODUCT_IDS_PER_REQ: usize = 40;
    pub const MAX_DB_CONNECTIONS: u32 = 10000u32;
    pub const MAX_SECONDS_DB_IDLE: u16 = 600u16;
    pub const MIN_DISCOUNT_PERCENT: u8 = 1;
    pub const MAX_DISCOUNT_PERCENT: u8 = 100;
}

pub(crate) mod api {
    use crate::WebApiHdlrLabel;

    #[allow(non_camel_case_types)]
    pub(crate) struct web {}

    impl web {
        pub(crate) const VALIDATE_PROMO_CODE: WebApiHdlrLabel = "validate_promo_code";
        pub(crate) const LIST_PROMO_CODES: WebApiHdlrLabel = "list_promo_codes";
        pub(crate) const CREATE_PROMO_CODE: WebApiHdlrLabel = "create_promo_code";
        pub(crate) const TOGGLE_PROMO_CODE: WebApiHdlrLabel = "toggle_promo_code";
        pub(crate) const DELETE_PROMO_CODE: WebApiHdlrLabel = "delete_promo_code";
        pub(crate) const REDEEM_PROMO_CODE: WebApiHdlrLabel = "redeem_promo_code";
        pub(crate) const BATCH_READ_PRODUCTS: WebApiHdlrLabel = "batch_read_products";
    }
} // end of inner-mod api

pub(crate) const HTTP_CONTENT_TYPE_JSON: &str = "application/json";

pub(crate) mod logging {
    use serde::Deserialize;

    #[derive(Deserialize)]
    pub enum Level {
        TRACE,
        DEBUG,
        INFO,
        WARNING,
        ERROR,
        FATAL,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Destination {
        CONSOLE,
        LOCALFS,
    } // TODO, Fluentd
}
