use std::borrow::BorrowMut;
use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::result::Result as DefaultResult;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, FixedOffset, Local as LocalTime};
use http::request::Parts;
use http::{header, StatusCode, Uri};
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode as jwt_decode, decode_header, DecodingKey, Validation as JwtValidation};
use serde::de::{Error as DeserializeError, Expected, Unexpected};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio::task;

use crate::config::AppAuthCfg;
use crate::constant::{app_meta, HTTP_CONTENT_TYPE_JSON};
use crate::error::{AppError, AppErrorCode};
use crate::AppSharedState;

const MAX_NBYTES_LOADED_RESPONSE_KEYSTORE: usize = 102400;

#[async_trait]
pub trait AbstractAuthKeystore: Sync + Send {
    fn update_period(&self) -> Duration;

    async fn refresh(&self) -> DefaultResult<AppKeystoreRefreshResult, AppError>;

    async fn find(&self, kid: &str) -> DefaultResult<Jwk, AppError>;
}

pub struct AppAuthKeystore {
    update_period: Duration,
    url: Uri,
    inner: RwLock<InnerKeystoreContext>,
}
struct InnerKeystoreContext {
    keyset: JwkSet,
    last_update: DateTime<FixedOffset>,
}
pub struct AppKeystoreRefreshResult {
    // number of minutes to next refresh operation
    pub period_next_op: Duration,
    pub num_discarded: usize,
    pub num_added: usize,
}

impl AppAuthKeystore {
    pub fn try_create(cfg: &AppAuthCfg) -> DefaultResult<Self, AppError> {
        let update_period = Duration::minutes(cfg.update_interval_minutes as i64);
        // caller can start refresh operation immediately after initialization
        let last_update = LocalTime::now().fixed_offset() - update_period - Duration::seconds(5);
        let url = cfg.keystore_url.parse::<Uri>().map_err(|e| AppError {
            detail: Some(e.to_string()),
            code: AppErrorCode::InvalidRouteConfig,
        })?;
        if url.host().is_none() || url.port_u16().is_none() {
            return Err(AppError {
                detail: Some(format!("host-or-port-missing, {}", cfg.keystore_url)),
                code: AppErrorCode::InvalidRouteConfig,
            });
        }
        let inner = InnerKeystoreContext {
            keyset: JwkSet { keys: Vec::new() },
            last_update,
        };
        Ok(Self {
            inner: RwLock::new(inner),
            update_period,
            url,
        })
    } // end of fn try_create

    async fn request_new_keys(&self) -> DefaultResult<JwkSet, AppError> {
        // TODO, config parameter for http version
        let addr = (self.url.host().unwrap(), self.url.port_u16().unwrap());
        let stream = TcpStream::connect(addr).await.map_err(|net_e| AppError {
            detail: Some(net_e.to_string()),
            code: AppErrorCode::IOerror(net_e.kind()),
        })?;
        let io_adapter = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, connector) = hyper::client::conn::http1::handshake(io_adapter)
            .await
            .map_err(|net_e| AppError {
                detail: Some(net_e.to_string()),
                code: AppErrorCode::from(&net_e),
            })?;
        // the low-level connection processes inbound / outbound messages
        // in a separate task
        let _handle = task::spawn(connector);
        let req = hyper::Request::get(self.url.path())
            .header(header::ACCEPT, HTTP_CONTENT_TYPE_JSON)
            .body(Empty::<Bytes>::default())
            .map_err(|e| AppError {
                detail: Some(e.to_string()),
                code: AppErrorCode::InvalidInput,
            })?;
        let mut resp = sender.send_request(req).await.map_err(|net_e| AppError {
            detail: Some(net_e.to_string()),
            code: AppErrorCode::from(&net_e),
        })?;
        if resp.status() != StatusCode::OK {
            return Err(AppError {
                detail: Some(format!("remote-key-server-response-status:{}", resp.status())),
                code: AppErrorCode::IOerror(ErrorKind::ConnectionRefused),
            });
        }
        let mut raw_collected = Vec::<u8>::new();
        while let Some(nxt) = resp.frame().await {
            let frm = nxt.map_err(|net_e| AppError {
                detail: Some(net_e.to_string()),
                code: AppErrorCode::from(&net_e),
            })?;
            let newchunk = frm.into_data().map_err(|frm| AppError {
                detail: Some(format!("{:?}", frm)),
                code: AppErrorCode::DataCorruption,
            })?;
            raw_collected.extend(newchunk.to_vec());
            if raw_collected.len() > MAX_NBYTES_LOADED_RESPONSE_KEYSTORE {
                return Err(AppError {
                    detail: Some("auth-keys-resp-body".to_string()),
                    code: AppErrorCode::ExceedingMaxLimit,
                });
            }
        } // end of loop
        serde_json::from_slice::<JwkSet>(raw_collected.as_slice()).map_err(|e| AppError {
            detail: Some(e.to_string()),
            code: AppErrorCode::DataCorruption,
        })
    } // end of fn request_new_keys

    pub fn merge(target: &mut JwkSet, new: JwkSet) -> (usize, usize) {
        // items without key ID are silently dropped, in this application
        // the key ID must be present
        let clone_kid = |item: &Jwk| -> Option<String> { item.common.key_id.clone() };
        let kids_iter_1 = target.keys.iter().filter_map(clone_kid);
        let kids_iter_2 = new.keys.iter().filter_map(clone_kid);
        let kidset1: HashSet<String, RandomState> = HashSet::from_iter(kids_iter_1);
        let kidset2 = HashSet::from_iter(kids_iter_2);
        let added = kidset2.difference(&kidset1).collect::<Vec<_>>();
        let discarding = kidset1.difference(&kidset2).collect::<Vec<_>>();
        let out = (discarding.len(), added.len());
        let _discarded = discarding
            .into_iter()
            .filter_map(|del_kid| {
                target
                    .keys
                    .iter()
                    .position(|item| {
                        item.common
                            .key_id
                            .as_ref()
                            .map_or(false, |t_kid| del_kid.as_str() == t_kid.as_str())
                    })
                    .map(|idx| target.keys.remove(idx))
            })
            .collect::<Vec<_>>();
        let new_iter = new.keys.into_iter().filter(|item| {
            item.common
                .key_id
                .as_ref()
                .map_or(false, |id| added.contains(&id))
        });
        target.keys.extend(new_iter);
        out
    } // end of fn merge
} // end of impl AppAuthKeystore

#[async_trait]
impl AbstractAuthKeystore for AppAuthKeystore {
    fn update_period(&self) -> Duration {
        self.update_period
    }

    async fn refresh(&self) -> DefaultResult<AppKeystoreRefreshResult, AppError> {
        let mut guard = self.inner.write().await;
        let ctx = guard.borrow_mut();
        let expect_time = ctx.last_update + self.update_period;
        let t0 = LocalTime::now().fixed_offset();
        // this ensures there is only one task refreshing the key store
        // in multithreaded application
        if t0 > expect_time {
            let newkeys = self.request_new_keys().await?;
            let (num_discarded, num_added) = Self::merge(&mut ctx.keyset, newkeys);
            ctx.last_update = t0;
            Ok(AppKeystoreRefreshResult {
                num_discarded,
                num_added,
                period_next_op: self.update_period,
            })
        } else {
            let period_next_op = expect_time - t0;
            Ok(AppKeystoreRefreshResult {
                period_next_op,
                num_discarded: 0,
                num_added: 0,
            })
        }
    }

    async fn find(&self, kid: &str) -> DefaultResult<Jwk, AppError> {
        let guard = self.inner.read().await;
        guard.keyset.find(kid).cloned().ok_or(AppError {
            detail: Some(kid.to_string()),
            code: AppErrorCode::MissingAuthKey,
        })
    }
} // end of impl AbstractAuthKeystore for AppAuthKeystore

impl From<&hyper::Error> for AppErrorCode {
    fn from(value: &hyper::Error) -> Self {
        if value.is_parse() || value.is_incomplete_message() {
            Self::DataCorruption
        } else if value.is_parse_too_large() {
            Self::ExceedingMaxLimit
        } else if value.is_user() {
            Self::IOerror(ErrorKind::InvalidInput)
        } else if value.is_timeout() {
            Self::IOerror(ErrorKind::TimedOut)
        } else if value.is_canceled() {
            Self::IOerror(ErrorKind::Interrupted)
        } else {
            Self::IOerror(ErrorKind::Other)
        }
    }
}

#[allow(non_camel_case_types)]
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAuthPermissionCode {
    can_manage_promo_code,
}

#[derive(Debug, Clone, Copy)]
pub enum AppAuthQuotaMatCode {
    NumPromoCodes,
}

#[derive(Deserialize, Serialize)]
pub struct AppAuthClaimPermission {
    #[serde(deserialize_with = "AppAuthedClaim::_jsn_validate_ap_code")]
    pub app_code: u8,
    pub codename: AppAuthPermissionCode,
}
#[derive(Deserialize, Serialize)]
pub struct AppAuthClaimQuota {
    #[serde(deserialize_with = "AppAuthedClaim::_jsn_validate_ap_code")]
    pub app_code: u8,
    pub mat_code: AppAuthQuotaMatCode,
    pub maxnum: u32,
}
#[derive(Deserialize, Serialize)]
pub struct AppAuthedClaim {
    pub profile: u32,
    pub iat: i64,
    pub exp: i64, // TODO, add timezone
    pub aud: Vec<String>,
    pub perms: Vec<AppAuthClaimPermission>,
    pub quota: Vec<AppAuthClaimQuota>,
}

struct ExpectValidApCode;

impl Expected for ExpectValidApCode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        let msg = format!(
            "application code {} for `{}`",
            app_meta::RESOURCE_QUOTA_AP_CODE,
            app_meta::LABEL
        );
        formatter.write_str(msg.as_str())
    }
}

impl AppAuthedClaim {
    fn _jsn_validate_ap_code<'de, D>(raw: D) -> DefaultResult<u8, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let val = u8::deserialize(raw)?;
        if val == app_meta::RESOURCE_QUOTA_AP_CODE {
            Ok(val)
        } else {
            let unexp = Unexpected::Unsigned(val as u64);
            Err(DeserializeError::invalid_value(unexp, &ExpectValidApCode))
        }
    }

    pub fn contain_permission(&self, code: AppAuthPermissionCode) -> bool {
        self.perms.iter().any(|p| p.codename == code)
    }

    // zero means the claim does not grant the given material type at all
    pub fn quota_limit(&self, mat_code: AppAuthQuotaMatCode) -> u32 {
        self.quota
            .iter()
            .filter(|q| u8::from(q.mat_code) == u8::from(mat_code))
            .map(|q| q.maxnum)
            .max()
            .unwrap_or(0)
    }
} // end of impl AppAuthedClaim

impl TryFrom<u8> for AppAuthQuotaMatCode {
    type Error = u8;
    fn try_from(value: u8) -> DefaultResult<Self, Self::Error> {
        match value {
            1 => Ok(Self::NumPromoCodes),
            _others => Err(value),
        }
    }
}
impl From<AppAuthQuotaMatCode> for u8 {
    fn from(value: AppAuthQuotaMatCode) -> u8 {
        match value {
            AppAuthQuotaMatCode::NumPromoCodes => 1,
        }
    }
}

struct ExpectQuotaMatCodeRange;

impl Expected for ExpectQuotaMatCodeRange {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("quota material code in range [1, 1]")
    }
}

impl<'de> Deserialize<'de> for AppAuthQuotaMatCode {
    fn deserialize<D>(raw: D) -> DefaultResult<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let val = u8::deserialize(raw)?;
        Self::try_from(val).map_err(|val| {
            let unexp = Unexpected::Unsigned(val as u64);
            DeserializeError::invalid_value(unexp, &ExpectQuotaMatCodeRange)
        })
    }
}
impl Serialize for AppAuthQuotaMatCode {
    fn serialize<S>(&self, serializer: S) -> DefaultResult<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(u8::from(*self))
    }
}

#[derive(Debug, Clone)]
pub enum AuthJwtError {
    MissingCredential,
    MissingKeyId,
    MissingAuthKey,
    KeystoreUnknown,
    VerifyFailure(JwtErrorKind),
}

impl IntoResponse for AuthJwtError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingCredential | Self::MissingKeyId | Self::MissingAuthKey => {
                StatusCode::UNAUTHORIZED
            }
            Self::VerifyFailure(ekind) => match ekind {
                JwtErrorKind::Json(_d) => StatusCode::BAD_REQUEST,
                JwtErrorKind::MissingRequiredClaim(_d) => StatusCode::UNAUTHORIZED,
                JwtErrorKind::InvalidToken => StatusCode::BAD_REQUEST,
                JwtErrorKind::InvalidAudience
                | JwtErrorKind::InvalidIssuer
                | JwtErrorKind::ExpiredSignature
                | JwtErrorKind::InvalidSignature
                | JwtErrorKind::InvalidAlgorithmName => StatusCode::UNAUTHORIZED,
                _others => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::KeystoreUnknown => StatusCode::INTERNAL_SERVER_ERROR,
        };
        status.into_response()
    }
} // end of impl AuthJwtError

impl From<JwtError> for AuthJwtError {
    fn from(value: JwtError) -> Self {
        Self::VerifyFailure(value.into_kind())
    }
}

impl From<AppError> for AuthJwtError {
    fn from(value: AppError) -> Self {
        match value.code {
            AppErrorCode::MissingAuthKey => Self::MissingAuthKey,
            _others => Self::KeystoreUnknown,
        }
    }
}

pub async fn validate_token(
    keystore: &dyn AbstractAuthKeystore,
    encoded: &str,
) -> DefaultResult<AppAuthedClaim, AuthJwtError> {
    let hdr = decode_header(encoded)?;
    let key_id = hdr.kid.as_deref().ok_or(AuthJwtError::MissingKeyId)?;
    let jwk = keystore.find(key_id).await?;
    let key = DecodingKey::from_jwk(&jwk)?;
    let validator = {
        let aud = [app_meta::LABEL];
        let required_claims = ["profile", "aud", "exp", "iat", "perms", "quota"];
        let mut v = JwtValidation::new(hdr.alg);
        v.set_audience(&aud);
        v.set_required_spec_claims(&required_claims);
        v
    };
    let decoded = jwt_decode::<AppAuthedClaim>(encoded, &key, &validator)?;
    Ok(decoded.claims)
} // end of fn validate_token

#[async_trait]
impl FromRequestParts<AppSharedState> for AppAuthedClaim {
    type Rejection = AuthJwtError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppSharedState,
    ) -> DefaultResult<Self, Self::Rejection> {
        let encoded = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AuthJwtError::MissingCredential)?;
        let keystore = state.auth_keystore();
        validate_token(keystore.as_ref().as_ref(), encoded).await
    }
} // end of impl FromRequestParts for AppAuthedClaim
