use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use lustre_core::{AppConfig, Environment};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const ADMIN_SESSION_COOKIE: &str = "admin_session";
const ADMIN_SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

struct AdminCredentials {
    password: String,
    session_token: String,
}

impl AdminCredentials {
    fn new(password: &str, session_secret: &str) -> Self {
        let digest = Sha256::digest(format!("{session_secret}:{password}").as_bytes());
        Self {
            password: password.to_owned(),
            session_token: format!("{digest:x}"),
        }
    }
}

/// Admin gate settings used by middleware and the session handlers.
///
/// A request is an admin request when it carries a known bearer key or the
/// `admin_session` cookie issued by a successful password login.
#[derive(Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    admin: Option<Arc<AdminCredentials>>,
    secure_cookies: bool,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `LUSTRE_API_KEYS` (comma-separated bearer
    /// tokens) and the admin password in `config`.
    ///
    /// In development, having neither disables the admin gate for local
    /// iteration. In non-development envs it fails startup.
    pub fn from_env(config: &AppConfig) -> anyhow::Result<Self> {
        let raw = std::env::var("LUSTRE_API_KEYS").unwrap_or_default();
        let keys = parse_api_keys(&raw);

        let Some(password) = config.admin_password.as_deref() else {
            if !keys.is_empty() {
                return Ok(Self::new(keys, None, "", false));
            }
            if config.env == Environment::Development {
                tracing::warn!(
                    "LUSTRE_API_KEYS and LUSTRE_ADMIN_PASSWORD not set; admin gate disabled in development environment"
                );
                return Ok(Self::disabled());
            }
            anyhow::bail!(
                "LUSTRE_ADMIN_PASSWORD or LUSTRE_API_KEYS is required outside development"
            );
        };

        let secret = config.session_secret.as_deref().unwrap_or_default();
        Ok(Self::new(
            keys,
            Some(password),
            secret,
            config.env == Environment::Production,
        ))
    }

    #[must_use]
    pub fn new(
        api_keys: HashSet<String>,
        admin_password: Option<&str>,
        session_secret: &str,
        secure_cookies: bool,
    ) -> Self {
        Self {
            api_keys: Arc::new(api_keys),
            admin: admin_password.map(|p| Arc::new(AdminCredentials::new(p, session_secret))),
            secure_cookies,
            enabled: true,
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            api_keys: Arc::new(HashSet::new()),
            admin: None,
            secure_cookies: false,
            enabled: false,
        }
    }

    #[must_use]
    pub fn has_admin_login(&self) -> bool {
        self.admin.is_some()
    }

    /// Compares `candidate` with the admin password in constant time.
    #[must_use]
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.admin
            .as_ref()
            .is_some_and(|admin| constant_time_eq(&admin.password, candidate))
    }

    /// `Set-Cookie` value that opens an admin session, if a password is configured.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        let admin = self.admin.as_ref()?;
        Some(self.cookie(&admin.session_token, ADMIN_SESSION_MAX_AGE_SECS))
    }

    /// `Set-Cookie` value that expires the admin session.
    #[must_use]
    pub fn clear_session_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{ADMIN_SESSION_COOKIE}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax"
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Whether the request headers carry admin credentials.
    #[must_use]
    pub fn is_admin_request(&self, headers: &HeaderMap) -> bool {
        if !self.enabled {
            return true;
        }

        if let Some(token) = extract_bearer_token(headers.get(AUTHORIZATION)) {
            if self.api_keys.contains(token) {
                return true;
            }
        }

        match (&self.admin, cookie_value(headers, ADMIN_SESSION_COOKIE)) {
            (Some(admin), Some(session)) => constant_time_eq(&admin.session_token, session),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware admitting only admin requests when the gate is enabled.
pub async fn require_admin(State(auth): State<AuthState>, req: Request, next: Next) -> Response {
    if auth.is_admin_request(req.headers()) {
        return next.run(req).await;
    }

    tracing::debug!(path = %req.uri().path(), "rejected unauthenticated admin request");
    (
        StatusCode::UNAUTHORIZED,
        Json(MiddlewareErrorBody {
            error: MiddlewareError {
                code: "unauthorized",
                message: "admin session or bearer token required",
            },
        }),
    )
        .into_response()
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn parse_api_keys(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn constant_time_eq(expected: &str, candidate: &str) -> bool {
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}
