use crate::{error::AppError, models::user::User, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

type KeyedRateLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;
static RATE_LIMITER: OnceCell<KeyedRateLimiter> = OnceCell::const_new();

/// 认证中间件
///
/// 从会话 cookie 或 Authorization 头解析 JWT, 成功后把用户放进请求扩展;
/// 任何失败都静默放行, 请求按未登录继续处理。
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    if let Some(token) = extract_token(&headers, &app_state.config.auth_cookie_name) {
        match app_state.auth_service.verify_jwt(&token) {
            Ok(claims) => {
                if let Some(user_id) = claims.user_id() {
                    match app_state.user_service.get_by_id(user_id).await {
                        Ok(Some(user)) => {
                            debug!("Authenticated user: {} ({})", user.username, user.id);
                            request.extensions_mut().insert(user);
                        }
                        Ok(None) => {
                            debug!("Token subject {} no longer exists", claims.sub);
                        }
                        Err(e) => {
                            warn!("Failed to load user for token subject {}: {}", claims.sub, e);
                        }
                    }
                } else {
                    debug!("Token subject {} is not a valid user id", claims.sub);
                }
            }
            Err(e) => {
                debug!("JWT verification failed: {}", e);
            }
        }
    }

    Ok(next.run(request).await)
}

/// 从请求头提取令牌: 优先 Bearer, 其次会话 cookie
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(auth_header) = headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    let cookie_header = headers.get("cookie")?.to_str().ok()?;
    for pair in cookie_header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(cookie_name) {
            return parts.next().map(|v| v.to_string());
        }
    }
    None
}

/// 速率限制中间件
pub async fn rate_limit_middleware(
    State(app_state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    let rate_limiter = RATE_LIMITER
        .get_or_init(|| async {
            let per_minute = NonZeroU32::new(app_state.config.rate_limit_requests)
                .unwrap_or(NonZeroU32::new(100).expect("non-zero"));
            let quota =
                Quota::per_minute(per_minute).allow_burst(NonZeroU32::new(10).expect("non-zero"));
            RateLimiter::dashmap(quota)
        })
        .await;

    let client_ip = get_client_ip(&request);

    match rate_limiter.check_key(&client_ip) {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            warn!("Rate limit exceeded for IP: {}", client_ip);
            Err(AppError::RateLimitExceeded)
        }
    }
}

/// 请求日志中间件
pub async fn request_logging_middleware(request: Request<Body>, next: Next<Body>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = get_client_ip(&request);

    let start_time = std::time::Instant::now();
    debug!("Incoming request: {} {} from {}", method, uri, client_ip);

    let response = next.run(request).await;

    info!(
        "Request completed: {} {} {} - {}ms",
        method,
        uri,
        response.status().as_u16(),
        start_time.elapsed().as_millis()
    );

    response
}

/// 获取客户端 IP 地址, 优先代理头
fn get_client_ip(request: &Request<Body>) -> String {
    let headers = request.headers();

    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(ip_str) = forwarded_for.to_str() {
            if let Some(ip) = ip_str.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.to_string();
        }
    }

    request
        .extensions()
        .get::<SocketAddr>()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 可选认证提取器
pub struct OptionalAuth(pub Option<User>);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<User>().cloned()))
    }
}

/// 登录保护提取器: 未登录时重定向到登录页并带上 next 参数
pub struct RequireLogin(pub User);

pub struct LoginRedirect(String);

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        let target = format!("/auth/login?next={}", urlencoding::encode(&self.0));
        Redirect::to(&target).into_response()
    }
}

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequireLogin
where
    S: Send + Sync,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<User>().cloned() {
            Some(user) => Ok(RequireLogin(user)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| parts.uri.path().to_string());
                Err(LoginRedirect(next))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        headers.insert("cookie", HeaderValue::from_static("auth_token=cookie-token"));

        assert_eq!(extract_token(&headers, "auth_token"), Some("abc123".to_string()));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; auth_token=cookie-token; lang=en"),
        );

        assert_eq!(
            extract_token(&headers, "auth_token"),
            Some("cookie-token".to_string())
        );
    }

    #[test]
    fn test_extract_token_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_token(&headers, "auth_token"), None);
    }
}
