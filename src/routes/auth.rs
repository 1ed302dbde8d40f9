use crate::{
    error::{AppError, Result},
    models::user::{LoginInput, SignupInput},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use super::{render_page, validation_messages};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", get(signup_form).post(signup))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// 登录后跳转目标只接受站内路径
fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

/// 设置会话 cookie 并重定向
fn redirect_with_cookie(target: &str, cookie: &str) -> Result<Response> {
    let mut response = Redirect::to(target).into_response();
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::internal(&format!("Invalid cookie value: {}", e)))?;
    response.headers_mut().insert(SET_COOKIE, value);
    Ok(response)
}

async fn signup_form(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    render_page(&state, "signup", &json!({ "errors": [], "username": "", "user": user }))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Form(input): Form<SignupInput>,
) -> Result<Response> {
    if let Err(validation) = input.validate() {
        return render_page(
            &state,
            "signup",
            &json!({
                "errors": validation_messages(&validation),
                "username": input.username,
                "user": null,
            }),
        );
    }

    let password_hash = state.auth_service.hash_password(&input.password)?;
    let user = match state.user_service.create(&input.username, &password_hash).await {
        Ok(user) => user,
        Err(AppError::Validation(msg)) => {
            return render_page(
                &state,
                "signup",
                &json!({ "errors": [msg], "username": input.username, "user": null }),
            );
        }
        Err(e) => return Err(e),
    };

    info!("New user registered: {}", user.username);

    let token = state.auth_service.create_jwt(&user)?;
    redirect_with_cookie("/", &state.auth_service.session_cookie(&token))
}

async fn login_form(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Result<Response> {
    render_page(
        &state,
        "login",
        &json!({
            "errors": [],
            "username": "",
            "next": sanitize_next(query.next.as_deref()),
            "user": user,
        }),
    )
}

async fn login(
    State(state): State<Arc<AppState>>,
    Form(input): Form<LoginInput>,
) -> Result<Response> {
    let next = sanitize_next(input.next.as_deref()).to_string();

    let invalid_credentials = |state: &AppState, username: &str| {
        render_page(
            state,
            "login",
            &json!({
                "errors": ["Invalid username or password"],
                "username": username,
                "next": next.clone(),
                "user": null,
            }),
        )
    };

    if input.validate().is_err() {
        return invalid_credentials(&state, &input.username);
    }

    let Some(user) = state.user_service.get_by_username(&input.username).await? else {
        debug!("Login failed: unknown user {}", input.username);
        return invalid_credentials(&state, &input.username);
    };

    if !state
        .auth_service
        .verify_password(&input.password, &user.password_hash)
    {
        debug!("Login failed: wrong password for {}", input.username);
        return invalid_credentials(&state, &input.username);
    }

    info!("User logged in: {}", user.username);

    let token = state.auth_service.create_jwt(&user)?;
    redirect_with_cookie(&next, &state.auth_service.session_cookie(&token))
}

async fn logout(State(state): State<Arc<AppState>>) -> Result<Response> {
    redirect_with_cookie("/", &state.auth_service.clear_cookie())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_next_accepts_site_paths() {
        assert_eq!(sanitize_next(Some("/create")), "/create");
        assert_eq!(sanitize_next(Some("/posts/abc/comment")), "/posts/abc/comment");
    }

    #[test]
    fn test_sanitize_next_rejects_offsite_targets() {
        assert_eq!(sanitize_next(Some("https://evil.example")), "/");
        assert_eq!(sanitize_next(Some("//evil.example")), "/");
        assert_eq!(sanitize_next(Some("")), "/");
        assert_eq!(sanitize_next(None), "/");
    }
}
