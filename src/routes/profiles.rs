use crate::{
    error::{AppError, Result},
    models::user::User,
    state::AppState,
    utils::middleware::{OptionalAuth, RequireLogin},
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::{render_page, PageQuery};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile/:username", get(profile))
        .route("/profile/:username/follow", get(profile_follow))
        .route("/profile/:username/unfollow", get(profile_unfollow))
        .route("/follow", get(follow_index))
}

async fn author_or_404(state: &AppState, username: &str) -> Result<User> {
    state
        .user_service
        .get_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

/// 个人主页: 作者的帖子时间线, 外加当前访问者是否已关注的标记
async fn profile(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let author = author_or_404(&state, &username).await?;

    let page = state
        .post_service
        .list_by_author(author.id, query.page.as_deref(), state.config.posts_per_page)
        .await?;

    let following = match &user {
        Some(viewer) => state.follow_service.is_following(viewer.id, author.id).await?,
        None => false,
    };
    let is_self = user.as_ref().map(|u| u.id == author.id).unwrap_or(false);

    render_page(
        &state,
        "profile",
        &json!({
            "author": author,
            "page": page,
            "following": following,
            "is_self": is_self,
            "user": user,
        }),
    )
}

/// 关注作者
///
/// 自关注和重复关注都是静默空操作, 一律跳回个人主页。
async fn profile_follow(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    Path(username): Path<String>,
) -> Result<Response> {
    let author = author_or_404(&state, &username).await?;
    let target = format!("/profile/{}", username);

    if user.username == author.username {
        debug!("User {} attempted to follow themselves", user.username);
        return Ok(Redirect::to(&target).into_response());
    }

    state.follow_service.follow(user.id, author.id).await?;
    Ok(Redirect::to(&target).into_response())
}

/// 取消关注, 同样幂等
async fn profile_unfollow(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    Path(username): Path<String>,
) -> Result<Response> {
    let author = author_or_404(&state, &username).await?;
    let target = format!("/profile/{}", username);

    if user.username == author.username {
        return Ok(Redirect::to(&target).into_response());
    }

    state.follow_service.unfollow(user.id, author.id).await?;
    Ok(Redirect::to(&target).into_response())
}

/// 关注列表时间线: 只显示已关注作者的帖子
async fn follow_index(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let page = state
        .post_service
        .list_feed(user.id, query.page.as_deref(), state.config.posts_per_page)
        .await?;

    render_page(&state, "follow", &json!({ "page": page, "user": user }))
}
