use crate::{
    error::{AppError, Result},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;

use super::{render_page, PageQuery};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/group/:slug", get(group_posts))
}

/// 栏目时间线: 该栏目下的帖子按发布时间倒序分页
async fn group_posts(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let group = state
        .group_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("Group"))?;

    let page = state
        .post_service
        .list_by_group(group.id, query.page.as_deref(), state.config.posts_per_page)
        .await?;

    render_page(
        &state,
        "group_list",
        &json!({ "group": group, "page": page, "user": user }),
    )
}
