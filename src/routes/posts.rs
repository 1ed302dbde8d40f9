use crate::{
    error::{AppError, Result},
    models::post::PostInput,
    state::AppState,
    utils::{
        cache::index_page_key,
        image,
        middleware::{OptionalAuth, RequireLogin},
    },
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use super::{group_options, render_page, validation_messages, PageQuery};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/create", get(create_form).post(create_post))
        .route("/posts/:post_id", get(post_detail))
        .route("/posts/:post_id/edit", get(edit_form).post(edit_post))
        .route("/posts/:post_id/comment", post(add_comment))
        .route("/media/*path", get(serve_media))
}

/// 路径里的帖子 id; 非法 id 与不存在的帖子一样按 404 处理
fn parse_post_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("Post"))
}

/// 首页: 全站时间线
///
/// 已渲染的帖子列表片段按页码缓存, 窗口期内不访问数据库,
/// 即使帖子已被删除也返回旧内容。页面外壳 (导航栏) 每次渲染。
async fn index(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let page_param = query.page.as_deref();
    let requested = page_param
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(1)
        .max(1);
    let key = index_page_key(requested);

    let fragment = match state.page_cache.get(&key) {
        Some(html) => {
            debug!("Index fragment served from cache: {}", key);
            html
        }
        None => {
            let page = state
                .post_service
                .list_all(page_param, state.config.posts_per_page)
                .await?;
            let html = state.templates.render("post_list", &json!({ "page": page }))?;
            state.page_cache.set(key, html.clone());
            html
        }
    };

    render_page(&state, "index", &json!({ "fragment": fragment, "user": user }))
}

/// 帖子详情页, 带评论列表和评论表单
async fn post_detail(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<String>,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;
    let post = state
        .post_service
        .get(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    let comments = state.comment_service.list_for_post(post_id).await?;

    let is_author = user.as_ref().map(|u| u.id == post.author_id).unwrap_or(false);

    render_page(
        &state,
        "post_detail",
        &json!({
            "post": post,
            "comments": comments,
            "is_author": is_author,
            "user": user,
        }),
    )
}

async fn create_form(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
) -> Result<Response> {
    let groups = state.group_service.list().await?;
    render_page(
        &state,
        "post_form",
        &json!({
            "action": "/create",
            "is_edit": false,
            "text": "",
            "groups": group_options(&groups, None),
            "errors": [],
            "user": user,
        }),
    )
}

/// 发布新帖: 当前登录用户成为作者, 成功后跳转到其个人主页
async fn create_post(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    multipart: Multipart,
) -> Result<Response> {
    let form = PostForm::from_multipart(multipart, &state).await?;

    match form.into_validated(&state).await? {
        ValidatedPost::Invalid { text, errors } => {
            let groups = state.group_service.list().await?;
            render_page(
                &state,
                "post_form",
                &json!({
                    "action": "/create",
                    "is_edit": false,
                    "text": text,
                    "groups": group_options(&groups, None),
                    "errors": errors,
                    "user": user,
                }),
            )
        }
        ValidatedPost::Valid { input, image } => {
            state.post_service.create(user.id, &input, image).await?;
            Ok(Redirect::to(&format!("/profile/{}", user.username)).into_response())
        }
    }
}

async fn edit_form(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    Path(post_id): Path<String>,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;
    let post = state
        .post_service
        .get(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    // 只有作者能编辑, 其他人静默跳回首页
    if post.author_id != user.id {
        return Ok(Redirect::to("/").into_response());
    }

    let groups = state.group_service.list().await?;
    render_page(
        &state,
        "post_form",
        &json!({
            "action": format!("/posts/{}/edit", post.id),
            "is_edit": true,
            "text": post.text,
            "groups": group_options(&groups, post.group_id),
            "errors": [],
            "user": user,
        }),
    )
}

/// 编辑帖子: 单条覆盖式保存, 成功后跳转到详情页
async fn edit_post(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;
    let post = state
        .post_service
        .get(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    if post.author_id != user.id {
        return Ok(Redirect::to("/").into_response());
    }

    let form = PostForm::from_multipart(multipart, &state).await?;

    match form.into_validated(&state).await? {
        ValidatedPost::Invalid { text, errors } => {
            let groups = state.group_service.list().await?;
            render_page(
                &state,
                "post_form",
                &json!({
                    "action": format!("/posts/{}/edit", post.id),
                    "is_edit": true,
                    "text": text,
                    "groups": group_options(&groups, post.group_id),
                    "errors": errors,
                    "user": user,
                }),
            )
        }
        ValidatedPost::Valid { input, image } => {
            // 没有新图片时保留原图
            let image = image.or(post.image);
            state.post_service.update(post_id, &input, image).await?;
            Ok(Redirect::to(&format!("/posts/{}", post_id)).into_response())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    pub text: Option<String>,
}

/// 发表评论: 只认 URL 路径里的帖子, 无论表单里还有什么字段。
/// 空文本不创建评论; 无论成功与否都跳回详情页。
async fn add_comment(
    State(state): State<Arc<AppState>>,
    RequireLogin(user): RequireLogin,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;
    state
        .post_service
        .get(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    let input = crate::models::comment::CommentInput {
        text: form.text.unwrap_or_default(),
    };
    if input.validate().is_ok() {
        state.comment_service.create(post_id, user.id, &input).await?;
    }

    Ok(Redirect::to(&format!("/posts/{}", post_id)).into_response())
}

/// 上传图片的静态访问
async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response> {
    if path.contains("..") || path.starts_with('/') {
        return Err(AppError::not_found("File"));
    }

    let full = std::path::Path::new(&state.config.media_root).join(&path);
    let bytes = tokio::fs::read(&full)
        .await
        .map_err(|_| AppError::not_found("File"))?;

    let mime = full
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(image::ImageFormat::from_extension)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");

    Ok(([(CONTENT_TYPE, mime)], bytes).into_response())
}

/// 发帖表单的 multipart 解析结果
struct PostForm {
    text: String,
    group_raw: Option<String>,
    image_bytes: Option<Vec<u8>>,
}

enum ValidatedPost {
    Valid {
        input: PostInput,
        image: Option<String>,
    },
    Invalid {
        text: String,
        errors: Vec<String>,
    },
}

impl PostForm {
    async fn from_multipart(mut multipart: Multipart, state: &AppState) -> Result<Self> {
        let mut form = PostForm {
            text: String::new(),
            group_raw: None,
            image_bytes: None,
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(&format!("Invalid form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => {
                    form.text = field
                        .text()
                        .await
                        .map_err(|e| AppError::bad_request(&format!("Invalid form data: {}", e)))?;
                }
                "group" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::bad_request(&format!("Invalid form data: {}", e)))?;
                    if !value.is_empty() {
                        form.group_raw = Some(value);
                    }
                }
                "image" => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::bad_request(&format!("Invalid form data: {}", e)))?;
                    if bytes.len() > state.config.max_upload_size {
                        return Err(AppError::FileUpload(format!(
                            "Uploaded file exceeds the {} byte limit",
                            state.config.max_upload_size
                        )));
                    }
                    if !bytes.is_empty() {
                        form.image_bytes = Some(bytes.to_vec());
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// 字段校验; 图片落盘放在校验通过之后
    async fn into_validated(self, state: &AppState) -> Result<ValidatedPost> {
        let mut errors = Vec::new();

        let group_id = match &self.group_raw {
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) => {
                    if state.group_service.get_by_id(id).await?.is_none() {
                        errors.push("Selected group does not exist".to_string());
                        None
                    } else {
                        Some(id)
                    }
                }
                Err(_) => {
                    errors.push("Selected group does not exist".to_string());
                    None
                }
            },
            None => None,
        };

        let input = PostInput {
            text: self.text,
            group_id,
        };
        if let Err(validation) = input.validate() {
            errors.extend(validation_messages(&validation));
        }

        if !errors.is_empty() {
            return Ok(ValidatedPost::Invalid {
                text: input.text,
                errors,
            });
        }

        let image = match self.image_bytes {
            Some(bytes) => match image::save_upload(
                &state.config.media_root,
                &bytes,
                &state.config.allowed_image_types,
                state.config.max_upload_size,
            )
            .await
            {
                Ok(path) => Some(path),
                Err(AppError::FileUpload(msg)) | Err(AppError::ImageProcessing(msg)) => {
                    return Ok(ValidatedPost::Invalid {
                        text: input.text,
                        errors: vec![msg],
                    });
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        Ok(ValidatedPost::Valid { input, image })
    }
}
