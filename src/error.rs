use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("File upload error: {0}")]
    FileUpload(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Validation error: {0}")]
    ValidatorError(#[from] validator::ValidationErrors),
}

// 错误页面 (对应 Django 的 handler404/handler500)
const NOT_FOUND_PAGE: &str = include_str!("../templates/errors/404.html");
const SERVER_ERROR_PAGE: &str = include_str!("../templates/errors/500.html");

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, NOT_FOUND_PAGE.to_string())
            }
            AppError::Authentication(msg) => {
                tracing::debug!("Authentication error: {}", msg);
                (StatusCode::UNAUTHORIZED, simple_page("401", msg))
            }
            AppError::Authorization(msg) => {
                tracing::debug!("Authorization error: {}", msg);
                (StatusCode::FORBIDDEN, simple_page("403", msg))
            }
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, simple_page("400", msg))
            }
            AppError::ValidatorError(e) => {
                let msg = e.to_string();
                (StatusCode::BAD_REQUEST, simple_page("400", &msg))
            }
            AppError::FileUpload(msg) | AppError::ImageProcessing(msg) => {
                (StatusCode::BAD_REQUEST, simple_page("400", msg))
            }
            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                simple_page("429", "Too many requests, slow down"),
            ),
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {}", e);
                (StatusCode::UNAUTHORIZED, simple_page("401", "Invalid token"))
            }
            other => {
                tracing::error!("Internal error: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_PAGE.to_string())
            }
        };

        (status, Html(body)).into_response()
    }
}

fn simple_page(code: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{code}</title></head>\
         <body><h1>{code}</h1><p>{message}</p><p><a href=\"/\">Back to the index page</a></p></body></html>"
    )
}

// 便利函数，用于创建常见错误
impl AppError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found", resource))
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::Authentication(msg.to_string())
    }

    pub fn forbidden(msg: &str) -> Self {
        Self::Authorization(msg.to_string())
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::BadRequest(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        Self::Internal(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        Self::Validation(msg.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
