pub mod auth;
pub mod groups;
pub mod posts;
pub mod profiles;

use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use crate::{error::Result, models::group::Group, state::AppState};
use uuid::Uuid;

/// 列表页的查询参数; 页码按字符串接收, 非数字回落到第一页
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// 渲染页面模板为 HTML 响应
pub(crate) fn render_page(
    state: &AppState,
    name: &str,
    data: &serde_json::Value,
) -> Result<Response> {
    let html = state.templates.render(name, data)?;
    Ok(Html(html).into_response())
}

/// 发帖表单的栏目下拉选项, 预先算好选中标记
pub(crate) fn group_options(groups: &[Group], selected: Option<Uuid>) -> serde_json::Value {
    serde_json::Value::Array(
        groups
            .iter()
            .map(|g| {
                serde_json::json!({
                    "id": g.id,
                    "title": g.title,
                    "selected": selected == Some(g.id),
                })
            })
            .collect(),
    )
}

/// 把字段级校验错误压平成模板可渲染的消息列表
pub(crate) fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{}: invalid value", field),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Text is required"))]
        text: String,
    }

    #[test]
    fn test_validation_messages_uses_custom_message() {
        let sample = Sample { text: String::new() };
        let errors = sample.validate().unwrap_err();
        assert_eq!(validation_messages(&errors), vec!["Text is required".to_string()]);
    }
}
