use handlebars::Handlebars;
use serde::Serialize;

use crate::error::Result;

/// 页面模板引擎, 模板在编译期嵌入二进制
#[derive(Clone)]
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

const PARTIALS: &[(&str, &str)] = &[
    ("header", include_str!("../../templates/partials/header.hbs")),
    ("footer", include_str!("../../templates/partials/footer.hbs")),
    ("paginator", include_str!("../../templates/partials/paginator.hbs")),
];

const PAGES: &[(&str, &str)] = &[
    ("index", include_str!("../../templates/index.hbs")),
    ("post_list", include_str!("../../templates/post_list.hbs")),
    ("group_list", include_str!("../../templates/group_list.hbs")),
    ("profile", include_str!("../../templates/profile.hbs")),
    ("post_detail", include_str!("../../templates/post_detail.hbs")),
    ("post_form", include_str!("../../templates/post_form.hbs")),
    ("follow", include_str!("../../templates/follow.hbs")),
    ("login", include_str!("../../templates/login.hbs")),
    ("signup", include_str!("../../templates/signup.hbs")),
];

impl TemplateEngine {
    pub fn new() -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();

        for (name, source) in PARTIALS {
            registry
                .register_partial(name, source)
                .map_err(|e| anyhow::anyhow!("failed to register partial {}: {}", name, e))?;
        }
        for (name, source) in PAGES {
            registry
                .register_template_string(name, source)
                .map_err(|e| anyhow::anyhow!("failed to register template {}: {}", name, e))?;
        }

        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        Ok(self.registry.render(name, data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> TemplateEngine {
        TemplateEngine::new().expect("templates must parse")
    }

    #[test]
    fn test_all_templates_parse() {
        engine();
    }

    #[test]
    fn test_post_list_renders_posts() {
        let html = engine()
            .render(
                "post_list",
                &json!({
                    "page": {
                        "items": [
                            {"id": "00000000-0000-0000-0000-000000000001",
                             "text": "first post",
                             "author_username": "leo",
                             "pub_date": "2022-02-22T00:00:00Z"},
                        ],
                        "number": 1,
                        "total_pages": 1,
                        "has_previous": false,
                        "has_next": false,
                        "previous_page": 1,
                        "next_page": 1,
                    }
                }),
            )
            .unwrap();

        assert!(html.contains("first post"));
        assert!(html.contains("leo"));
    }

    #[test]
    fn test_index_embeds_fragment_verbatim() {
        let fragment = "<ul><li>cached post</li></ul>";
        let html = engine()
            .render("index", &json!({ "fragment": fragment, "user": null }))
            .unwrap();

        assert!(html.contains(fragment));
    }

    #[test]
    fn test_login_shows_next_field() {
        let html = engine()
            .render("login", &json!({ "next": "/create", "errors": [], "user": null }))
            .unwrap();

        assert!(html.contains("/create"));
    }

    #[test]
    fn test_post_form_renders_errors() {
        let html = engine()
            .render(
                "post_form",
                &json!({
                    "errors": ["Text is required"],
                    "text": "",
                    "groups": [],
                    "action": "/create",
                    "is_edit": false,
                    "user": {"username": "leo"},
                }),
            )
            .unwrap();

        assert!(html.contains("Text is required"));
    }
}
