use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\-_]").unwrap());
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// 从栏目标题生成 URL 友好的 slug
pub fn generate_slug(title: &str) -> String {
    let mut slug = title.to_lowercase();
    slug = slug.replace(' ', "-");
    slug = SLUG_REGEX.replace_all(&slug, "").to_string();
    slug = HYPHEN_RUN.replace_all(&slug, "-").to_string();
    slug = slug.trim_matches('-').to_string();

    if slug.len() > 100 {
        slug = slug.chars().take(100).collect();
        if let Some(last_hyphen) = slug.rfind('-') {
            if last_hyphen > 50 {
                slug = slug[..last_hyphen].to_string();
            }
        }
    }

    if slug.is_empty() {
        slug = "group".to_string();
    }

    slug
}

/// 为 slug 添加数字后缀避免与已有栏目冲突
pub fn make_slug_unique(base_slug: &str, existing_slugs: &[String]) -> String {
    let mut slug = base_slug.to_string();
    let mut counter = 1;

    while existing_slugs.contains(&slug) {
        slug = format!("{}-{}", base_slug, counter);
        counter += 1;

        if counter > 1000 {
            slug = format!("{}-{}", base_slug, uuid::Uuid::new_v4());
            break;
        }
    }

    slug
}

/// 验证 slug 格式是否正确
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > 100 {
        return false;
    }

    static VALID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-_]+$").unwrap());
    if !VALID_CHARS.is_match(slug) {
        return false;
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return false;
    }

    !slug.contains("--")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Rust News"), "rust-news");
        assert_eq!(generate_slug("Cats & Dogs"), "cats-dogs");
        assert_eq!(generate_slug("Travel: Notes from the Road"), "travel-notes-from-the-road");
        assert_eq!(generate_slug(""), "group");
        assert_eq!(generate_slug("   "), "group");
        assert_eq!(generate_slug("---"), "group");
    }

    #[test]
    fn test_make_slug_unique() {
        let existing = vec![
            "rust-news".to_string(),
            "rust-news-1".to_string(),
            "rust-news-2".to_string(),
        ];

        assert_eq!(make_slug_unique("rust-news", &existing), "rust-news-3");
        assert_eq!(make_slug_unique("travel", &existing), "travel");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("rust-news"));
        assert!(is_valid_slug("rust_news"));
        assert!(is_valid_slug("group123"));

        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-rust"));
        assert!(!is_valid_slug("rust-"));
        assert!(!is_valid_slug("rust--news"));
        assert!(!is_valid_slug("rust news"));
        assert!(!is_valid_slug("rust@news"));
    }
}
