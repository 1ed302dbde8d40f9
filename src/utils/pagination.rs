use serde::Serialize;

/// 每页帖子数
pub const POSTS_PER_PAGE: i64 = 10;

/// 按发布时间排序的一页帖子, 模板直接渲染该结构
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub number: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: i64,
    pub next_page: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, number: i64, per_page: i64, total_items: i64) -> Self {
        let total_pages = total_pages(total_items, per_page);
        Self {
            items,
            number,
            per_page,
            total_items,
            total_pages,
            has_previous: number > 1,
            has_next: number < total_pages,
            previous_page: (number - 1).max(1),
            next_page: (number + 1).min(total_pages),
        }
    }
}

/// 空列表也算一页, 避免 0 页的边界
pub fn total_pages(total_items: i64, per_page: i64) -> i64 {
    if total_items <= 0 {
        1
    } else {
        (total_items + per_page - 1) / per_page
    }
}

/// 解析查询串中的 1 起始页码: 非数字取第一页, 越界收拢到最近的有效页
pub fn resolve_page(raw: Option<&str>, total_pages: i64) -> i64 {
    let requested = raw
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(1);
    requested.clamp(1, total_pages)
}

pub fn offset(page: i64, per_page: i64) -> i64 {
    (page - 1) * per_page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(13, 10), 2);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(21, 10), 3);
    }

    #[test]
    fn test_resolve_page_clamps_to_valid_range() {
        assert_eq!(resolve_page(Some("1"), 3), 1);
        assert_eq!(resolve_page(Some("3"), 3), 3);
        assert_eq!(resolve_page(Some("99"), 3), 3);
        assert_eq!(resolve_page(Some("0"), 3), 1);
        assert_eq!(resolve_page(Some("-5"), 3), 1);
    }

    #[test]
    fn test_resolve_page_non_numeric_defaults_to_first() {
        assert_eq!(resolve_page(None, 3), 1);
        assert_eq!(resolve_page(Some(""), 3), 1);
        assert_eq!(resolve_page(Some("abc"), 3), 1);
        assert_eq!(resolve_page(Some("1.5"), 3), 1);
    }

    #[test]
    fn test_offset() {
        assert_eq!(offset(1, 10), 0);
        assert_eq!(offset(2, 10), 10);
        assert_eq!(offset(3, 25), 50);
    }

    #[test]
    fn test_thirteen_posts_split_ten_and_three() {
        let items: Vec<i64> = (0..13).collect();
        let pages = total_pages(items.len() as i64, POSTS_PER_PAGE);
        assert_eq!(pages, 2);

        let first: Vec<_> = items
            .iter()
            .skip(offset(1, POSTS_PER_PAGE) as usize)
            .take(POSTS_PER_PAGE as usize)
            .collect();
        let second: Vec<_> = items
            .iter()
            .skip(offset(2, POSTS_PER_PAGE) as usize)
            .take(POSTS_PER_PAGE as usize)
            .collect();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn test_page_navigation_flags() {
        let page = Page::new(vec![1, 2, 3], 2, 10, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous);
        assert!(page.has_next);
        assert_eq!(page.previous_page, 1);
        assert_eq!(page.next_page, 3);

        let last = Page::new(vec![1], 3, 10, 25);
        assert!(!last.has_next);
        assert_eq!(last.next_page, 3);
    }
}
