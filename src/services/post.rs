use crate::{
    error::Result,
    models::post::{Post, PostInput, PostView},
    services::Database,
    utils::pagination::{offset, resolve_page, total_pages, Page},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 帖子视图查询的公共部分, 联表补齐作者与栏目
const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author_username,
           p.group_id, g.title AS group_title, g.slug AS group_slug, p.image
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN groups g ON g.id = p.group_id
"#;

/// 帖子服务: 时间线查询与增删改
#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
}

impl PostService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 全站时间线, 按发布时间倒序分页
    pub async fn list_all(&self, page_param: Option<&str>, per_page: i64) -> Result<Page<PostView>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.db.pool)
            .await?;
        let pages = total_pages(total, per_page);
        let number = resolve_page(page_param, pages);

        let items = sqlx::query_as::<_, PostView>(&format!(
            "{} ORDER BY p.pub_date DESC LIMIT $1 OFFSET $2",
            POST_VIEW_SELECT
        ))
        .bind(per_page)
        .bind(offset(number, per_page))
        .fetch_all(&self.db.pool)
        .await?;

        Ok(Page::new(items, number, per_page, total))
    }

    /// 某个栏目的时间线
    pub async fn list_by_group(
        &self,
        group_id: Uuid,
        page_param: Option<&str>,
        per_page: i64,
    ) -> Result<Page<PostView>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.db.pool)
            .await?;
        let pages = total_pages(total, per_page);
        let number = resolve_page(page_param, pages);

        let items = sqlx::query_as::<_, PostView>(&format!(
            "{} WHERE p.group_id = $1 ORDER BY p.pub_date DESC LIMIT $2 OFFSET $3",
            POST_VIEW_SELECT
        ))
        .bind(group_id)
        .bind(per_page)
        .bind(offset(number, per_page))
        .fetch_all(&self.db.pool)
        .await?;

        Ok(Page::new(items, number, per_page, total))
    }

    /// 某个作者的时间线
    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        page_param: Option<&str>,
        per_page: i64,
    ) -> Result<Page<PostView>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.db.pool)
            .await?;
        let pages = total_pages(total, per_page);
        let number = resolve_page(page_param, pages);

        let items = sqlx::query_as::<_, PostView>(&format!(
            "{} WHERE p.author_id = $1 ORDER BY p.pub_date DESC LIMIT $2 OFFSET $3",
            POST_VIEW_SELECT
        ))
        .bind(author_id)
        .bind(per_page)
        .bind(offset(number, per_page))
        .fetch_all(&self.db.pool)
        .await?;

        Ok(Page::new(items, number, per_page, total))
    }

    /// 关注列表的时间线: 只包含 user_id 关注的作者的帖子
    pub async fn list_feed(
        &self,
        user_id: Uuid,
        page_param: Option<&str>,
        per_page: i64,
    ) -> Result<Page<PostView>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE author_id IN (SELECT author_id FROM follows WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.db.pool)
        .await?;
        let pages = total_pages(total, per_page);
        let number = resolve_page(page_param, pages);

        let items = sqlx::query_as::<_, PostView>(&format!(
            "{} WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = $1) \
             ORDER BY p.pub_date DESC LIMIT $2 OFFSET $3",
            POST_VIEW_SELECT
        ))
        .bind(user_id)
        .bind(per_page)
        .bind(offset(number, per_page))
        .fetch_all(&self.db.pool)
        .await?;

        Ok(Page::new(items, number, per_page, total))
    }

    pub async fn get(&self, post_id: Uuid) -> Result<Option<PostView>> {
        let post = sqlx::query_as::<_, PostView>(&format!("{} WHERE p.id = $1", POST_VIEW_SELECT))
            .bind(post_id)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(post)
    }

    pub async fn create(
        &self,
        author_id: Uuid,
        input: &PostInput,
        image: Option<String>,
    ) -> Result<Post> {
        debug!("Creating post for author {}", author_id);

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, text, pub_date, author_id, group_id, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, text, pub_date, author_id, group_id, image
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.text)
        .bind(Utc::now())
        .bind(author_id)
        .bind(input.group_id)
        .bind(image)
        .fetch_one(&self.db.pool)
        .await?;

        Ok(post)
    }

    /// 覆盖式更新, 没有乐观并发检查
    pub async fn update(
        &self,
        post_id: Uuid,
        input: &PostInput,
        image: Option<String>,
    ) -> Result<Option<Post>> {
        debug!("Updating post {}", post_id);

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts SET text = $2, group_id = $3, image = $4
            WHERE id = $1
            RETURNING id, text, pub_date, author_id, group_id, image
            "#,
        )
        .bind(post_id)
        .bind(&input.text)
        .bind(input.group_id)
        .bind(image)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(post)
    }

    pub async fn delete(&self, post_id: Uuid) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.db.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}
