use crate::{
    error::Result,
    models::comment::{Comment, CommentInput, CommentView},
    services::Database,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// 评论服务
#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 评论总是挂在 URL 路径指定的帖子上
    pub async fn create(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        input: &CommentInput,
    ) -> Result<Comment> {
        input.validate()?;
        debug!("Creating comment on post {} by {}", post_id, author_id);

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, author_id, text, created)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, author_id, text, created
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(author_id)
        .bind(&input.text)
        .bind(Utc::now())
        .fetch_one(&self.db.pool)
        .await?;

        Ok(comment)
    }

    /// 帖子详情页的评论列表, 按时间正序
    pub async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.text, c.created, u.username AS author_username
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(comments)
    }
}
