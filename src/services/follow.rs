use crate::{error::Result, models::follow::Follow, services::Database};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 关注服务
///
/// 关注与取关都按构造幂等: 重复操作是无副作用的空操作。
/// 自关注在路由层拦截, 存储层不做约束。
#[derive(Clone)]
pub struct FollowService {
    db: Arc<Database>,
}

impl FollowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 建立关注关系; 已存在时不做任何事。返回是否新插入
    pub async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        debug!("User {} following author {}", user_id, author_id);

        let inserted = sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (id, user_id, author_id, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING id, user_id, author_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// 解除关注关系; 不存在时不做任何事。返回是否删除了记录
    pub async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        debug!("User {} unfollowing author {}", user_id, author_id);

        let affected = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.db.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    /// 个人主页的关注状态标记
    pub async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let exists: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM follows WHERE user_id = $1 AND author_id = $2",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(exists.is_some())
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count)
    }
}
