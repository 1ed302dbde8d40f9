use crate::{
    error::Result,
    models::group::{CreateGroupRequest, Group},
    services::Database,
    utils::slug::{generate_slug, make_slug_unique},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// 栏目服务
#[derive(Clone)]
pub struct GroupService {
    db: Arc<Database>,
}

impl GroupService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 直接创建栏目 (没有公开页面, 由种子数据或管理操作调用)
    pub async fn create(&self, request: CreateGroupRequest) -> Result<Group> {
        request.validate()?;

        let base_slug = match &request.slug {
            Some(slug) if !slug.is_empty() => slug.clone(),
            _ => generate_slug(&request.title),
        };

        let existing: Vec<String> =
            sqlx::query_scalar::<_, String>("SELECT slug FROM groups WHERE slug LIKE $1")
                .bind(format!("{}%", base_slug))
                .fetch_all(&self.db.pool)
                .await?;
        let slug = make_slug_unique(&base_slug, &existing);

        debug!("Creating group {} (slug: {})", request.title, slug);

        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (id, title, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(&slug)
        .bind(request.description.unwrap_or_default())
        .fetch_one(&self.db.pool)
        .await?;

        Ok(group)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(group)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(group)
    }

    /// 发帖表单的栏目下拉列表
    pub async fn list(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups ORDER BY title",
        )
        .fetch_all(&self.db.pool)
        .await?;
        Ok(groups)
    }
}
