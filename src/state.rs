use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    services::{
        AuthService, CommentService, Database, FollowService, GroupService, PostService,
        UserService,
    },
    utils::{cache::Cache, templates::TemplateEngine},
};

/// 应用程序的共享状态
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    /// 认证服务
    pub auth_service: AuthService,

    /// 用户服务
    pub user_service: UserService,

    /// 栏目服务
    pub group_service: GroupService,

    /// 帖子服务
    pub post_service: PostService,

    /// 评论服务
    pub comment_service: CommentService,

    /// 关注服务
    pub follow_service: FollowService,

    /// 页面模板
    pub templates: TemplateEngine,

    /// 首页片段缓存
    pub page_cache: Cache<String>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<Database>) -> anyhow::Result<Self> {
        let templates = TemplateEngine::new()?;
        let page_cache = Cache::new(Duration::from_secs(config.index_cache_ttl));

        Ok(Self {
            auth_service: AuthService::new(&config),
            user_service: UserService::new(db.clone()),
            group_service: GroupService::new(db.clone()),
            post_service: PostService::new(db.clone()),
            comment_service: CommentService::new(db.clone()),
            follow_service: FollowService::new(db.clone()),
            templates,
            page_cache,
            config,
            db,
        })
    }

    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}
