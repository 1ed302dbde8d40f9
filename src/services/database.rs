use crate::config::Config;
use crate::error::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    pub config: Config,
}

impl Database {
    /// 创建新的数据库连接池
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection pool");

        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// 惰性连接池, 首次查询时才真正建立连接
    pub fn connect_lazy(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect_lazy(&config.database_url)?;

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        info!("Database connection verified successfully");
        Ok(())
    }

    /// 执行迁移, 建立缺失的表结构
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}
