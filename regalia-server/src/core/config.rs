use std::path::PathBuf;
use std::time::Duration;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/regalia | 工作目录（数据库、日志） |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | DB_NAMESPACE | regalia | SurrealDB namespace |
/// | DB_NAME | catalog | SurrealDB database |
/// | CACHE_CAPACITY | 200 | 结果缓存条目上限 |
/// | FILTER_CACHE_TTL_SECS | 900 | 筛选项缓存 TTL |
/// | SYNC_BATCH_SIZE | 10 | 重算批大小 |
/// | RECONCILE_INTERVAL_SECS | 0 | 定时全量对账间隔，0 = 关闭 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 设置后按天滚动写文件 |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 优雅关闭超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/regalia HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,

    pub db_namespace: String,
    pub db_name: String,

    /// 结果缓存条目上限（进程内所有消费者共享）
    pub cache_capacity: usize,
    /// 筛选项缓存 TTL (秒)
    pub filter_cache_ttl_secs: u64,
    /// 反范式重算批大小
    pub sync_batch_size: usize,
    /// 定时对账间隔 (秒)，0 表示不启动
    pub reconcile_interval_secs: u64,

    pub log_level: String,
    pub log_dir: Option<String>,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/regalia".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            db_namespace: std::env::var("DB_NAMESPACE").unwrap_or_else(|_| "regalia".into()),
            db_name: std::env::var("DB_NAME").unwrap_or_else(|_| "catalog".into()),
            cache_capacity: env_or("CACHE_CAPACITY", 200),
            filter_cache_ttl_secs: env_or("FILTER_CACHE_TTL_SECS", 900),
            sync_batch_size: env_or("SYNC_BATCH_SIZE", 10),
            reconcile_interval_secs: env_or("RECONCILE_INTERVAL_SECS", 0),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库目录: {work_dir}/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 数据库文件: {work_dir}/database/regalia.db
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("regalia.db")
    }

    /// 创建工作目录结构
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        if let Some(dir) = &self.log_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn filter_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.filter_cache_ttl_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// 对账间隔，未启用时为 None
    pub fn reconcile_interval(&self) -> Option<Duration> {
        (self.reconcile_interval_secs > 0).then(|| Duration::from_secs(self.reconcile_interval_secs))
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
