use thiserror::Error;

/// 启动与运行期的服务器错误（请求级错误用 `AppError`）
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("数据库初始化失败: {0}")]
    Database(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

impl From<surrealdb::Error> for ServerError {
    fn from(err: surrealdb::Error) -> Self {
        ServerError::Database(err.to_string())
    }
}

/// 服务器 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
