//! 后台任务管理
//!
//! 统一管理后台任务的注册、启动和关闭。
//!
//! # 任务类型
//!
//! - [`TaskKind::Warmup`] - 启动预热（运行一次即结束）
//! - [`TaskKind::Periodic`] - 定时任务，直到收到 shutdown

use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// 启动预热（运行一次）
    Warmup,
    /// 定时任务
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Warmup => write!(f, "Warmup"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

struct RegisteredTask {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// 后台任务管理器
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
/// let token = tasks.shutdown_token();
/// tasks.spawn("denorm_reconciler", TaskKind::Periodic, async move {
///     token.cancelled().await;
/// });
/// tasks.shutdown().await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    /// 全局取消令牌
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 获取取消令牌（任务内部监听 shutdown 信号）
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册并启动一个后台任务
    ///
    /// 任务会被包装以捕获 panic。Periodic 任务在未收到 shutdown 时退出会记 warn。
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let token = self.shutdown.clone();
        let wrapped_future = async move {
            let result: Result<(), Box<dyn std::any::Any + Send>> =
                AssertUnwindSafe(future).catch_unwind().await;
            match result {
                Ok(()) => {
                    if kind == TaskKind::Periodic && !token.is_cancelled() {
                        tracing::warn!(task = %name, kind = %kind, "Background task completed unexpectedly");
                    }
                }
                Err(panic_info) => {
                    let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(
                        task = %name,
                        kind = %kind,
                        panic = %panic_msg,
                        "Background task panicked"
                    );
                }
            }
        };

        let handle = tokio::spawn(wrapped_future);
        tracing::debug!(task = %name, kind = %kind, "Registered background task");
        self.tasks.push(RegisteredTask { name, kind, handle });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 按类型统计 (warmup, periodic)
    pub fn count_by_kind(&self) -> (usize, usize) {
        self.tasks.iter().fold((0, 0), |(w, p), t| match t.kind {
            TaskKind::Warmup => (w + 1, p),
            TaskKind::Periodic => (w, p + 1),
        })
    }

    pub fn log_summary(&self) {
        let (warmup, periodic) = self.count_by_kind();
        tracing::info!(
            "Background tasks registered: {} total (Periodic: {}, Warmup: {})",
            self.tasks.len(),
            periodic,
            warmup
        );
    }

    /// Graceful shutdown - 取消所有任务并等待完成
    pub async fn shutdown(self) {
        tracing::info!("Shutting down {} background tasks...", self.tasks.len());
        self.shutdown.cancel();

        for task in self.tasks {
            match task.handle.await {
                Ok(()) => tracing::debug!(task = %task.name, "Task completed"),
                Err(e) if e.is_cancelled() => tracing::debug!(task = %task.name, "Task cancelled"),
                Err(e) => tracing::error!(task = %task.name, error = ?e, "Task panicked"),
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_periodic_task_stops_on_shutdown() {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = stopped.clone();

        tasks.spawn("ticker", TaskKind::Periodic, async move {
            token.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        });
        tasks.spawn("warmup", TaskKind::Warmup, async {});

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks.count_by_kind(), (1, 1));

        tasks.shutdown().await;
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_poison_shutdown() {
        let mut tasks = BackgroundTasks::new();
        tasks.spawn("boom", TaskKind::Warmup, async { panic!("boom") });
        tasks.shutdown().await;
    }
}
