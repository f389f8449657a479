//! 反范式字段定时对账
//!
//! 同步失败没有重试队列，陈旧字段只能靠下一次成功同步修正。
//! 对账器定期全量 `resync_all` 并清除筛选缓存。
//! 注册为 `TaskKind::Periodic`，`RECONCILE_INTERVAL_SECS = 0` 时不启动。

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::facets::FacetService;
use super::sync::DenormSync;
use shared::models::SyncReport;

pub struct Reconciler {
    sync: DenormSync,
    facets: FacetService,
    interval: Duration,
    shutdown: CancellationToken,
}

impl Reconciler {
    pub fn new(
        sync: DenormSync,
        facets: FacetService,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sync,
            facets,
            interval,
            shutdown,
        }
    }

    /// 主循环：等待 interval 或 shutdown
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Denormalization reconciler started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Reconciler received shutdown signal");
                    return;
                }
            }
            self.reconcile_once().await;
        }
    }

    /// 单轮对账；失败只记日志
    pub async fn reconcile_once(&self) -> Option<SyncReport> {
        match self.sync.resync_all().await {
            Ok(report) => {
                self.facets.invalidate();
                if report.failures > 0 {
                    tracing::warn!(
                        failures = report.failures,
                        total = report.total,
                        "Reconciliation finished with failures"
                    );
                }
                Some(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Reconciliation failed");
                None
            }
        }
    }
}
