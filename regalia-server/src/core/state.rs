use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::catalog::{DenormSync, FacetService, Reconciler, SurrealSource};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::db::models::TaxonomyKind;
use crate::services::ResultCache;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc / 内部句柄实现浅拷贝，可以直接作为 axum `State`。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | cache | Arc<ResultCache> | 进程内结果缓存 |
/// | facets | FacetService | 筛选项聚合服务 |
/// | sync | DenormSync | 反范式字段同步 |
///
/// # 变更钩子
///
/// 管理接口在写入成功后调用：
///
/// - [`on_taxonomy_changed`](Self::on_taxonomy_changed) - 分类实体更新/删除
/// - [`on_product_changed`](Self::on_product_changed) - 商品增删改
///
/// 同步失败只记日志，不影响已完成的写入。
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 结果缓存
    pub cache: Arc<ResultCache>,
    /// 筛选项服务
    pub facets: FacetService,
    /// 反范式同步
    pub sync: DenormSync,
}

impl ServerState {
    /// 用已打开的数据库组装状态（测试使用内存库）
    pub fn from_db(config: Config, db: Surreal<Db>) -> Self {
        let cache = Arc::new(ResultCache::new(config.cache_capacity));
        let source = Arc::new(SurrealSource::new(db.clone()));
        let facets = FacetService::new(source, cache.clone()).with_ttl(config.filter_cache_ttl());
        let sync = DenormSync::new(db.clone()).with_batch_size(config.sync_batch_size);

        Self {
            config,
            db,
            cache,
            facets,
            sync,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/regalia.db)
    /// 3. 缓存、筛选项服务、同步器
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let db_service = DbService::new(
            &db_path.to_string_lossy(),
            &config.db_namespace,
            &config.db_name,
        )
        .await
        .map_err(|e| ServerError::Database(e.message))?;

        Ok(Self::from_db(config.clone(), db_service.db))
    }

    /// 启动后台任务
    ///
    /// - 筛选项缓存预热 (Warmup)
    /// - 定时对账 (Periodic，仅在配置了间隔时)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let facets = self.facets.clone();
        tasks.spawn("filter_warmup", TaskKind::Warmup, async move {
            match facets.warm_up().await {
                Ok(()) => tracing::info!("Catalog filter cache warmed up"),
                Err(e) => tracing::warn!(error = %e, "Catalog filter warmup failed"),
            }
        });

        if let Some(interval) = self.config.reconcile_interval() {
            let reconciler = Reconciler::new(
                self.sync.clone(),
                self.facets.clone(),
                interval,
                tasks.shutdown_token(),
            );
            tasks.spawn("denorm_reconciler", TaskKind::Periodic, reconciler.run());
        }

        tasks.log_summary();
        tasks
    }

    /// 分类实体更新或删除后：重算引用它的商品，再清筛选缓存
    ///
    /// `entity_id` 为 "table:key"。
    pub async fn on_taxonomy_changed(&self, kind: TaxonomyKind, entity_id: &str) {
        match self.sync.resync_for_entity(kind, entity_id).await {
            Ok(report) if report.failures > 0 => {
                tracing::warn!(
                    entity = %kind,
                    entity_id = %entity_id,
                    failures = report.failures,
                    total = report.total,
                    "Some products failed to resync"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(entity = %kind, entity_id = %entity_id, error = %e, "Resync after taxonomy change failed");
            }
        }
        self.facets.invalidate();
    }

    /// 商品变更后：必要时重算该商品，再清筛选缓存
    pub async fn on_product_changed(&self, product_id: &str, resync: bool) {
        if resync && let Err(e) = self.sync.sync_one(product_id).await {
            tracing::error!(product_id = %product_id, error = %e, "Product denormalization sync failed");
        }
        self.facets.invalidate();
    }
}
