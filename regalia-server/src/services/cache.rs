//! 进程内结果缓存
//!
//! 有界 FIFO 缓存：容量满时淘汰最早**插入**的条目（不是最久未访问）。
//! 每个条目自带 TTL，`get` 遇到过期条目时顺手删除。
//!
//! 值以 `Arc<dyn Any>` 存放，同一个缓存可以同时服务多种派生读模型
//! （筛选结果等），读取时按类型 downcast。
//!
//! 每次失效都会推进 generation。`get_or_compute` 在计算前记下 generation，
//! 计算期间若发生过失效，结果照常返回但不写入缓存。

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use tokio::time::Instant;

/// 默认容量
pub const DEFAULT_CAPACITY: usize = 200;

/// TTL 档位
pub mod ttl {
    use std::time::Duration;

    pub const SHORT: Duration = Duration::from_secs(60);
    pub const LONG: Duration = Duration::from_secs(15 * 60);
}

type CachedValue = Arc<dyn Any + Send + Sync>;

struct Entry {
    value: CachedValue,
    stored_at: Instant,
    ttl: Duration,
}

impl Entry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= self.ttl
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// 插入顺序，队首最旧
    order: VecDeque<String>,
    /// 失效计数
    generation: u64,
}

impl Inner {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }
}

/// 结果缓存
pub struct ResultCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 读取未过期的值；过期条目会被删除。类型不符视为未命中。
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        let fresh = inner.entries.get(key).map(|e| e.is_fresh(now))?;
        if !fresh {
            inner.remove(key);
            tracing::trace!(key = %key, "Cache entry expired");
            return None;
        }
        let value = inner.entries.get(key)?.value.clone();
        value.downcast::<T>().ok()
    }

    /// 写入；已存在的 key 会移到队尾，满了淘汰队首
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: Arc<T>, ttl: Duration) {
        let key = key.into();
        let mut inner = self.inner.lock();
        inner.remove(&key);

        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            tracing::debug!(key = %oldest, "Cache full, evicted oldest entry");
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// 删除单个 key
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.remove(key)
    }

    /// 删除所有匹配 `pattern` 的 key，返回删除数量
    ///
    /// 即使当前没有匹配的条目也会推进 generation，进行中的计算因此不会回填。
    pub fn invalidate_pattern(&self, pattern: &Regex) -> usize {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        let before = inner.entries.len();
        inner.entries.retain(|k, _| !pattern.is_match(k));
        let Inner { entries, order, .. } = &mut *inner;
        order.retain(|k| entries.contains_key(k));
        before - inner.entries.len()
    }

    /// 当前失效计数
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Read-through: 命中直接返回，未命中则计算并写入。
    ///
    /// 返回 `(value, from_cache)`。计算失败不写缓存；计算期间发生过失效也不写。
    /// 锁不跨 await 持有，并发未命中可能重复计算，后写者覆盖前者。
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<(Arc<T>, bool), E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key) {
            return Ok((hit, true));
        }
        let generation = self.generation();
        let value = Arc::new(compute().await?);
        if self.generation() == generation {
            self.set(key, value.clone(), ttl);
        } else {
            tracing::debug!(key = %key, "Invalidated during compute, result not cached");
        }
        Ok((value, false))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
