//! 订户目录与会话存储
//!
//! 解析层只依赖两个只读 trait，具体实现可以是内存快照、远程代理或数据库。
//! 内存实现使用 `ArcSwap` 持有不可变快照：读取一次原子 load，
//! 热加载时整体替换，读方不会看到一半新一半旧的规则集合。

use crate::error::{ProvisionError, StoreError};
use crate::models::{RuleBundle, SubscriberSessions};
use crate::seed::{SeedDocument, Snapshot};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 订户目录：订户标识 -> 两个流量类别的会话标识
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    /// 订户不存在时返回 `Ok(None)`
    async fn lookup(&self, subscriber_key: &str)
    -> Result<Option<SubscriberSessions>, StoreError>;
}

/// 会话存储：会话标识 -> active 规则集合
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 会话不存在时返回 `Ok(None)`
    async fn get_rules(&self, session_key: &str) -> Result<Option<RuleBundle>, StoreError>;
}

/// 内存快照存储
#[derive(Clone)]
pub struct SnapshotStore {
    current: Arc<ArcSwap<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(snapshot)),
        }
    }

    /// 校验种子并创建存储
    pub fn from_seed(doc: SeedDocument) -> Result<Self, ProvisionError> {
        Ok(Self::new(Snapshot::provision(doc)?))
    }

    /// 内置示例数据
    pub fn builtin() -> Result<Self, ProvisionError> {
        Self::from_seed(SeedDocument::builtin())
    }

    /// 有配置路径时读取文件，否则使用内置数据
    pub fn from_path_or_builtin(path: Option<&str>) -> Result<Self, ProvisionError> {
        match path {
            Some(path) => Self::from_seed(SeedDocument::from_path(path)?),
            None => Self::builtin(),
        }
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// 整体替换快照
    pub fn replace(&self, snapshot: Snapshot) {
        info!(
            subscribers = snapshot.subscriber_count(),
            sessions = snapshot.session_count(),
            "快照已替换"
        );
        self.current.store(Arc::new(snapshot));
    }

    /// 重新读取种子文件；校验失败时保留旧快照
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<(), ProvisionError> {
        let snapshot = Snapshot::provision(SeedDocument::from_path(path)?)?;
        self.replace(snapshot);
        Ok(())
    }

    pub fn stats(&self) -> SnapshotStats {
        let snapshot = self.current.load();
        SnapshotStats {
            subscribers: snapshot.subscriber_count(),
            sessions: snapshot.session_count(),
        }
    }
}

/// 快照统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStats {
    pub subscribers: usize,
    pub sessions: usize,
}

#[async_trait]
impl SubscriberDirectory for SnapshotStore {
    async fn lookup(
        &self,
        subscriber_key: &str,
    ) -> Result<Option<SubscriberSessions>, StoreError> {
        let found = self.current.load().subscriber(subscriber_key).cloned();
        debug!(subscriber_key, found = found.is_some(), "目录查询");
        Ok(found)
    }
}

#[async_trait]
impl SessionStore for SnapshotStore {
    async fn get_rules(&self, session_key: &str) -> Result<Option<RuleBundle>, StoreError> {
        let bundle = self.current.load().active_bundle(session_key);
        debug!(session_key, found = bundle.is_some(), "会话查询");
        Ok(bundle)
    }
}
