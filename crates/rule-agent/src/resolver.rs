//! 规则解析
//!
//! `resolve_subscriber` 先查订户目录拿到两个会话标识，再并发读取两个会话的规则，
//! 按会话所属类别划分 PDR。每次存储读取都有独立的超时。
//!
//! 不可用判定：
//! - 目录读取失败 -> 整体不可用
//! - 至少尝试了一次会话读取且全部失败 -> 整体不可用
//! - 部分失败 -> 返回可读类别的结果，失败类别为空并标记为降级

use crate::error::{ResolveError, Result, StoreError};
use crate::models::{ClassifiedRuleSet, RuleBundle, SubscriberSessions, TrafficClass};
use crate::store::{SessionStore, SubscriberDirectory};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use upf_shared::observability::metrics;

/// 默认单次读取超时
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(2000);

/// 规则解析器，无状态、只读
#[derive(Clone)]
pub struct RuleResolver {
    directory: Arc<dyn SubscriberDirectory>,
    sessions: Arc<dyn SessionStore>,
    read_timeout: Duration,
}

impl RuleResolver {
    pub fn new(
        directory: Arc<dyn SubscriberDirectory>,
        sessions: Arc<dyn SessionStore>,
        read_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            sessions,
            read_timeout,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// 按会话标识读取规则集合
    ///
    /// 会话不存在返回 `Ok(None)`；存在但没有规则返回空集合。
    #[instrument(skip(self))]
    pub async fn resolve_session(&self, session_key: &str) -> Result<Option<RuleBundle>> {
        if session_key.trim().is_empty() {
            return Err(ResolveError::EmptyKey);
        }

        self.read_session(session_key)
            .await
            .map_err(|e| ResolveError::Unavailable(e.to_string()))
    }

    /// 按订户解析并分类 PDR
    ///
    /// 未知订户与没有会话的订户一样返回两个空集合。
    #[instrument(skip(self))]
    pub async fn resolve_subscriber(&self, subscriber_key: &str) -> Result<ClassifiedRuleSet> {
        if subscriber_key.trim().is_empty() {
            return Err(ResolveError::EmptyKey);
        }

        let sessions = match self.read_directory(subscriber_key).await {
            Ok(Some(sessions)) => sessions,
            Ok(None) => {
                debug!("订户不存在，返回空集合");
                return Ok(ClassifiedRuleSet::default());
            }
            Err(e) => {
                warn!(error = %e, "订户目录不可用");
                return Err(ResolveError::Unavailable(e.to_string()));
            }
        };

        let (internet, ims) = tokio::join!(
            self.read_class(&sessions, TrafficClass::Internet),
            self.read_class(&sessions, TrafficClass::Ims),
        );

        let mut classified = ClassifiedRuleSet::default();
        let mut attempted = 0usize;
        let mut failures = Vec::new();

        for (class, read) in [(TrafficClass::Internet, internet), (TrafficClass::Ims, ims)] {
            let Some(read) = read else {
                continue;
            };
            attempted += 1;
            match read {
                Ok(Some(bundle)) => classified.extend(class, bundle.pdr_ids),
                Ok(None) => debug!(class = %class, "会话不存在，该类别无规则"),
                Err(e) => {
                    warn!(class = %class, error = %e, "会话读取失败，该类别降级");
                    classified.mark_degraded(class);
                    failures.push(format!("{class}: {e}"));
                }
            }
        }

        if attempted > 0 && failures.len() == attempted {
            return Err(ResolveError::Unavailable(failures.join("; ")));
        }

        Ok(classified)
    }

    /// 读取某个类别的会话；订户未开通该类别时返回 None
    async fn read_class(
        &self,
        sessions: &SubscriberSessions,
        class: TrafficClass,
    ) -> Option<std::result::Result<Option<RuleBundle>, StoreError>> {
        match sessions.session_for(class) {
            Some(key) => Some(self.read_session(key).await),
            None => None,
        }
    }

    async fn read_directory(
        &self,
        subscriber_key: &str,
    ) -> std::result::Result<Option<SubscriberSessions>, StoreError> {
        let result = match tokio::time::timeout(
            self.read_timeout,
            self.directory.lookup(subscriber_key),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(self.timeout_error("directory")),
        };
        metrics::record_store_read("directory", read_label(&result));
        result
    }

    async fn read_session(
        &self,
        session_key: &str,
    ) -> std::result::Result<Option<RuleBundle>, StoreError> {
        let result =
            match tokio::time::timeout(self.read_timeout, self.sessions.get_rules(session_key))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(self.timeout_error("session")),
            };
        metrics::record_store_read("session", read_label(&result));
        result
    }

    fn timeout_error(&self, store: &'static str) -> StoreError {
        StoreError::Timeout {
            store,
            timeout_ms: self.read_timeout.as_millis() as u64,
        }
    }
}

fn read_label<T>(result: &std::result::Result<Option<T>, StoreError>) -> &'static str {
    match result {
        Ok(Some(_)) => "hit",
        Ok(None) => "miss",
        Err(_) => "unavailable",
    }
}
