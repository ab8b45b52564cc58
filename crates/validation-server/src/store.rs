//! PostgreSQL 规则存储
//!
//! 同一个 `PgRuleStore` 同时充当订户目录和会话存储，解析逻辑复用规则代理的
//! `RuleResolver`。写操作（停用 PDR）和就绪探测走 `RuleMaintenance`。

use async_trait::async_trait;
use rule_agent::{
    RuleBundle, SessionStore, StoreError, SubscriberDirectory, SubscriberSessions, TrafficClass,
};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// 内嵌的建表迁移
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// 维护类操作
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleMaintenance: Send + Sync {
    /// 停用订户名下的某个 active PDR，返回受影响的行数
    async fn deactivate_pdr(&self, imsi: &str, pdr_id: &str) -> Result<u64, StoreError>;

    /// 后端连通性探测
    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgRuleStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgRuleStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// 为单次数据库调用加上期限
    async fn with_deadline<T, F>(&self, store: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(store, error = %e, "数据库读取失败");
                Err(StoreError::Unavailable(e.to_string()))
            }
            Err(_) => Err(StoreError::Timeout {
                store,
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// 订户的会话行，LEFT JOIN 后会话列可能为空
#[derive(sqlx::FromRow)]
struct SubscriberRow {
    fseid_value: Option<String>,
    dnn: Option<String>,
}

/// 会话的规则行，会话存在但没有 active 规则时规则列为空
#[derive(sqlx::FromRow)]
struct SessionRuleRow {
    rule_type: Option<String>,
    rule_id: Option<String>,
}

fn rows_to_sessions(rows: Vec<SubscriberRow>) -> SubscriberSessions {
    let mut sessions = SubscriberSessions::default();
    for row in rows {
        let (Some(fseid), Some(dnn)) = (row.fseid_value, row.dnn) else {
            continue;
        };
        match dnn.parse::<TrafficClass>() {
            Ok(TrafficClass::Internet) => sessions.internet = Some(fseid),
            Ok(TrafficClass::Ims) => sessions.ims = Some(fseid),
            Err(e) => warn!(fseid = %fseid, error = %e, "忽略未知 dnn 的会话"),
        }
    }
    sessions
}

fn rows_to_bundle(rows: Vec<SessionRuleRow>) -> RuleBundle {
    let mut bundle = RuleBundle::default();
    for row in rows {
        let (Some(rule_type), Some(rule_id)) = (row.rule_type, row.rule_id) else {
            continue;
        };
        match rule_type.as_str() {
            "pdr" => {
                if !bundle.pdr_ids.contains(&rule_id) {
                    bundle.pdr_ids.push(rule_id);
                }
            }
            "far" => {
                bundle.far_id.get_or_insert(rule_id);
            }
            "qer" => {
                bundle.qer_id.get_or_insert(rule_id);
            }
            "urr" => {
                bundle.urr_id.get_or_insert(rule_id);
            }
            other => warn!(rule_type = other, "忽略未知规则类型"),
        }
    }
    bundle
}

#[async_trait]
impl SubscriberDirectory for PgRuleStore {
    #[instrument(skip(self))]
    async fn lookup(
        &self,
        subscriber_key: &str,
    ) -> Result<Option<SubscriberSessions>, StoreError> {
        let rows = self
            .with_deadline(
                "directory",
                sqlx::query_as::<_, SubscriberRow>(
                    r#"
                    SELECT f.fseid_value, f.dnn
                    FROM imsi i
                    LEFT JOIN fseid f ON f.imsi_id = i.id
                    WHERE i.imsi_number = $1
                    "#,
                )
                .bind(subscriber_key)
                .fetch_all(&self.pool),
            )
            .await?;

        if rows.is_empty() {
            debug!(subscriber_key, "订户不存在");
            return Ok(None);
        }
        Ok(Some(rows_to_sessions(rows)))
    }
}

#[async_trait]
impl SessionStore for PgRuleStore {
    #[instrument(skip(self))]
    async fn get_rules(&self, session_key: &str) -> Result<Option<RuleBundle>, StoreError> {
        let rows = self
            .with_deadline(
                "session",
                sqlx::query_as::<_, SessionRuleRow>(
                    r#"
                    SELECT r.rule_type, r.rule_id
                    FROM fseid f
                    LEFT JOIN session_rule r ON r.fseid_id = f.id AND r.status = 'active'
                    WHERE f.fseid_value = $1
                    ORDER BY r.id
                    "#,
                )
                .bind(session_key)
                .fetch_all(&self.pool),
            )
            .await?;

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows_to_bundle(rows)))
    }
}

#[async_trait]
impl RuleMaintenance for PgRuleStore {
    #[instrument(skip(self))]
    async fn deactivate_pdr(&self, imsi: &str, pdr_id: &str) -> Result<u64, StoreError> {
        let result = self
            .with_deadline(
                "session",
                sqlx::query(
                    r#"
                    UPDATE session_rule r
                    SET status = 'inactive'
                    FROM fseid f
                    JOIN imsi i ON i.id = f.imsi_id
                    WHERE r.fseid_id = f.id
                      AND i.imsi_number = $1
                      AND r.rule_type = 'pdr'
                      AND r.rule_id = $2
                      AND r.status = 'active'
                    "#,
                )
                .bind(imsi)
                .bind(pdr_id)
                .execute(&self.pool),
            )
            .await?;

        let affected = result.rows_affected();
        info!(imsi, pdr_id, affected, "PDR 已停用");
        Ok(affected)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_deadline("database", sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }
}

/// 示例订户
pub const SEED_IMSI: &str = "001011234567890";

/// `imsi` 表为空时写入示例数据，整体在一个事务内完成
#[instrument(skip(pool))]
pub async fn seed_if_empty(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM imsi")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        info!(count, "数据库已有订户，跳过种子写入");
        return Ok(false);
    }

    let sessions: [(&str, TrafficClass, &[&str]); 2] = [
        ("fseid1", TrafficClass::Internet, &["pdr1", "pdr2"]),
        ("fseid2", TrafficClass::Ims, &["pdr3"]),
    ];

    let mut tx = pool.begin().await?;

    let imsi_id: i64 = sqlx::query_scalar("INSERT INTO imsi (imsi_number) VALUES ($1) RETURNING id")
        .bind(SEED_IMSI)
        .fetch_one(&mut *tx)
        .await?;

    for (fseid, class, pdrs) in sessions {
        let fseid_id: i64 = sqlx::query_scalar(
            "INSERT INTO fseid (fseid_value, imsi_id, dnn) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(fseid)
        .bind(imsi_id)
        .bind(class.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for pdr in pdrs {
            sqlx::query(
                "INSERT INTO session_rule (fseid_id, rule_type, rule_id, status) VALUES ($1, 'pdr', $2, 'active')",
            )
            .bind(fseid_id)
            .bind(*pdr)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    info!(imsi = SEED_IMSI, "示例数据已写入");
    Ok(true)
}
