//! 种子数据
//!
//! 内存代理在启动时装载一份种子文档，经校验后生成不可变快照。
//! 校验失败时整份种子被拒绝，不会出现部分装载。

use crate::error::ProvisionError;
use crate::models::{RuleBundle, RuleStatus, SubscriberSessions, TrafficClass};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 种子文档
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub subscribers: Vec<SubscriberSeed>,
    #[serde(default)]
    pub sessions: Vec<SessionSeed>,
}

/// 订户条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberSeed {
    pub imsi: String,
    #[serde(default)]
    pub internet: Option<String>,
    #[serde(default)]
    pub ims: Option<String>,
}

/// 会话条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSeed {
    pub fseid: String,
    #[serde(default)]
    pub pdrs: Vec<RuleSeed>,
    #[serde(default)]
    pub far: Option<RuleSeed>,
    #[serde(default)]
    pub qer: Option<RuleSeed>,
    #[serde(default)]
    pub urr: Option<RuleSeed>,
}

/// 单条规则引用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSeed {
    pub id: String,
    #[serde(default)]
    pub status: RuleStatus,
}

impl RuleSeed {
    pub fn active(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: RuleStatus::Active,
        }
    }
}

impl SessionSeed {
    /// 只保留 active 规则
    pub fn active_bundle(&self) -> RuleBundle {
        let active_id = |rule: &Option<RuleSeed>| {
            rule.as_ref()
                .filter(|r| r.status.is_active())
                .map(|r| r.id.clone())
        };

        RuleBundle {
            pdr_ids: self
                .pdrs
                .iter()
                .filter(|r| r.status.is_active())
                .map(|r| r.id.clone())
                .collect(),
            far_id: active_id(&self.far),
            qer_id: active_id(&self.qer),
            urr_id: active_id(&self.urr),
        }
    }

    fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.pdrs
            .iter()
            .chain(self.far.iter())
            .chain(self.qer.iter())
            .chain(self.urr.iter())
            .map(|r| r.id.as_str())
    }
}

impl SeedDocument {
    /// 从 JSON 文本解析
    pub fn from_json(json: &str) -> Result<Self, ProvisionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从文件读取
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProvisionError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ProvisionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// 内置示例数据
    pub fn builtin() -> Self {
        let subscriber = |imsi: &str, internet: &str, ims: &str| SubscriberSeed {
            imsi: imsi.to_string(),
            internet: Some(internet.to_string()),
            ims: Some(ims.to_string()),
        };
        let session = |fseid: &str, pdrs: &[&str], n: u32| SessionSeed {
            fseid: fseid.to_string(),
            pdrs: pdrs.iter().map(|p| RuleSeed::active(*p)).collect(),
            far: Some(RuleSeed::active(format!("far{n}"))),
            qer: Some(RuleSeed::active(format!("qer{n}"))),
            urr: Some(RuleSeed::active(format!("urr{n}"))),
        };

        Self {
            subscribers: vec![
                subscriber("IMSI1", "fseid1", "fseid2"),
                subscriber("IMSI2", "fseid3", "fseid4"),
                subscriber("IMSI3", "fseid5", "fseid6"),
            ],
            sessions: vec![
                session("fseid1", &["pdr1", "pdr2"], 1),
                session("fseid2", &["pdr3", "pdr4"], 2),
            ],
        }
    }
}

/// 已校验的不可变快照
#[derive(Debug, Default)]
pub struct Snapshot {
    subscribers: HashMap<String, SubscriberSessions>,
    sessions: HashMap<String, SessionSeed>,
}

impl Snapshot {
    /// 校验种子并构建快照
    pub fn provision(doc: SeedDocument) -> Result<Self, ProvisionError> {
        let mut subscribers = HashMap::with_capacity(doc.subscribers.len());
        for sub in doc.subscribers {
            if sub.imsi.trim().is_empty() {
                return Err(ProvisionError::EmptySubscriberKey);
            }
            for class in TrafficClass::ALL {
                let key = match class {
                    TrafficClass::Internet => &sub.internet,
                    TrafficClass::Ims => &sub.ims,
                };
                if matches!(key, Some(k) if k.trim().is_empty()) {
                    return Err(ProvisionError::EmptySessionKey { imsi: sub.imsi });
                }
            }
            if let (Some(internet), Some(ims)) = (&sub.internet, &sub.ims) {
                if internet == ims {
                    return Err(ProvisionError::AliasedSession {
                        fseid: internet.clone(),
                        imsi: sub.imsi,
                    });
                }
            }
            if subscribers.contains_key(&sub.imsi) {
                return Err(ProvisionError::DuplicateSubscriber(sub.imsi));
            }
            subscribers.insert(
                sub.imsi,
                SubscriberSessions {
                    internet: sub.internet,
                    ims: sub.ims,
                },
            );
        }

        let mut sessions = HashMap::with_capacity(doc.sessions.len());
        for session in doc.sessions {
            if session.fseid.trim().is_empty() {
                return Err(ProvisionError::EmptySessionKey {
                    imsi: String::new(),
                });
            }
            if session.rule_ids().any(|id| id.trim().is_empty()) {
                return Err(ProvisionError::EmptyRuleId {
                    fseid: session.fseid,
                });
            }
            if sessions.contains_key(&session.fseid) {
                return Err(ProvisionError::DuplicateSession(session.fseid));
            }
            sessions.insert(session.fseid.clone(), session);
        }

        Ok(Self {
            subscribers,
            sessions,
        })
    }

    pub fn subscriber(&self, imsi: &str) -> Option<&SubscriberSessions> {
        self.subscribers.get(imsi)
    }

    /// 会话的 active 规则；会话不存在时为 None
    pub fn active_bundle(&self, fseid: &str) -> Option<RuleBundle> {
        self.sessions.get(fseid).map(SessionSeed::active_bundle)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// 所有订户标识（排序后返回）
    pub fn subscriber_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.subscribers.keys().cloned().collect();
        keys.sort();
        keys
    }
}
