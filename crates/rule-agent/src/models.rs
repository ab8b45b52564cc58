//! 订户、会话与规则的领域模型

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 流量类别（线上以 DNN 字段承载）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficClass {
    Internet,
    Ims,
}

impl TrafficClass {
    pub const ALL: [TrafficClass; 2] = [TrafficClass::Internet, TrafficClass::Ims];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internet => "internet",
            Self::Ims => "ims",
        }
    }

    /// 另一个类别
    pub fn other(&self) -> Self {
        match self {
            Self::Internet => Self::Ims,
            Self::Ims => Self::Internet,
        }
    }
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 无法识别的流量类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClass(pub String);

impl fmt::Display for UnknownClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知的流量类别: {}", self.0)
    }
}

impl std::error::Error for UnknownClass {}

impl FromStr for TrafficClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "internet" => Ok(Self::Internet),
            "ims" => Ok(Self::Ims),
            _ => Err(UnknownClass(s.to_string())),
        }
    }
}

/// 规则状态，只有 active 的规则对解析可见
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

impl RuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl FromStr for RuleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("未知的规则状态: {other}")),
        }
    }
}

/// 会话规则集合（已按 active 过滤）
///
/// 会话存在但没有任何规则时为空集合，与“会话不存在”不同。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBundle {
    /// 保持装载顺序
    pub pdr_ids: Vec<String>,
    pub far_id: Option<String>,
    pub qer_id: Option<String>,
    pub urr_id: Option<String>,
}

impl RuleBundle {
    pub fn is_empty(&self) -> bool {
        self.pdr_ids.is_empty()
            && self.far_id.is_none()
            && self.qer_id.is_none()
            && self.urr_id.is_none()
    }
}

/// 订户在目录中的会话引用，缺少的类别为 None
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberSessions {
    pub internet: Option<String>,
    pub ims: Option<String>,
}

impl SubscriberSessions {
    pub fn session_for(&self, class: TrafficClass) -> Option<&str> {
        match class {
            TrafficClass::Internet => self.internet.as_deref(),
            TrafficClass::Ims => self.ims.as_deref(),
        }
    }
}

/// 按流量类别划分的 PDR 集合，每次查询时派生，从不缓存
///
/// 同一类别内重复的 PDR 只保留第一次出现。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedRuleSet {
    pub internet_pdrs: Vec<String>,
    pub ims_pdrs: Vec<String>,
    /// 会话读取失败、因此结果为空的类别
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<TrafficClass>,
}

impl ClassifiedRuleSet {
    pub fn pdrs(&self, class: TrafficClass) -> &[String] {
        match class {
            TrafficClass::Internet => &self.internet_pdrs,
            TrafficClass::Ims => &self.ims_pdrs,
        }
    }

    pub fn contains(&self, class: TrafficClass, pdr_id: &str) -> bool {
        self.pdrs(class).iter().any(|p| p == pdr_id)
    }

    /// 追加一个类别的 PDR，去重并保持顺序
    pub fn extend(&mut self, class: TrafficClass, pdr_ids: impl IntoIterator<Item = String>) {
        let target = match class {
            TrafficClass::Internet => &mut self.internet_pdrs,
            TrafficClass::Ims => &mut self.ims_pdrs,
        };
        for pdr_id in pdr_ids {
            if !target.contains(&pdr_id) {
                target.push(pdr_id);
            }
        }
    }

    pub fn mark_degraded(&mut self, class: TrafficClass) {
        if !self.degraded.contains(&class) {
            self.degraded.push(class);
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.internet_pdrs.is_empty() && self.ims_pdrs.is_empty()
    }
}
