//! 流量计数器
//!
//! 每个会话一份计数器，存放在 `DashMap` 中，多个流同时推送同一会话时按分片锁串行累加。

use dashmap::DashMap;
use rand::Rng;
use upf_proto::flow::FlowReply;

/// 预置的示例会话
pub const EXAMPLE_FSEID: &str = "exampleFSEID";

/// 计数表默认最多容纳的会话数
pub const DEFAULT_MAX_FLOWS: usize = 10_000;

/// 单次推送的随机增量上限（不含）
const MAX_PACKET_STEP: u64 = 50;
const MAX_SPEED_STEP: u64 = 1000;

/// 单个会话的累计计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowCounters {
    pub rx_packet: u64,
    pub tx_packet: u64,
    pub rx_speed: u64,
    pub tx_speed: u64,
}

impl FlowCounters {
    pub fn total_packets(&self) -> u64 {
        self.rx_packet + self.tx_packet
    }

    pub fn total_speed(&self) -> u64 {
        self.rx_speed + self.tx_speed
    }

    fn apply(&mut self, step: FlowIncrement) {
        self.rx_packet += step.rx_packet;
        self.tx_packet += step.tx_packet;
        self.rx_speed += step.rx_speed;
        self.tx_speed += step.tx_speed;
    }

    /// 转换为线上结构，`count` 为当前流内的推送序号
    pub fn to_reply(&self, all_imsi: &[String], count: u64) -> FlowReply {
        FlowReply {
            total_packets: self.total_packets(),
            rx_packet: self.rx_packet,
            tx_packet: self.tx_packet,
            rx_speed: self.rx_speed,
            tx_speed: self.tx_speed,
            total_speed: self.total_speed(),
            all_imsi: all_imsi.to_vec(),
            count,
        }
    }
}

/// 一次累加的增量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowIncrement {
    pub rx_packet: u64,
    pub tx_packet: u64,
    pub rx_speed: u64,
    pub tx_speed: u64,
}

impl FlowIncrement {
    pub fn random() -> Self {
        let mut rng = rand::rng();
        Self {
            rx_packet: rng.random_range(0..MAX_PACKET_STEP),
            tx_packet: rng.random_range(0..MAX_PACKET_STEP),
            rx_speed: rng.random_range(0..MAX_SPEED_STEP),
            tx_speed: rng.random_range(0..MAX_SPEED_STEP),
        }
    }
}

/// 会话计数表
///
/// 会话数有上限，满了之后只累加已有会话，新会话被拒绝。
/// 上限在并发插入时是软上限，可能略微超出。
pub struct FlowTable {
    flows: DashMap<String, FlowCounters>,
    all_imsi: Vec<String>,
    max_flows: usize,
}

impl FlowTable {
    pub fn new(all_imsi: Vec<String>) -> Self {
        Self {
            flows: DashMap::new(),
            all_imsi,
            max_flows: DEFAULT_MAX_FLOWS,
        }
    }

    pub fn with_max_flows(mut self, max_flows: usize) -> Self {
        self.max_flows = max_flows;
        self
    }

    /// 预置 `exampleFSEID` 以及 IMSI1..IMSI3
    pub fn with_example() -> Self {
        let table = Self::new(vec![
            "IMSI1".to_string(),
            "IMSI2".to_string(),
            "IMSI3".to_string(),
        ]);
        table.flows.insert(
            EXAMPLE_FSEID.to_string(),
            FlowCounters {
                rx_packet: 100,
                tx_packet: 200,
                rx_speed: 3000,
                tx_speed: 4000,
            },
        );
        table
    }

    pub fn all_imsi(&self) -> &[String] {
        &self.all_imsi
    }

    pub fn get(&self, fseid: &str) -> Option<FlowCounters> {
        self.flows.get(fseid).map(|c| *c)
    }

    /// 已有会话或表未满时可以推送
    pub fn admits(&self, fseid: &str) -> bool {
        self.flows.contains_key(fseid) || self.flows.len() < self.max_flows
    }

    /// 累加一次增量并返回累加后的值；未知会话从零开始，表满时返回 `None`
    pub fn advance_by(&self, fseid: &str, step: FlowIncrement) -> Option<FlowCounters> {
        if let Some(mut counters) = self.flows.get_mut(fseid) {
            counters.apply(step);
            return Some(*counters);
        }
        if self.flows.len() >= self.max_flows {
            return None;
        }
        let mut entry = self.flows.entry(fseid.to_string()).or_default();
        entry.apply(step);
        Some(*entry)
    }

    /// 随机累加
    pub fn advance(&self, fseid: &str) -> Option<FlowCounters> {
        self.advance_by(fseid, FlowIncrement::random())
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
