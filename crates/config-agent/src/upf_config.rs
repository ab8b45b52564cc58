//! UPF 配置文件模型
//!
//! 文件为 JSONC（允许注释和尾随逗号），通过 `config` 的 JSON5 格式解析。
//! 配置库会把键名统一为小写，驼峰字段需要额外的小写别名。

use crate::error::{ConfigAgentError, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, instrument};
use upf_proto::config as pb;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpfConfig {
    pub mode: String,
    pub table_sizes: TableSizes,
    pub log_level: String,
    pub sim: SimConfig,
    pub hwcksum: bool,
    pub gtppsc: bool,
    pub ddp: bool,
    pub measure_upf: bool,
    pub measure_flow: bool,
    pub access: Interface,
    pub core: Interface,
    pub workers: i32,
    pub max_req_retries: i32,
    pub resp_timeout: String,
    pub enable_ntf: bool,
    pub enable_p4rt: bool,
    #[serde(rename = "enable_hbTimer", alias = "enable_hbtimer")]
    pub enable_hb_timer: bool,
    pub enable_gtpu_path_monitoring: bool,
    pub qci_qos_config: Vec<QosConfig>,
    pub slice_rate_limit_config: SliceRateLimit,
    pub cpiface: CpInterface,
    pub p4rtciface: P4rtcInterface,
}

/// 查找表容量
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableSizes {
    #[serde(rename = "pdrLookup", alias = "pdrlookup")]
    pub pdr_lookup: i32,
    #[serde(rename = "flowMeasure", alias = "flowmeasure")]
    pub flow_measure: i32,
    #[serde(rename = "appQERLookup", alias = "appqerlookup")]
    pub app_qer_lookup: i32,
    #[serde(rename = "sessionQERLookup", alias = "sessionqerlookup")]
    pub session_qer_lookup: i32,
    #[serde(rename = "farLookup", alias = "farlookup")]
    pub far_lookup: i32,
}

/// 仿真模式参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub core: String,
    pub max_sessions: i32,
    pub start_ue_ip: String,
    pub start_enb_ip: String,
    pub start_aupf_ip: String,
    pub n6_app_ip: String,
    pub n9_app_ip: String,
    pub start_n3_teid: String,
    pub start_n9_teid: String,
    pub uplink_mbr: i32,
    pub uplink_gbr: i32,
    pub downlink_mbr: i32,
    pub downlink_gbr: i32,
    pub pkt_size: i32,
    pub total_flows: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Interface {
    pub ifname: String,
}

/// 单个 QCI 的 QoS 参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QosConfig {
    pub qci: i32,
    pub cbs: i32,
    pub ebs: i32,
    pub pbs: i32,
    pub burst_duration_ms: i32,
    pub priority: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SliceRateLimit {
    pub n6_bps: i32,
    pub n6_burst_bytes: i32,
    pub n3_bps: i32,
    pub n3_burst_bytes: i32,
}

/// 控制面接口
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CpInterface {
    pub peers: Vec<String>,
    pub dnn: String,
    pub http_port: String,
    pub enable_ue_ip_alloc: bool,
    pub ue_ip_pool: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct P4rtcInterface {
    pub access_ip: String,
    pub p4rtc_server: String,
    pub p4rtc_port: String,
    pub slice_id: i32,
    pub default_tc: i32,
    pub clear_state_on_restart: bool,
}

impl UpfConfig {
    /// 读取并解析配置文件，每次调用都重新读取磁盘
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let load_err = |source| ConfigAgentError::Load {
            path: display.clone(),
            source,
        };

        let config: Self = Config::builder()
            .add_source(File::new(&display, FileFormat::Json5).required(true))
            .build()
            .map_err(load_err)?
            .try_deserialize()
            .map_err(load_err)?;

        debug!(mode = %config.mode, "UPF 配置已加载");
        Ok(config)
    }
}

impl From<TableSizes> for pb::TableSizes {
    fn from(t: TableSizes) -> Self {
        Self {
            pdr_lookup: t.pdr_lookup,
            flow_measure: t.flow_measure,
            app_qer_lookup: t.app_qer_lookup,
            session_qer_lookup: t.session_qer_lookup,
            far_lookup: t.far_lookup,
        }
    }
}

impl From<SimConfig> for pb::SimConfig {
    fn from(s: SimConfig) -> Self {
        Self {
            core: s.core,
            max_sessions: s.max_sessions,
            start_ue_ip: s.start_ue_ip,
            start_enb_ip: s.start_enb_ip,
            start_aupf_ip: s.start_aupf_ip,
            n6_app_ip: s.n6_app_ip,
            n9_app_ip: s.n9_app_ip,
            start_n3_teid: s.start_n3_teid,
            start_n9_teid: s.start_n9_teid,
            uplink_mbr: s.uplink_mbr,
            uplink_gbr: s.uplink_gbr,
            downlink_mbr: s.downlink_mbr,
            downlink_gbr: s.downlink_gbr,
            pkt_size: s.pkt_size,
            total_flows: s.total_flows,
        }
    }
}

impl From<Interface> for pb::Interface {
    fn from(i: Interface) -> Self {
        Self { ifname: i.ifname }
    }
}

impl From<QosConfig> for pb::QosConfig {
    fn from(q: QosConfig) -> Self {
        Self {
            qci: q.qci,
            cbs: q.cbs,
            ebs: q.ebs,
            pbs: q.pbs,
            burst_duration_ms: q.burst_duration_ms,
            priority: q.priority,
        }
    }
}

impl From<SliceRateLimit> for pb::SliceRateLimit {
    fn from(s: SliceRateLimit) -> Self {
        Self {
            n6_bps: s.n6_bps,
            n6_burst_bytes: s.n6_burst_bytes,
            n3_bps: s.n3_bps,
            n3_burst_bytes: s.n3_burst_bytes,
        }
    }
}

impl From<CpInterface> for pb::CpInterface {
    fn from(c: CpInterface) -> Self {
        Self {
            peers: c.peers,
            dnn: c.dnn,
            http_port: c.http_port,
            enable_ue_ip_alloc: c.enable_ue_ip_alloc,
            ue_ip_pool: c.ue_ip_pool,
        }
    }
}

impl From<P4rtcInterface> for pb::P4rtcInterface {
    fn from(p: P4rtcInterface) -> Self {
        Self {
            access_ip: p.access_ip,
            p4rtc_server: p.p4rtc_server,
            p4rtc_port: p.p4rtc_port,
            slice_id: p.slice_id,
            default_tc: p.default_tc,
            clear_state_on_restart: p.clear_state_on_restart,
        }
    }
}

impl From<UpfConfig> for pb::UpfConfig {
    fn from(c: UpfConfig) -> Self {
        Self {
            mode: c.mode,
            table_sizes: Some(c.table_sizes.into()),
            log_level: c.log_level,
            sim: Some(c.sim.into()),
            hwcksum: c.hwcksum,
            gtppsc: c.gtppsc,
            ddp: c.ddp,
            measure_upf: c.measure_upf,
            measure_flow: c.measure_flow,
            access: Some(c.access.into()),
            core: Some(c.core.into()),
            workers: c.workers,
            max_req_retries: c.max_req_retries,
            resp_timeout: c.resp_timeout,
            enable_ntf: c.enable_ntf,
            enable_p4rt: c.enable_p4rt,
            enable_hb_timer: c.enable_hb_timer,
            enable_gtpu_path_monitoring: c.enable_gtpu_path_monitoring,
            qci_qos_config: c.qci_qos_config.into_iter().map(Into::into).collect(),
            slice_rate_limit_config: Some(c.slice_rate_limit_config.into()),
            cpiface: Some(c.cpiface.into()),
            p4rtciface: Some(c.p4rtciface.into()),
        }
    }
}
