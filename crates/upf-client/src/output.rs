//! 输出格式化
//!
//! 表格用于人工查看，JSON 便于脚本处理。

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use rule_agent::{Outcome, ValidationResult};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};
use upf_proto::config::UpfConfig;
use upf_proto::flow::FlowReply;
use upf_proto::rule::Rulestruct;
use upf_proto::subscriber::ImsiReply;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// 两列表格的一行
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "FIELD")]
    pub field: String,
    #[tabled(rename = "VALUE")]
    pub value: String,
}

impl FieldRow {
    fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct FlowRow {
    #[tabled(rename = "#")]
    pub count: u64,
    #[tabled(rename = "RX PKT")]
    pub rx_packet: u64,
    #[tabled(rename = "TX PKT")]
    pub tx_packet: u64,
    #[tabled(rename = "TOTAL PKT")]
    pub total_packets: u64,
    #[tabled(rename = "RX SPEED")]
    pub rx_speed: u64,
    #[tabled(rename = "TX SPEED")]
    pub tx_speed: u64,
    #[tabled(rename = "TOTAL SPEED")]
    pub total_speed: u64,
}

impl From<&FlowReply> for FlowRow {
    fn from(reply: &FlowReply) -> Self {
        Self {
            count: reply.count,
            rx_packet: reply.rx_packet,
            tx_packet: reply.tx_packet,
            total_packets: reply.total_packets,
            rx_speed: reply.rx_speed,
            tx_speed: reply.tx_speed,
            total_speed: reply.total_speed,
        }
    }
}

/// 空值显示为 `-`
fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn join_or_dash(values: &[String]) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}

pub fn outcome_colored(outcome: &str) -> ColoredString {
    match outcome {
        "CORRECT" => outcome.green().bold(),
        "CLASS_MISMATCH" | "NOT_FOUND" => outcome.yellow().bold(),
        _ => outcome.red().bold(),
    }
}

fn table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn imsi_rows(imsi: &str, reply: &ImsiReply) -> Vec<FieldRow> {
    let mut rows = vec![FieldRow::new("imsi", imsi)];
    for entry in &reply.imsi {
        rows.push(FieldRow::new("internet", or_dash(&entry.internet)));
        rows.push(FieldRow::new("ims", or_dash(&entry.ims)));
    }
    rows
}

pub fn rule_rows(rules: &Rulestruct) -> Vec<FieldRow> {
    let mut rows = Vec::new();
    if let Some(pdr) = &rules.pdr {
        rows.push(FieldRow::new("fseid", or_dash(&pdr.fseid)));
        rows.push(FieldRow::new("pdr", join_or_dash(&pdr.pdr_id)));
    }
    if let Some(far) = &rules.far {
        rows.push(FieldRow::new("far", or_dash(&far.far_id)));
    }
    if let Some(qer) = &rules.qer {
        rows.push(FieldRow::new("qer", or_dash(&qer.qer_id)));
    }
    if let Some(urr) = &rules.urr {
        rows.push(FieldRow::new("urr", or_dash(&urr.urr_id)));
    }
    rows
}

pub fn config_rows(config: &UpfConfig) -> Vec<FieldRow> {
    let mut rows = vec![
        FieldRow::new("mode", or_dash(&config.mode)),
        FieldRow::new("log_level", or_dash(&config.log_level)),
        FieldRow::new("workers", config.workers),
        FieldRow::new("max_req_retries", config.max_req_retries),
        FieldRow::new("resp_timeout", or_dash(&config.resp_timeout)),
        FieldRow::new("hwcksum", config.hwcksum),
        FieldRow::new("gtppsc", config.gtppsc),
        FieldRow::new("measure_upf", config.measure_upf),
        FieldRow::new("measure_flow", config.measure_flow),
        FieldRow::new("enable_p4rt", config.enable_p4rt),
        FieldRow::new("enable_hb_timer", config.enable_hb_timer),
    ];
    if let Some(access) = &config.access {
        rows.push(FieldRow::new("access", or_dash(&access.ifname)));
    }
    if let Some(core) = &config.core {
        rows.push(FieldRow::new("core", or_dash(&core.ifname)));
    }
    if let Some(sizes) = &config.table_sizes {
        rows.push(FieldRow::new(
            "table_sizes",
            format!(
                "pdr={} flow={} app_qer={} session_qer={} far={}",
                sizes.pdr_lookup,
                sizes.flow_measure,
                sizes.app_qer_lookup,
                sizes.session_qer_lookup,
                sizes.far_lookup
            ),
        ));
    }
    if let Some(cpiface) = &config.cpiface {
        rows.push(FieldRow::new("cpiface.dnn", or_dash(&cpiface.dnn)));
        rows.push(FieldRow::new("cpiface.peers", join_or_dash(&cpiface.peers)));
    }
    rows.push(FieldRow::new("qci_qos_config", config.qci_qos_config.len()));
    rows
}

/// 本地校验结果，outcome 带颜色
pub fn validation_rows(result: &ValidationResult) -> Vec<FieldRow> {
    let mut rows = vec![
        FieldRow::new("outcome", outcome_colored(result.outcome.as_str())),
        FieldRow::new(
            "found_in",
            result.found_in.map(|c| c.as_str()).unwrap_or("-"),
        ),
        FieldRow::new("message", &result.message),
    ];
    if let Some(field) = result.missing_field {
        rows.push(FieldRow::new("missing_field", field));
    }
    if let Some(classified) = &result.classified {
        rows.push(FieldRow::new(
            "internet_pdrs",
            join_or_dash(&classified.internet_pdrs),
        ));
        rows.push(FieldRow::new("ims_pdrs", join_or_dash(&classified.ims_pdrs)));
        if classified.is_degraded() {
            let degraded: Vec<String> = classified
                .degraded
                .iter()
                .map(|c| c.as_str().to_string())
                .collect();
            rows.push(FieldRow::new("degraded", degraded.join(", ")));
        }
    }
    rows
}

/// 本地校验结果的 JSON 形态，字段与校验服务的 data 保持一致
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationView<'a> {
    pub outcome: Outcome,
    pub found_in: Option<&'static str>,
    pub missing_field: Option<&'static str>,
    pub message: &'a str,
    pub internet_pdrs: Option<&'a [String]>,
    pub ims_pdrs: Option<&'a [String]>,
    pub degraded_classes: Vec<&'static str>,
}

impl<'a> From<&'a ValidationResult> for ValidationView<'a> {
    fn from(result: &'a ValidationResult) -> Self {
        let classified = result.classified.as_ref();
        Self {
            outcome: result.outcome,
            found_in: result.found_in.map(|c| c.as_str()),
            missing_field: result.missing_field,
            message: &result.message,
            internet_pdrs: classified.map(|c| c.internet_pdrs.as_slice()),
            ims_pdrs: classified.map(|c| c.ims_pdrs.as_slice()),
            degraded_classes: classified
                .map(|c| c.degraded.iter().map(|d| d.as_str()).collect())
                .unwrap_or_default(),
        }
    }
}

impl OutputFormat {
    /// JSON 直接序列化 `data`，表格使用调用方给出的行
    pub fn print<T, R>(&self, data: &T, rows: impl FnOnce() -> Vec<R>)
    where
        T: Serialize,
        R: Tabled,
    {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Table => {
                println!("{}", table(rows()));
            }
        }
    }

    /// 流式输出：JSON 每条一行，表格每条一张单行表
    pub fn print_flow(&self, reply: &FlowReply) {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(reply).unwrap_or_default());
            }
            OutputFormat::Table => {
                if reply.count <= 1 {
                    println!("all_imsi: {}", join_or_dash(&reply.all_imsi));
                }
                println!("{}", table([FlowRow::from(reply)]));
            }
        }
    }
}
