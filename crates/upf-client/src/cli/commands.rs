//! CLI 命令定义
//!
//! 每个子命令对应一个代理服务的 RPC，`validate` 在客户端本地完成解析与判定，
//! `validate-http` 则交给校验服务。

use clap::{Parser, Subcommand};
use upf_shared::config::AgentsConfig;

use crate::output::OutputFormat;

/// UPF 代理服务命令行客户端
#[derive(Parser, Debug)]
#[command(name = "upf-client")]
#[command(version, about = "UPF 代理服务命令行客户端")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// 输出格式
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// 单次存储读取超时（毫秒）
    #[arg(long, default_value = "2000")]
    pub timeout_ms: u64,

    #[command(flatten)]
    pub endpoints: Endpoints,

    #[command(subcommand)]
    pub command: Commands,
}

/// 各服务地址，命令行参数优先于环境变量
#[derive(clap::Args, Debug, Clone)]
pub struct Endpoints {
    #[arg(long, env = "UPF_RULE_AGENT_URL", default_value = "http://127.0.0.1:2000")]
    pub rule_agent_url: String,

    #[arg(long, env = "UPF_IMSI_AGENT_URL", default_value = "http://127.0.0.1:4678")]
    pub imsi_agent_url: String,

    #[arg(long, env = "UPF_FLOW_AGENT_URL", default_value = "http://127.0.0.1:50051")]
    pub flow_agent_url: String,

    #[arg(long, env = "UPF_CONFIG_AGENT_URL", default_value = "http://127.0.0.1:3000")]
    pub config_agent_url: String,

    #[arg(
        long,
        env = "UPF_VALIDATION_SERVER_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    pub validation_server_url: String,
}

impl From<Endpoints> for AgentsConfig {
    fn from(endpoints: Endpoints) -> Self {
        Self {
            rule_agent_url: endpoints.rule_agent_url,
            imsi_agent_url: endpoints.imsi_agent_url,
            flow_agent_url: endpoints.flow_agent_url,
            config_agent_url: endpoints.config_agent_url,
            validation_server_url: endpoints.validation_server_url,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 订阅流量计数推送
    Flow {
        #[arg(long)]
        fseid: String,

        /// 收到指定条数后退出，0 表示一直订阅
        #[arg(short = 'n', long, default_value = "0")]
        limit: u64,
    },

    /// 查询 UPF 配置
    Config,

    /// 查询订户的会话标识
    Imsi {
        #[arg(long)]
        imsi: String,
    },

    /// 查询会话规则
    Rule {
        #[arg(long)]
        fseid: String,
    },

    /// 在客户端解析订户规则并校验 PDR
    Validate {
        #[arg(long)]
        imsi: String,

        #[arg(long)]
        pdr_id: String,

        /// 声明的流量类别（internet / ims）
        #[arg(long)]
        dnn: String,
    },

    /// 通过校验服务的 REST 接口校验 PDR
    ValidateHttp {
        #[arg(long)]
        imsi: String,

        #[arg(long)]
        pdr_id: String,

        #[arg(long)]
        dnn: String,
    },
}
