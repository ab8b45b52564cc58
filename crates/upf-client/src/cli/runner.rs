//! 命令执行器
//!
//! 负责连接各代理服务、发起调用并按输出格式打印结果。

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tonic::transport::Channel;
use tracing::{debug, info};
use upf_proto::config::ConfigRequest;
use upf_proto::config::config_service_client::ConfigServiceClient;
use upf_proto::flow::FlowRequest;
use upf_proto::flow::flow_service_client::FlowServiceClient;
use upf_proto::rule::RuleRequest;
use upf_proto::rule::rule_agent_service_client::RuleAgentServiceClient;
use upf_proto::subscriber::ImsiRequest;
use upf_proto::subscriber::subscriber_service_client::SubscriberServiceClient;
use upf_shared::config::AgentsConfig;

use rule_agent::client::{RemoteSessionStore, RemoteSubscriberDirectory, lazy_channel};
use rule_agent::{RuleResolver, ValidationEngine, ValidationRequest};

use crate::output::{self, FieldRow, OutputFormat, ValidationView};

/// 校验服务 REST 请求体
#[derive(Debug, Serialize)]
pub struct HttpValidateBody<'a> {
    pub imsi: &'a str,
    pub rules: HttpRuleBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct HttpRuleBody<'a> {
    pub pdr_id: &'a str,
    pub dnn: &'a str,
}

/// 校验服务统一响应信封
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = vec![
            FieldRow {
                field: "code".to_string(),
                value: output::outcome_colored(&self.code).to_string(),
            },
            FieldRow {
                field: "message".to_string(),
                value: self.message.clone(),
            },
        ];
        if let Some(serde_json::Value::Object(data)) = &self.data {
            for (key, value) in data {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Array(items) => items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect::<Vec<_>>()
                        .join(", "),
                    other => other.to_string(),
                };
                rows.push(FieldRow {
                    field: key.clone(),
                    value,
                });
            }
        }
        rows
    }
}

/// 命令执行器
pub struct CommandRunner {
    agents: AgentsConfig,
    format: OutputFormat,
    read_timeout: Duration,
}

impl CommandRunner {
    pub fn new(agents: AgentsConfig, format: OutputFormat, read_timeout: Duration) -> Self {
        Self {
            agents,
            format,
            read_timeout,
        }
    }

    fn channel(url: &str) -> Result<Channel> {
        lazy_channel(url).with_context(|| format!("无法创建连接: {url}"))
    }

    /// 订阅流量推送，直到服务端结束或达到条数上限
    pub async fn run_flow(&self, fseid: &str, limit: u64) -> Result<()> {
        let mut client = FlowServiceClient::new(Self::channel(&self.agents.flow_agent_url)?);
        let mut stream = client
            .stream_flow(FlowRequest {
                fseid: fseid.to_string(),
            })
            .await
            .context("StreamFlow 调用失败")?
            .into_inner();

        info!(fseid, limit, "开始接收流量推送");
        let mut received = 0u64;
        while let Some(reply) = stream.message().await.context("流量推送中断")? {
            self.format.print_flow(&reply);
            received += 1;
            if limit > 0 && received >= limit {
                break;
            }
        }
        debug!(received, "流量推送结束");
        Ok(())
    }

    pub async fn run_config(&self) -> Result<()> {
        let mut client = ConfigServiceClient::new(Self::channel(&self.agents.config_agent_url)?);
        let reply = client
            .get_config(ConfigRequest {})
            .await
            .context("GetConfig 调用失败")?
            .into_inner();

        let Some(config) = reply.config else {
            bail!("配置代理返回了空配置");
        };
        self.format.print(&config, || output::config_rows(&config));
        Ok(())
    }

    pub async fn run_imsi(&self, imsi: &str) -> Result<()> {
        let mut client =
            SubscriberServiceClient::new(Self::channel(&self.agents.imsi_agent_url)?);
        let reply = client
            .get_imsi(ImsiRequest {
                imsi: imsi.to_string(),
            })
            .await
            .context("GetImsi 调用失败")?
            .into_inner();

        self.format.print(&reply, || output::imsi_rows(imsi, &reply));
        Ok(())
    }

    pub async fn run_rule(&self, fseid: &str) -> Result<()> {
        let mut client = RuleAgentServiceClient::new(Self::channel(&self.agents.rule_agent_url)?);
        let reply = client
            .get_rule(RuleRequest {
                fseid: fseid.to_string(),
            })
            .await
            .context("GetRule 调用失败")?
            .into_inner();

        let Some(session) = reply.session else {
            bail!("规则代理返回了空会话: {fseid}");
        };
        self.format.print(&session, || output::rule_rows(&session));
        Ok(())
    }

    /// 客户端本地校验：IMSI 代理 + 规则代理作为存储，复用同一套解析与判定
    pub async fn run_validate(&self, imsi: &str, pdr_id: &str, dnn: &str) -> Result<()> {
        let directory = RemoteSubscriberDirectory::new(&self.agents.imsi_agent_url)?;
        let sessions = RemoteSessionStore::new(&self.agents.rule_agent_url)?;
        let engine = ValidationEngine::new(RuleResolver::new(
            Arc::new(directory),
            Arc::new(sessions),
            self.read_timeout,
        ));

        let result = engine
            .validate(&ValidationRequest::new(imsi, pdr_id, dnn))
            .await;

        self.format.print(&ValidationView::from(&result), || {
            output::validation_rows(&result)
        });
        Ok(())
    }

    /// 通过校验服务的 POST /validate 校验
    pub async fn run_validate_http(&self, imsi: &str, pdr_id: &str, dnn: &str) -> Result<()> {
        let url = format!(
            "{}/validate",
            self.agents.validation_server_url.trim_end_matches('/')
        );
        let body = HttpValidateBody {
            imsi,
            rules: HttpRuleBody { pdr_id, dnn },
        };

        let response = reqwest::Client::new()
            .post(&url)
            .timeout(self.read_timeout * 2)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("请求校验服务失败: {url}"))?;

        // 非 2xx 同样带信封，照常解析
        let status = response.status();
        let envelope: Envelope = response
            .json()
            .await
            .with_context(|| format!("校验服务响应无法解析 (HTTP {status})"))?;
        debug!(%status, code = %envelope.code, "校验服务已响应");

        self.format.print(&envelope, || envelope.rows());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_body_shape() {
        let body = HttpValidateBody {
            imsi: "IMSI1",
            rules: HttpRuleBody {
                pdr_id: "pdr3",
                dnn: "ims",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"imsi": "IMSI1", "rules": {"pdr_id": "pdr3", "dnn": "ims"}})
        );
    }

    #[test]
    fn test_envelope_rows_flatten_data() {
        let envelope: Envelope = serde_json::from_str(
            r#"{
                "success": true,
                "code": "CORRECT",
                "message": "ok",
                "data": {"foundIn": "ims", "imsPdrs": ["pdr3", "pdr4"]}
            }"#,
        )
        .unwrap();

        let rows = envelope.rows();
        let value = |field: &str| {
            rows.iter()
                .find(|r| r.field == field)
                .map(|r| r.value.clone())
        };
        assert_eq!(value("foundIn").as_deref(), Some("ims"));
        assert_eq!(value("imsPdrs").as_deref(), Some("pdr3, pdr4"));
        assert_eq!(value("message").as_deref(), Some("ok"));
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"success": false, "code": "INVALID_REQUEST", "message": "bad", "data": null}"#,
        )
        .unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_validate_against_unreachable_agents_still_reports() {
        // 端口 1 上没有服务，本地校验给出 UNAVAILABLE 而不是报错
        let agents = AgentsConfig {
            rule_agent_url: "http://127.0.0.1:1".to_string(),
            imsi_agent_url: "http://127.0.0.1:1".to_string(),
            ..AgentsConfig::default()
        };
        let runner = CommandRunner::new(agents, OutputFormat::Json, Duration::from_millis(200));
        runner.run_validate("IMSI1", "pdr1", "internet").await.unwrap();
    }
}
