//! 远程存储适配
//!
//! 把 IMSI 代理和规则代理的 gRPC 接口包装成 `SubscriberDirectory` / `SessionStore`，
//! 让客户端侧也能复用同一套解析与校验逻辑。
//! NOT_FOUND 视为“不存在”，其它 gRPC 错误一律视为存储不可达。

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::{debug, info};
use upf_proto::rule::RuleRequest;
use upf_proto::rule::rule_agent_service_client::RuleAgentServiceClient;
use upf_proto::subscriber::ImsiRequest;
use upf_proto::subscriber::subscriber_service_client::SubscriberServiceClient;

use crate::error::StoreError;
use crate::models::{RuleBundle, SubscriberSessions};
use crate::store::{SessionStore, SubscriberDirectory};

/// 创建懒连接 Channel，首次调用时才建立连接
pub fn lazy_channel(url: &str) -> Result<Channel, StoreError> {
    let endpoint = Endpoint::from_shared(url.to_string())
        .map_err(|e| StoreError::Unavailable(format!("无效的服务地址 {url}: {e}")))?;
    Ok(endpoint.connect_lazy())
}

/// 空字符串表示未开通
fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn status_to_store_error(service: &str, status: Status) -> StoreError {
    StoreError::Unavailable(format!("{service} 调用失败: {}", status.message()))
}

/// 基于 IMSI 代理的订户目录
#[derive(Clone)]
pub struct RemoteSubscriberDirectory {
    client: SubscriberServiceClient<Channel>,
}

impl RemoteSubscriberDirectory {
    pub fn new(url: &str) -> Result<Self, StoreError> {
        info!(url, "IMSI 代理客户端已初始化（懒连接模式）");
        Ok(Self::from_channel(lazy_channel(url)?))
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self {
            client: SubscriberServiceClient::new(channel),
        }
    }
}

#[async_trait]
impl SubscriberDirectory for RemoteSubscriberDirectory {
    async fn lookup(
        &self,
        subscriber_key: &str,
    ) -> Result<Option<SubscriberSessions>, StoreError> {
        // tonic 客户端 clone 很轻量，避免 &mut self
        let mut client = self.client.clone();
        let request = ImsiRequest {
            imsi: subscriber_key.to_string(),
        };

        match client.get_imsi(request).await {
            Ok(response) => {
                let entry = response.into_inner().imsi.into_iter().next();
                debug!(subscriber_key, found = entry.is_some(), "GetImsi 返回");
                Ok(entry.map(|e| SubscriberSessions {
                    internet: non_empty(e.internet),
                    ims: non_empty(e.ims),
                }))
            }
            Err(status) if status.code() == Code::NotFound => Ok(None),
            Err(status) => Err(status_to_store_error("GetImsi", status)),
        }
    }
}

/// 基于规则代理的会话存储
#[derive(Clone)]
pub struct RemoteSessionStore {
    client: RuleAgentServiceClient<Channel>,
}

impl RemoteSessionStore {
    pub fn new(url: &str) -> Result<Self, StoreError> {
        info!(url, "规则代理客户端已初始化（懒连接模式）");
        Ok(Self::from_channel(lazy_channel(url)?))
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self {
            client: RuleAgentServiceClient::new(channel),
        }
    }
}

#[async_trait]
impl SessionStore for RemoteSessionStore {
    async fn get_rules(&self, session_key: &str) -> Result<Option<RuleBundle>, StoreError> {
        let mut client = self.client.clone();
        let request = RuleRequest {
            fseid: session_key.to_string(),
        };

        match client.get_rule(request).await {
            Ok(response) => {
                let Some(session) = response.into_inner().session else {
                    return Ok(Some(RuleBundle::default()));
                };
                Ok(Some(RuleBundle {
                    pdr_ids: session.pdr.map(|p| p.pdr_id).unwrap_or_default(),
                    far_id: session.far.and_then(|r| non_empty(r.far_id)),
                    qer_id: session.qer.and_then(|r| non_empty(r.qer_id)),
                    urr_id: session.urr.and_then(|r| non_empty(r.urr_id)),
                }))
            }
            Err(status) if status.code() == Code::NotFound => Ok(None),
            Err(status) => Err(status_to_store_error("GetRule", status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(lazy_channel("not a url").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_agent_is_unavailable() {
        // 端口 1 上没有服务
        let directory = RemoteSubscriberDirectory::new("http://127.0.0.1:1").unwrap();
        let err = directory.lookup("IMSI1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        let store = RemoteSessionStore::new("http://127.0.0.1:1").unwrap();
        let err = store.get_rules("fseid1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("fseid1".to_string()), Some("fseid1".to_string()));
    }
}
