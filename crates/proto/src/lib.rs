//! UPF 代理服务 gRPC 协议定义
//!
//! 由 `build.rs` 通过 tonic-prost-build 从 `proto/upf/*.proto` 生成。

/// 规则代理：会话规则查询、订户规则分类、PDR 校验
pub mod rule {
    tonic::include_proto!("upf.rule");
}

/// 订户目录：IMSI 到会话标识的映射
pub mod subscriber {
    tonic::include_proto!("upf.subscriber");
}

/// 流量计数器推送（服务端流）
pub mod flow {
    tonic::include_proto!("upf.flow");
}

/// UPF 配置查询
pub mod config {
    tonic::include_proto!("upf.config");
}
