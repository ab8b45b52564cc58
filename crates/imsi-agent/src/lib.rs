//! IMSI 代理
//!
//! 订户目录的 gRPC 出口：IMSI -> internet / ims 会话标识。

pub mod grpc;

pub use grpc::SubscriberServiceImpl;
