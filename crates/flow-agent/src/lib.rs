//! 流量代理
//!
//! 按会话维护模拟的收发计数器，并以服务端流的方式周期性推送。

pub mod counters;
pub mod grpc;

pub use counters::{FlowCounters, FlowIncrement, FlowTable};
pub use grpc::FlowServiceImpl;
