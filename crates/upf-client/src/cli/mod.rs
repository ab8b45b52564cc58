//! CLI 模块
//!
//! ```bash
//! # 订阅流量推送，收到 5 条后退出
//! upf-client flow --fseid exampleFSEID -n 5
//!
//! # 查询配置、订户、会话规则
//! upf-client config
//! upf-client imsi --imsi IMSI1
//! upf-client --format json rule --fseid fseid1
//!
//! # 本地校验 / 经校验服务校验
//! upf-client validate --imsi IMSI1 --pdr-id pdr3 --dnn ims
//! upf-client validate-http --imsi 001011234567890 --pdr-id pdr1 --dnn internet
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands, Endpoints};
pub use runner::CommandRunner;
