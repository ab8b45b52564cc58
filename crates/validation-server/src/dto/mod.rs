//! 请求与响应的数据传输对象

pub mod request;
pub mod response;

pub use request::{DeactivateQuery, RuleBody, SubscriberQuery, ValidateBody};
pub use response::{ApiResponse, DeactivationData, SubscriberRulesData, ValidationData};
