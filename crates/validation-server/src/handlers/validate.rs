//! 校验 API 处理器
//!
//! 业务结果（CORRECT / CLASS_MISMATCH / NOT_FOUND）一律 200，
//! 通过 `code` 和 `data.outcome` 区分；MISSING_FIELD 为 400，UNAVAILABLE 为 503。

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use rule_agent::{Outcome, ValidationRequest};
use tracing::instrument;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, DeactivateQuery, DeactivationData, SubscriberQuery, SubscriberRulesData,
        ValidateBody, ValidationData,
    },
    error::{ApiError, Result},
    state::AppState,
};

fn outcome_status(outcome: Outcome) -> StatusCode {
    match outcome {
        Outcome::Correct | Outcome::ClassMismatch | Outcome::NotFound => StatusCode::OK,
        Outcome::MissingField => StatusCode::BAD_REQUEST,
        Outcome::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// 查询订户的 PDR 分类
///
/// GET /validate?imsi=
#[instrument(skip(state))]
pub async fn get_subscriber_rules(
    State(state): State<AppState>,
    Query(query): Query<SubscriberQuery>,
) -> Result<Json<ApiResponse<SubscriberRulesData>>> {
    query.validate()?;

    let classified = state.engine.resolver().resolve_subscriber(&query.imsi).await?;

    Ok(Json(ApiResponse::success(SubscriberRulesData::new(
        query.imsi, classified,
    ))))
}

/// 校验 PDR 是否属于声明的类别
///
/// POST /validate，PUT /validate
#[instrument(skip(state, payload))]
pub async fn validate_pdr(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ValidateBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ValidationData>>)> {
    let Json(body) = payload?;
    let request = ValidationRequest::new(body.imsi, body.rules.pdr_id, body.rules.dnn);

    let result = state.engine.validate(&request).await;
    let status = outcome_status(result.outcome);
    let success = status == StatusCode::OK;

    let message = result.message.clone();
    let data = ValidationData::new(&request, &result);
    Ok((
        status,
        Json(ApiResponse::with_code(
            success,
            result.outcome.as_str(),
            message,
            data,
        )),
    ))
}

/// 停用订户的某个 PDR
///
/// DELETE /validate?imsi=&pdr_id=
#[instrument(skip(state))]
pub async fn deactivate_pdr(
    State(state): State<AppState>,
    Query(query): Query<DeactivateQuery>,
) -> Result<Json<ApiResponse<DeactivationData>>> {
    query.validate()?;

    let affected = state
        .maintenance
        .deactivate_pdr(&query.imsi, &query.pdr_id)
        .await?;

    if affected == 0 {
        return Err(ApiError::PdrNotFound {
            imsi: query.imsi,
            pdr_id: query.pdr_id,
        });
    }

    Ok(Json(ApiResponse::success(DeactivationData::new(
        query.imsi,
        query.pdr_id,
    ))))
}
