//! POST /identify

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::resolver::IdentityView;
use crate::AppState;

/// Request body
///
/// `phoneNumber` may arrive as a JSON string or number.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone_number: Option<String>,
}

/// Response body
#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
    pub contact: IdentityView,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "phoneNumber must be a string or number, got {}",
            other
        ))),
    }
}

/// POST /identify
///
/// Resolve the submitted email/phone into its consolidated identity.
pub async fn identify(
    State(state): State<AppState>,
    payload: Result<Json<IdentifyRequest>, JsonRejection>,
) -> ApiResult<Json<IdentifyResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let span = info_span!("identify", request_id = %Uuid::new_v4());
    let view = state
        .resolver
        .resolve(request.email.as_deref(), request.phone_number.as_deref())
        .instrument(span)
        .await?;

    Ok(Json(IdentifyResponse { contact: view }))
}

/// Build identify routes
pub fn identify_routes() -> Router<AppState> {
    Router::new().route("/identify", post(identify))
}
