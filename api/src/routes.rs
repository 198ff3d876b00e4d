//! Request handlers.

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use textframe_auth::{DevicePublicKey, NonceSignature};
use textframe_types::{
    DeviceId, NonceResponse, RegisterKeyRequest, RegisterKeyResponse, SearchRequest,
    HEADER_DEVICE_ID, HEADER_SIGNATURE,
};
use tracing::{debug, info, warn};

/// `POST /register_public_key`. Failures are reported in the body, never
/// as an HTTP error.
pub async fn register_public_key(
    State(state): State<AppState>,
    body: Result<Json<RegisterKeyRequest>, JsonRejection>,
) -> Json<RegisterKeyResponse> {
    match register(&state, body) {
        Ok(()) => Json(RegisterKeyResponse::success()),
        Err(message) => {
            warn!("Registration rejected: {}", message);
            Json(RegisterKeyResponse::error(message))
        }
    }
}

fn register(
    state: &AppState,
    body: Result<Json<RegisterKeyRequest>, JsonRejection>,
) -> Result<(), String> {
    let Json(request) = body.map_err(|e| e.body_text())?;
    let device_id = DeviceId::parse(&request.uuid).map_err(|e| e.to_string())?;
    let public_key = DevicePublicKey::from_base64(&request.public_key).map_err(|e| e.to_string())?;

    let change = state
        .registry
        .upsert(&device_id, &public_key)
        .map_err(|e| e.to_string())?;
    info!("Registered key for device {} ({:?})", device_id, change);
    Ok(())
}

/// `POST /get_nonce`. Only registered devices are issued a nonce.
pub async fn get_nonce(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<NonceResponse>> {
    let device_id = header(&headers, HEADER_DEVICE_ID)
        .ok_or_else(|| ApiError::BadRequest(format!("{HEADER_DEVICE_ID} header missing")))?;
    let device_id = DeviceId::parse(device_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if state.registry.public_key(&device_id)?.is_none() {
        return Err(ApiError::Unauthorized("User not registered".to_string()));
    }

    let nonce = state.nonces.issue(&device_id).await;
    Ok(Json(NonceResponse { nonce }))
}

/// `POST /search`, guarded by [`verify_request`].
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<Vec<String>>> {
    let device_id = verify_request(&state, &headers).await?;
    debug!(
        "Device {} searching {} via {}",
        device_id,
        request.video_id,
        state.backend.name()
    );
    let positions = state
        .backend
        .search(&request.video_id, &request.query)
        .await?;
    Ok(Json(positions))
}

/// Checks the authentication headers of a privileged request and returns
/// the authenticated device.
///
/// The device's outstanding nonce is consumed by any attempt that names a
/// registered device, whether or not the signature verifies.
pub async fn verify_request(state: &AppState, headers: &HeaderMap) -> ApiResult<DeviceId> {
    let (Some(device_id), Some(signature)) = (
        header(headers, HEADER_DEVICE_ID),
        header(headers, HEADER_SIGNATURE),
    ) else {
        return Err(ApiError::BadRequest(
            "Missing authentication headers".to_string(),
        ));
    };

    let device_id = DeviceId::parse(device_id)
        .map_err(|_| ApiError::Unauthorized("User not registered".to_string()))?;
    let public_key = state
        .registry
        .public_key(&device_id)?
        .ok_or_else(|| ApiError::Unauthorized("User not registered".to_string()))?;

    let nonce = state
        .nonces
        .take(&device_id)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Invalid nonce".to_string()))?;

    NonceSignature::from_base64(signature)
        .and_then(|signature| public_key.verify_nonce(&nonce, &signature))
        .map_err(|_| {
            warn!("Rejected signature from device {}", device_id);
            ApiError::Unauthorized("Invalid signature".to_string())
        })?;

    Ok(device_id)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
