/*
 * Responsibility
 * - GET /me: echo the identity the gate derived for this request
 * - doubles as the smoke route for the middleware → extractor wiring
 */
use axum::Json;
use serde::Serialize;

use crate::api::v1::extractors::AuthCtxExtractor;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
}

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: ctx.user_id,
        email: ctx.email,
        role: ctx.role,
    })
}
