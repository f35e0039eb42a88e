/*
 * Responsibility
 * - The "authenticated context" type as seen from handlers
 * - The middleware verifies the token and stores this in request extensions;
 *   handlers only ever receive this type
 */

use crate::services::auth::VerifiedIdentity;

/// Context attached to an authenticated request.
///
/// - `user_id` is the subject the token was issued for (never empty)
/// - `role` is coarse-grained; fine-grained authorization happens downstream
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub user_id: String,
    pub email: Option<String>,
    pub role: String,
}

impl From<VerifiedIdentity> for AuthCtx {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
            role: identity.role,
        }
    }
}
