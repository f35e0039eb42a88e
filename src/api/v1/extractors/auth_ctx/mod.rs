/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Provide handlers with the context of an authenticated request (AuthCtx)
 * - HTTP / axum concerns live in core; plain type definitions live in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::AuthCtx;
