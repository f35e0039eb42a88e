/*
 * Responsibility
 * - Public interface of the middleware stack (re-exports)
 */
pub mod auth;
pub mod http;
