//! HTTP middleware stack for the storefront backend.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (`http_request` span per request)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Rate limiting on login/registration (governor)
//!
//! Authentication is an extractor ([`RequireAuth`]) rather than a layer, so
//! public routes never pay for token verification.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthUser, RequireAuth};
pub use rate_limit::{auth_rate_limiter, rate_limit_json};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
