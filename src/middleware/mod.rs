//! Middleware components for HTTP request processing.
//!
//! The admission pipeline is layered with Axum's routing system:
//! client-address extraction feeds the DoS guard (`rate_limit`), and the
//! header pre-authenticator (`preauth`) derives a per-request identity for
//! admitted traffic. `gate` composes the two into one middleware.

pub mod gate;
pub mod ip;
pub mod preauth;
pub mod rate_limit;
pub mod security_headers;

pub use preauth::HeaderPreAuth;
pub use rate_limit::DosGuard;
