pub mod auth;
pub mod cors;
pub mod gates;
pub mod metrics;
pub mod rate_limit;
pub mod recover;
pub mod response;

pub use auth::{authenticate, AuthUser};
pub use cors::enable_cors;
pub use gates::{require_activated_user, require_authenticated_user, require_permission};
pub use metrics::{track_metrics, Metrics, MetricsSnapshot};
pub use rate_limit::{rate_limit, RateLimiter};
pub use recover::recover_panic;
pub use response::{envelope, ApiResponse, ApiResult, Envelope};
