// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Health, debug counters, fallbacks and the account endpoints a caller uses
// to obtain a token. These still pass through `authenticate`, so a bad
// Authorization header is rejected here too.

pub mod auth;
pub mod debug;
pub mod fallback;
pub mod health;

pub use debug::debug_vars;
pub use fallback::{method_not_allowed, not_found};
pub use health::healthcheck;
