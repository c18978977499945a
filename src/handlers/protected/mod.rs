// handlers/protected/mod.rs - Protected handlers (permission required)
//
// Routes in this tier are wrapped by `require_permission`, which in turn
// requires an authenticated, activated user.

pub mod movies;
