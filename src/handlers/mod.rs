// handlers/mod.rs - Two-tier handler layout
//
// Public (anyone, identity optional) → Protected (activated user holding a
// permission). The tier decides which gate `routes.rs` wraps a handler in;
// the handlers themselves only parse, validate and call the models.

pub mod protected;
pub mod public;
