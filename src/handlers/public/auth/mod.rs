// handlers/public/auth/mod.rs - Public account and token handlers
//
// Registration, activation and token acquisition. None of these require an
// authenticated caller; they are how a caller becomes one.

pub mod activate; // PUT /v1/users/activated
pub mod register; // POST /v1/users
pub mod token; // POST /v1/tokens/authentication

pub use activate::activate_user;
pub use register::register_user;
pub use token::create_authentication_token;
