pub mod password;
pub mod token;

pub use password::{validate_password_plaintext, Password, PasswordError};
pub use token::{digest, validate_token_plaintext, Scope, Token, TOKEN_LENGTH};
