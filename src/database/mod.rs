pub mod manager;
pub mod models;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::Models;
