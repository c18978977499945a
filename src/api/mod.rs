pub mod json;
pub mod params;

pub use json::{JsonBody, MAX_BODY_BYTES};
pub use params::{read_csv, read_id, read_int, read_string};
