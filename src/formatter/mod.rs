pub mod json;

pub use json::{HostResult, JsonFormatter};
