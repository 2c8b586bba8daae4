//! HTTP handlers. Failures map to `(StatusCode, String)`.

pub mod collections;
pub mod explain;
pub mod search;
