pub mod context;
pub mod fusion;
pub mod multi_query;
pub mod store;
pub mod vector;
