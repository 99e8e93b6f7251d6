pub mod db;
pub mod errors;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod store;
