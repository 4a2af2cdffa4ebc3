pub mod handlers;
pub mod models;
pub mod normalize;
pub mod repair;
pub mod store;
