// Presentation layer - axum surface over one view session
pub mod app_state;
pub mod handlers;
pub mod interaction;
