// Presentation layer - HTTP surface over the dashboard controller
pub mod app_state;
pub mod handlers;
pub mod router;
