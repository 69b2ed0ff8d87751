// Presentation layer - HTTP routes over the envelope services
pub mod app_state;
pub mod handlers;
