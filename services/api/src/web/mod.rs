pub mod analyze;
pub mod auth;
pub mod middleware;
pub mod state;

// Re-export the handlers and middleware to make them easily accessible
// to the binary that builds the web server router.
pub use analyze::{analyze_handler, ApiDoc};
pub use middleware::require_session;
