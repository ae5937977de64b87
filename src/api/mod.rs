pub mod component_handlers;
pub mod envelope;
pub mod handlers;
pub mod image_handlers;
pub mod routes;

pub use envelope::{ApiError, ApiResult, Envelope};
pub use handlers::AppState;
pub use routes::create_router;
