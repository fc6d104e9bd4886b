pub mod auth;
pub mod response;

pub use auth::{require_admin, require_caller};
pub use response::{ApiResponse, ApiResult};
