pub mod auth;
pub mod error_handler;
pub mod request_id;

pub use auth::{hash_api_key, verify_api_key, AdminApiKey, AdminCapability};
pub use error_handler::{error_response, json_error_handler, ErrorHandler};
pub use request_id::{RequestId, RequestIdValue};
