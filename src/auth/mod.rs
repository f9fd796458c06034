//! API key authentication for the protected routes.

mod api_key;
mod credentials;
mod middleware;

pub use api_key::{ApiKey, create_api_key, create_api_key_table, get_api_key_for_user};
pub use middleware::api_key_guard;
