pub mod api;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod order;
pub mod product;

pub use api::{create_app, service_error_to_response, ApiState, RouterSettings};
pub use health::*;
pub use metrics::*;
pub use middleware::*;
