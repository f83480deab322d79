pub mod access;
pub mod context;
pub mod response;

pub use access::{access_control_middleware, decide, AccessDecision, RouteClass};
pub use context::context_middleware;
pub use response::{ApiResponse, ApiResult};
