pub mod client;
pub mod invoker;
pub mod mapper;
pub mod pagination;
pub mod rate_limiter;
pub mod resolver;
pub mod status;
pub mod xml;

pub use crate::domain::model::{Operation, RpcRequest, ServiceEndpoint};
pub use crate::domain::ports::{Clock, RateLimiter, RpcTransport};
pub use crate::utils::error::Result;
