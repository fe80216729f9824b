use crate::domain::model::{RpcRequest, ServiceEndpoint};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Instant;

/// Single-attempt remote call. Implementations never retry.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(
        &self,
        endpoint: &ServiceEndpoint,
        request: &RpcRequest,
    ) -> Result<serde_json::Value>;
}

/// Fails fast: returns `false` instead of waiting for budget.
pub trait RateLimiter: Send + Sync {
    fn try_acquire(&self, window_key: &str) -> bool;
}

pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
