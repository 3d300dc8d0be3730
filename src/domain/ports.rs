use crate::domain::model::{Criteria, Notification, Offer};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait FareProvider: Send + Sync {
    /// All offers for the routes, dates and cabins in `criteria`. Fails with
    /// `ProviderError` on any transport, status or decoding problem.
    async fn search(&self, criteria: &Criteria) -> Result<Vec<Offer>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}
