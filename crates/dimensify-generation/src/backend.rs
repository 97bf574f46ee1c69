pub mod blocking;
pub mod polling;

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{AssetRef, GenerationRequest},
};

/// A backend that turns one request into finished assets
///
/// Implementations own their whole protocol, whether that is a single call
/// or a submit-then-poll session.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run the request to a terminal result
    ///
    /// A success always carries at least one asset.
    async fn run(&self, request: &GenerationRequest) -> Result<Vec<AssetRef>>;

    /// Backend name used in logs
    fn name(&self) -> &str;
}
