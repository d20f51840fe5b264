//! The operation interface every subcommand implements.

use std::fmt::Display;

use store::FileStore;

/// Shared context handed to every op.
pub struct OpContext {
    pub store: FileStore,
}

/// One executable CLI operation: typed output for rendering, typed
/// error for exit reporting.
#[async_trait::async_trait]
pub trait Op {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: Display;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}
