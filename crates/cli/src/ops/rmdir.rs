use std::fmt;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Rmdir {
    /// Directory path to remove, including everything under it
    pub path: String,
}

#[derive(Debug)]
pub struct RmdirOutput {
    pub path: String,
}

impl fmt::Display for RmdirOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Removed directory {}", self.path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RmdirError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Rmdir {
    type Error = RmdirError;
    type Output = RmdirOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.store.delete_directory(&self.path).await?;
        Ok(RmdirOutput {
            path: store::FileStore::normalize(&self.path),
        })
    }
}
