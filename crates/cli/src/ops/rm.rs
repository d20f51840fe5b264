use std::fmt;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Path in the bucket to remove
    pub path: String,
}

#[derive(Debug)]
pub struct RmOutput {
    pub path: String,
}

impl fmt::Display for RmOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Removed {}", self.path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Rm {
    type Error = RmError;
    type Output = RmOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.store.delete(&self.path).await?;
        Ok(RmOutput {
            path: store::FileStore::normalize(&self.path),
        })
    }
}
