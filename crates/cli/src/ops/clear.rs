use std::fmt;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Clear {
    /// Confirm removing every record in the bucket
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug)]
pub struct ClearOutput {
    pub bucket: String,
}

impl fmt::Display for ClearOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Removed every record in bucket {}", self.bucket)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClearError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
    #[error("refusing to clear the bucket without --force")]
    Unconfirmed,
}

#[async_trait::async_trait]
impl crate::op::Op for Clear {
    type Error = ClearError;
    type Output = ClearOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        if !self.force {
            return Err(ClearError::Unconfirmed);
        }

        ctx.store.delete_everything().await?;
        Ok(ClearOutput {
            bucket: ctx.store.bucket().to_string(),
        })
    }
}
