use std::fmt;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Mv {
    /// Source path in the bucket
    pub source: String,

    /// Destination path; must not already exist
    pub destination: String,
}

#[derive(Debug)]
pub struct MvOutput {
    pub source: String,
    pub destination: String,
}

impl fmt::Display for MvOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Moved {} to {}", self.source, self.destination)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MvError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Mv {
    type Error = MvError;
    type Output = MvOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.store
            .move_file(&self.source, &self.destination, store::WriteOptions::default())
            .await?;
        Ok(MvOutput {
            source: store::FileStore::normalize(&self.source),
            destination: store::FileStore::normalize(&self.destination),
        })
    }
}
