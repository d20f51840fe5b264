use std::fmt;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Cp {
    /// Source path in the bucket
    pub source: String,

    /// Destination path
    pub destination: String,
}

#[derive(Debug)]
pub struct CpOutput {
    pub source: String,
    pub destination: String,
}

impl fmt::Display for CpOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Copied {} to {}", self.source, self.destination)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CpError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Cp {
    type Error = CpError;
    type Output = CpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.store
            .copy_file(&self.source, &self.destination, store::WriteOptions::default())
            .await?;
        Ok(CpOutput {
            source: store::FileStore::normalize(&self.source),
            destination: store::FileStore::normalize(&self.destination),
        })
    }
}
