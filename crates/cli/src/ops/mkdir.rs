use std::fmt;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Mkdir {
    /// Directory path to create
    pub path: String,
}

#[derive(Debug)]
pub struct MkdirOutput {
    pub path: String,
}

impl fmt::Display for MkdirOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Created directory {}", self.path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MkdirError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Mkdir {
    type Error = MkdirError;
    type Output = MkdirOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.store
            .create_directory(&self.path, store::WriteOptions::default())
            .await?;
        Ok(MkdirOutput {
            path: store::FileStore::normalize(&self.path),
        })
    }
}
