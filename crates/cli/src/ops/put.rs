use std::fmt;
use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Destination path in the bucket
    pub path: String,

    /// Local file to upload (reads stdin when omitted)
    pub file: Option<PathBuf>,

    /// Visibility for the record (public or private)
    #[arg(long)]
    pub visibility: Option<String>,
}

#[derive(Debug)]
pub struct PutOutput {
    pub path: String,
    pub size: usize,
}

impl fmt::Display for PutOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wrote {} ({} bytes)", self.path, self.size)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Put {
    type Error = PutError;
    type Output = PutOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let contents = match &self.file {
            Some(file) => tokio::fs::read(file).await?,
            None => {
                use tokio::io::AsyncReadExt;
                let mut buffer = Vec::new();
                tokio::io::stdin().read_to_end(&mut buffer).await?;
                buffer
            }
        };

        let options = store::WriteOptions {
            visibility: self.visibility.as_deref().map(|v| v.parse().unwrap()),
            ..Default::default()
        };
        ctx.store.write(&self.path, &contents, options).await?;

        Ok(PutOutput {
            path: store::FileStore::normalize(&self.path),
            size: contents.len(),
        })
    }
}
