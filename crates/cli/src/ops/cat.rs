use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// Path in the bucket to read
    pub path: String,
}

#[derive(Debug)]
pub enum CatContent {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug)]
pub struct CatOutput {
    pub path: String,
    pub size: usize,
    pub content: CatContent,
}

impl fmt::Display for CatOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            CatContent::Text(text) => {
                writeln!(
                    f,
                    "{} {}  {} {} bytes",
                    "File:".dimmed(),
                    self.path.bold(),
                    "Size:".dimmed(),
                    self.size
                )?;
                write!(f, "{text}")
            }
            CatContent::Binary(bytes) => {
                writeln!(
                    f,
                    "{} {}  {} {} bytes",
                    "File:".dimmed(),
                    self.path.bold(),
                    "Size:".dimmed(),
                    self.size
                )?;
                let hex = bytes
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "{} {hex}", "Binary content (hex):".dimmed())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Cat {
    type Error = CatError;
    type Output = CatOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bytes = ctx.store.read(&self.path).await?.to_vec();
        let size = bytes.len();

        let content = match String::from_utf8(bytes.clone()) {
            Ok(text) => CatContent::Text(text),
            Err(_) => CatContent::Binary(bytes),
        };

        Ok(CatOutput {
            path: store::FileStore::normalize(&self.path),
            size,
            content,
        })
    }
}
