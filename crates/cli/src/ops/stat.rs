use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Args, Debug, Clone)]
pub struct Stat {
    /// Path in the bucket to inspect
    pub path: String,
}

#[derive(Debug)]
pub struct StatOutput {
    pub path: String,
    pub size: u64,
    pub mime_type: Option<String>,
    pub visibility: store::Visibility,
    pub last_modified: OffsetDateTime,
}

impl fmt::Display for StatOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modified = self
            .last_modified
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_string());
        writeln!(f, "{} {}", "Path:".dimmed(), self.path.bold())?;
        writeln!(f, "{} {} bytes", "Size:".dimmed(), self.size)?;
        writeln!(
            f,
            "{} {}",
            "Type:".dimmed(),
            self.mime_type.as_deref().unwrap_or("-")
        )?;
        writeln!(f, "{} {}", "Visibility:".dimmed(), self.visibility)?;
        write!(f, "{} {}", "Modified:".dimmed(), modified)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Stat {
    type Error = StatError;
    type Output = StatOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let size = ctx.store.file_size(&self.path).await?;
        let visibility = ctx.store.visibility(&self.path).await?;
        let last_modified = ctx.store.last_modified(&self.path).await?;
        // An empty stored mime type is reported as absent, not an error.
        let mime_type = match ctx.store.mime_type(&self.path).await {
            Ok(mime_type) => Some(mime_type),
            Err(store::StoreError::Metadata { .. }) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(StatOutput {
            path: store::FileStore::normalize(&self.path),
            size,
            mime_type,
            visibility,
            last_modified,
        })
    }
}
