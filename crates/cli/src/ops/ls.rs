use std::fmt;

use clap::Args;
use comfy_table::Table;
use futures::TryStreamExt;
use time::format_description::well_known::Rfc3339;

use store::Entry;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Path in the bucket to list (defaults to root)
    pub path: Option<String>,

    /// List recursively
    #[arg(long)]
    pub deep: bool,
}

#[derive(Debug)]
pub struct LsOutput {
    pub entries: Vec<Entry>,
}

impl fmt::Display for LsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "No entries found");
        }

        let mut table = Table::new();
        table.set_header(vec!["TYPE", "PATH", "SIZE", "VISIBILITY", "MODIFIED"]);
        for entry in &self.entries {
            match entry {
                Entry::Directory(directory) => {
                    table.add_row(vec![
                        "dir".to_string(),
                        directory.path.clone(),
                        "-".to_string(),
                        "-".to_string(),
                        "-".to_string(),
                    ]);
                }
                Entry::File(file) => {
                    let modified = file
                        .last_modified
                        .format(&Rfc3339)
                        .unwrap_or_else(|_| "-".to_string());
                    table.add_row(vec![
                        "file".to_string(),
                        file.path.clone(),
                        file.size.to_string(),
                        file.visibility.to_string(),
                        modified,
                    ]);
                }
            }
        }
        write!(f, "{table}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = LsError;
    type Output = LsOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let path = self.path.as_deref().unwrap_or("/");
        let entries = ctx
            .store
            .list_contents(path, self.deep)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(LsOutput { entries })
    }
}
