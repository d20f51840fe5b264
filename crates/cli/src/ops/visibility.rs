use std::fmt;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Visibility {
    /// Path in the bucket
    pub path: String,

    /// New visibility, public or private (shows the current value when
    /// omitted)
    pub value: Option<String>,
}

#[derive(Debug)]
pub struct VisibilityOutput {
    pub path: String,
    pub visibility: store::Visibility,
}

impl fmt::Display for VisibilityOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is {}", self.path, self.visibility)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VisibilityError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Visibility {
    type Error = VisibilityError;
    type Output = VisibilityOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        if let Some(value) = &self.value {
            ctx.store
                .set_visibility(&self.path, value.parse().unwrap())
                .await?;
        }

        let visibility = ctx.store.visibility(&self.path).await?;
        Ok(VisibilityOutput {
            path: store::FileStore::normalize(&self.path),
            visibility,
        })
    }
}
