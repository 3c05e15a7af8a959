//! Template snapshot store.
//!
//! Both template variants are loaded into an immutable [`TemplateSet`] and
//! published as an `Arc` snapshot. Each request grabs the snapshot current at
//! dispatch time; the file watcher swaps in a freshly loaded set atomically
//! and in-flight requests keep rendering against the one they started with.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::loader::{load_template, TemplateError};
use crate::schema::PromptTemplate;

/// The two pre-authored template variants, selected by presence of user
/// input.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    pub with_input: PromptTemplate,
    pub without_input: PromptTemplate,
}

impl TemplateSet {
    /// Load both variants from disk.
    pub async fn load(with_input: &Path, without_input: &Path) -> Result<Self, TemplateError> {
        Ok(Self {
            with_input: load_template(with_input).await?,
            without_input: load_template(without_input).await?,
        })
    }

    /// Pick the variant for this request. A latest user turn with any
    /// non-whitespace content selects the with-input variant; this is the
    /// only selection rule.
    pub fn select(&self, user_input: &str) -> &PromptTemplate {
        if user_input.trim().is_empty() {
            &self.without_input
        } else {
            &self.with_input
        }
    }
}

/// Publisher of read-only template snapshots.
pub struct TemplateStore {
    with_input_path: PathBuf,
    without_input_path: PathBuf,
    current: RwLock<Arc<TemplateSet>>,
}

impl TemplateStore {
    /// Load both template files and publish the initial snapshot. Failure
    /// here is fatal: the proxy refuses to start on a malformed template.
    pub async fn open(
        with_input: impl Into<PathBuf>,
        without_input: impl Into<PathBuf>,
    ) -> Result<Self, TemplateError> {
        let with_input_path = with_input.into();
        let without_input_path = without_input.into();
        let set = TemplateSet::load(&with_input_path, &without_input_path).await?;
        Ok(Self::from_set(set, with_input_path, without_input_path))
    }

    /// Publish an already-loaded set. [`TemplateStore::open`] is the
    /// disk-backed constructor.
    pub fn from_set(
        set: TemplateSet,
        with_input: impl Into<PathBuf>,
        without_input: impl Into<PathBuf>,
    ) -> Self {
        Self {
            with_input_path: with_input.into(),
            without_input_path: without_input.into(),
            current: RwLock::new(Arc::new(set)),
        }
    }

    /// The snapshot to use for one request.
    pub async fn snapshot(&self) -> Arc<TemplateSet> {
        self.current.read().await.clone()
    }

    /// Re-read both template files and swap the published snapshot. On
    /// failure the previous snapshot stays published and the error is
    /// returned to the caller (the watcher logs it).
    pub async fn reload(&self) -> Result<(), TemplateError> {
        let set = TemplateSet::load(&self.with_input_path, &self.without_input_path).await?;
        *self.current.write().await = Arc::new(set);
        info!("Template snapshot swapped");
        Ok(())
    }

    /// Paths the file watcher should observe.
    pub fn watched_paths(&self) -> [&Path; 2] {
        [&self.with_input_path, &self.without_input_path]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PromptItem;

    fn set_with_marker() -> TemplateSet {
        TemplateSet {
            with_input: PromptTemplate {
                items: vec![PromptItem::Message {
                    role: "system".into(),
                    content: "with".into(),
                }],
                rules: vec![],
            },
            without_input: PromptTemplate {
                items: vec![PromptItem::Message {
                    role: "system".into(),
                    content: "without".into(),
                }],
                rules: vec![],
            },
        }
    }

    fn marker(template: &PromptTemplate) -> &str {
        match &template.items[0] {
            PromptItem::Message { content, .. } => content,
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn non_empty_input_selects_with_input_variant() {
        let set = set_with_marker();
        assert_eq!(marker(set.select("hello")), "with");
    }

    #[test]
    fn empty_or_whitespace_input_selects_without_input_variant() {
        let set = set_with_marker();
        assert_eq!(marker(set.select("")), "without");
        assert_eq!(marker(set.select("  \n\t")), "without");
    }
}
