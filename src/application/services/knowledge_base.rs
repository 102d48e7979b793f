//! Knowledge-base persistence service
//!
//! Loads a tree file into memory and writes it back in the text format.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{parse_bytes_with, Branch, DecisionTree, Diagnostic, DomainError, NodeId};
use crate::infrastructure::traits::FileSystem;

/// A tree together with the file it came from.
#[derive(Debug)]
pub struct KnowledgeBase {
    /// File the tree was loaded from
    pub path: PathBuf,
    /// The decision tree
    pub tree: DecisionTree,
    /// Structural anomalies tolerated while loading
    pub diagnostics: Vec<Diagnostic>,
}

/// Service for loading, saving and growing knowledge bases.
pub struct KnowledgeBaseService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl KnowledgeBaseService {
    /// Create a new knowledge-base service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Read and parse a knowledge-base file.
    ///
    /// An unreadable file is `FileUnavailable`; a file that does not parse is
    /// a domain `MalformedInput`.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<KnowledgeBase> {
        let bytes = self.fs.read(path).or_unavailable(path)?;
        let parsed = parse_bytes_with(&bytes, self.settings.parse_options())?;
        for diagnostic in &parsed.diagnostics {
            warn!("{}: {}", path.display(), diagnostic);
        }
        info!("loaded {} nodes from {}", parsed.tree.len(), path.display());
        Ok(KnowledgeBase {
            path: path.to_path_buf(),
            tree: parsed.tree,
            diagnostics: parsed.diagnostics,
        })
    }

    /// Render a tree in the configured text layout.
    pub fn render(&self, tree: &DecisionTree) -> String {
        self.settings.writer().write(tree)
    }

    /// Write a tree to `path`, replacing the file atomically.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn save(&self, path: &Path, tree: &DecisionTree) -> ApplicationResult<()> {
        if tree.is_empty() {
            return Err(DomainError::EmptyTree.into());
        }
        let text = self.render(tree);
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory for", path)?;
        self.fs
            .write_atomic(path, &text)
            .with_path_context("save knowledge base", path)?;
        debug!("saved {} nodes to {}", tree.len(), path.display());
        Ok(())
    }

    /// Split the leaf reached by `path` so it learns `answer`.
    ///
    /// `question` must be answered "yes" for `answer` and "no" for the
    /// leaf's current answer.
    #[instrument(level = "debug", skip(self, kb))]
    pub fn learn(
        &self,
        kb: &mut KnowledgeBase,
        path: &[Branch],
        answer: &str,
        question: &str,
    ) -> ApplicationResult<NodeId> {
        let id = kb.tree.walk(path)?;
        kb.tree.split_leaf(id, answer, question)?;
        info!("learned {:?} under {:?}", answer, question);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    fn service() -> KnowledgeBaseService {
        KnowledgeBaseService::new(Arc::new(RealFileSystem), Arc::new(Settings::default()))
    }

    #[test]
    fn given_missing_file_when_loading_then_file_unavailable() {
        let temp = TempDir::new().unwrap();
        let err = service().load(&temp.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, ApplicationError::FileUnavailable { .. }));
    }

    #[test]
    fn given_empty_tree_when_saving_then_refused() {
        let temp = TempDir::new().unwrap();
        let err = service()
            .save(&temp.path().join("kb.txt"), &DecisionTree::new())
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::EmptyTree)));
        assert!(!temp.path().join("kb.txt").exists());
    }
}
