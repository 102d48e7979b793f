//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{KnowledgeBaseService, SessionService};
use crate::config::Settings;
use crate::infrastructure::graph::GraphRenderer;
use crate::infrastructure::traits::{
    CommandRunner, FileSystem, Prompter, RealCommandRunner, RealFileSystem, StdioPrompter,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,

    /// Interactive prompt abstraction
    pub prompter: Arc<dyn Prompter>,

    pub knowledge_base: KnowledgeBaseService,
    pub session: SessionService,
    pub renderer: GraphRenderer,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(RealCommandRunner),
            Arc::new(StdioPrompter),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        let settings = Arc::new(settings);
        let knowledge_base = KnowledgeBaseService::new(fs.clone(), settings.clone());
        let session = SessionService::new(prompter.clone());
        let renderer = GraphRenderer::new(fs.clone(), cmd.clone(), settings.graph.clone());

        Self {
            settings,
            fs,
            cmd,
            prompter,
            knowledge_base,
            session,
            renderer,
        }
    }
}
