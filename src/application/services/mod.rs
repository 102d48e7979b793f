//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, Prompter, etc.)
//! but are themselves concrete structs, not traits.

mod knowledge_base;
mod session;

pub use knowledge_base::{KnowledgeBase, KnowledgeBaseService};
pub use session::{RoundOutcome, SessionService};
