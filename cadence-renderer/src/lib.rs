//! # cadence-renderer
//!
//! Tera-based renderer that turns a merged set of playbooks or standards into
//! the files published to a target: canonical copies, an index and one
//! instruction file per selected agent.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cadence_core::types::{ContentKind, ContentVersion, Repository, Target};
//! use cadence_core::AgentKind;
//! use cadence_renderer::{ContentRenderer, TeraRenderer};
//!
//! fn files(versions: &[ContentVersion], repository: &Repository, target: &Target) {
//!     if let Ok(renderer) = TeraRenderer::new() {
//!         let agents = [AgentKind::Claude, AgentKind::Cursor];
//!         if let Ok(updates) = renderer.render(ContentKind::Standard, versions, repository, target, &agents) {
//!             for file in &updates.create_or_update {
//!                 println!("{}: {} bytes", file.path.display(), file.content.len());
//!             }
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod updates;

pub use context::RenderContext;
pub use engine::{agent_output_path, TemplateEngine, TeraRenderer};
pub use error::RenderError;
pub use updates::{ContentRenderer, FileUpdate, FileUpdates};
