//! Cadence core library: domain types, target registry, content catalog,
//! configuration and errors.
//!
//! - [`types`]: newtypes, content versions, targets, deployments
//! - [`agent`]: [`AgentKind`]
//! - [`registry`]: repositories and targets, [`TargetRegistry`]
//! - [`catalog`]: authored content, [`ContentProvider`]
//! - [`config`]: `~/.cadence/config.yaml`
//! - [`error`]: [`RegistryError`]

pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use agent::AgentKind;
pub use catalog::{ContentProvider, FileContentCatalog};
pub use config::Config;
pub use error::RegistryError;
pub use registry::{FileTargetRegistry, TargetRegistry};
pub use types::{
    CommitRef, ContentId, ContentKind, ContentVersion, Deployment, DeploymentId,
    DeploymentOutcome, DistributionStatus, OrganizationId, Repository, RepositoryId,
    ResolvedTarget, Target, TargetId, UserId, VersionId,
};
