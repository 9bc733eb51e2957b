//! Local article files synchronised with a remote item service.

pub mod api;
pub mod article;
pub mod articles;
pub mod config;
pub mod error;
pub mod files;
pub mod meta;
pub mod tag;
pub mod time;
pub mod validation;
pub mod workspace;

#[cfg(test)]
mod testutil;

pub use api::{ApiResponse, HttpClientConfig, HttpItemApi, ItemApi};
pub use article::{Article, CreateOptions, User};
pub use articles::ArticleList;
pub use error::{Error, Result};
pub use tag::{Tag, Tags};
pub use time::Timestamp;
pub use validation::ValidationResult;
pub use workspace::{Workspace, fetch_workspaces};
