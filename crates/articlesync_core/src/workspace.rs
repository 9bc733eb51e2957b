use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ItemApi;
use crate::error::{Error, Result};

/// Directory name used for articles outside any team workspace.
pub const PERSONAL_DIR: &str = "mine";

const TEAMS_PATH: &str = "/teams";

/// A team context. Its `id` doubles as the API sub-domain and the top-level
/// local directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub active: bool,
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Workspace {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            active: true,
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Local top-level directory for an optional workspace. The id must be a
/// single plain path segment.
pub fn space_dir(workspace: Option<&Workspace>) -> Result<&str> {
    let Some(team) = workspace else {
        return Ok(PERSONAL_DIR);
    };
    let id = team.id.as_str();
    if id.is_empty() || id == "." || id.contains("..") || id.contains(['/', '\\']) {
        return Err(Error::InvalidWorkspaceId(team.id.clone()));
    }
    Ok(id)
}

/// API sub-domain selector for an optional workspace.
pub fn sub_domain(workspace: Option<&Workspace>) -> Option<&str> {
    workspace.map(|team| team.id.as_str())
}

/// List the team workspaces the credential can see.
pub fn fetch_workspaces<A: ItemApi + ?Sized>(api: &mut A) -> Result<Vec<Workspace>> {
    let response = api.get(None, TEAMS_PATH)?.ensure_success()?;
    let teams: Vec<Workspace> = serde_json::from_slice(&response.body)?;
    debug!(count = teams.len(), "fetched workspaces");
    Ok(teams)
}
