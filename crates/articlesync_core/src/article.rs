use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ItemApi;
use crate::error::{Error, Result};
use crate::files::{file_exists, read_text, remove_file, write_text};
use crate::meta::{META_CLOSE, META_OPEN, Meta};
use crate::tag::Tags;
use crate::time::Timestamp;
use crate::validation::ValidationResult;
use crate::workspace::{Workspace, space_dir, sub_domain};

pub const ITEMS_PATH: &str = "/items";
pub const FILE_EXTENSION: &str = "md";

const UNTITLED_STEM: &str = "untitled";
const COLLISION_SUFFIX: char = '-';

/// Author profile attached to remote items. Never written to local files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub permanent_id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub website_url: Option<String>,
    pub profile_image_url: String,
    pub facebook_id: Option<String>,
    pub github_login_name: Option<String>,
    pub linkedin_id: Option<String>,
    pub twitter_screen_name: Option<String>,
    pub followees_count: u64,
    pub followers_count: u64,
    pub items_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: String,
    pub url: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub private: bool,
    pub coediting: bool,
    pub tags: Tags,
    pub title: String,
    pub body: String,
    pub rendered_body: String,
    pub user: Option<User>,
    #[serde(skip)]
    pub workspace: Option<Workspace>,
    /// Location relative to the local root. Absolute paths are kept as-is.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

/// Publish-time switches sent with a create request and never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub tweet: bool,
    pub gist: bool,
}

#[derive(Debug, Serialize)]
struct ItemPayload<'a> {
    title: &'a str,
    body: &'a str,
    private: bool,
    coediting: bool,
    tags: &'a Tags,
    #[serde(skip_serializing_if = "Option::is_none")]
    tweet: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gist: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct CreatedItem {
    id: String,
    url: String,
    created_at: Timestamp,
    updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
struct UpdatedItem {
    updated_at: Timestamp,
}

impl Article {
    /// A fresh, unsaved article. `created_at` defaults to now.
    pub fn new(
        title: impl Into<String>,
        created_at: Option<Timestamp>,
        workspace: Option<Workspace>,
    ) -> Self {
        let created_at = created_at.unwrap_or_else(Timestamp::now);
        Self {
            title: title.into(),
            created_at,
            updated_at: created_at,
            workspace,
            ..Self::default()
        }
    }

    pub fn meta(&self) -> Meta {
        Meta {
            id: self.id.clone(),
            url: self.url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            private: self.private,
            coediting: self.coediting,
            tags: self.tags.clone(),
            team: self.workspace.clone(),
        }
    }

    /// Parse the local file format.
    pub fn decode(content: &str) -> Result<Self> {
        let rest = content
            .strip_prefix(META_OPEN)
            .ok_or(Error::MissingMetaBlock)?;
        let close = rest.find(META_CLOSE).ok_or(Error::MissingMetaBlock)?;
        let meta = Meta::decode(&rest[..close])?;
        let after_meta = &rest[close + META_CLOSE.len()..];

        let mut consumed = 0;
        let mut title = None;
        for line in after_meta.split_inclusive('\n') {
            consumed += line.len();
            if line.trim().is_empty() {
                continue;
            }
            title = level_one_heading(strip_line_ending(line));
            break;
        }
        let title = title.ok_or(Error::MissingTitle)?;

        Ok(Self {
            id: meta.id,
            url: meta.url,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
            private: meta.private,
            coediting: meta.coediting,
            tags: meta.tags,
            workspace: meta.team,
            title,
            body: trim_blank_lines(&after_meta[consumed..]),
            ..Self::default()
        })
    }

    /// Render the local file format.
    pub fn encode(&self) -> Result<String> {
        let mut out = format!(
            "{META_OPEN}\n{}\n{META_CLOSE}\n\n# {}\n\n{}",
            self.meta().encode()?,
            self.title,
            self.body
        );
        if !self.body.is_empty() && !self.body.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    /// Read an article file. `path` may be relative to `root` or absolute and
    /// becomes the article's fixed save location.
    pub fn load(root: &Path, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut article = Self::decode(&read_text(&root.join(path))?)?;
        article.path = Some(path.to_path_buf());
        Ok(article)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        if self.title.is_empty() {
            result.require("title");
        }
        if self.body.is_empty() {
            result.require("body");
        }
        if self.tags.is_empty() {
            result.require("tags");
        }
        result
    }

    /// Where `save` would write, relative to `root` unless `path` is absolute.
    pub fn local_path(&self, root: &Path) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => self.derive_path(root),
        }
    }

    /// Write the article under `root` and pin its path. Returns the absolute
    /// location written.
    pub fn save(&mut self, root: &Path) -> Result<PathBuf> {
        let relative = self.local_path(root)?;
        let absolute = root.join(&relative);
        write_text(&absolute, &self.encode()?)?;
        self.path = Some(relative);
        Ok(absolute)
    }

    pub fn create<A: ItemApi + ?Sized>(&mut self, api: &mut A, options: &CreateOptions) -> Result<()> {
        let payload = serde_json::to_value(self.payload(Some(options)))?;
        let response = api
            .post(self.sub_domain(), ITEMS_PATH, &payload)?
            .ensure_success()?;
        let created: CreatedItem = serde_json::from_slice(&response.body)?;
        debug!(id = %created.id, "created item");

        self.id = created.id;
        self.url = created.url;
        self.created_at = created.created_at;
        self.updated_at = created.updated_at;
        Ok(())
    }

    pub fn fetch<A: ItemApi + ?Sized>(
        api: &mut A,
        id: &str,
        workspace: Option<&Workspace>,
    ) -> Result<Self> {
        let response = api
            .get(sub_domain(workspace), &item_path(id))?
            .ensure_success()?;
        let mut article: Self = serde_json::from_slice(&response.body)?;
        article.workspace = workspace.cloned();
        Ok(article)
    }

    pub fn update<A: ItemApi + ?Sized>(&mut self, api: &mut A) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::EmptyId);
        }
        let payload = serde_json::to_value(self.payload(None))?;
        let response = api
            .patch(self.sub_domain(), &item_path(&self.id), &payload)?
            .ensure_success()?;
        let updated: UpdatedItem = serde_json::from_slice(&response.body)?;
        debug!(id = %self.id, "updated item");

        self.updated_at = updated.updated_at;
        Ok(())
    }

    /// Delete remotely, then remove the local file if one was saved.
    pub fn delete<A: ItemApi + ?Sized>(&mut self, api: &mut A, root: &Path) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::EmptyId);
        }
        api.delete(self.sub_domain(), &item_path(&self.id))?
            .ensure_success()?;
        debug!(id = %self.id, "deleted item");

        if let Some(relative) = &self.path {
            let absolute = root.join(relative);
            if file_exists(&absolute) {
                remove_file(&absolute)?;
            }
        }
        self.path = None;
        Ok(())
    }

    fn sub_domain(&self) -> Option<&str> {
        sub_domain(self.workspace.as_ref())
    }

    fn payload<'a>(&'a self, options: Option<&CreateOptions>) -> ItemPayload<'a> {
        ItemPayload {
            title: &self.title,
            body: &self.body,
            private: self.private,
            coediting: self.coediting,
            tags: &self.tags,
            tweet: options.map(|options| options.tweet),
            gist: options.map(|options| options.gist),
        }
    }

    /// `<space>/<YYYY>/<MM>/<DD>/<title>.md`, suffixing the stem until the
    /// slot is free or already holds this article.
    fn derive_path(&self, root: &Path) -> Result<PathBuf> {
        let (year, month, day) = self.created_at.date_segments();
        let dir = PathBuf::from(space_dir(self.workspace.as_ref())?)
            .join(year)
            .join(month)
            .join(day);

        let mut stem = file_stem(&self.title);
        loop {
            let candidate = dir.join(format!("{stem}.{FILE_EXTENSION}"));
            let occupied = root.join(&candidate);
            if !file_exists(&occupied) || self.is_stored_at(&occupied) {
                return Ok(candidate);
            }
            stem.push(COLLISION_SUFFIX);
        }
    }

    /// An unsaved article (empty id) never claims an existing file.
    fn is_stored_at(&self, path: &Path) -> bool {
        if self.id.is_empty() {
            return false;
        }
        read_text(path)
            .and_then(|content| Self::decode(&content))
            .is_ok_and(|existing| existing.id == self.id)
    }
}

fn item_path(id: &str) -> String {
    format!("{ITEMS_PATH}/{id}")
}

/// Text after `#` and one separating space; the rest is kept verbatim.
fn level_one_heading(line: &str) -> Option<String> {
    let text = line.trim_start().strip_prefix('#')?;
    if text.starts_with('#') {
        return None;
    }
    Some(text.strip_prefix(' ').unwrap_or(text).to_string())
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Slice from the first to the last non-blank line, keeping the original
/// line endings in between.
fn trim_blank_lines(text: &str) -> String {
    let mut start = None;
    let mut end = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            start.get_or_insert(offset);
            end = offset + strip_line_ending(line).len();
        }
        offset += line.len();
    }
    match start {
        Some(start) => text[start..end].to_string(),
        None => String::new(),
    }
}

fn file_stem(title: &str) -> String {
    let stem = title.trim().replace(['/', '\\'], "-");
    if stem.is_empty() {
        UNTITLED_STEM.to_string()
    } else {
        stem
    }
}
