use serde::Deserialize;
use serde_yaml::Value;

use crate::error::Result;
use crate::tag::Tags;
use crate::time::Timestamp;
use crate::workspace::Workspace;

pub const META_OPEN: &str = "<!--";
pub const META_CLOSE: &str = "-->";

/// Header fields stored in the leading HTML comment of an article file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub id: String,
    pub url: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub private: bool,
    pub coediting: bool,
    pub tags: Tags,
    pub team: Option<Workspace>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMeta {
    id: Option<String>,
    url: Option<String>,
    created_at: Option<Timestamp>,
    updated_at: Option<Timestamp>,
    private: bool,
    coediting: bool,
    tags: Value,
    team: Option<Workspace>,
}

impl Meta {
    /// Parse the interior of the metadata comment.
    pub fn decode(interior: &str) -> Result<Self> {
        let raw: RawMeta = if interior.trim().is_empty() {
            RawMeta::default()
        } else {
            serde_yaml::from_str(interior)?
        };
        Ok(Self {
            id: raw.id.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            created_at: raw.created_at.unwrap_or_default(),
            updated_at: raw.updated_at.unwrap_or_default(),
            private: raw.private,
            coediting: raw.coediting,
            tags: Tags::from_local_value(&raw.tags)?,
            team: raw.team,
        })
    }

    /// Render the interior in fixed key order, without a trailing newline.
    pub fn encode(&self) -> Result<String> {
        let mut lines = vec![
            format!("id: {}", render_scalar(&self.id)?),
            format!("url: {}", render_scalar(&self.url)?),
            format!("created_at: {}", self.created_at),
            format!("updated_at: {}", self.updated_at),
            format!("private: {}", self.private),
            format!("coediting: {}", self.coediting),
            self.tags.render_local()?,
        ];
        match &self.team {
            None => lines.push("team: null".to_string()),
            Some(team) => {
                lines.push("team:".to_string());
                lines.push(format!("  active: {}", team.active));
                lines.push(format!("  id: {}", render_scalar(&team.id)?));
                lines.push(format!("  name: {}", render_scalar(&team.name)?));
            }
        }
        Ok(lines.join("\n"))
    }
}

/// Render a string as a single-line YAML scalar, quoting only when a plain
/// scalar would read back as something else.
pub(crate) fn render_scalar(value: &str) -> Result<String> {
    if value.is_empty() {
        return Ok("\"\"".to_string());
    }
    if !value.contains('\n') {
        let rendered = serde_yaml::to_string(value)?;
        let rendered = rendered.trim_end_matches('\n');
        if !rendered.contains('\n') {
            return Ok(rendered.to_string());
        }
    }
    // JSON strings are valid double-quoted YAML scalars.
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::{Meta, render_scalar};
    use crate::tag::{Tag, Tags};
    use crate::time::Timestamp;
    use crate::workspace::Workspace;

    #[test]
    fn scalars_are_quoted_only_when_ambiguous() {
        assert_eq!(render_scalar("").expect("render"), "\"\"");
        assert_eq!(render_scalar("abc").expect("render"), "abc");
        assert_eq!(
            render_scalar("https://example.com/items/1").expect("render"),
            "https://example.com/items/1"
        );
        assert_ne!(render_scalar("true").expect("render"), "true");
        assert_ne!(render_scalar("1.9").expect("render"), "1.9");
        assert_eq!(render_scalar("a\nb").expect("render"), "\"a\\nb\"");
    }

    #[test]
    fn encode_then_decode_keeps_every_field() {
        let meta = Meta {
            id: "1".to_string(),
            url: "https://example.com/items/1".to_string(),
            created_at: Timestamp::parse("2013-12-10T12:29:14+09:00").expect("ts"),
            updated_at: Timestamp::parse("2015-02-25T09:26:30+09:00").expect("ts"),
            private: true,
            coediting: false,
            tags: Tags::new(vec![Tag::with_versions("Go", ["1.5.3"])]),
            team: Some(Workspace::new("increments", "Increments Inc")),
        };
        let encoded = meta.encode().expect("encode");
        assert!(encoded.ends_with("team:\n  active: true\n  id: increments\n  name: Increments Inc"));
        assert_eq!(Meta::decode(&encoded).expect("decode"), meta);
    }

    #[test]
    fn decode_tolerates_missing_fields() {
        let meta = Meta::decode("id: abc\n").expect("decode");
        assert_eq!(meta.id, "abc");
        assert!(meta.url.is_empty());
        assert!(meta.tags.is_empty());
        assert!(meta.team.is_none());
        assert_eq!(Meta::decode("\n").expect("decode"), Meta::default());
    }
}
