use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::meta::render_scalar;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub versions: Vec<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: Vec::new(),
        }
    }

    pub fn with_versions<I, S>(name: impl Into<String>, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered tag list.
///
/// Serde impls produce the remote shape (`[{name, versions}]`). The local file
/// shape goes through [`Tags::from_local_value`] and [`Tags::render_local`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new(tags: Vec<Tag>) -> Self {
        Self(tags)
    }

    pub fn push(&mut self, tag: Tag) {
        self.0.push(tag);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.0
    }

    /// Decode the local YAML shape.
    ///
    /// Each sequence element is a bare name or a single-key mapping from name
    /// to versions. A top-level mapping (`Name: [versions]`) written by older
    /// files is accepted as well. Numeric versions such as `1.9` are kept as
    /// their YAML text.
    pub fn from_local_value(value: &Value) -> Result<Self> {
        let mut tags = Vec::new();
        match value {
            Value::Null => {}
            Value::Sequence(items) => {
                for item in items {
                    tags.push(tag_from_local_item(item)?);
                }
            }
            Value::Mapping(entries) => {
                for (name, versions) in entries {
                    tags.push(tag_from_pair(name, versions)?);
                }
            }
            other => return Err(invalid(other)),
        }
        Ok(Self(tags))
    }

    /// Render the `tags:` field of a metadata block, without trailing newline.
    pub fn render_local(&self) -> Result<String> {
        if self.0.is_empty() {
            return Ok("tags: []".to_string());
        }
        let mut out = String::from("tags:");
        for tag in &self.0 {
            let name = render_scalar(&tag.name)?;
            if tag.versions.is_empty() {
                out.push_str(&format!("\n- {name}"));
                continue;
            }
            out.push_str(&format!("\n- {name}:"));
            for version in &tag.versions {
                out.push_str(&format!("\n  - {}", render_scalar(version)?));
            }
        }
        Ok(out)
    }
}

impl From<Vec<Tag>> for Tags {
    fn from(tags: Vec<Tag>) -> Self {
        Self(tags)
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn tag_from_local_item(item: &Value) -> Result<Tag> {
    if let Some(name) = scalar_text(item) {
        return Ok(Tag::new(name));
    }
    match item {
        Value::Mapping(entries) if entries.len() == 1 => {
            let (name, versions) = entries.iter().next().ok_or_else(|| invalid(item))?;
            tag_from_pair(name, versions)
        }
        other => Err(invalid(other)),
    }
}

fn tag_from_pair(name: &Value, versions: &Value) -> Result<Tag> {
    let name = scalar_text(name).ok_or_else(|| invalid(name))?;
    let versions = match versions {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items
            .iter()
            .map(|item| scalar_text(item).ok_or_else(|| invalid(item)))
            .collect::<Result<Vec<_>>>()?,
        other => return Err(invalid(other)),
    };
    Ok(Tag { name, versions })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn invalid(value: &Value) -> Error {
    Error::InvalidTagFormat(format!("{value:?}"))
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
