//! Breakpoint graph vertices.
//!
//! A block vertex is one extremity of a synteny block (`Xt` or `Xh`); an
//! infinity vertex stands in for a telomere next to such an extremity. Both
//! can carry tags, and everything (identity, ordering, DOT keys) goes through
//! the rendered name: `root__tag:value__...__infinity`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::{json, Value};
use thiserror::Error;

use crate::utils::stable_hash;

pub const NAME_SEPARATOR: &str = "__";
pub const TAG_SEPARATOR: &str = ":";
pub const INFINITY_SUFFIX: &str = "infinity";
pub const REPEAT_TAG: &str = "repeat";

#[derive(Error, Debug, PartialEq)]
pub enum VertexError {
    #[error("vertex name is empty or has an empty root: {0:?}")]
    EmptyRoot(String),

    #[error("vertex {vertex} has no tag {tag}:{value:?}")]
    MissingTag {
        vertex: String,
        tag: String,
        value: Option<String>,
    },

    #[error("vertex JSON has no \"name\" field: {0}")]
    MissingName(Value),

    #[error("unknown vertex JSON schema: {0}")]
    UnknownSchema(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Block,
    Infinity,
}

pub type Tag = (String, Option<String>);

#[derive(Debug, Clone)]
pub struct Vertex {
    root: String,
    kind: VertexKind,
    tags: Vec<Tag>,
    name: String,
}

impl Vertex {
    pub fn new(root: impl Into<String>, kind: VertexKind) -> Self {
        let mut vertex = Vertex {
            root: root.into(),
            kind,
            tags: Vec::new(),
            name: String::new(),
        };
        vertex.refresh_name();
        vertex
    }

    pub fn block(root: impl Into<String>) -> Self {
        Vertex::new(root, VertexKind::Block)
    }

    pub fn infinity(root: impl Into<String>) -> Self {
        Vertex::new(root, VertexKind::Infinity)
    }

    /// Parse a rendered vertex name back into a vertex.
    pub fn from_name(name: &str) -> Result<Self, VertexError> {
        let mut parts = name.split(NAME_SEPARATOR);
        let root = parts.next().unwrap_or_default();
        if root.is_empty() {
            return Err(VertexError::EmptyRoot(name.to_string()));
        }
        let mut kind = VertexKind::Block;
        let mut vertex = Vertex::block(root);
        for part in parts {
            if part == INFINITY_SUFFIX {
                kind = VertexKind::Infinity;
                continue;
            }
            let (tag, value) = match part.split_once(TAG_SEPARATOR) {
                Some((tag, "")) => (tag, None),
                Some((tag, value)) => (tag, Some(value)),
                None => (part, None),
            };
            vertex.add_tag(tag, value);
        }
        vertex.kind = kind;
        vertex.refresh_name();
        Ok(vertex)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn kind(&self) -> VertexKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn is_regular(&self) -> bool {
        self.kind == VertexKind::Block
    }

    pub fn is_block(&self) -> bool {
        self.is_regular()
    }

    pub fn is_irregular(&self) -> bool {
        self.kind == VertexKind::Infinity
    }

    pub fn is_infinity(&self) -> bool {
        self.is_irregular()
    }

    pub fn is_head(&self) -> bool {
        self.is_block() && self.root.ends_with('h')
    }

    pub fn is_tail(&self) -> bool {
        self.is_block() && self.root.ends_with('t')
    }

    /// Block name without the extremity suffix (`"10t"` -> `"10"`).
    pub fn block_name(&self) -> &str {
        if self.is_head() || self.is_tail() {
            &self.root[..self.root.len() - 1]
        } else {
            &self.root
        }
    }

    /// Block name followed by the tags, as written in GRIMM (`"a__repeat"`,
    /// `"c__tag:1"`).
    pub fn block_label(&self) -> String {
        let mut label = self.block_name().to_string();
        for (tag, value) in &self.tags {
            label.push_str(NAME_SEPARATOR);
            label.push_str(tag);
            if let Some(value) = value {
                label.push_str(TAG_SEPARATOR);
                label.push_str(value);
            }
        }
        label
    }

    /// The other extremity of the same block, tags included. Infinity vertices
    /// and roots without an `h`/`t` suffix have no mate.
    pub fn mate_vertex(&self) -> Option<Vertex> {
        let suffix = if self.is_head() {
            't'
        } else if self.is_tail() {
            'h'
        } else {
            return None;
        };
        let mut mate = self.clone();
        mate.root = format!("{}{}", self.block_name(), suffix);
        mate.refresh_name();
        Some(mate)
    }

    pub fn add_tag(&mut self, tag: &str, value: Option<&str>) {
        let entry = (tag.to_string(), value.map(str::to_string));
        if let Err(position) = self.tags.binary_search(&entry) {
            self.tags.insert(position, entry);
            self.refresh_name();
        }
    }

    pub fn remove_tag(
        &mut self,
        tag: &str,
        value: Option<&str>,
        silent_fail: bool,
    ) -> Result<(), VertexError> {
        let entry = (tag.to_string(), value.map(str::to_string));
        match self.tags.binary_search(&entry) {
            Ok(position) => {
                self.tags.remove(position);
                self.refresh_name();
                Ok(())
            }
            Err(_) if silent_fail => Ok(()),
            Err(_) => Err(VertexError::MissingTag {
                vertex: self.name.clone(),
                tag: entry.0,
                value: entry.1,
            }),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|(name, _)| name == tag)
    }

    pub fn tag_value(&self, tag: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(name, _)| name == tag)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn is_repeat(&self) -> bool {
        self.has_tag(REPEAT_TAG)
    }

    pub fn json_id(&self) -> u64 {
        stable_hash(&self.name)
    }

    pub fn to_json(&self, schema_info: bool) -> Value {
        let mut value = json!({"name": self.name, "v_id": self.json_id()});
        if schema_info {
            let schema = match self.kind {
                VertexKind::Block => "BlockVertex",
                VertexKind::Infinity => "InfinityVertex",
            };
            value["vertex_json_schema"] = json!(schema);
        }
        value
    }

    pub fn from_json(value: &Value) -> Result<Self, VertexError> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| VertexError::MissingName(value.clone()))?;
        let mut vertex = Vertex::from_name(name)?;
        if let Some(schema) = value.get("vertex_json_schema").and_then(Value::as_str) {
            vertex.kind = match schema {
                "BlockVertex" => VertexKind::Block,
                "InfinityVertex" => VertexKind::Infinity,
                other => return Err(VertexError::UnknownSchema(other.to_string())),
            };
            vertex.refresh_name();
        }
        Ok(vertex)
    }

    fn refresh_name(&mut self) {
        let mut parts = Vec::with_capacity(self.tags.len() + 2);
        parts.push(self.root.clone());
        for (tag, value) in &self.tags {
            parts.push(format!(
                "{}{}{}",
                tag,
                TAG_SEPARATOR,
                value.as_deref().unwrap_or_default()
            ));
        }
        if self.is_infinity() {
            parts.push(INFINITY_SUFFIX.to_string());
        }
        self.name = parts.join(NAME_SEPARATOR);
    }
}

/// Root part of a rendered vertex name.
pub fn vertex_name_root(name: &str) -> &str {
    name.split(NAME_SEPARATOR).next().unwrap_or_default()
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Vertex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Vertex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_vertex_name_is_its_root() {
        let vertex = Vertex::block("10t");
        assert_eq!(vertex.name(), "10t");
        assert!(vertex.is_regular());
        assert!(vertex.is_tail());
        assert!(!vertex.is_head());
        assert_eq!(vertex.block_name(), "10");
    }

    #[test]
    fn infinity_vertex_name_has_suffix_after_tags() {
        let mut vertex = Vertex::infinity("1h");
        vertex.add_tag("repeat", Some("ALCt"));
        assert_eq!(vertex.name(), "1h__repeat:ALCt__infinity");
        assert!(vertex.is_irregular());
        assert!(!vertex.is_head());
        assert!(vertex.is_repeat());
        assert_eq!(vertex.tag_value("repeat"), Some("ALCt"));
    }

    #[test]
    fn tags_stay_sorted_and_unique() {
        let mut vertex = Vertex::block("5h");
        vertex.add_tag("tag2", Some("b"));
        vertex.add_tag("tag1", Some("a"));
        vertex.add_tag("tag1", Some("a"));
        assert_eq!(vertex.tags().len(), 2);
        assert_eq!(vertex.name(), "5h__tag1:a__tag2:b");
    }

    #[test]
    fn remove_missing_tag_fails_unless_silent() {
        let mut vertex = Vertex::block("5h");
        vertex.add_tag("repeat", None);
        assert!(vertex.remove_tag("repeat", Some("x"), false).is_err());
        assert!(vertex.remove_tag("repeat", Some("x"), true).is_ok());
        vertex.remove_tag("repeat", None, false).unwrap();
        assert_eq!(vertex.name(), "5h");
    }

    #[test]
    fn mate_keeps_tags_and_swaps_extremity() {
        let mut vertex = Vertex::block("7h");
        vertex.add_tag("repeat", None);
        let mate = vertex.mate_vertex().unwrap();
        assert_eq!(mate.name(), "7t__repeat:");
        assert_eq!(mate.mate_vertex().unwrap(), vertex);
        assert!(Vertex::infinity("7h").mate_vertex().is_none());
    }

    #[test]
    fn block_label_uses_grimm_tag_syntax() {
        let mut vertex = Vertex::block("ch");
        vertex.add_tag("tag", Some("1:2"));
        vertex.add_tag("repeat", None);
        assert_eq!(vertex.block_label(), "c__repeat__tag:1:2");
    }

    #[test]
    fn names_parse_back_into_equal_vertices() {
        for name in ["10t", "1h__repeat:ALCt__infinity", "5h__flag:__tag:v", "3t__infinity"] {
            let vertex = Vertex::from_name(name).unwrap();
            assert_eq!(vertex.name(), name);
        }
        assert!(Vertex::from_name("3t__infinity").unwrap().is_infinity());
        assert_eq!(vertex_name_root("1h__repeat:ALCt__infinity"), "1h");
        assert!(Vertex::from_name("__infinity").is_err());
    }

    #[test]
    fn json_carries_schema_when_asked() {
        let vertex = Vertex::infinity("2t");
        let plain = vertex.to_json(false);
        assert!(plain.get("vertex_json_schema").is_none());
        let with_schema = vertex.to_json(true);
        assert_eq!(with_schema["vertex_json_schema"], json!("InfinityVertex"));
        assert_eq!(Vertex::from_json(&with_schema).unwrap(), vertex);
        assert!(Vertex::from_json(&json!({"v_id": 1})).is_err());
    }
}
