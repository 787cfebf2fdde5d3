use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::graph::{Cardinality, SimpleValue};

/// JSON document of one topic with its expanded child topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: i64,
    #[serde(rename = "type")]
    pub type_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub value: SimpleValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<Composite>,
    pub resources: NodeResources,
}

/// Child relations of a node document, kept in the order the type declares them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composite {
    entries: Vec<(String, CompositeValue)>,
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, child_type_uri: impl Into<String>, value: CompositeValue) {
        self.entries.push((child_type_uri.into(), value));
    }

    pub fn get(&self, child_type_uri: &str) -> Option<&CompositeValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == child_type_uri)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompositeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Composite {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (child_type_uri, value) in &self.entries {
            map.serialize_entry(child_type_uri, value)?;
        }
        map.end()
    }
}

struct CompositeVisitor;

impl<'de> Visitor<'de> for CompositeVisitor {
    type Value = Composite;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of child type uri to node document(s)")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Composite, A::Error> {
        let mut composite = Composite::new();
        while let Some((child_type_uri, value)) = access.next_entry::<String, CompositeValue>()? {
            composite.insert(child_type_uri, value);
        }
        Ok(composite)
    }
}

impl<'de> Deserialize<'de> for Composite {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CompositeVisitor)
    }
}

/// A child relation inside a node document: one nested node or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompositeValue {
    One(Box<NodeDocument>),
    Many(Vec<NodeDocument>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResources {
    #[serde(rename = "type")]
    pub type_link: String,
}

/// JSON document of a topic type.
///
/// `type` carries the data type uri here, unlike node documents where it is
/// the topic's type uri.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDocument {
    pub id: i64,
    #[serde(rename = "type")]
    pub data_type_uri: String,
    pub uri: String,
    pub value: SimpleValue,
    pub composite: Vec<RelationEntry>,
    pub aggregate: Vec<RelationEntry>,
    pub resources: TypeResources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationEntry {
    pub uri: String,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeResources {
    pub instances: String,
    pub topic: String,
    #[serde(rename = "type")]
    pub type_link: String,
}

/// Flat entry of a type's instance list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub id: i64,
    #[serde(rename = "type")]
    pub type_uri: String,
    pub uri: String,
    pub value: SimpleValue,
    pub resources: SummaryResources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResources {
    pub topic: String,
}
