//! Topic graph model and the host lookup capability.
//!
//! Topics are typed by topic types; a type declares its child relations as
//! association definitions (composition or aggregation, cardinality one or many).
//! The store traits hand out immutable snapshots of both.

mod memory;
mod sqlite;
mod store;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{RelatedQuery, TopicStore};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Association type of a composition (ownership) definition.
pub const COMPOSITION_DEF: &str = "dm4.core.composition_def";
/// Association type of an aggregation (reference) definition.
pub const AGGREGATION_DEF: &str = "dm4.core.aggregation_def";

/// Association type linking a topic type to its instances.
pub const INSTANTIATION: &str = "dm4.core.instantiation";
/// Role played by the type in an instantiation.
pub const TYPE_ROLE: &str = "dm4.core.type";
/// Role played by the instance in an instantiation.
pub const INSTANCE_ROLE: &str = "dm4.core.instance";

pub const CARDINALITY_ONE: &str = "dm4.core.one";
pub const CARDINALITY_MANY: &str = "dm4.core.many";

/// Scalar display value of a topic or type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimpleValue {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl fmt::Display for SimpleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleValue::Boolean(b) => write!(f, "{}", b),
            SimpleValue::Integer(i) => write!(f, "{}", i),
            SimpleValue::Number(n) => write!(f, "{}", n),
            SimpleValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for SimpleValue {
    fn from(value: &str) -> Self {
        SimpleValue::Text(value.to_string())
    }
}

impl From<String> for SimpleValue {
    fn from(value: String) -> Self {
        SimpleValue::Text(value)
    }
}

impl From<i64> for SimpleValue {
    fn from(value: i64) -> Self {
        SimpleValue::Integer(value)
    }
}

impl From<f64> for SimpleValue {
    fn from(value: f64) -> Self {
        SimpleValue::Number(value)
    }
}

impl From<bool> for SimpleValue {
    fn from(value: bool) -> Self {
        SimpleValue::Boolean(value)
    }
}

/// A node of the knowledge graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub id: i64,
    pub type_uri: String,
    /// Human readable uri; empty when the topic has none.
    pub uri: String,
    pub value: SimpleValue,
}

impl Topic {
    pub fn new(id: i64, type_uri: impl Into<String>, value: impl Into<SimpleValue>) -> Self {
        Self {
            id,
            type_uri: type_uri.into(),
            uri: String::new(),
            value: value.into(),
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }
}

/// A topic reached from a type through the instantiation relation. Never expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedTopic {
    pub id: i64,
    pub type_uri: String,
    pub uri: String,
    pub value: SimpleValue,
}

impl From<Topic> for RelatedTopic {
    fn from(topic: Topic) -> Self {
        Self {
            id: topic.id,
            type_uri: topic.type_uri,
            uri: topic.uri,
            value: topic.value,
        }
    }
}

/// Kind of a child relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Ownership: the child is part of the parent.
    Composition,
    /// Reference: the child exists on its own.
    Aggregation,
}

impl RelationKind {
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            COMPOSITION_DEF => Some(RelationKind::Composition),
            AGGREGATION_DEF => Some(RelationKind::Aggregation),
            _ => None,
        }
    }
}

/// Number of children a relation yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    /// Accepts both the platform uris and the bare names.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            CARDINALITY_ONE | "one" => Some(Cardinality::One),
            CARDINALITY_MANY | "many" => Some(Cardinality::Many),
            _ => None,
        }
    }
}

/// One declared child relation of a topic type.
#[derive(Debug, Clone, PartialEq)]
pub struct AssocDef {
    pub child_type_uri: String,
    pub cardinality_uri: String,
    pub assoc_type_uri: String,
}

impl AssocDef {
    pub fn new(
        child_type_uri: impl Into<String>,
        cardinality_uri: impl Into<String>,
        assoc_type_uri: impl Into<String>,
    ) -> Self {
        Self {
            child_type_uri: child_type_uri.into(),
            cardinality_uri: cardinality_uri.into(),
            assoc_type_uri: assoc_type_uri.into(),
        }
    }

    pub fn composition(child_type_uri: impl Into<String>, cardinality: Cardinality) -> Self {
        Self::new(child_type_uri, cardinality_uri(cardinality), COMPOSITION_DEF)
    }

    pub fn aggregation(child_type_uri: impl Into<String>, cardinality: Cardinality) -> Self {
        Self::new(child_type_uri, cardinality_uri(cardinality), AGGREGATION_DEF)
    }

    /// `None` for an unrecognized association type.
    pub fn kind(&self) -> Option<RelationKind> {
        RelationKind::from_uri(&self.assoc_type_uri)
    }

    pub fn cardinality(&self) -> Option<Cardinality> {
        Cardinality::from_uri(&self.cardinality_uri)
    }
}

fn cardinality_uri(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::One => CARDINALITY_ONE,
        Cardinality::Many => CARDINALITY_MANY,
    }
}

/// Schema of a topic: display value, data type and child relations in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicType {
    pub id: i64,
    pub uri: String,
    pub value: SimpleValue,
    pub data_type_uri: String,
    pub assoc_defs: Vec<AssocDef>,
}

/// Loaded value of one child relation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildValue {
    Single(Topic),
    Many(Vec<Topic>),
}

/// Child topics of one topic, keyed by child type uri, in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildTopics {
    entries: Vec<(String, ChildValue)>,
}

impl ChildTopics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for `child_type_uri`, replacing an earlier one.
    pub fn insert(&mut self, child_type_uri: impl Into<String>, value: ChildValue) {
        let key = child_type_uri.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, child_type_uri: &str) -> Option<&ChildValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == child_type_uri)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChildValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
