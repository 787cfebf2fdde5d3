//! Graph-to-document serialization.
//!
//! Node documents follow the topic's loaded child topics recursively; type
//! documents list the type's child relations split by relation kind.

use std::collections::HashSet;

use crate::graph::{ChildValue, RelatedTopic, RelationKind, Topic, TopicStore, TopicType};
use crate::rest::links::LinkBuilder;
use crate::rest::types::{
    Composite, CompositeValue, NodeDocument, NodeResources, RelationEntry, SummaryResources, TopicSummary,
    TypeDocument, TypeResources,
};
use crate::Result;

/// Default bound on child topic expansion.
pub const DEFAULT_MAX_DEPTH: usize = 32;

pub struct GraphSerializer<'a, S: TopicStore + ?Sized> {
    store: &'a S,
    links: &'a LinkBuilder,
    max_depth: usize,
}

impl<'a, S: TopicStore + ?Sized> GraphSerializer<'a, S> {
    pub fn new(store: &'a S, links: &'a LinkBuilder) -> Self {
        Self {
            store,
            links,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Topics below `max_depth` levels are emitted without their child topics.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn serialize_topic(&self, topic: &Topic) -> Result<NodeDocument> {
        let mut expanded = HashSet::new();
        self.node(topic, 0, &mut expanded)
    }

    /// `expanded` holds every topic whose child topics were already emitted in
    /// this document; each topic is expanded at most once.
    fn node(&self, topic: &Topic, depth: usize, expanded: &mut HashSet<i64>) -> Result<NodeDocument> {
        let mut doc = NodeDocument {
            id: topic.id,
            type_uri: topic.type_uri.clone(),
            uri: (!topic.uri.is_empty()).then(|| topic.uri.clone()),
            value: topic.value.clone(),
            composite: None,
            resources: NodeResources {
                type_link: self.links.type_uri(&topic.type_uri),
            },
        };

        if expanded.contains(&topic.id) {
            log::debug!("topic {} already expanded in this document", topic.id);
            return Ok(doc);
        }
        if depth >= self.max_depth {
            log::warn!(
                "child topics of topic {} not expanded: depth limit {} reached",
                topic.id,
                self.max_depth
            );
            return Ok(doc);
        }
        expanded.insert(topic.id);

        let children = self.store.child_topics(topic)?;
        if children.is_empty() {
            return Ok(doc);
        }

        let mut composite = Composite::new();
        for (child_type_uri, value) in children.iter() {
            let value = match value {
                ChildValue::Single(child) => {
                    CompositeValue::One(Box::new(self.node(child, depth + 1, expanded)?))
                }
                ChildValue::Many(items) => CompositeValue::Many(
                    items
                        .iter()
                        .map(|child| self.node(child, depth + 1, expanded))
                        .collect::<Result<Vec<_>>>()?,
                ),
            };
            composite.insert(child_type_uri, value);
        }

        doc.composite = Some(composite);
        Ok(doc)
    }

    pub fn serialize_type(&self, topic_type: &TopicType) -> TypeDocument {
        let mut composite = Vec::new();
        let mut aggregate = Vec::new();

        for def in &topic_type.assoc_defs {
            let Some(kind) = def.kind() else {
                log::warn!(
                    "invalid association definition model {} found in type {}",
                    def.assoc_type_uri,
                    topic_type.uri
                );
                continue;
            };
            let Some(cardinality) = def.cardinality() else {
                log::warn!(
                    "invalid cardinality {} of {} found in type {}",
                    def.cardinality_uri,
                    def.child_type_uri,
                    topic_type.uri
                );
                continue;
            };

            let entry = RelationEntry {
                uri: def.child_type_uri.clone(),
                cardinality,
            };
            match kind {
                RelationKind::Composition => composite.push(entry),
                RelationKind::Aggregation => aggregate.push(entry),
            }
        }

        TypeDocument {
            id: topic_type.id,
            data_type_uri: topic_type.data_type_uri.clone(),
            uri: topic_type.uri.clone(),
            value: topic_type.value.clone(),
            composite,
            aggregate,
            resources: TypeResources {
                instances: self.links.instances_uri(&topic_type.uri),
                topic: self.links.topic_uri(topic_type.id),
                type_link: self.links.type_uri(&topic_type.uri),
            },
        }
    }

    pub fn serialize_related(&self, topics: &[RelatedTopic]) -> Vec<TopicSummary> {
        topics
            .iter()
            .map(|topic| TopicSummary {
                id: topic.id,
                type_uri: topic.type_uri.clone(),
                uri: topic.uri.clone(),
                value: topic.value.clone(),
                resources: SummaryResources {
                    topic: self.links.topic_uri(topic.id),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AssocDef, Cardinality, MemoryStore, SimpleValue, COMPOSITION_DEF};
    use serde_json::json;
    use std::collections::BTreeMap;

    const HOST: &str = "http://dm.test";

    fn links() -> LinkBuilder {
        LinkBuilder::new(Some(HOST)).unwrap()
    }

    fn topic_type(id: i64, uri: &str, assoc_defs: Vec<AssocDef>) -> TopicType {
        TopicType {
            id,
            uri: uri.to_string(),
            value: SimpleValue::from(uri),
            data_type_uri: if assoc_defs.is_empty() { "dm4.core.text" } else { "dm4.core.composite" }
                .to_string(),
            assoc_defs,
        }
    }

    fn person_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .insert_type(topic_type(
                1,
                "person",
                vec![
                    AssocDef::composition("email", Cardinality::Many),
                    AssocDef::composition("address", Cardinality::One),
                    AssocDef::aggregation("person", Cardinality::Many),
                ],
            ))
            .insert_type(topic_type(2, "email", vec![]))
            .insert_type(topic_type(3, "address", vec![AssocDef::composition("city", Cardinality::One)]))
            .insert_type(topic_type(4, "city", vec![]))
            .insert_topic(Topic::new(42, "person", "Ada"))
            .insert_topic(Topic::new(7, "email", "a@b.c"));
        store.add_child(42, 7).unwrap();
        store
    }

    /// Rebuild the id tree of a node document.
    fn id_tree(doc: &NodeDocument) -> serde_json::Value {
        let children: BTreeMap<String, serde_json::Value> = doc
            .composite
            .iter()
            .flat_map(|composite| composite.iter())
            .map(|(name, value)| {
                let tree = match value {
                    CompositeValue::One(child) => id_tree(child),
                    CompositeValue::Many(items) => items.iter().map(id_tree).collect(),
                };
                (name.to_string(), tree)
            })
            .collect();
        json!({ "id": doc.id, "children": children })
    }

    #[test]
    fn test_node_document_matches_reference_shape() {
        let store = person_store();
        let links = links();
        let serializer = GraphSerializer::new(&store, &links);
        let ada = store.topic(42).unwrap().unwrap();

        let doc = serde_json::to_value(serializer.serialize_topic(&ada).unwrap()).unwrap();
        assert_eq!(
            doc,
            json!({
                "id": 42,
                "type": "person",
                "value": "Ada",
                "composite": {
                    "email": [{
                        "id": 7,
                        "type": "email",
                        "value": "a@b.c",
                        "resources": {"type": "http://dm.test/rest/type/email"}
                    }]
                },
                "resources": {"type": "http://dm.test/rest/type/person"}
            })
        );
    }

    #[test]
    fn test_leaf_has_no_composite_and_no_empty_uri() {
        let store = person_store();
        let links = links();
        let serializer = GraphSerializer::new(&store, &links);
        let email = store.topic(7).unwrap().unwrap();

        let doc = serde_json::to_value(serializer.serialize_topic(&email).unwrap()).unwrap();
        let object = doc.as_object().unwrap();
        assert!(!object.contains_key("composite"));
        assert!(!object.contains_key("uri"));
    }

    #[test]
    fn test_non_empty_uri_and_scalar_values() {
        let mut store = person_store();
        store.insert_topic(Topic::new(5, "city", 1815_i64).with_uri("city.london"));
        store.insert_topic(Topic::new(6, "email", true));
        let links = links();
        let serializer = GraphSerializer::new(&store, &links);

        let city = serializer.serialize_topic(&store.topic(5).unwrap().unwrap()).unwrap();
        let city = serde_json::to_value(city).unwrap();
        assert_eq!(city["uri"], "city.london");
        assert_eq!(city["value"], 1815);

        let flag = serializer.serialize_topic(&store.topic(6).unwrap().unwrap()).unwrap();
        assert_eq!(serde_json::to_value(flag).unwrap()["value"], true);
    }

    #[test]
    fn test_nested_tree_round_trips_ids() {
        let mut store = person_store();
        store
            .insert_topic(Topic::new(8, "email", "d@e.f"))
            .insert_topic(Topic::new(20, "address", "Home"))
            .insert_topic(Topic::new(21, "city", "London"));
        store.add_child(42, 8).unwrap();
        store.add_child(42, 20).unwrap();
        store.add_child(20, 21).unwrap();

        let links = links();
        let serializer = GraphSerializer::new(&store, &links);
        let doc = serializer.serialize_topic(&store.topic(42).unwrap().unwrap()).unwrap();

        assert_eq!(
            id_tree(&doc),
            json!({
                "id": 42,
                "children": {
                    "email": [{"id": 7, "children": {}}, {"id": 8, "children": {}}],
                    "address": {"id": 20, "children": {"city": {"id": 21, "children": {}}}}
                }
            })
        );

        // parse back through JSON and compare the whole document
        let text = serde_json::to_string(&doc).unwrap();
        let parsed: NodeDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_aggregation_cycle_terminates() {
        let mut store = person_store();
        store.insert_topic(Topic::new(43, "person", "Grace"));
        store.add_child(42, 43).unwrap();
        store.add_child(43, 42).unwrap();

        let links = links();
        let serializer = GraphSerializer::new(&store, &links);
        let doc = serializer.serialize_topic(&store.topic(42).unwrap().unwrap()).unwrap();
        let doc = serde_json::to_value(doc).unwrap();

        let grace = &doc["composite"]["person"][0];
        assert_eq!(grace["id"], 43);
        let ada_again = &grace["composite"]["person"][0];
        assert_eq!(ada_again["id"], 42);
        assert!(ada_again.get("composite").is_none());
    }

    #[test]
    fn test_depth_limit_stops_expansion() {
        let mut store = person_store();
        store
            .insert_topic(Topic::new(20, "address", "Home"))
            .insert_topic(Topic::new(21, "city", "London"));
        store.add_child(42, 20).unwrap();
        store.add_child(20, 21).unwrap();

        let links = links();
        let serializer = GraphSerializer::new(&store, &links).with_max_depth(1);
        let doc = serializer.serialize_topic(&store.topic(42).unwrap().unwrap()).unwrap();
        let doc = serde_json::to_value(doc).unwrap();

        assert_eq!(doc["composite"]["address"]["id"], 20);
        assert!(doc["composite"]["address"].get("composite").is_none());
    }

    /// Visit every node of a document: (id, expanded).
    fn walk(doc: &NodeDocument, out: &mut Vec<(i64, bool)>) {
        out.push((doc.id, doc.composite.is_some()));
        for (_, value) in doc.composite.iter().flat_map(|composite| composite.iter()) {
            match value {
                CompositeValue::One(child) => walk(child, out),
                CompositeValue::Many(items) => items.iter().for_each(|child| walk(child, out)),
            }
        }
    }

    #[test]
    fn test_friend_clique_expands_each_topic_once() {
        let n: i64 = 10;
        let mut store = person_store();
        for id in 100..100 + n {
            store.insert_topic(Topic::new(id, "person", format!("friend {}", id)));
        }
        for id in 100..100 + n {
            for other in (100..100 + n).filter(|other| *other != id) {
                store.add_child(id, other).unwrap();
            }
        }

        let links = links();
        let serializer = GraphSerializer::new(&store, &links);
        let doc = serializer.serialize_topic(&store.topic(100).unwrap().unwrap()).unwrap();

        let mut nodes = Vec::new();
        walk(&doc, &mut nodes);
        let n = n as usize;
        assert_eq!(nodes.len(), 1 + n * (n - 1));

        let mut expanded: Vec<i64> = nodes.iter().filter(|(_, e)| *e).map(|(id, _)| *id).collect();
        expanded.sort();
        assert_eq!(expanded, (100..100 + n as i64).collect::<Vec<_>>());
    }

    #[test]
    fn test_composite_keeps_declared_order() {
        let mut store = person_store();
        store.insert_topic(Topic::new(20, "address", "Home"));
        store.add_child(42, 20).unwrap();

        let links = links();
        let serializer = GraphSerializer::new(&store, &links);
        let doc = serializer.serialize_topic(&store.topic(42).unwrap().unwrap()).unwrap();

        let keys: Vec<&str> = doc.composite.as_ref().unwrap().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["email", "address"]);
        let text = serde_json::to_string(&doc).unwrap();
        assert!(text.find("\"email\"").unwrap() < text.find("\"address\"").unwrap());
    }

    #[test]
    fn test_type_document_partitions_relations() {
        let store = MemoryStore::new();
        let links = links();
        let serializer = GraphSerializer::new(&store, &links);
        let person = topic_type(
            1,
            "person",
            vec![
                AssocDef::composition("email", Cardinality::One),
                AssocDef::aggregation("friend", Cardinality::Many),
                AssocDef::new("nickname", "dm4.core.one", "dm4.core.association"),
                AssocDef::new("alias", "dm4.core.lots", COMPOSITION_DEF),
            ],
        );

        let doc = serde_json::to_value(serializer.serialize_type(&person)).unwrap();
        assert_eq!(
            doc,
            json!({
                "id": 1,
                "type": "dm4.core.composite",
                "uri": "person",
                "value": "person",
                "composite": [{"uri": "email", "cardinality": "one"}],
                "aggregate": [{"uri": "friend", "cardinality": "many"}],
                "resources": {
                    "instances": "http://dm.test/rest/topics/person",
                    "topic": "http://dm.test/rest/topic/1",
                    "type": "http://dm.test/rest/type/person"
                }
            })
        );
    }

    #[test]
    fn test_type_document_always_has_both_arrays() {
        let store = MemoryStore::new();
        let links = links();
        let serializer = GraphSerializer::new(&store, &links);

        let doc = serde_json::to_value(serializer.serialize_type(&topic_type(2, "email", vec![]))).unwrap();
        assert_eq!(doc["composite"], json!([]));
        assert_eq!(doc["aggregate"], json!([]));
    }

    #[test]
    fn test_related_topics_are_flat() {
        let store = person_store();
        let links = links();
        let serializer = GraphSerializer::new(&store, &links);
        let people = store
            .related_topics(&crate::graph::RelatedQuery::instances_of("person"))
            .unwrap();

        let list = serde_json::to_value(serializer.serialize_related(&people)).unwrap();
        assert_eq!(
            list,
            json!([{
                "id": 42,
                "type": "person",
                "uri": "",
                "value": "Ada",
                "resources": {"topic": "http://dm.test/rest/topic/42"}
            }])
        );
        assert!(serializer.serialize_related(&[]).is_empty());
    }
}
