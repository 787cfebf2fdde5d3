//! The host lookup capability the REST layer reads through.

use super::{
    Cardinality, ChildTopics, ChildValue, RelatedTopic, Topic, TopicType, INSTANCE_ROLE,
    INSTANTIATION, TYPE_ROLE,
};
use crate::Result;

/// Selects the topics related to a topic type through one association type.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedQuery {
    pub assoc_type_uri: String,
    pub my_role_type_uri: String,
    pub others_role_type_uri: String,
    pub others_topic_type_uri: String,
}

impl RelatedQuery {
    /// All instances of the type `type_uri`.
    pub fn instances_of(type_uri: &str) -> Self {
        Self {
            assoc_type_uri: INSTANTIATION.to_string(),
            my_role_type_uri: TYPE_ROLE.to_string(),
            others_role_type_uri: INSTANCE_ROLE.to_string(),
            others_topic_type_uri: type_uri.to_string(),
        }
    }

    pub fn is_instantiation(&self) -> bool {
        self.assoc_type_uri == INSTANTIATION
            && self.my_role_type_uri == TYPE_ROLE
            && self.others_role_type_uri == INSTANCE_ROLE
    }
}

/// Read access to topics and topic types.
///
/// Implementations return snapshots; nothing handed out is mutated afterwards.
pub trait TopicStore {
    fn topic(&self, id: i64) -> Result<Option<Topic>>;

    fn topic_type(&self, uri: &str) -> Result<Option<TopicType>>;

    /// One level of child topics, shaped by the topic type's association definitions.
    fn child_topics(&self, topic: &Topic) -> Result<ChildTopics>;

    fn related_topics(&self, query: &RelatedQuery) -> Result<Vec<RelatedTopic>>;
}

/// Shape raw `(child_type_uri, child)` pairs into child topics following the
/// declared order and cardinality of `topic_type`.
pub(crate) fn group_children(topic_type: &TopicType, children: Vec<(String, Topic)>) -> ChildTopics {
    let mut grouped = ChildTopics::new();

    for def in &topic_type.assoc_defs {
        if grouped.get(&def.child_type_uri).is_some() {
            continue;
        }

        let mut matching: Vec<Topic> = children
            .iter()
            .filter(|(child_type, _)| *child_type == def.child_type_uri)
            .map(|(_, child)| child.clone())
            .collect();
        if matching.is_empty() {
            continue;
        }

        match def.cardinality() {
            Some(Cardinality::One) => {
                if matching.len() > 1 {
                    log::warn!(
                        "{} child topics of type {} found where {} allows one, using the first",
                        matching.len(),
                        def.child_type_uri,
                        topic_type.uri
                    );
                }
                grouped.insert(def.child_type_uri.clone(), ChildValue::Single(matching.remove(0)));
            }
            Some(Cardinality::Many) => {
                grouped.insert(def.child_type_uri.clone(), ChildValue::Many(matching));
            }
            None => {
                log::warn!(
                    "invalid cardinality {} for {} found in type {}",
                    def.cardinality_uri,
                    def.child_type_uri,
                    topic_type.uri
                );
            }
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AssocDef, SimpleValue};

    fn person_type() -> TopicType {
        TopicType {
            id: 1,
            uri: "person".to_string(),
            value: SimpleValue::from("Person"),
            data_type_uri: "dm4.core.composite".to_string(),
            assoc_defs: vec![
                AssocDef::composition("name", Cardinality::One),
                AssocDef::composition("email", Cardinality::Many),
                AssocDef::new("nick", "dm4.core.lots", "dm4.core.composition_def"),
            ],
        }
    }

    #[test]
    fn test_instances_query() {
        let query = RelatedQuery::instances_of("person");
        assert!(query.is_instantiation());
        assert_eq!(query.others_topic_type_uri, "person");
    }

    #[test]
    fn test_group_children_follows_cardinality() {
        let children = vec![
            ("email".to_string(), Topic::new(11, "email", "a@b.c")),
            ("name".to_string(), Topic::new(10, "name", "Ada")),
            ("email".to_string(), Topic::new(12, "email", "d@e.f")),
            ("nick".to_string(), Topic::new(13, "nick", "ada")),
            ("unrelated".to_string(), Topic::new(14, "unrelated", "x")),
        ];

        let grouped = group_children(&person_type(), children);
        let keys: Vec<&str> = grouped.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "email"]);
        assert_eq!(grouped.get("name"), Some(&ChildValue::Single(Topic::new(10, "name", "Ada"))));
        match grouped.get("email") {
            Some(ChildValue::Many(emails)) => {
                assert_eq!(emails.iter().map(|t| t.id).collect::<Vec<_>>(), vec![11, 12]);
            }
            other => panic!("expected many emails, got {:?}", other),
        }
    }

    #[test]
    fn test_group_children_empty() {
        assert!(group_children(&person_type(), Vec::new()).is_empty());
    }
}
