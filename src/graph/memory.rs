//! In-process topic store for fixtures and embedding.

use std::collections::HashMap;

use super::store::group_children;
use super::{ChildTopics, RelatedQuery, RelatedTopic, Topic, TopicStore, TopicType};
use crate::{DmrestError, Result};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    topics: HashMap<i64, Topic>,
    types: HashMap<String, TopicType>,
    /// parent id -> (child type uri, child id), in insertion order
    children: HashMap<i64, Vec<(String, i64)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_type(&mut self, topic_type: TopicType) -> &mut Self {
        self.types.insert(topic_type.uri.clone(), topic_type);
        self
    }

    pub fn insert_topic(&mut self, topic: Topic) -> &mut Self {
        self.topics.insert(topic.id, topic);
        self
    }

    /// Attach `child_id` to `parent_id` under the child's own type uri.
    pub fn add_child(&mut self, parent_id: i64, child_id: i64) -> Result<&mut Self> {
        if !self.topics.contains_key(&parent_id) {
            return Err(DmrestError::TopicNotFound(parent_id));
        }
        let child_type_uri = self
            .topics
            .get(&child_id)
            .map(|child| child.type_uri.clone())
            .ok_or(DmrestError::TopicNotFound(child_id))?;
        self.children
            .entry(parent_id)
            .or_default()
            .push((child_type_uri, child_id));
        Ok(self)
    }
}

impl TopicStore for MemoryStore {
    fn topic(&self, id: i64) -> Result<Option<Topic>> {
        Ok(self.topics.get(&id).cloned())
    }

    fn topic_type(&self, uri: &str) -> Result<Option<TopicType>> {
        Ok(self.types.get(uri).cloned())
    }

    fn child_topics(&self, topic: &Topic) -> Result<ChildTopics> {
        let Some(topic_type) = self.types.get(&topic.type_uri) else {
            log::warn!("topic {} has unknown type {}", topic.id, topic.type_uri);
            return Ok(ChildTopics::new());
        };
        let children = self
            .children
            .get(&topic.id)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(child_type_uri, child_id)| {
                        self.topics
                            .get(child_id)
                            .map(|child| (child_type_uri.clone(), child.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(group_children(topic_type, children))
    }

    fn related_topics(&self, query: &RelatedQuery) -> Result<Vec<RelatedTopic>> {
        if !query.is_instantiation() {
            return Err(DmrestError::InvalidInput(format!(
                "unsupported related topics query: {}",
                query.assoc_type_uri
            )));
        }
        let mut instances: Vec<RelatedTopic> = self
            .topics
            .values()
            .filter(|topic| topic.type_uri == query.others_topic_type_uri)
            .cloned()
            .map(RelatedTopic::from)
            .collect();
        instances.sort_by_key(|topic| topic.id);
        Ok(instances)
    }
}
