use crate::graph::{RelatedQuery, RelatedTopic, Topic, TopicStore, TopicType};
use crate::{DmrestError, Result};

/// Turns lookups that come back empty into not-found errors.
pub struct SchemaResolver<'a, S: TopicStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TopicStore + ?Sized> SchemaResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn resolve_type(&self, uri: &str) -> Result<TopicType> {
        self.store
            .topic_type(uri)?
            .ok_or_else(|| DmrestError::TypeNotFound(uri.to_string()))
    }

    pub fn resolve_topic(&self, id: i64) -> Result<Topic> {
        self.store.topic(id)?.ok_or(DmrestError::TopicNotFound(id))
    }

    /// Topics related to `topic_type` through instantiation. Possibly empty.
    pub fn instances(&self, topic_type: &TopicType) -> Result<Vec<RelatedTopic>> {
        self.store
            .related_topics(&RelatedQuery::instances_of(&topic_type.uri))
    }
}
