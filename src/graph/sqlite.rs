//! Topic store over the SQLite graph tables.

use rusqlite::{Connection, OptionalExtension, Row};

use super::store::group_children;
use super::{AssocDef, ChildTopics, RelatedQuery, RelatedTopic, SimpleValue, Topic, TopicStore, TopicType};
use crate::{DmrestError, Result};

/// Raw topic row before the value is decoded.
struct TopicRow {
    id: i64,
    type_uri: String,
    uri: String,
    value: String,
    value_kind: String,
}

impl TopicRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            type_uri: row.get(1)?,
            uri: row.get(2)?,
            value: row.get(3)?,
            value_kind: row.get(4)?,
        })
    }

    fn into_topic(self) -> Result<Topic> {
        let value = decode_value(&self.value_kind, &self.value)
            .map_err(|msg| DmrestError::DataIntegrity(format!("topic {}: {}", self.id, msg)))?;
        Ok(Topic {
            id: self.id,
            type_uri: self.type_uri,
            uri: self.uri,
            value,
        })
    }
}

/// Decode a stored simple value by its kind column.
fn decode_value(kind: &str, raw: &str) -> std::result::Result<SimpleValue, String> {
    match kind {
        "text" => Ok(SimpleValue::Text(raw.to_string())),
        "integer" => raw
            .parse::<i64>()
            .map(SimpleValue::Integer)
            .map_err(|_| format!("invalid integer value {:?}", raw)),
        "number" => raw
            .parse::<f64>()
            .map(SimpleValue::Number)
            .map_err(|_| format!("invalid number value {:?}", raw)),
        "boolean" => match raw {
            "true" | "1" => Ok(SimpleValue::Boolean(true)),
            "false" | "0" => Ok(SimpleValue::Boolean(false)),
            _ => Err(format!("invalid boolean value {:?}", raw)),
        },
        other => Err(format!("unknown value kind {:?}", other)),
    }
}

/// Reads topics and types through a borrowed connection.
///
/// Pass a transaction to get one consistent snapshot per request.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn assoc_defs(&self, parent_type_uri: &str) -> Result<Vec<AssocDef>> {
        let mut stmt = self.conn.prepare(
            "SELECT child_type_uri, cardinality_uri, assoc_type_uri \
             FROM assoc_defs \
             WHERE parent_type_uri = ?1 \
             ORDER BY position, id",
        )?;
        let defs = stmt
            .query_map([parent_type_uri], |row| {
                Ok(AssocDef {
                    child_type_uri: row.get(0)?,
                    cardinality_uri: row.get(1)?,
                    assoc_type_uri: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(defs)
    }
}

impl TopicStore for SqliteStore<'_> {
    fn topic(&self, id: i64) -> Result<Option<Topic>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, type_uri, uri, value, value_kind FROM topics WHERE id = ?1",
                [id],
                TopicRow::from_row,
            )
            .optional()?;
        row.map(TopicRow::into_topic).transpose()
    }

    fn topic_type(&self, uri: &str) -> Result<Option<TopicType>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, uri, value, data_type_uri FROM topic_types WHERE uri = ?1",
                [uri],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, uri, value, data_type_uri)) = row else {
            return Ok(None);
        };
        let assoc_defs = self.assoc_defs(&uri)?;
        Ok(Some(TopicType {
            id,
            uri,
            value: SimpleValue::Text(value),
            data_type_uri,
            assoc_defs,
        }))
    }

    fn child_topics(&self, topic: &Topic) -> Result<ChildTopics> {
        let Some(topic_type) = self.topic_type(&topic.type_uri)? else {
            log::warn!("topic {} has unknown type {}", topic.id, topic.type_uri);
            return Ok(ChildTopics::new());
        };
        if topic_type.assoc_defs.is_empty() {
            return Ok(ChildTopics::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.type_uri, t.uri, t.value, t.value_kind, c.child_type_uri \
             FROM child_topics c \
             JOIN topics t ON t.id = c.child_id \
             WHERE c.parent_id = ?1 \
             ORDER BY c.position, c.child_id",
        )?;
        let rows = stmt
            .query_map([topic.id], |row| {
                Ok((TopicRow::from_row(row)?, row.get::<_, String>(5)?))
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        let mut children = Vec::with_capacity(rows.len());
        for (row, child_type_uri) in rows {
            children.push((child_type_uri, row.into_topic()?));
        }

        Ok(group_children(&topic_type, children))
    }

    fn related_topics(&self, query: &RelatedQuery) -> Result<Vec<RelatedTopic>> {
        if !query.is_instantiation() {
            return Err(DmrestError::InvalidInput(format!(
                "unsupported related topics query: {} ({} -> {})",
                query.assoc_type_uri, query.my_role_type_uri, query.others_role_type_uri
            )));
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, type_uri, uri, value, value_kind FROM topics WHERE type_uri = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([&query.others_topic_type_uri], TopicRow::from_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        rows.into_iter()
            .map(|row| row.into_topic().map(RelatedTopic::from))
            .collect()
    }
}
