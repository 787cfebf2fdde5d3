//! Canonical resource links.

use std::fmt;

use crate::{DmrestError, Result};

/// Formats resource URIs against the configured base host address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    host: String,
}

impl LinkBuilder {
    /// Fails when no host address was configured.
    pub fn new(host: Option<&str>) -> Result<Self> {
        let host = host.map(str::trim).filter(|h| !h.is_empty()).ok_or_else(|| {
            DmrestError::Config(
                "host url is not configured: set dmrest.host_url in config.toml or DM4_HOST_URL"
                    .to_string(),
            )
        })?;
        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Append `template` to the host, filling each `{}` with the next param.
    /// Placeholders without a param are left as they are.
    pub fn build(&self, template: &str, params: &[&dyn fmt::Display]) -> String {
        let mut uri = String::with_capacity(self.host.len() + template.len() + 16);
        uri.push_str(&self.host);

        let mut params = params.iter();
        let mut rest = template;
        while let Some(pos) = rest.find("{}") {
            uri.push_str(&rest[..pos]);
            match params.next() {
                Some(param) => uri.push_str(&param.to_string()),
                None => uri.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        uri.push_str(rest);
        uri
    }

    /// Link to a type document.
    pub fn type_uri(&self, type_uri: &str) -> String {
        self.build("/rest/type/{}", &[&type_uri])
    }

    /// Link to a topic document.
    pub fn topic_uri(&self, id: i64) -> String {
        self.build("/rest/topic/{}", &[&id])
    }

    /// Link to the instance list of a type.
    pub fn instances_uri(&self, type_uri: &str) -> String {
        self.build("/rest/topics/{}", &[&type_uri])
    }
}
