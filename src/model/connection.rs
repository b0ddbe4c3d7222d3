//! Connections
//!
//! Credentials/endpoints for the target runtime. Keyed by `conn_id`,
//! overwritten on collision.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{Entity, EntityKind};
use crate::error::{require_key, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Connection {
    pub conn_id: String,

    #[serde(default = "default_conn_type")]
    pub conn_type: String,

    /// Any further connection fields (host, port, login, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_conn_type() -> String {
    "generic".to_string()
}

/// Settings document record for a connection.
#[derive(Serialize, Debug)]
pub struct ConnectionRecord<'a> {
    pub conn_id: &'a str,
    pub conn_type: &'a str,
    #[serde(flatten)]
    pub extra: &'a BTreeMap<String, Value>,
}

impl Connection {
    pub fn new(conn_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            conn_id: require_key("Connection", "conn_id", &conn_id.into())?,
            conn_type: default_conn_type(),
            extra: BTreeMap::new(),
        })
    }

    pub fn with_type(mut self, conn_type: impl Into<String>) -> Self {
        self.conn_type = conn_type.into();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn record(&self) -> ConnectionRecord<'_> {
        ConnectionRecord {
            conn_id: &self.conn_id,
            conn_type: &self.conn_type,
            extra: &self.extra,
        }
    }
}

impl Entity for Connection {
    type Key = String;
    const KIND: EntityKind = EntityKind::Connections;

    fn key(&self) -> String {
        self.conn_id.clone()
    }

    fn merge(self, other: Self) -> Self {
        other
    }

    fn render(&self) -> String {
        serde_yaml::to_string(&self.record()).unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        require_key("Connection", "conn_id", &self.conn_id)?;
        require_key("Connection", "conn_type", &self.conn_type)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_generic() {
        let conn = Connection::new("foo").unwrap();
        assert_eq!(conn.conn_type, "generic");
    }

    #[test]
    fn test_merge_overwrites() {
        let old = Connection::new("db").unwrap().with_extra("host", "old");
        let new = Connection::new("db").unwrap().with_type("postgres");
        let merged = old.merge(new.clone());
        assert_eq!(merged, new);
        assert!(merged.extra.is_empty());
    }

    #[test]
    fn test_render_includes_extra_fields() {
        let conn = Connection::new("smtp")
            .unwrap()
            .with_type("smtp")
            .with_extra("host", "mail.local")
            .with_extra("port", 25);
        let text = conn.render();
        assert!(text.contains("conn_id: smtp"));
        assert!(text.contains("host: mail.local"));
        assert!(text.contains("port: 25"));
    }

    #[test]
    fn test_blank_id_rejected() {
        assert!(Connection::new("").is_err());
    }
}
