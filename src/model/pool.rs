//! Resource Pools
//!
//! Pools are the one keyed kind that accumulates on collision instead of
//! being overwritten: several rule matches may each ask for slots in the
//! same pool.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use crate::error::{require_key, Result};

/// A named, capacity-limited execution resource.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_slots")]
    pub slots: u32,
}

fn default_slots() -> u32 {
    1
}

/// How slot counts combine when two pools with the same name meet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolMerge {
    /// Slots add up. Order-independent, but re-adding a pool counts it again.
    #[default]
    Sum,
    /// The larger slot count wins. Idempotent.
    Max,
}

impl PoolMerge {
    pub fn combine(self, existing: u32, incoming: u32) -> u32 {
        match self {
            Self::Sum => existing.saturating_add(incoming),
            Self::Max => existing.max(incoming),
        }
    }
}

/// Settings document record for a pool.
#[derive(Serialize, Debug)]
pub struct PoolRecord<'a> {
    pub pool_name: &'a str,
    pub pool_slot: u32,
    pub pool_description: &'a str,
}

impl Pool {
    pub fn new(name: impl Into<String>, slots: u32) -> Result<Self> {
        Ok(Self {
            name: require_key("Pool", "name", &name.into())?,
            description: String::new(),
            slots,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Merges `other` into `self` using the given slot combinator.
    ///
    /// A non-empty incoming description replaces the stored one.
    pub fn merge_with(self, other: Pool, policy: PoolMerge) -> Pool {
        Pool {
            slots: policy.combine(self.slots, other.slots),
            description: if other.description.is_empty() {
                self.description
            } else {
                other.description
            },
            name: self.name,
        }
    }

    pub fn record(&self) -> PoolRecord<'_> {
        PoolRecord {
            pool_name: &self.name,
            pool_slot: self.slots,
            pool_description: &self.description,
        }
    }
}

impl Entity for Pool {
    type Key = String;
    const KIND: EntityKind = EntityKind::Pools;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn merge(self, other: Self) -> Self {
        self.merge_with(other, PoolMerge::default())
    }

    fn render(&self) -> String {
        // A struct of strings and integers always serializes.
        serde_yaml::to_string(&self.record()).unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        require_key("Pool", "name", &self.name).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sums_slots() {
        let a = Pool::new("p1", 2).unwrap();
        let b = Pool::new("p1", 3).unwrap();
        assert_eq!(a.merge(b).slots, 5);
    }

    #[test]
    fn test_max_merge_is_idempotent() {
        let a = Pool::new("p1", 4).unwrap().with_description("etl");
        let merged = a.clone().merge_with(a.clone(), PoolMerge::Max);
        assert_eq!(merged, a);
    }

    #[test]
    fn test_merge_keeps_description_when_incoming_blank() {
        let a = Pool::new("p1", 1).unwrap().with_description("batch jobs");
        let b = Pool::new("p1", 1).unwrap();
        assert_eq!(a.merge(b).description, "batch jobs");
    }

    #[test]
    fn test_sum_saturates() {
        assert_eq!(PoolMerge::Sum.combine(u32::MAX, 1), u32::MAX);
    }

    #[test]
    fn test_render_record() {
        let pool = Pool::new("p1", 5).unwrap();
        let text = pool.render();
        assert!(text.contains("pool_name: p1"));
        assert!(text.contains("pool_slot: 5"));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(Pool::new(" ", 1).is_err());
    }

    #[test]
    fn test_default_slots_on_deserialize() {
        let pool: Pool = serde_yaml::from_str("name: p1").unwrap();
        assert_eq!(pool.slots, 1);
    }
}
