//! Runtime item-attribute registry, loaded once at startup from a JSON
//! asset file and indexed directly by item id.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetsError {
    #[error("failed to read items file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse items json {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The subset of item attributes the wire format and the rest of this
/// workspace care about. `is_stackable`/`is_fluid` are the only fields the
/// packet codec reads; the rest are carried for completeness (a future
/// dashboard consumer) but unused by this crate's own logic.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemAttributes {
    pub id: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_ground: bool,
    #[serde(default)]
    pub speed: u16,
    #[serde(default)]
    pub is_blocking: bool,
    #[serde(default)]
    pub is_missile_block: bool,
    #[serde(default)]
    pub is_path_block: bool,
    #[serde(default)]
    pub is_container: bool,
    #[serde(default)]
    pub is_stackable: bool,
    #[serde(default)]
    pub is_fluid: bool,
    #[serde(default)]
    pub is_multi_use: bool,
    #[serde(default)]
    pub is_pickupable: bool,
    #[serde(default)]
    pub is_translucent: bool,
    #[serde(default)]
    pub light_level: u8,
    #[serde(default)]
    pub light_color: u8,
    #[serde(default)]
    pub elevation: u16,
}

/// Item attributes indexed by id, `0..=max(id)`. Ids beyond the loaded
/// range resolve to a default record carrying only that id, matching the
/// source's fallback-to-blank-record behavior for unknown items.
#[derive(Debug, Default)]
pub struct Registry {
    things: Vec<ItemAttributes>,
}

impl Registry {
    pub fn empty() -> Self {
        Self { things: Vec::new() }
    }

    pub fn from_items(items: Vec<ItemAttributes>) -> Self {
        let max_id = items.iter().map(|item| item.id).max().unwrap_or(0);
        let mut things = vec![ItemAttributes::default(); max_id as usize + 1];
        for item in items {
            let id = item.id as usize;
            things[id] = item;
        }
        Self { things }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetsError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AssetsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let items: Vec<ItemAttributes> =
            serde_json::from_slice(&bytes).map_err(|source| AssetsError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::from_items(items))
    }

    /// Never fails: unknown ids return a default record carrying only that
    /// id, exactly like the source's `Get` fallback.
    pub fn get(&self, id: u16) -> ItemAttributes {
        self.things
            .get(id as usize)
            .cloned()
            .unwrap_or(ItemAttributes {
                id,
                ..Default::default()
            })
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_id_falls_back_to_blank_record() {
        let registry = Registry::from_items(vec![ItemAttributes {
            id: 100,
            name: "gold coin".into(),
            is_stackable: true,
            ..Default::default()
        }]);

        let known = registry.get(100);
        assert!(known.is_stackable);
        assert_eq!(known.name, "gold coin");

        let unknown = registry.get(9999);
        assert_eq!(unknown, ItemAttributes {
            id: 9999,
            ..Default::default()
        });
    }

    #[test]
    fn indexes_directly_by_id() {
        let registry = Registry::from_items(vec![
            ItemAttributes {
                id: 0,
                ..Default::default()
            },
            ItemAttributes {
                id: 5,
                is_fluid: true,
                ..Default::default()
            },
        ]);
        assert_eq!(registry.len(), 6);
        assert!(registry.get(5).is_fluid);
        assert!(!registry.get(3).is_fluid);
    }
}
