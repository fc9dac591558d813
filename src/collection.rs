//! Read-only index of collection metadata keyed by mint.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use serde::Deserialize;
use solana_pubkey::Pubkey;

use crate::codec::address::parse_address;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Trait {
    pub trait_type: String,
    pub value: serde_json::Value,
}

/// Human-facing metadata for one mint, as shipped in a collection dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionEntry {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    pub mint: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub external_url: String,
    #[serde(default)]
    pub seller_fee_basis_points: u16,
    #[serde(default)]
    pub attributes: Vec<Trait>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "arweaveUri")]
    pub arweave_uri: Option<String>,
}

impl CollectionEntry {
    pub fn display_name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default)]
pub struct CollectionIndex {
    entries: HashMap<Pubkey, CollectionEntry>,
}

impl CollectionIndex {
    /// Load `<dir>/<id>.json` for every dataset id. Any unreadable dataset
    /// fails the whole load.
    pub fn load<S: AsRef<str>>(dir: &Path, dataset_ids: &[S]) -> Result<Self, Error> {
        let mut index = Self::default();
        for dataset in dataset_ids {
            let dataset = dataset.as_ref();
            let path = dir.join(format!("{dataset}.json"));
            let raw = std::fs::read_to_string(&path).map_err(|e| Error::DatasetUnreadable {
                dataset: dataset.to_string(),
                reason: format!("{}: {e}", path.display()),
            })?;
            let entries: Vec<CollectionEntry> =
                serde_json::from_str(&raw).map_err(|e| Error::DatasetUnreadable {
                    dataset: dataset.to_string(),
                    reason: e.to_string(),
                })?;
            index.insert_dataset(dataset, entries)?;
        }
        tracing::info!(entries = index.len(), datasets = dataset_ids.len(), "collection index loaded");
        Ok(index)
    }

    pub fn from_entries(dataset: &str, entries: Vec<CollectionEntry>) -> Result<Self, Error> {
        let mut index = Self::default();
        index.insert_dataset(dataset, entries)?;
        Ok(index)
    }

    pub fn lookup(&self, mint: &Pubkey) -> Option<&CollectionEntry> {
        self.entries.get(mint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert_dataset(&mut self, dataset: &str, entries: Vec<CollectionEntry>) -> Result<(), Error> {
        let mut id_counts: HashMap<u32, usize> = HashMap::new();
        for entry in &entries {
            *id_counts.entry(entry.id).or_default() += 1;
        }

        for entry in entries {
            if id_counts.get(&entry.id).copied().unwrap_or(0) > 1 {
                tracing::debug!(dataset, id = entry.id, "dropping ambiguous collection id");
                continue;
            }
            let mint = parse_address(&entry.mint).map_err(|e| Error::DatasetUnreadable {
                dataset: dataset.to_string(),
                reason: format!("entry {}: {e}", entry.id),
            })?;
            match self.entries.entry(mint) {
                Entry::Occupied(existing) => {
                    tracing::warn!(
                        dataset,
                        mint = %mint,
                        kept = %existing.get().name,
                        "mint already indexed by an earlier dataset"
                    );
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
        }
        Ok(())
    }
}
