use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type AssetId = u64;

/// Operational status of a physical asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    #[serde(rename = "Betrieb")]
    Betrieb,
    #[serde(rename = "Wartung")]
    Wartung,
    #[serde(rename = "Störung")]
    Stoerung,
    #[serde(rename = "Stillstand")]
    Stillstand,
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssetStatus::Betrieb => "Betrieb",
            AssetStatus::Wartung => "Wartung",
            AssetStatus::Stoerung => "Störung",
            AssetStatus::Stillstand => "Stillstand",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub location: String,
    pub status: AssetStatus,
}

impl Asset {
    pub fn new(id: AssetId, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            location: location.into(),
            status: AssetStatus::Betrieb,
        }
    }
}

/// Read-mostly directory of assets, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetDirectory {
    assets: BTreeMap<AssetId, Asset>,
}

impl AssetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: assets.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    pub fn upsert(&mut self, asset: Asset) {
        self.assets.insert(asset.id, asset);
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
