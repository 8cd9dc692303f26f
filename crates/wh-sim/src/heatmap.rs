use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use wh_core::GridPosition;

/// Per-cell visit counts for one run.
///
/// Serialized as a JSON object keyed `"x:y"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, u64>", try_from = "BTreeMap<String, u64>")]
pub struct Heatmap {
    counts: BTreeMap<GridPosition, u64>,
}

impl Heatmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one arrival at `cell`.
    pub fn visit(&mut self, cell: GridPosition) {
        *self.counts.entry(cell).or_default() += 1;
    }

    pub fn get(&self, cell: GridPosition) -> u64 {
        self.counts.get(&cell).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, u64)> + '_ {
        self.counts.iter().map(|(&c, &n)| (c, n))
    }

    /// Sum of all visits.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl From<Heatmap> for BTreeMap<String, u64> {
    fn from(map: Heatmap) -> Self {
        map.counts
            .into_iter()
            .map(|(c, n)| (format!("{}:{}", c.x, c.y), n))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, u64>> for Heatmap {
    type Error = String;

    fn try_from(raw: BTreeMap<String, u64>) -> Result<Self, Self::Error> {
        let mut counts = BTreeMap::new();
        for (key, n) in raw {
            let (x, y) = key.split_once(':').ok_or_else(|| format!("bad heatmap key {key:?}"))?;
            let x = x.parse::<u32>().map_err(|e| format!("bad heatmap key {key:?}: {e}"))?;
            let y = y.parse::<u32>().map_err(|e| format!("bad heatmap key {key:?}: {e}"))?;
            counts.insert(GridPosition::new(x, y), n);
        }
        Ok(Self { counts })
    }
}
