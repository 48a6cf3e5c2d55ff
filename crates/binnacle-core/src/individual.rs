//! The unit of evaluation: a genome plus its measured metrics and provenance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mutate::MutatorTag;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lineage {
    pub mutator: MutatorTag,
    #[serde(default)]
    pub parent1_uuid: Option<Uuid>,
    #[serde(default)]
    pub parent2_uuid: Option<Uuid>,
    pub generation_num: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Individual {
    pub uuid: Uuid,
    pub genetics: serde_json::Value,
    #[serde(default)]
    pub metrics: BTreeMap<String, Option<f64>>,
    pub lineage: Lineage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_path: Option<String>,
}

impl Individual {
    pub fn new(genetics: serde_json::Value, lineage: Lineage) -> Individual {
        Individual {
            uuid: Uuid::new_v4(),
            genetics,
            metrics: BTreeMap::new(),
            lineage,
            trials: None,
            out_path: None,
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().flatten()
    }

    /// Every metric present, finite, and non-null.
    pub fn has_all_metrics(&self, names: &[String]) -> bool {
        names.iter().all(|name| {
            self.metrics
                .get(name)
                .and_then(|v| *v)
                .is_some_and(f64::is_finite)
        })
    }
}
