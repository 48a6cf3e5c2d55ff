//! Metric definitions: the ordered list of axes the archive bins on, with the
//! last one (by `index`) designated the free axis being optimized.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricDef {
    pub name: String,
    pub fixed_axis: bool,
    pub axis_range: [f64; 2],
    pub partitions: u32,
    pub index: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(flatten)]
    pub fitness: std::collections::BTreeMap<String, MetricDefRaw>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricDefRaw {
    pub fixed_axis: bool,
    pub range: [f64; 2],
    #[serde(default)]
    pub partitions: u32,
    pub index: u32,
}

#[derive(Clone, Debug)]
pub struct Metrics {
    ordered: Vec<MetricDef>,
}

impl Metrics {
    pub fn from_config(config: &MetricsConfig) -> Metrics {
        let mut ordered: Vec<MetricDef> = config
            .fitness
            .iter()
            .map(|(name, raw)| MetricDef {
                name: name.clone(),
                fixed_axis: raw.fixed_axis,
                axis_range: raw.range,
                partitions: raw.partitions,
                index: raw.index,
            })
            .collect();
        ordered.sort_by_key(|m| m.index);
        Metrics { ordered }
    }

    pub fn all(&self) -> &[MetricDef] {
        &self.ordered
    }

    pub fn fixed_axes(&self) -> impl Iterator<Item = &MetricDef> {
        self.ordered.iter().filter(|m| m.fixed_axis)
    }

    /// The metric being optimized: by convention the last metric in index order
    /// and the only one with `fixed_axis == false`.
    pub fn free_axis(&self) -> &MetricDef {
        self.ordered
            .last()
            .expect("at least one metric must be configured")
    }
}
