//! The binned Pareto archive ("DataDict"): a multidimensional fixed-axis grid
//! where each cell keeps the top-K individuals seen for that bin.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::individual::Individual;
use crate::metric::Metrics;
use crate::objective::Optimize;

/// One fixed-axis bin edge per fixed-axis metric, in metric-index order.
pub type BinPath = Vec<String>;

fn linspace(lo: f64, hi: f64, n: u32) -> Vec<f64> {
    if n <= 1 {
        return vec![round2(lo)];
    }
    let step = (hi - lo) / (n as f64 - 1.0);
    (0..n).map(|i| round2(lo + step * i as f64)).collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn edge_key(v: f64) -> String {
    format!("{:.2}", v)
}

/// Greatest edge strictly less than `value`; falls back to the first edge.
fn bin_for_value(edges: &[f64], value: f64) -> f64 {
    edges
        .iter()
        .copied()
        .filter(|&e| e < value)
        .next_back()
        .unwrap_or(edges[0])
}

pub struct Archive {
    metrics: Metrics,
    optimize: Optimize,
    amount_per_bin: usize,
    bins: BTreeMap<BinPath, Vec<Individual>>,
    edges: Vec<(String, Vec<f64>)>,
}

impl Archive {
    pub fn new(metrics: Metrics, maximize: bool, amount_per_bin: usize) -> Archive {
        let edges: Vec<(String, Vec<f64>)> = metrics
            .fixed_axes()
            .map(|m| (m.name.clone(), linspace(m.axis_range[0], m.axis_range[1], m.partitions)))
            .collect();

        let mut archive = Archive {
            metrics,
            optimize: Optimize::from_maximize(maximize),
            amount_per_bin,
            bins: BTreeMap::new(),
            edges,
        };
        archive.seed_empty_bins();
        archive
    }

    fn seed_empty_bins(&mut self) {
        let mut paths: Vec<BinPath> = vec![Vec::new()];
        for (_, axis_edges) in &self.edges {
            let mut next = Vec::with_capacity(paths.len() * axis_edges.len());
            for path in &paths {
                for edge in axis_edges {
                    let mut extended = path.clone();
                    extended.push(edge_key(*edge));
                    next.push(extended);
                }
            }
            paths = next;
        }
        for path in paths {
            self.bins.entry(path).or_default();
        }
    }

    fn free_axis_name(&self) -> &str {
        &self.metrics.free_axis().name
    }

    fn bin_path_for(&self, individual: &Individual) -> Option<BinPath> {
        let mut path = Vec::with_capacity(self.edges.len());
        for (name, axis_edges) in &self.edges {
            let value = individual.metric(name)?;
            path.push(edge_key(bin_for_value(axis_edges, value)));
        }
        Some(path)
    }

    /// Replace any missing/non-finite configured metric with the worst feasible
    /// value for the archive's optimization direction.
    fn fill_invalid(&self, individual: &mut Individual) {
        for metric in self.metrics.all() {
            let needs_fill = !individual
                .metrics
                .get(&metric.name)
                .and_then(|v| *v)
                .is_some_and(f64::is_finite);
            if needs_fill {
                individual
                    .metrics
                    .insert(metric.name.clone(), Some(self.optimize.worst_value(metric.axis_range)));
            }
        }
    }

    /// Insert one individual. Returns `true` iff it survived top-K truncation.
    pub fn insert(&mut self, mut individual: Individual) -> bool {
        self.fill_invalid(&mut individual);
        let Some(path) = self.bin_path_for(&individual) else {
            return false;
        };
        let uuid = individual.uuid;
        let free_axis = self.free_axis_name().to_string();
        let optimize = self.optimize;

        let bin = self.bins.entry(path).or_default();
        bin.push(individual);
        bin.sort_by(|a, b| {
            optimize.cmp(
                a.metric(&free_axis).unwrap_or(f64::NAN),
                b.metric(&free_axis).unwrap_or(f64::NAN),
            )
        });
        bin.truncate(self.amount_per_bin);
        bin.iter().any(|i| i.uuid == uuid)
    }

    /// Merge another archive's individuals in, re-sorting and truncating every
    /// touched bin. Idempotent: merging an archive into itself changes nothing.
    pub fn merge(&mut self, other: &Archive) {
        let free_axis = self.free_axis_name().to_string();
        let optimize = self.optimize;
        for (path, individuals) in &other.bins {
            let bin = self.bins.entry(path.clone()).or_default();
            for incoming in individuals {
                if !bin.iter().any(|existing| existing.uuid == incoming.uuid) {
                    bin.push(incoming.clone());
                }
            }
            bin.sort_by(|a, b| {
                optimize.cmp(
                    a.metric(&free_axis).unwrap_or(f64::NAN),
                    b.metric(&free_axis).unwrap_or(f64::NAN),
                )
            });
            bin.truncate(self.amount_per_bin);
        }
    }

    pub fn non_empty_bins(&self) -> Vec<&BinPath> {
        self.bins
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| k)
            .collect()
    }

    pub fn bin(&self, path: &BinPath) -> &[Individual] {
        self.bins.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(bin path, best free-axis value or None if empty)` for every bin.
    pub fn flatten(&self) -> Vec<(BinPath, Option<f64>)> {
        let free_axis = self.free_axis_name().to_string();
        self.bins
            .iter()
            .map(|(path, individuals)| {
                (
                    path.clone(),
                    individuals.first().and_then(|i| i.metric(&free_axis)),
                )
            })
            .collect()
    }

    pub fn to_wire(&self) -> ArchiveWire {
        ArchiveWire {
            bins: self
                .bins
                .iter()
                .map(|(k, v)| (k.join("/"), v.clone()))
                .collect(),
        }
    }

    /// Rebuild an archive of this shape from a wire snapshot, for merging a
    /// pulled server state into a local archive.
    pub fn from_wire(wire: &ArchiveWire, metrics: Metrics, maximize: bool, amount_per_bin: usize) -> Archive {
        let mut archive = Archive::new(metrics, maximize, amount_per_bin);
        for (joined, individuals) in &wire.bins {
            let path: BinPath = if joined.is_empty() {
                Vec::new()
            } else {
                joined.split('/').map(str::to_string).collect()
            };
            archive.bins.insert(path, individuals.clone());
        }
        archive
    }
}

/// Flat wire representation for `GET /get_state`: bin path joined with `/` as the
/// key, since JSON object keys must be strings and paths have variable arity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArchiveWire {
    pub bins: BTreeMap<String, Vec<Individual>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::Lineage;
    use crate::metric::{MetricDefRaw, MetricsConfig};
    use crate::mutate::MutatorTag;
    use serde_json::json;
    use std::collections::BTreeMap as Map;

    fn metrics_fixed_and_free() -> Metrics {
        let mut fitness = Map::new();
        fitness.insert(
            "banana".to_string(),
            MetricDefRaw {
                fixed_axis: true,
                range: [0.0, 400.0],
                partitions: 5,
                index: 0,
            },
        );
        fitness.insert(
            "sinc".to_string(),
            MetricDefRaw {
                fixed_axis: false,
                range: [-0.5, 0.5],
                partitions: 0,
                index: 1,
            },
        );
        Metrics::from_config(&MetricsConfig { fitness })
    }

    fn make_individual(banana: f64, sinc: f64) -> Individual {
        let mut individual = Individual::new(
            json!({}),
            Lineage {
                mutator: MutatorTag::Random,
                parent1_uuid: None,
                parent2_uuid: None,
                generation_num: 0,
            },
        );
        individual.metrics.insert("banana".into(), Some(banana));
        individual.metrics.insert("sinc".into(), Some(sinc));
        individual
    }

    #[test]
    fn top_k_truncation_keeps_best_by_free_axis() {
        let mut archive = Archive::new(metrics_fixed_and_free(), false, 2);
        for sinc in [0.3, 0.1, 0.9, 0.2] {
            archive.insert(make_individual(10.0, sinc));
        }
        let path = vec![bin_for_value(&linspace(0.0, 400.0, 5), 10.0)]
            .iter()
            .map(|v| edge_key(*v))
            .collect::<Vec<_>>();
        let values: Vec<f64> = archive.bin(&path).iter().map(|i| i.metric("sinc").unwrap()).collect();
        assert_eq!(values, vec![0.1, 0.2]);
    }

    #[test]
    fn fill_invalid_assigns_worst_value_for_minimize() {
        let mut archive = Archive::new(metrics_fixed_and_free(), false, 2);
        let mut individual = make_individual(0.0, 0.1);
        individual.metrics.insert("banana".into(), Some(f64::NAN));
        archive.insert(individual);
        let bins = archive.non_empty_bins();
        assert_eq!(bins.len(), 1);
        let stored = &archive.bin(bins[0])[0];
        assert_eq!(stored.metric("banana"), Some(400.0));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut archive = Archive::new(metrics_fixed_and_free(), false, 3);
        archive.insert(make_individual(10.0, 0.1));
        archive.insert(make_individual(10.0, 0.2));
        let snapshot_before: Vec<_> = archive.flatten();

        let other_bins = archive.bins.clone();
        let clone = Archive {
            metrics: metrics_fixed_and_free(),
            optimize: archive.optimize,
            amount_per_bin: archive.amount_per_bin,
            bins: other_bins,
            edges: archive.edges.clone(),
        };
        archive.merge(&clone);

        let snapshot_after = archive.flatten();
        assert_eq!(snapshot_before, snapshot_after);
    }

    #[test]
    fn bin_lookup_uses_strict_inequality() {
        let edges = linspace(0.0, 400.0, 5);
        // value exactly on an edge falls into the next-lower bin, not this one
        assert_eq!(bin_for_value(&edges, edges[2]), edges[1]);
        assert_eq!(bin_for_value(&edges, edges[0]), edges[0]);
    }
}
