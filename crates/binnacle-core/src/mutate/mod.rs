//! Typed mutation dispatch: `(GeneType, MutatorTag)` selects one operator.

mod binary_block;
mod boolean;
mod enumerated;
mod float;
mod int;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::gene::{GeneType, GeneValue};
use crate::random;
use crate::schema::LeafSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutatorTag {
    Crossover,
    Random,
    GaussianStep,
    GaussianRandom,
    Scaled,
    Minimum,
    Maximum,
    /// Tree-wide policy: disable mutation on a random subset of eligible leaves.
    Partial,
    /// Tree-wide policy: disable mutation on all but one eligible leaf.
    Min,
    #[serde(rename = "bbleftshift")]
    BbLeftShift,
    #[serde(rename = "bbrightshift")]
    BbRightShift,
    #[serde(rename = "bbxor")]
    BbXor,
    #[serde(rename = "bband")]
    BbAnd,
    #[serde(rename = "bbor")]
    BbOr,
    #[serde(rename = "bbnotone")]
    BbNotOne,
    #[serde(rename = "bbnotsome")]
    BbNotSome,
    #[serde(rename = "bbnotall")]
    BbNotAll,
    #[serde(rename = "bbflipgroup")]
    BbFlipGroup,
}

impl MutatorTag {
    /// Tags that select a whole-tree policy rather than a per-leaf operator.
    pub fn is_tree_policy(self) -> bool {
        matches!(self, MutatorTag::Partial | MutatorTag::Min)
    }
}

/// Whether `gene_type` has a wired operator for `tag`. The nine `bb*` tags are valid
/// enum values (so config files naming them still parse) but no gene type declares
/// support for them, matching the source's dynamic-dispatch table which never
/// contained matching methods.
pub fn supports(gene_type: GeneType, tag: MutatorTag) -> bool {
    use GeneType::*;
    use MutatorTag::*;
    match (gene_type, tag) {
        (_, Partial) | (_, Min) => false,
        (BinaryBlock, Crossover | Random | GaussianStep | Scaled | Minimum | Maximum) => true,
        (BinaryBlock, _) => false,
        (_, Crossover | Random | GaussianStep | GaussianRandom | Scaled | Minimum | Maximum) => {
            true
        }
        _ => false,
    }
}

/// Dispatch one mutation. `current` is the pre-mutation value (`values[0]` in tree
/// terms) returned unchanged when `tag` is not wired for `gene_type`.
pub fn dispatch(
    tag: MutatorTag,
    leaf: &LeafSchema,
    parents: &[GeneValue],
    percentage: f64,
    current: Option<&GeneValue>,
) -> GeneValue {
    let gene_type = leaf.param_type.gene_type();
    if !supports(gene_type, tag) {
        return current
            .cloned()
            .or_else(|| parents.first().cloned())
            .unwrap_or(GeneValue::Bool(false));
    }

    match gene_type {
        GeneType::Int => int::mutate(tag, leaf, parents, percentage),
        GeneType::Float => float::mutate(tag, leaf, parents, percentage),
        GeneType::Bool => boolean::mutate(tag, leaf, parents, percentage),
        GeneType::Enum => enumerated::mutate(tag, leaf, parents, percentage),
        GeneType::BinaryBlock => binary_block::mutate(tag, leaf, parents, percentage),
    }
}

/// Weighted-choice tables: one "which tag for the whole tree" table (`global`,
/// corresponds to the source's `mutators.scale`) and one per-gene-type table
/// (`per_type`, corresponds to `mutators.type`) used when a leaf actually mutates.
#[derive(Clone, Debug, Default)]
pub struct MutatorWeights {
    pub global: Vec<(MutatorTag, f64)>,
    pub per_type: HashMap<GeneType, Vec<(MutatorTag, f64)>>,
}

impl MutatorWeights {
    pub fn draw_global(&self) -> MutatorTag {
        draw(&self.global).unwrap_or(MutatorTag::Random)
    }

    pub fn draw_for_type(&self, gene_type: GeneType) -> MutatorTag {
        match self.per_type.get(&gene_type) {
            Some(weights) => draw(weights).unwrap_or(MutatorTag::Random),
            None => MutatorTag::Random,
        }
    }
}

fn draw(weights: &[(MutatorTag, f64)]) -> Option<MutatorTag> {
    if weights.is_empty() {
        return None;
    }
    let tags: Vec<MutatorTag> = weights.iter().map(|(t, _)| *t).collect();
    let ws: Vec<f64> = weights.iter().map(|(_, w)| *w).collect();
    random::weighted_choice(&tags, &ws).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bb_tags_are_unsupported_everywhere() {
        for gt in [
            GeneType::Int,
            GeneType::Float,
            GeneType::Bool,
            GeneType::Enum,
            GeneType::BinaryBlock,
        ] {
            assert!(!supports(gt, MutatorTag::BbXor));
            assert!(!supports(gt, MutatorTag::BbFlipGroup));
        }
    }

    #[test]
    fn tree_policy_tags_are_never_leaf_operators() {
        for gt in [GeneType::Int, GeneType::BinaryBlock] {
            assert!(!supports(gt, MutatorTag::Partial));
            assert!(!supports(gt, MutatorTag::Min));
        }
    }

    #[test]
    fn gaussian_random_does_not_apply_to_binary_block() {
        assert!(!supports(GeneType::BinaryBlock, MutatorTag::GaussianRandom));
        assert!(supports(GeneType::Int, MutatorTag::GaussianRandom));
    }
}
