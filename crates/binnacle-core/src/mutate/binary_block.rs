use std::collections::BTreeMap;

use crate::gene::GeneValue;
use crate::random;
use crate::schema::LeafSchema;

use super::MutatorTag;

fn component_keys(leaf: &LeafSchema) -> Vec<String> {
    leaf.components
        .as_ref()
        .expect("binary_block leaf always has components")
        .keys()
        .cloned()
        .collect()
}

fn sum_range(leaf: &LeafSchema) -> (u32, u32) {
    let [lo, hi] = leaf.sum_range.expect("binary_block leaf always has sum_range");
    (lo, hi)
}

fn block_from_indices(keys: &[String], chosen: &[usize]) -> BTreeMap<String, u8> {
    let chosen: std::collections::HashSet<usize> = chosen.iter().copied().collect();
    keys.iter()
        .enumerate()
        .map(|(i, k)| (k.clone(), if chosen.contains(&i) { 1 } else { 0 }))
        .collect()
}

pub fn mutate(tag: MutatorTag, leaf: &LeafSchema, parents: &[GeneValue], percentage: f64) -> GeneValue {
    let keys = component_keys(leaf);
    let (lo, hi) = sum_range(leaf);
    let parent_blocks: Vec<&BTreeMap<String, u8>> =
        parents.iter().filter_map(GeneValue::as_binary_block).collect();

    let block = match tag {
        MutatorTag::Crossover => crossover(&keys, lo, hi, &parent_blocks),
        MutatorTag::Random | MutatorTag::GaussianStep => random_block(&keys, lo, hi),
        MutatorTag::Scaled => scaled(&keys, lo, hi, percentage),
        MutatorTag::Minimum => block_from_indices(&keys, &[]),
        MutatorTag::Maximum => {
            let indices = random::sample_indices(keys.len(), hi as usize);
            block_from_indices(&keys, &indices)
        }
        _ => unreachable!("unsupported tag filtered by dispatch"),
    };
    GeneValue::BinaryBlock(block)
}

fn random_block(keys: &[String], lo: u32, hi: u32) -> BTreeMap<String, u8> {
    let amount = random::range_inclusive(lo, hi) as usize;
    let indices = random::sample_indices(keys.len(), amount);
    block_from_indices(keys, &indices)
}

fn scaled(keys: &[String], lo: u32, hi: u32, percentage: f64) -> BTreeMap<String, u8> {
    let ones = (lo as f64 + (hi - lo) as f64 * percentage).ceil() as usize;
    let ones = ones.min(keys.len());
    let indices = random::sample_indices(keys.len(), ones);
    block_from_indices(keys, &indices)
}

fn crossover(keys: &[String], lo: u32, hi: u32, parents: &[&BTreeMap<String, u8>]) -> BTreeMap<String, u8> {
    let mut result = BTreeMap::new();
    for k in keys {
        let bit = if parents.is_empty() {
            random::bool(0.5) as u8
        } else {
            let chosen = random::choose(parents).expect("non-empty checked above");
            *chosen.get(k).unwrap_or(&0)
        };
        result.insert(k.clone(), bit);
    }
    repair(keys, lo, hi, parents, result)
}

/// Weighted, parent-aware repair: flips preferentially land on bits where some
/// parent already held the target value, so the fixed-up candidate still looks
/// like something crossover could plausibly have produced.
fn repair(
    keys: &[String],
    lo: u32,
    hi: u32,
    parents: &[&BTreeMap<String, u8>],
    mut result: BTreeMap<String, u8>,
) -> BTreeMap<String, u8> {
    let popcount = result.values().filter(|&&b| b != 0).count() as u32;

    let (flip_to, flip_num) = if popcount > hi {
        (0u8, popcount - hi)
    } else if popcount < lo {
        (1u8, lo - popcount)
    } else {
        return result;
    };
    if flip_num == 0 {
        return result;
    }

    let mut pool_keys = Vec::new();
    let mut pool_weights = Vec::new();
    for k in keys {
        let current = *result.get(k).unwrap_or(&0);
        if current == flip_to {
            continue;
        }
        let weight = parents
            .iter()
            .filter(|p| *p.get(k).unwrap_or(&0) == flip_to)
            .count();
        if weight > 0 {
            pool_keys.push(k.clone());
            pool_weights.push(weight as f64);
        }
    }

    let mut chosen: Vec<String> = random::weighted_sample_indices(&pool_weights, flip_num as usize)
        .into_iter()
        .map(|i| pool_keys[i].clone())
        .collect();

    if chosen.len() < flip_num as usize {
        let remaining: Vec<String> = keys
            .iter()
            .filter(|k| *result.get(*k).unwrap_or(&0) != flip_to && !chosen.contains(k))
            .cloned()
            .collect();
        let need = flip_num as usize - chosen.len();
        let extra = random::sample_indices(remaining.len(), need);
        chosen.extend(extra.into_iter().map(|i| remaining[i].clone()));
    }

    for k in chosen {
        result.insert(k, flip_to);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamType;

    fn leaf(n: usize, lo: u32, hi: u32) -> LeafSchema {
        let components = (0..n).map(|i| (format!("c{i}"), 0)).collect();
        LeafSchema {
            param_type: ParamType::BinaryBlock,
            range: None,
            values: None,
            components: Some(components),
            sum_range: Some([lo, hi]),
        }
    }

    fn popcount(block: &GeneValue) -> u32 {
        block.popcount().unwrap()
    }

    #[test]
    fn random_respects_sum_range() {
        let leaf = leaf(10, 3, 5);
        for _ in 0..500 {
            let out = mutate(MutatorTag::Random, &leaf, &[], 0.0);
            let c = popcount(&out);
            assert!((3..=5).contains(&c));
        }
    }

    #[test]
    fn crossover_repair_keeps_popcount_in_bounds_and_flips_only_parent_backed_bits() {
        let leaf = leaf(10, 3, 5);
        let mut parent_a = BTreeMap::new();
        let mut parent_b = BTreeMap::new();
        for i in 0..10 {
            parent_a.insert(format!("c{i}"), if i < 5 { 1 } else { 0 });
            parent_b.insert(format!("c{i}"), if i >= 5 { 1 } else { 0 });
        }
        let parents = [
            GeneValue::BinaryBlock(parent_a.clone()),
            GeneValue::BinaryBlock(parent_b.clone()),
        ];

        for _ in 0..500 {
            let out = mutate(MutatorTag::Crossover, &leaf, &parents, 0.0);
            let c = popcount(&out);
            assert!((3..=5).contains(&c), "popcount {c} outside sum_range");

            let GeneValue::BinaryBlock(map) = &out else { panic!() };
            for (k, &bit) in map {
                // Every bit present in the output must be backed by at least one
                // parent's value at that key (the parent-aware repair invariant).
                let backed = *parent_a.get(k).unwrap() == bit || *parent_b.get(k).unwrap() == bit;
                assert!(backed, "bit {k}={bit} not backed by either parent");
            }
        }
    }

    #[test]
    fn minimum_is_all_zero_maximum_is_max_sum_range() {
        let leaf = leaf(10, 3, 5);
        let min = mutate(MutatorTag::Minimum, &leaf, &[], 0.0);
        assert_eq!(popcount(&min), 0);
        let max = mutate(MutatorTag::Maximum, &leaf, &[], 0.0);
        assert_eq!(popcount(&max), 5);
    }

    #[test]
    fn scaled_interpolates_between_sum_range_endpoints() {
        let leaf = leaf(20, 4, 20);
        let low = mutate(MutatorTag::Scaled, &leaf, &[], 0.0);
        assert_eq!(popcount(&low), 4);
        let high = mutate(MutatorTag::Scaled, &leaf, &[], 1.0);
        assert_eq!(popcount(&high), 20);
    }
}
