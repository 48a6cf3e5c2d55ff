use crate::gene::GeneValue;
use crate::random;
use crate::schema::LeafSchema;

use super::MutatorTag;

fn bounds(leaf: &LeafSchema) -> (i64, i64) {
    let [lo, hi] = leaf.range.expect("int leaf always has a range");
    (lo as i64, hi as i64)
}

pub fn mutate(tag: MutatorTag, leaf: &LeafSchema, parents: &[GeneValue], percentage: f64) -> GeneValue {
    let (lo, hi) = bounds(leaf);
    let parent_ints: Vec<i64> = parents.iter().filter_map(GeneValue::as_int).collect();

    let value = match tag {
        MutatorTag::Crossover => crossover(&parent_ints, lo, hi),
        MutatorTag::Random => random_value(lo, hi),
        MutatorTag::GaussianStep => gaussian_step(&parent_ints, lo, hi),
        MutatorTag::GaussianRandom => gaussian_random(lo, hi),
        MutatorTag::Scaled => scaled(lo, hi, percentage),
        MutatorTag::Minimum => lo,
        MutatorTag::Maximum => hi,
        _ => unreachable!("unsupported tag filtered by dispatch"),
    };
    GeneValue::Int(value)
}

fn crossover(parents: &[i64], lo: i64, hi: i64) -> i64 {
    match random::choose(parents) {
        Some(&v) => v,
        None => random_value(lo, hi),
    }
}

fn random_value(lo: i64, hi: i64) -> i64 {
    if lo >= hi {
        return lo;
    }
    random::range(lo..hi)
}

fn gaussian_step(parents: &[i64], lo: i64, hi: i64) -> i64 {
    let p = random::choose(parents).copied().unwrap_or((lo + hi) / 2);
    let std_dev = (hi - lo) as f64 / 4.0;
    let sample = random::gaussian(p as f64, std_dev);
    sample.round().clamp(lo as f64, hi as f64) as i64
}

fn gaussian_random(lo: i64, hi: i64) -> i64 {
    let mid = (lo as f64 + hi as f64) / 2.0;
    let sample = random::gaussian(mid, 3.0);
    sample.round().clamp(lo as f64, hi as f64) as i64
}

fn scaled(lo: i64, hi: i64, percentage: f64) -> i64 {
    (((hi - lo) as f64) * percentage + lo as f64).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamType;

    fn leaf(lo: f64, hi: f64) -> LeafSchema {
        LeafSchema {
            param_type: ParamType::Int,
            range: Some([lo, hi]),
            values: None,
            components: None,
            sum_range: None,
        }
    }

    #[test]
    fn crossover_always_returns_a_parent_value() {
        let leaf = leaf(-100.0, 100.0);
        let parents = [GeneValue::Int(23), GeneValue::Int(45), GeneValue::Int(97)];
        for _ in 0..200 {
            let out = mutate(MutatorTag::Crossover, &leaf, &parents, 0.0);
            let GeneValue::Int(v) = out else { panic!() };
            assert!([23, 45, 97].contains(&v));
        }
    }

    #[test]
    fn crossover_with_single_parent_returns_it() {
        let leaf = leaf(-200.0, 200.0);
        let parents = [GeneValue::Int(-99)];
        let out = mutate(MutatorTag::Crossover, &leaf, &parents, 0.0);
        assert_eq!(out, GeneValue::Int(-99));
    }

    #[test]
    fn crossover_with_no_parents_falls_back_to_random_in_range() {
        let leaf = leaf(-27.0, 30.0);
        for _ in 0..500 {
            let out = mutate(MutatorTag::Crossover, &leaf, &[], 0.0);
            let GeneValue::Int(v) = out else { panic!() };
            assert!((-27..30).contains(&v));
        }
    }

    #[test]
    fn random_is_uniform_within_half_open_range() {
        let leaf = leaf(-27.0, 30.0);
        let mut counts = [0usize; 57];
        for _ in 0..100_000 {
            let out = mutate(MutatorTag::Random, &leaf, &[], 0.0);
            let GeneValue::Int(v) = out else { panic!() };
            assert!((-27..30).contains(&v));
            counts[(v + 27) as usize] += 1;
        }
        let expected = 100_000.0 / 57.0;
        for count in counts {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation < 0.25, "bucket deviated too far from uniform: {deviation}");
        }
    }

    #[test]
    fn scaled_respects_endpoints() {
        let leaf = leaf(0.0, 100.0);
        assert_eq!(scaled(0, 100, 0.0), 0);
        assert_eq!(scaled(0, 100, 1.0), 100);
        assert_eq!(scaled(0, 100, 0.5), 50);
        let _ = leaf;
    }

    #[test]
    fn min_max_return_endpoints() {
        let leaf = leaf(-5.0, 5.0);
        assert_eq!(mutate(MutatorTag::Minimum, &leaf, &[], 0.0), GeneValue::Int(-5));
        assert_eq!(mutate(MutatorTag::Maximum, &leaf, &[], 0.0), GeneValue::Int(5));
    }

    #[test]
    fn gaussian_step_stays_in_range() {
        let leaf = leaf(-10.0, 10.0);
        let parents = [GeneValue::Int(0)];
        for _ in 0..200 {
            let out = mutate(MutatorTag::GaussianStep, &leaf, &parents, 0.0);
            let GeneValue::Int(v) = out else { panic!() };
            assert!((-10..=10).contains(&v));
        }
    }
}
