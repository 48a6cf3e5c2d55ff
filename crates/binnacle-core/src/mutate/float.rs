use crate::gene::GeneValue;
use crate::random;
use crate::schema::LeafSchema;

use super::MutatorTag;

fn bounds(leaf: &LeafSchema) -> (f64, f64) {
    let [lo, hi] = leaf.range.expect("float leaf always has a range");
    (lo, hi)
}

pub fn mutate(tag: MutatorTag, leaf: &LeafSchema, parents: &[GeneValue], percentage: f64) -> GeneValue {
    let (lo, hi) = bounds(leaf);
    let parent_floats: Vec<f64> = parents.iter().filter_map(GeneValue::as_float).collect();

    let value = match tag {
        MutatorTag::Crossover => crossover(&parent_floats, lo, hi),
        MutatorTag::Random => random_value(lo, hi),
        MutatorTag::GaussianStep => gaussian_step(&parent_floats, lo, hi),
        MutatorTag::GaussianRandom => gaussian_random(lo, hi),
        MutatorTag::Scaled => (hi - lo) * percentage + lo,
        MutatorTag::Minimum => lo,
        MutatorTag::Maximum => hi,
        _ => unreachable!("unsupported tag filtered by dispatch"),
    };
    GeneValue::Float(value)
}

fn crossover(parents: &[f64], lo: f64, hi: f64) -> f64 {
    match random::choose(parents) {
        Some(&v) => v,
        None => random_value(lo, hi),
    }
}

fn random_value(lo: f64, hi: f64) -> f64 {
    if lo >= hi {
        return lo;
    }
    random::range(lo..hi)
}

fn gaussian_step(parents: &[f64], lo: f64, hi: f64) -> f64 {
    let p = random::choose(parents).copied().unwrap_or((lo + hi) / 2.0);
    let std_dev = (hi - lo) / 4.0;
    random::gaussian(p, std_dev).clamp(lo, hi)
}

fn gaussian_random(lo: f64, hi: f64) -> f64 {
    let mid = (lo + hi) / 2.0;
    random::gaussian(mid, 3.0).clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamType;

    fn leaf(lo: f64, hi: f64) -> LeafSchema {
        LeafSchema {
            param_type: ParamType::Float,
            range: Some([lo, hi]),
            values: None,
            components: None,
            sum_range: None,
        }
    }

    #[test]
    fn random_stays_in_range() {
        let leaf = leaf(-1.5, 2.5);
        for _ in 0..1000 {
            let out = mutate(MutatorTag::Random, &leaf, &[], 0.0);
            let GeneValue::Float(v) = out else { panic!() };
            assert!(v >= -1.5 && v < 2.5);
        }
    }

    #[test]
    fn scaled_respects_endpoints() {
        let leaf = leaf(-10.0, 10.0);
        assert_eq!(mutate(MutatorTag::Scaled, &leaf, &[], 0.0), GeneValue::Float(-10.0));
        assert_eq!(mutate(MutatorTag::Scaled, &leaf, &[], 1.0), GeneValue::Float(10.0));
    }

    #[test]
    fn gaussian_random_is_clipped() {
        let leaf = leaf(-0.1, 0.1);
        for _ in 0..500 {
            let out = mutate(MutatorTag::GaussianRandom, &leaf, &[], 0.0);
            let GeneValue::Float(v) = out else { panic!() };
            assert!((-0.1..=0.1).contains(&v));
        }
    }
}
