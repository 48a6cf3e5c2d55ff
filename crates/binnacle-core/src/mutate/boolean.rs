use crate::gene::GeneValue;
use crate::random;
use crate::schema::LeafSchema;

use super::MutatorTag;

pub fn mutate(tag: MutatorTag, _leaf: &LeafSchema, parents: &[GeneValue], percentage: f64) -> GeneValue {
    let parent_bools: Vec<bool> = parents.iter().filter_map(GeneValue::as_bool).collect();

    let value = match tag {
        MutatorTag::Crossover => random::choose(&parent_bools).copied().unwrap_or_else(|| random::bool(0.5)),
        MutatorTag::Random | MutatorTag::GaussianStep | MutatorTag::GaussianRandom => random::bool(0.5),
        MutatorTag::Scaled => random::bool(percentage),
        MutatorTag::Minimum => false,
        MutatorTag::Maximum => true,
        _ => unreachable!("unsupported tag filtered by dispatch"),
    };
    GeneValue::Bool(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamType;

    fn leaf() -> LeafSchema {
        LeafSchema {
            param_type: ParamType::Bool,
            range: None,
            values: None,
            components: None,
            sum_range: None,
        }
    }

    #[test]
    fn crossover_picks_a_parent() {
        let parents = [GeneValue::Bool(true)];
        let out = mutate(MutatorTag::Crossover, &leaf(), &parents, 0.0);
        assert_eq!(out, GeneValue::Bool(true));
    }

    #[test]
    fn minimum_maximum_are_fixed() {
        assert_eq!(mutate(MutatorTag::Minimum, &leaf(), &[], 0.0), GeneValue::Bool(false));
        assert_eq!(mutate(MutatorTag::Maximum, &leaf(), &[], 0.0), GeneValue::Bool(true));
    }

    #[test]
    fn scaled_is_always_true_at_probability_one() {
        for _ in 0..50 {
            assert_eq!(mutate(MutatorTag::Scaled, &leaf(), &[], 1.0), GeneValue::Bool(true));
        }
    }
}
