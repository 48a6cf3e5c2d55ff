use crate::gene::GeneValue;
use crate::random;
use crate::schema::LeafSchema;

use super::MutatorTag;

fn values(leaf: &LeafSchema) -> &[serde_json::Value] {
    leaf.values.as_deref().expect("enum leaf always has values")
}

pub fn mutate(tag: MutatorTag, leaf: &LeafSchema, parents: &[GeneValue], _percentage: f64) -> GeneValue {
    let values = values(leaf);
    let parent_values: Vec<serde_json::Value> = parents
        .iter()
        .filter_map(|g| match g {
            GeneValue::Enum(v) => Some(v.clone()),
            _ => None,
        })
        .collect();

    let value = match tag {
        MutatorTag::Crossover => random::choose(&parent_values)
            .cloned()
            .unwrap_or_else(|| random_value(values)),
        MutatorTag::Random | MutatorTag::GaussianStep | MutatorTag::GaussianRandom | MutatorTag::Scaled => {
            random_value(values)
        }
        MutatorTag::Minimum => values.first().cloned().expect("validated non-empty"),
        MutatorTag::Maximum => values.last().cloned().expect("validated non-empty"),
        _ => unreachable!("unsupported tag filtered by dispatch"),
    };
    GeneValue::Enum(value)
}

fn random_value(values: &[serde_json::Value]) -> serde_json::Value {
    random::choose(values).cloned().expect("validated non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamType;
    use serde_json::json;

    fn leaf() -> LeafSchema {
        LeafSchema {
            param_type: ParamType::Enum,
            range: None,
            values: Some(vec![json!("fast"), json!("balanced"), json!("accurate")]),
            components: None,
            sum_range: None,
        }
    }

    #[test]
    fn random_draws_from_values() {
        for _ in 0..100 {
            let out = mutate(MutatorTag::Random, &leaf(), &[], 0.0);
            let GeneValue::Enum(v) = out else { panic!() };
            assert!(["fast", "balanced", "accurate"].contains(&v.as_str().unwrap()));
        }
    }

    #[test]
    fn minimum_maximum_are_first_and_last() {
        assert_eq!(
            mutate(MutatorTag::Minimum, &leaf(), &[], 0.0),
            GeneValue::Enum(json!("fast"))
        );
        assert_eq!(
            mutate(MutatorTag::Maximum, &leaf(), &[], 0.0),
            GeneValue::Enum(json!("accurate"))
        );
    }
}
