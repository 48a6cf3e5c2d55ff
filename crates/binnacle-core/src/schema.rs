//! Declarative description of a genome: a nested mapping from string keys to either
//! sub-schemas or typed leaf parameter definitions.

use binnacle_error::{BinnacleError, BinnacleResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gene::GeneType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Int,
    Float,
    Bool,
    Enum,
    BinaryBlock,
}

impl ParamType {
    pub fn gene_type(self) -> GeneType {
        match self {
            ParamType::Int => GeneType::Int,
            ParamType::Float => GeneType::Float,
            ParamType::Bool => GeneType::Bool,
            ParamType::Enum => GeneType::Enum,
            ParamType::BinaryBlock => GeneType::BinaryBlock,
        }
    }
}

/// A single tunable leaf of the genome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeafSchema {
    pub param_type: ParamType,
    #[serde(default)]
    pub range: Option<[f64; 2]>,
    #[serde(default)]
    pub values: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub components: Option<BTreeMap<String, u8>>,
    #[serde(default)]
    pub sum_range: Option<[u32; 2]>,
}

impl LeafSchema {
    pub fn validate(&self, key: &str) -> BinnacleResult<()> {
        match self.param_type {
            ParamType::Int | ParamType::Float => {
                let [lo, hi] = self.range.ok_or_else(|| BinnacleError::InvalidSchema {
                    message: format!("leaf '{key}' of type {:?} is missing `range`", self.param_type)
                        .into(),
                })?;
                if lo > hi {
                    return Err(BinnacleError::InvalidSchema {
                        message: format!("leaf '{key}' has range [{lo}, {hi}] with lo > hi").into(),
                    });
                }
            }
            ParamType::Enum => {
                let values = self.values.as_ref().ok_or_else(|| BinnacleError::InvalidSchema {
                    message: format!("leaf '{key}' of type enum is missing `values`").into(),
                })?;
                if values.is_empty() {
                    return Err(BinnacleError::InvalidSchema {
                        message: format!("leaf '{key}' has an empty `values` list").into(),
                    });
                }
            }
            ParamType::Bool => {}
            ParamType::BinaryBlock => {
                let components =
                    self.components.as_ref().ok_or_else(|| BinnacleError::InvalidSchema {
                        message: format!("leaf '{key}' of type binary_block is missing `components`")
                            .into(),
                    })?;
                let [lo, hi] = self.sum_range.ok_or_else(|| BinnacleError::InvalidSchema {
                    message: format!("leaf '{key}' of type binary_block is missing `sum_range`")
                        .into(),
                })?;
                if lo > hi {
                    return Err(BinnacleError::InvalidSchema {
                        message: format!("leaf '{key}' has sum_range [{lo}, {hi}] with lo > hi")
                            .into(),
                    });
                }
                if (components.len() as u32) < hi {
                    return Err(BinnacleError::InvalidSchema {
                        message: format!(
                            "leaf '{key}' declares {} components but sum_range allows up to {hi} ones",
                            components.len()
                        )
                        .into(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// One node of the nested schema tree.
#[derive(Clone, Debug)]
pub enum SchemaNode {
    Leaf(LeafSchema),
    Group(BTreeMap<String, SchemaNode>),
    /// A literal, non-mutating scalar carried through unchanged (e.g. a fixed flag).
    Static(serde_json::Value),
}

impl SchemaNode {
    fn from_yaml(value: &serde_yaml::Value, key: &str) -> BinnacleResult<SchemaNode> {
        let serde_yaml::Value::Mapping(map) = value else {
            let json = serde_yaml_to_json(value)?;
            return Ok(SchemaNode::Static(json));
        };

        if map.contains_key(serde_yaml::Value::String("param_type".to_string())) {
            let json = serde_yaml_to_json(value)?;
            let leaf: LeafSchema = serde_json::from_value(json)
                .map_err(|e| BinnacleError::InvalidSchema {
                    message: format!("leaf '{key}' failed to parse: {e}").into(),
                })?;
            leaf.validate(key)?;
            return Ok(SchemaNode::Leaf(leaf));
        }

        let mut children = BTreeMap::new();
        for (k, v) in map {
            let serde_yaml::Value::String(child_key) = k else {
                return Err(BinnacleError::InvalidSchema {
                    message: "schema mapping keys must be strings".into(),
                });
            };
            children.insert(child_key.clone(), SchemaNode::from_yaml(v, child_key)?);
        }
        Ok(SchemaNode::Group(children))
    }
}

fn serde_yaml_to_json(value: &serde_yaml::Value) -> BinnacleResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| BinnacleError::Serde {
        message: format!("could not normalize schema value: {e}").into(),
    })
}

/// Strip a `_methodnum_<n>` suffix so alternative instantiations resolve to the same
/// schema entry.
pub fn canonical_key(key: &str) -> &str {
    match key.find("_methodnum_") {
        Some(idx) => &key[..idx],
        None => key,
    }
}

#[derive(Clone, Debug)]
pub struct GeneSchema {
    pub root: SchemaNode,
}

impl GeneSchema {
    pub fn from_yaml_str(text: &str) -> BinnacleResult<GeneSchema> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        let root = SchemaNode::from_yaml(&value, "root")?;
        Ok(GeneSchema { root })
    }

    pub fn from_file(path: &std::path::Path) -> BinnacleResult<GeneSchema> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
        learning_rate:
          param_type: float
          range: [0.001, 1.0]
        retries:
          param_type: int
          range: [1, 10]
        mode:
          param_type: enum
          values: ["fast", "accurate"]
        flags:
          param_type: binary_block
          components: { a: 0, b: 0, c: 0, d: 0 }
          sum_range: [1, 2]
        nested:
          enabled:
            param_type: bool
        label: "fixed-value"
    "#;

    #[test]
    fn parses_mixed_schema() {
        let schema = GeneSchema::from_yaml_str(SCHEMA).unwrap();
        let SchemaNode::Group(root) = &schema.root else {
            panic!("expected group root");
        };
        assert!(matches!(root.get("learning_rate"), Some(SchemaNode::Leaf(_))));
        assert!(matches!(root.get("label"), Some(SchemaNode::Static(_))));
        assert!(matches!(root.get("nested"), Some(SchemaNode::Group(_))));
    }

    #[test]
    fn rejects_binary_block_with_too_few_components() {
        let bad = r#"
            flags:
              param_type: binary_block
              components: { a: 0 }
              sum_range: [1, 2]
        "#;
        let err = GeneSchema::from_yaml_str(bad).unwrap_err();
        assert_eq!(err.code(), binnacle_error::ErrorCode::InvalidSchema);
    }

    #[test]
    fn canonical_key_strips_methodnum_suffix() {
        assert_eq!(canonical_key("solver_methodnum_2"), "solver");
        assert_eq!(canonical_key("solver"), "solver");
    }
}
