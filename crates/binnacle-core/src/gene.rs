//! The sealed tagged union over gene types.
//!
//! The distillation source dispatches mutation by reflecting over method names on a
//! per-parameter-type class. Here that becomes a closed `GeneType` enum plus a
//! `GeneValue` tagged union, so dispatch is a `match` the compiler can check.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeneType {
    Int,
    Float,
    Bool,
    Enum,
    BinaryBlock,
}

/// A realized leaf value. `Enum` carries its selection as raw JSON so the schema's
/// `values` list can hold any serializable type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Enum(serde_json::Value),
    BinaryBlock(BTreeMap<String, u8>),
}

impl GeneValue {
    pub fn gene_type(&self) -> GeneType {
        match self {
            GeneValue::Int(_) => GeneType::Int,
            GeneValue::Float(_) => GeneType::Float,
            GeneValue::Bool(_) => GeneType::Bool,
            GeneValue::Enum(_) => GeneType::Enum,
            GeneValue::BinaryBlock(_) => GeneType::BinaryBlock,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            GeneValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            GeneValue::Float(v) => Some(*v),
            GeneValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GeneValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_binary_block(&self) -> Option<&BTreeMap<String, u8>> {
        match self {
            GeneValue::BinaryBlock(v) => Some(v),
            _ => None,
        }
    }

    pub fn popcount(&self) -> Option<u32> {
        self.as_binary_block()
            .map(|c| c.values().filter(|&&b| b != 0).count() as u32)
    }
}
