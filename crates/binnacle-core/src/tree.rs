//! Arena-backed gene tree: a flat `Vec` of nodes with index-based parent/child
//! links, mirroring the schema's shape for exactly one mutation pass.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use binnacle_error::{BinnacleError, BinnacleResult};

use crate::gene::{GeneType, GeneValue};
use crate::mutate::{self, MutatorTag, MutatorWeights};
use crate::random;
use crate::schema::{canonical_key, GeneSchema, LeafSchema, SchemaNode};

static NODE_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u64, usize);

pub struct Arena<T> {
    members: Vec<T>,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Arena { members: Vec::new() }
    }

    fn add(&mut self, value: T) -> NodeId {
        let id = NodeId(NODE_COUNTER.fetch_add(1, Ordering::Relaxed), self.members.len());
        self.members.push(value);
        id
    }

    fn get(&self, id: NodeId) -> &T {
        &self.members[id.1]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.members[id.1]
    }
}

enum NodeBody {
    Leaf {
        schema: LeafSchema,
        values: Vec<GeneValue>,
        allow_mutations: bool,
    },
    Group(Vec<(String, NodeId)>),
    Static(serde_json::Value),
}

struct Node {
    key: String,
    body: NodeBody,
}

/// Per-mutation-pass parameters that ride along with a [`MutatorTag`], mirroring
/// the source's `mutator_params` dict. `percentage` drives the `scaled` operator;
/// it defaults to `1.0`, matching the source leaving it unset for ordinary
/// candidate generation (`scaled` then interpolates to its range maximum).
#[derive(Clone, Copy, Debug)]
pub struct MutatorParams {
    pub percentage: f64,
}

impl Default for MutatorParams {
    fn default() -> Self {
        MutatorParams { percentage: 1.0 }
    }
}

/// A tree mirroring a [`GeneSchema`], carrying each parent's contribution at every
/// leaf, ready for exactly one [`GeneTree::mutate`] pass.
pub struct GeneTree {
    arena: Arena<Node>,
    root: NodeId,
    mutator_tag: MutatorTag,
    mutator_params: MutatorParams,
}

impl GeneTree {
    /// Build the tree structure, ingest `parents`' values at matching leaves, and
    /// record the tree-wide `mutator_tag`/`mutator_params` that govern mutation.
    pub fn build(
        schema: &GeneSchema,
        parents: &[serde_json::Value],
        mutator_tag: MutatorTag,
        mutator_params: MutatorParams,
    ) -> BinnacleResult<GeneTree> {
        let mut arena = Arena::new();
        let root = build_node(&schema.root, "root", &mut arena)?;
        let mut tree = GeneTree {
            arena,
            root,
            mutator_tag,
            mutator_params,
        };
        for parent in parents {
            tree.ingest(tree.root, parent);
        }
        Ok(tree)
    }

    fn ingest(&mut self, node_id: NodeId, parent_value: &serde_json::Value) {
        let children = match &self.arena.get(node_id).body {
            NodeBody::Static(_) => return,
            NodeBody::Leaf { .. } => {
                if let NodeBody::Leaf { schema, values, .. } = &mut self.arena.get_mut(node_id).body
                {
                    if let Some(v) = parse_value(schema, parent_value) {
                        values.push(v);
                    }
                }
                return;
            }
            NodeBody::Group(children) => children.clone(),
        };
        let serde_json::Value::Object(map) = parent_value else {
            return;
        };
        for (schema_key, child_id) in children {
            for (parent_key, parent_child) in map {
                if canonical_key(parent_key) == schema_key {
                    self.ingest(child_id, parent_child);
                }
            }
        }
    }

    /// Apply the partial-mutation policy, then produce one mutated genome.
    /// Returns `Err` if a non-static leaf received no parent values at all (the
    /// "null leaf" edge case callers must treat as fatal).
    pub fn mutate(&mut self, weights: &MutatorWeights) -> BinnacleResult<serde_json::Value> {
        self.apply_partial_policy();
        self.mutate_node(self.root, weights)
    }

    fn eligible_leaves(&self) -> Vec<NodeId> {
        self.arena
            .members
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| match &node.body {
                NodeBody::Leaf { values, .. } if !values.is_empty() => {
                    Some(NodeId(0, idx))
                }
                _ => None,
            })
            .collect()
    }

    fn apply_partial_policy(&mut self) {
        if !self.mutator_tag.is_tree_policy() {
            return;
        }
        let eligible = self.eligible_leaves();
        let l = eligible.len();
        if l == 0 {
            return;
        }
        let disable_count = match self.mutator_tag {
            MutatorTag::Partial => random::range_inclusive(1usize, l),
            MutatorTag::Min => l.saturating_sub(1),
            _ => 0,
        };
        let disabled_indices = random::sample_indices(l, disable_count);
        for idx in disabled_indices {
            let node_id = eligible[idx];
            if let NodeBody::Leaf { allow_mutations, .. } = &mut self.arena.get_mut(node_id).body {
                *allow_mutations = false;
            }
        }
    }

    fn mutate_node(
        &mut self,
        node_id: NodeId,
        weights: &MutatorWeights,
    ) -> BinnacleResult<serde_json::Value> {
        let children = match &self.arena.get(node_id).body {
            NodeBody::Static(v) => return Ok(v.clone()),
            NodeBody::Leaf { .. } => return self.mutate_leaf(node_id, weights),
            NodeBody::Group(children) => children.clone(),
        };
        let mut out = serde_json::Map::new();
        for (key, child_id) in children {
            out.insert(key, self.mutate_node(child_id, weights)?);
        }
        Ok(serde_json::Value::Object(out))
    }

    fn mutate_leaf(
        &mut self,
        node_id: NodeId,
        weights: &MutatorWeights,
    ) -> BinnacleResult<serde_json::Value> {
        let key = self.arena.get(node_id).key.clone();
        let NodeBody::Leaf {
            schema,
            values,
            allow_mutations,
        } = &self.arena.get(node_id).body
        else {
            unreachable!("caller only invokes this on leaf nodes");
        };

        // Disabled leaves copy values[0] verbatim; if a leaf was never ingested at
        // all (no parent offered a value) there is nothing to copy, and nothing a
        // parent-less operator run would even mean, so this is a fatal schema gap.
        if !*allow_mutations && values.is_empty() {
            return Err(BinnacleError::InvalidSchema {
                message: format!("leaf '{key}' has no parent values and is not static").into(),
            });
        }

        let output = if *allow_mutations {
            let gene_type = schema.param_type.gene_type();
            let tag = if self.mutator_tag.is_tree_policy() {
                weights.draw_for_type(gene_type)
            } else {
                self.mutator_tag
            };
            mutate::dispatch(tag, schema, values, self.mutator_params.percentage, values.first())
        } else {
            values[0].clone()
        };

        Ok(gene_value_to_json(&output))
    }
}

fn build_node(node: &SchemaNode, key: &str, arena: &mut Arena<Node>) -> BinnacleResult<NodeId> {
    match node {
        SchemaNode::Leaf(schema) => Ok(arena.add(Node {
            key: key.to_string(),
            body: NodeBody::Leaf {
                schema: schema.clone(),
                values: Vec::new(),
                allow_mutations: true,
            },
        })),
        SchemaNode::Static(value) => Ok(arena.add(Node {
            key: key.to_string(),
            body: NodeBody::Static(value.clone()),
        })),
        SchemaNode::Group(map) => {
            let mut children = Vec::with_capacity(map.len());
            for (child_key, child_node) in map {
                let child_id = build_node(child_node, child_key, arena)?;
                children.push((child_key.clone(), child_id));
            }
            Ok(arena.add(Node {
                key: key.to_string(),
                body: NodeBody::Group(children),
            }))
        }
    }
}

fn parse_value(schema: &LeafSchema, value: &serde_json::Value) -> Option<GeneValue> {
    use crate::schema::ParamType;
    match schema.param_type {
        ParamType::Int => value.as_i64().map(GeneValue::Int),
        ParamType::Float => value.as_f64().map(GeneValue::Float),
        ParamType::Bool => value.as_bool().map(GeneValue::Bool),
        ParamType::Enum => Some(GeneValue::Enum(value.clone())),
        ParamType::BinaryBlock => {
            let serde_json::Value::Object(map) = value else {
                return None;
            };
            let mut block = BTreeMap::new();
            for (k, v) in map {
                block.insert(k.clone(), v.as_u64().unwrap_or(0) as u8);
            }
            Some(GeneValue::BinaryBlock(block))
        }
    }
}

fn gene_value_to_json(value: &GeneValue) -> serde_json::Value {
    match value {
        GeneValue::Int(v) => serde_json::json!(v),
        GeneValue::Float(v) => serde_json::json!(v),
        GeneValue::Bool(v) => serde_json::json!(v),
        GeneValue::Enum(v) => v.clone(),
        GeneValue::BinaryBlock(map) => serde_json::to_value(map).expect("map of primitives"),
    }
}
