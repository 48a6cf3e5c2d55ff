//! Parent selection from the archive frontier and candidate-individual creation.

use binnacle_error::BinnacleResult;

use crate::archive::Archive;
use crate::individual::{Individual, Lineage};
use crate::mutate::MutatorWeights;
use crate::random;
use crate::schema::GeneSchema;
use crate::tree::{GeneTree, MutatorParams};

/// Two bin keys drawn with replacement, one individual per bin (also with
/// replacement across bins); `[]` when the archive has no non-empty bins yet.
pub fn sample_parents(archive: &Archive) -> Vec<Individual> {
    let bins = archive.non_empty_bins();
    if bins.is_empty() {
        return Vec::new();
    }
    (0..2)
        .filter_map(|_| {
            let path = random::choose(&bins)?;
            random::choose(archive.bin(path)).cloned()
        })
        .collect()
}

pub fn create_individual(
    schema: &GeneSchema,
    archive: &Archive,
    weights: &MutatorWeights,
) -> BinnacleResult<Individual> {
    let parents = sample_parents(archive);
    let parent_genetics: Vec<serde_json::Value> =
        parents.iter().map(|p| p.genetics.clone()).collect();
    let mutator_tag = weights.draw_global();

    let mut tree = GeneTree::build(schema, &parent_genetics, mutator_tag, MutatorParams::default())?;
    let genome = tree.mutate(weights)?;

    let lineage = Lineage {
        mutator: mutator_tag,
        parent1_uuid: parents.first().map(|p| p.uuid),
        parent2_uuid: parents.get(1).map(|p| p.uuid),
        generation_num: 0,
    };
    Ok(Individual::new(genome, lineage))
}
