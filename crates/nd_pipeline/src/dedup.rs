//! Re-clustering with the selected parameters and per-cluster sampling.

use std::collections::{BTreeMap, BTreeSet};

use nd_core::{ArticleRecord, ParameterCandidate, Result, NOISE};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::debug;

use crate::dbscan::dbscan;
use crate::vectorize::DistanceMatrix;

/// Representatives kept per cluster.
pub fn samples_per_cluster(cluster_count: usize) -> usize {
    if cluster_count >= 4 {
        1
    } else {
        2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated {
    pub articles: Vec<ArticleRecord>,
    pub cluster_count: usize,
}

/// Label `records` with the selected parameters and keep a random sample of
/// each non-noise cluster, grouped by ascending cluster id.
///
/// The sample size follows the cluster count of this re-clustering, which
/// also covers the `(0.2, 2)` fallback that was never scored. `seed` makes
/// the draw reproducible.
pub fn deduplicate(
    mut records: Vec<ArticleRecord>,
    distances: &DistanceMatrix,
    selected: &ParameterCandidate,
    seed: Option<u64>,
) -> Result<Deduplicated> {
    let clustering = dbscan(distances, selected.eps, selected.min_points)?;
    for (record, &label) in records.iter_mut().zip(&clustering.labels) {
        record.cluster_id = label;
    }

    let per_cluster = samples_per_cluster(clustering.cluster_count);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut groups: BTreeMap<i32, Vec<ArticleRecord>> = BTreeMap::new();
    for record in records {
        if record.cluster_id != NOISE {
            groups.entry(record.cluster_id).or_default().push(record);
        }
    }

    let mut articles = Vec::new();
    for (cluster_id, members) in groups {
        let amount = per_cluster.min(members.len());
        let picked: BTreeSet<usize> = index::sample(&mut rng, members.len(), amount).into_iter().collect();
        debug!("Cluster {} - {} members, keeping {}", cluster_id, members.len(), amount);
        articles.extend(
            members
                .into_iter()
                .enumerate()
                .filter(|(i, _)| picked.contains(i))
                .map(|(_, record)| record),
        );
    }

    Ok(Deduplicated {
        articles,
        cluster_count: clustering.cluster_count,
    })
}
