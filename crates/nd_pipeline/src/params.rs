//! DBSCAN parameter grid search and selection.

use crate::dbscan::{dbscan, silhouette_score};
use crate::vectorize::DistanceMatrix;
use nd_core::{ParameterCandidate, Result};
use rayon::prelude::*;
use tracing::debug;

pub const FALLBACK_EPS: f64 = 0.2;
pub const FALLBACK_MIN_POINTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    pub eps: Vec<f64>,
    pub min_points: Vec<usize>,
}

impl Default for ParameterGrid {
    /// `eps` 0.2 to 0.9 in steps of 0.1, `min_points` 2 to 10.
    fn default() -> Self {
        Self {
            eps: (2..=9).map(|step| step as f64 / 10.0).collect(),
            min_points: (2..=10).collect(),
        }
    }
}

impl ParameterGrid {
    /// Combinations in eps-major order.
    pub fn combinations(&self) -> Vec<(f64, usize)> {
        self.eps
            .iter()
            .flat_map(|&eps| self.min_points.iter().map(move |&m| (eps, m)))
            .collect()
    }
}

/// Cluster with every combination in the grid and score each result.
///
/// Runs on the rayon pool; the output keeps enumeration order. Fails if any
/// grid point is rejected by the clusterer.
pub fn search_parameters(distances: &DistanceMatrix, grid: &ParameterGrid) -> Result<Vec<ParameterCandidate>> {
    grid.combinations()
        .into_par_iter()
        .map(|(eps, min_points)| {
            let clustering = dbscan(distances, eps, min_points)?;
            let quality_score = if clustering.cluster_count > 1 && clustering.non_noise() > 1 {
                silhouette_score(distances, &clustering.labels)
            } else {
                None
            };
            Ok(ParameterCandidate {
                eps,
                min_points,
                cluster_count: clustering.cluster_count,
                quality_score,
            })
        })
        .collect()
}

/// The runner-up among scored candidates, or `(0.2, 2)` when fewer than two
/// were scored.
///
/// The fallback candidate carries no cluster count; the caller re-clusters
/// with it anyway.
pub fn select_parameters(candidates: &[ParameterCandidate]) -> ParameterCandidate {
    let mut scored: Vec<(&ParameterCandidate, f64)> = candidates
        .iter()
        .filter_map(|c| c.quality_score.map(|score| (c, score)))
        .collect();
    // stable: equal scores keep grid order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    match scored.get(1) {
        Some((candidate, score)) => {
            debug!(
                "Selected eps={} min_points={} ({} clusters, silhouette {:.4})",
                candidate.eps, candidate.min_points, candidate.cluster_count, score
            );
            **candidate
        }
        None => {
            debug!("Fewer than two scored candidates, falling back to eps={} min_points={}", FALLBACK_EPS, FALLBACK_MIN_POINTS);
            ParameterCandidate {
                eps: FALLBACK_EPS,
                min_points: FALLBACK_MIN_POINTS,
                cluster_count: 0,
                quality_score: None,
            }
        }
    }
}
