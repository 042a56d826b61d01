//! Density clustering over a precomputed distance matrix and the silhouette
//! score used to rank parameter choices.

use crate::vectorize::DistanceMatrix;
use linfa::traits::Transformer;
use linfa::ParamGuard;
use linfa_clustering::Dbscan;
use linfa_nn::distance::Distance;
use linfa_nn::CommonNearestNeighbour;
use nd_core::{Error, Result, NOISE};
use ndarray::{Array2, ArrayView, Dimension};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub labels: Vec<i32>,
    pub cluster_count: usize,
}

impl Clustering {
    pub fn non_noise(&self) -> usize {
        self.labels.iter().filter(|&&l| l != NOISE).count()
    }
}

/// Cosine distance read from a precomputed matrix. Each observation handed
/// to linfa is a one-element row holding the point's index.
#[derive(Debug, Clone, Copy)]
struct CosineDistance<'a> {
    matrix: &'a DistanceMatrix,
}

impl CosineDistance<'_> {
    fn index<D: Dimension>(point: &ArrayView<f64, D>) -> usize {
        point.iter().next().map_or(0, |&i| i as usize)
    }
}

impl Distance<f64> for CosineDistance<'_> {
    fn distance<D: Dimension>(&self, a: ArrayView<f64, D>, b: ArrayView<f64, D>) -> f64 {
        self.matrix.get(Self::index(&a), Self::index(&b))
    }
}

/// The smallest tolerance that still admits a neighbour at exactly `eps`.
fn inclusive(eps: f64) -> f64 {
    if eps.is_finite() && eps >= 0.0 {
        f64::from_bits(eps.to_bits() + 1)
    } else {
        eps
    }
}

/// Label every point with a cluster id (`0..cluster_count`) or [`NOISE`].
///
/// A point is a core point when at least `min_points` points, itself
/// included, lie within `eps` (inclusive). Clusters are grown from core
/// points in index order, so ids are stable for a given matrix. linfa
/// rejects `min_points < 2` and a non-positive `eps` as
/// [`Error::Clustering`].
pub fn dbscan(distances: &DistanceMatrix, eps: f64, min_points: usize) -> Result<Clustering> {
    let n = distances.len();
    if n == 0 {
        return Ok(Clustering { labels: Vec::new(), cluster_count: 0 });
    }

    let params = Dbscan::params_with(
        min_points,
        CosineDistance { matrix: distances },
        CommonNearestNeighbour::LinearSearch,
    )
    .tolerance(inclusive(eps))
    .check()
    .map_err(|e| Error::Clustering(format!("eps={} min_points={}: {}", eps, min_points, e)))?;

    let observations = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
    let memberships = params.transform(&observations);

    let cluster_count = memberships.iter().flatten().max().map_or(0, |&id| id + 1);
    Ok(Clustering {
        labels: memberships.iter().map(|m| m.map_or(NOISE, |id| id as i32)).collect(),
        cluster_count,
    })
}

/// Mean silhouette coefficient over the non-noise points.
///
/// `None` unless there are at least two clusters and at least one cluster
/// with more than one member. Members of singleton clusters contribute 0.
pub fn silhouette_score(distances: &DistanceMatrix, labels: &[i32]) -> Option<f64> {
    let points: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] != NOISE).collect();

    let mut members: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for &i in &points {
        members.entry(labels[i]).or_default().push(i);
    }
    if members.len() < 2 || members.len() >= points.len() {
        return None;
    }

    let mean_distance = |i: usize, cluster: &[usize]| -> f64 {
        let total: f64 = cluster.iter().filter(|&&j| j != i).map(|&j| distances.get(i, j)).sum();
        let count = cluster.iter().filter(|&&j| j != i).count();
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    };

    let mut sum = 0.0;
    for &i in &points {
        let own = &members[&labels[i]];
        if own.len() == 1 {
            continue;
        }
        let a = mean_distance(i, own);
        let b = members
            .iter()
            .filter(|(&label, _)| label != labels[i])
            .map(|(_, cluster)| mean_distance(i, cluster))
            .fold(f64::INFINITY, f64::min);
        let denominator = a.max(b);
        if denominator > 0.0 {
            sum += (b - a) / denominator;
        }
    }

    Some(sum / points.len() as f64)
}
