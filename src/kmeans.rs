//! One-dimensional k-means seeded from the first `k` values. Labels are
//! centroid ranks: 0 is always the lowest-valued cluster.

use std::num::NonZeroUsize;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub max_iterations: usize,
    /// Largest per-centroid movement still treated as converged.
    pub tolerance: f64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterOutcome {
    /// Centroids stopped moving within tolerance.
    Converged,
    /// Iteration cap hit first; the last centroids are kept.
    MaxIterReached,
    /// Fewer points than clusters: every point is its own cluster.
    Singletons,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clustering {
    /// Ascending centroid values, indexed by rank.
    pub centroids: Vec<f64>,
    /// Rank of each input point's cluster, aligned with the input.
    pub labels: Vec<usize>,
    pub iterations: usize,
    pub outcome: ClusterOutcome,
}

impl Clustering {
    pub fn cluster_count(&self) -> usize {
        self.centroids.len()
    }

    /// Input indices assigned to `rank`, in input order.
    pub fn members(&self, rank: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == rank)
            .map(|(index, _)| index)
            .collect()
    }
}

pub fn fit(data: &[f64], k: NonZeroUsize, params: &KMeansParams) -> Clustering {
    let k = k.get();
    if data.len() < k {
        let labels: Vec<usize> = (0..data.len()).collect();
        return rank_clusters(data.to_vec(), labels, 0, ClusterOutcome::Singletons);
    }

    let mut centroids = data[..k].to_vec();
    let mut labels = vec![0usize; data.len()];
    let mut iterations = 0;
    let mut outcome = ClusterOutcome::MaxIterReached;

    while iterations < params.max_iterations {
        for (label, point) in labels.iter_mut().zip(data) {
            *label = nearest(&centroids, *point);
        }

        let updated = recompute(data, &labels, &centroids);
        iterations += 1;

        let moved = updated
            .iter()
            .zip(&centroids)
            .map(|(new, old)| (new - old).abs())
            .fold(0.0, f64::max);
        centroids = updated;

        if moved <= params.tolerance {
            outcome = ClusterOutcome::Converged;
            break;
        }
    }

    rank_clusters(centroids, labels, iterations, outcome)
}

/// Index of the closest centroid; ties go to the lowest index.
fn nearest(centroids: &[f64], point: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = (point - centroid).abs();
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}

fn recompute(data: &[f64], labels: &[usize], previous: &[f64]) -> Vec<f64> {
    let mut totals = vec![0.0; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (point, &label) in data.iter().zip(labels) {
        totals[label] += point;
        counts[label] += 1;
    }

    previous
        .iter()
        .enumerate()
        .map(|(index, &old)| {
            if counts[index] == 0 {
                old
            } else {
                totals[index] / counts[index] as f64
            }
        })
        .collect()
}

fn rank_clusters(
    centroids: Vec<f64>,
    labels: Vec<usize>,
    iterations: usize,
    outcome: ClusterOutcome,
) -> Clustering {
    let mut order: Vec<usize> = (0..centroids.len()).collect();
    order.sort_by(|a, b| {
        centroids[*a]
            .partial_cmp(&centroids[*b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rank_of = vec![0usize; centroids.len()];
    for (rank, &index) in order.iter().enumerate() {
        rank_of[index] = rank;
    }

    Clustering {
        centroids: order.iter().map(|&index| centroids[index]).collect(),
        labels: labels.into_iter().map(|label| rank_of[label]).collect(),
        iterations,
        outcome,
    }
}
