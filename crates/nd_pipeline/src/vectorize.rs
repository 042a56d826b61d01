//! Sparse TF-IDF rows and cosine distances over the segmented batch.

use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn term_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid term pattern"))
}

fn terms(text: &str) -> Vec<String> {
    term_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// One L2-normalized document row: `(term index, weight)` sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            if a == b {
                sum += wa * wb;
                i += 1;
                j += 1;
            } else if a < b {
                i += 1;
            } else {
                j += 1;
            }
        }
        sum
    }
}

#[derive(Debug, Clone, Default)]
pub struct TfidfMatrix {
    vocabulary: BTreeMap<String, usize>,
    rows: Vec<SparseVector>,
}

impl TfidfMatrix {
    /// Fit the vocabulary and weights on `documents` and transform them.
    pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| terms(d.as_ref())).collect();

        let mut vocabulary = BTreeMap::new();
        for term in tokenized.iter().flatten() {
            vocabulary.entry(term.clone()).or_insert(0);
        }
        for (index, slot) in vocabulary.values_mut().enumerate() {
            *slot = index;
        }

        let mut document_frequency = vec![0usize; vocabulary.len()];
        let mut counts: Vec<BTreeMap<usize, usize>> = Vec::with_capacity(tokenized.len());
        for doc in &tokenized {
            let mut row: BTreeMap<usize, usize> = BTreeMap::new();
            for term in doc {
                *row.entry(vocabulary[term]).or_insert(0) += 1;
            }
            for &index in row.keys() {
                document_frequency[index] += 1;
            }
            counts.push(row);
        }

        let n = tokenized.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|row| {
                let mut entries: Vec<(usize, f64)> = row
                    .into_iter()
                    .map(|(index, count)| (index, count as f64 * idf[index]))
                    .collect();
                let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in entries.iter_mut() {
                        *w /= norm;
                    }
                }
                SparseVector { entries }
            })
            .collect();

        Self { vocabulary, rows }
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Dense `n x n` cosine distances. A zero row is at distance 1 from
    /// everything except itself.
    pub fn cosine_distances(&self) -> DistanceMatrix {
        let n = self.rows.len();
        let values: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            0.0
                        } else {
                            let similarity = self.rows[i].dot(&self.rows[j]);
                            (1.0 - similarity).clamp(0.0, 2.0)
                        }
                    })
                    .collect()
            })
            .collect();
        DistanceMatrix { values }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DistanceMatrix {
    values: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    #[cfg(test)]
    pub(crate) fn from_rows(values: Vec<Vec<f64>>) -> Self {
        Self { values }
    }
}
