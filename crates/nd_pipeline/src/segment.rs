//! Corpus-local sub-word segmentation.
//!
//! [`CohesionModel::train`] counts every left substring of every whitespace
//! token in the batch and scores it by forward cohesion:
//!
//! ```text
//! cohesion(w) = (count(w) / count(w[0])) ^ (1 / (len(w) - 1))
//! ```
//!
//! [`CohesionModel::tokenize`] then splits each token into its best-scoring
//! left part and recursively segments the rest. A model is built per batch and
//! never shared between batches.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SegmenterConfig {
    /// Longest left substring counted, in characters
    pub max_left_length: usize,
    /// Substrings seen fewer times than this are not scored
    pub min_frequency: usize,
    /// Scores below this are discarded
    pub min_cohesion: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_left_length: 10,
            min_frequency: 5,
            min_cohesion: 0.05,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CohesionModel {
    scores: HashMap<String, f64>,
}

/// Byte offset just past the `n`-th character of `s`.
fn char_boundary(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

impl CohesionModel {
    pub fn train<S: AsRef<str>>(documents: &[S], config: &SegmenterConfig) -> Self {
        let mut left_counts: HashMap<&str, usize> = HashMap::new();
        for document in documents {
            for token in document.as_ref().split_whitespace() {
                let limit = token.chars().count().min(config.max_left_length);
                for e in 1..=limit {
                    *left_counts.entry(&token[..char_boundary(token, e)]).or_insert(0) += 1;
                }
            }
        }

        let mut scores = HashMap::new();
        for (&word, &count) in &left_counts {
            let len = word.chars().count();
            if len < 2 || count < config.min_frequency {
                continue;
            }
            let first = &word[..char_boundary(word, 1)];
            let Some(&first_count) = left_counts.get(first) else {
                continue;
            };
            let cohesion = (count as f64 / first_count as f64).powf(1.0 / (len - 1) as f64);
            if cohesion >= config.min_cohesion {
                scores.insert(word.to_string(), cohesion);
            }
        }

        Self { scores }
    }

    pub fn score(&self, word: &str) -> f64 {
        self.scores.get(word).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn split_token<'a>(&self, token: &'a str, out: &mut Vec<&'a str>) {
        let mut rest = token;
        while !rest.is_empty() {
            let n = rest.chars().count();
            if n <= 1 {
                out.push(rest);
                return;
            }
            // Highest score wins; ties go to the longer left part, so an
            // unscored token stays whole.
            let mut best = (0.0_f64, n);
            for e in 2..=n {
                let score = self.score(&rest[..char_boundary(rest, e)]);
                if score > best.0 || (score == best.0 && e > best.1) {
                    best = (score, e);
                }
            }
            let cut = char_boundary(rest, best.1);
            out.push(&rest[..cut]);
            rest = &rest[cut..];
        }
    }

    /// Segment `text` into space-joined sub-word units.
    pub fn tokenize(&self, text: &str) -> String {
        let mut pieces = Vec::new();
        for token in text.split_whitespace() {
            self.split_token(token, &mut pieces);
        }
        pieces.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min_frequency: usize) -> SegmenterConfig {
        SegmenterConfig {
            min_frequency,
            ..Default::default()
        }
    }

    #[test]
    fn test_cohesion_formula() {
        let docs = ["테슬라가 테슬라는 테슬라를 테스트"];
        let model = CohesionModel::train(&docs, &config(1));
        // "테" appears 4 times, "테슬" 3 times
        assert!((model.score("테슬") - 0.75).abs() < 1e-9);
        // "테슬라" 3 times over 2 steps: (3/4)^(1/2)
        assert!((model.score("테슬라") - 0.75_f64.sqrt()).abs() < 1e-9);
        assert_eq!(model.score("테"), 0.0);
    }

    #[test]
    fn test_min_frequency_prunes_rare_substrings() {
        let docs = ["테슬라가 테슬라는 전기차"];
        let model = CohesionModel::train(&docs, &config(2));
        assert!(model.score("테슬라") > 0.0);
        assert_eq!(model.score("전기차"), 0.0);
    }

    #[test]
    fn test_tokenize_splits_particles() {
        let docs = [
            "테슬라가 신차를 공개",
            "테슬라는 신차를 발표",
            "테슬라의 신차가 인기",
        ];
        let model = CohesionModel::train(&docs, &config(2));
        assert_eq!(model.tokenize("테슬라가 신차를 공개"), "테슬라 가 신차 를 공개");
    }

    #[test]
    fn test_unknown_tokens_stay_whole() {
        let model = CohesionModel::default();
        assert_eq!(model.tokenize("  로보택시   공개 a "), "로보택시 공개 a");
        assert_eq!(model.tokenize(""), "");
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let docs = ["전기차 보조금 축소", "전기차 보조금 확대", "전기차 충전소 확대"];
        let first = CohesionModel::train(&docs, &config(2));
        let second = CohesionModel::train(&docs, &config(2));
        for doc in docs {
            assert_eq!(first.tokenize(doc), second.tokenize(doc));
        }
    }

    #[test]
    fn test_max_left_length_caps_counted_prefixes() {
        let docs = ["abcdefghijkl abcdefghijkl"];
        let model = CohesionModel::train(&docs, &SegmenterConfig { max_left_length: 4, min_frequency: 1, min_cohesion: 0.0 });
        assert!(model.score("abcd") > 0.0);
        assert_eq!(model.score("abcde"), 0.0);
    }
}
