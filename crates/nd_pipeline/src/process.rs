//! The CPU-bound half of a search: everything between collection and
//! keyword extraction.

use nd_core::{Error, ParameterCandidate, RawArticle, Result};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::dedup::{deduplicate, Deduplicated};
use crate::normalize::normalize_record;
use crate::params::{search_parameters, select_parameters};
use crate::segment::CohesionModel;
use crate::vectorize::TfidfMatrix;

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub deduplicated: Deduplicated,
    pub selected: ParameterCandidate,
    pub candidates: Vec<ParameterCandidate>,
    /// Records dropped by normalization
    pub skipped: usize,
}

/// Normalize, segment, vectorize, search the DBSCAN grid and sample one
/// batch. Records with a malformed timestamp are logged and left out.
pub fn process_batch(raw: &[RawArticle], config: &PipelineConfig) -> Result<BatchOutcome> {
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped = 0;
    for item in raw {
        match normalize_record(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("⚠️ Dropping article {:?}: {}", item.title, e);
                skipped += 1;
            }
        }
    }
    if records.is_empty() {
        return Err(Error::Normalization(format!(
            "none of the {} collected articles could be normalized",
            raw.len()
        )));
    }

    let model = CohesionModel::train(
        &records.iter().map(|r| r.composite_text.as_str()).collect::<Vec<_>>(),
        &config.segmenter,
    );
    for record in records.iter_mut() {
        record.processed_text = model.tokenize(&record.composite_text);
    }
    info!("✂️ Segmented {} articles ({} scored substrings)", records.len(), model.len());

    let matrix = TfidfMatrix::fit_transform(
        &records.iter().map(|r| r.processed_text.as_str()).collect::<Vec<_>>(),
    );
    let distances = matrix.cosine_distances();
    info!("🔢 Built {}x{} TF-IDF matrix", matrix.len(), matrix.vocabulary().len());

    let candidates = search_parameters(&distances, &config.grid)?;
    let selected = select_parameters(&candidates);
    info!(
        "🔍 Scored {} of {} parameter combinations, using eps={} min_points={}",
        candidates.iter().filter(|c| c.quality_score.is_some()).count(),
        candidates.len(),
        selected.eps,
        selected.min_points
    );

    let deduplicated = deduplicate(records, &distances, &selected, config.seed)?;
    info!(
        "✨ Kept {} articles from {} clusters",
        deduplicated.articles.len(),
        deduplicated.cluster_count
    );

    Ok(BatchOutcome {
        deduplicated,
        selected,
        candidates,
        skipped,
    })
}
