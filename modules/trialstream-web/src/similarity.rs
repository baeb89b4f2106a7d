use tracing::warn;

use trialstream_common::EmbeddedCriteria;

/// One stored row with its deserialized embedding vector.
#[derive(Debug, Clone)]
pub struct StoredEmbedding {
    pub nct_id: String,
    pub brief_title: String,
    pub vector: Vec<f32>,
}

/// Deserialize the JSON-array vectors loaded by the embedding stage. A row
/// whose vector fails to parse is dropped with a warning rather than taking
/// the server down.
pub fn parse_stored(rows: Vec<EmbeddedCriteria>) -> Vec<StoredEmbedding> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_str(&row.criteria_embeddings) {
            Ok(vector) => Some(StoredEmbedding {
                nct_id: row.nct_id,
                brief_title: row.brief_title,
                vector,
            }),
            Err(e) => {
                warn!(nct_id = %row.nct_id, error = %e, "skipping row with unparseable embedding");
                None
            }
        })
        .collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// The stored row most similar to the query vector. Strictly-greater
/// comparison, so ties go to the first-seen row in store order.
pub fn most_similar<'a>(query: &[f32], rows: &'a [StoredEmbedding]) -> Option<&'a StoredEmbedding> {
    let mut best: Option<(&StoredEmbedding, f32)> = None;
    for row in rows {
        let score = cosine_similarity(query, &row.vector);
        if best.map_or(true, |(_, current)| score > current) {
            best = Some((row, score));
        }
    }
    best.map(|(row, _)| row)
}
