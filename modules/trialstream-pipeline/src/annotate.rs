use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use ai_client::{ChatAgent, OpenAi};
use trialstream_common::{AnnotatedRow, FlatRow};

/// Entity group emitted by the token-classification model for diseases.
const DISEASE_GROUP: &str = "DISEASE_DISORDER";
/// Entity group emitted by the token-classification model for medications.
const MEDICATION_GROUP: &str = "MEDICATION";

/// The annotator contract: always exactly these two keys, each a single
/// string (possibly empty), never a list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractedEntities {
    #[serde(default)]
    pub diseases: String,
    #[serde(default)]
    pub medications: String,
}

/// One span from a token-classification model.
#[derive(Debug, Clone, Deserialize)]
pub struct EntitySpan {
    pub entity_group: String,
    pub score: f32,
    pub word: String,
}

/// Keep only the single highest-confidence span per target type. Ties go to
/// the first-seen span because the comparison is strictly greater.
pub fn best_spans(spans: &[EntitySpan]) -> ExtractedEntities {
    let mut best_disease: Option<&EntitySpan> = None;
    let mut best_medication: Option<&EntitySpan> = None;

    for span in spans {
        let slot = match span.entity_group.as_str() {
            DISEASE_GROUP => &mut best_disease,
            MEDICATION_GROUP => &mut best_medication,
            _ => continue,
        };
        if slot.map_or(true, |current| span.score > current.score) {
            *slot = Some(span);
        }
    }

    ExtractedEntities {
        diseases: best_disease.map(|s| s.word.clone()).unwrap_or_default(),
        medications: best_medication.map(|s| s.word.clone()).unwrap_or_default(),
    }
}

/// Strategy seam: local span-classification model or hosted LLM, chosen at
/// construction time by the caller.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ExtractedEntities>;
}

// --- Local token-classification strategy ---

pub struct NerExtractor {
    http: reqwest::Client,
    endpoint: String,
}

impl NerExtractor {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl EntityExtractor for NerExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedEntities> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("NER inference failed ({status}): {body}"));
        }

        let spans: Vec<EntitySpan> = response.json().await?;
        Ok(best_spans(&spans))
    }
}

// --- Hosted LLM strategy ---

const EXTRACTION_SYSTEM_PROMPT: &str = "You extract medical entities from clinical-trial \
eligibility criteria. Find the single highest-confidence disease/disorder and the single \
highest-confidence medication in the text. Reply with exactly one line: a JSON object of the \
form {\"diseases\": \"\", \"medications\": \"\"}. Use an empty string when no entity of that \
type is present. No markdown, no explanations.";

pub struct LlmExtractor<C: ChatAgent = OpenAi> {
    agent: C,
}

impl LlmExtractor<OpenAi> {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            agent: OpenAi::new(api_key, model),
        }
    }
}

impl<C: ChatAgent> LlmExtractor<C> {
    pub fn with_agent(agent: C) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl<C: ChatAgent> EntityExtractor for LlmExtractor<C> {
    async fn extract(&self, text: &str) -> Result<ExtractedEntities> {
        let user_prompt = format!("Text: {text}");
        let response = self
            .agent
            .chat_completion(EXTRACTION_SYSTEM_PROMPT, &user_prompt)
            .await?;
        parse_first_line(&response)
    }
}

/// Parse the two-key object from the first line of a model reply. A reply
/// that does not start with such an object is a typed error — the caller
/// decides whether empty defaults are acceptable.
pub fn parse_first_line(response: &str) -> Result<ExtractedEntities> {
    let first_line = response
        .lines()
        .next()
        .ok_or_else(|| anyhow!("empty model response"))?
        .trim();

    serde_json::from_str(first_line)
        .map_err(|e| anyhow!("unparseable entity response {first_line:?}: {e}"))
}

/// Annotate the filtered rows with extracted entities. Pure with respect to
/// its input: produces a new sequence instead of mutating rows in place. An
/// extraction failure is logged and that row gets empty strings; the batch
/// never aborts.
pub async fn annotate_rows(
    extractor: &dyn EntityExtractor,
    rows: Vec<FlatRow>,
) -> Vec<AnnotatedRow> {
    let mut annotated = Vec::with_capacity(rows.len());

    for row in rows {
        let entities = match extractor.extract(&row.eligibility_criteria).await {
            Ok(entities) => entities,
            Err(e) => {
                warn!(nct_id = %row.nct_id, error = %e, "entity extraction failed, using empty defaults");
                ExtractedEntities::default()
            }
        };
        annotated.push(AnnotatedRow {
            row,
            diseases: entities.diseases,
            medications: entities.medications,
        });
    }

    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use trialstream_common::Study;

    fn span(group: &str, score: f32, word: &str) -> EntitySpan {
        EntitySpan {
            entity_group: group.to_string(),
            score,
            word: word.to_string(),
        }
    }

    #[test]
    fn keeps_only_highest_confidence_span_per_type() {
        let spans = vec![
            span(DISEASE_GROUP, 0.61, "asthma"),
            span(DISEASE_GROUP, 0.93, "diabetes"),
            span(MEDICATION_GROUP, 0.87, "metformin"),
            span(DISEASE_GROUP, 0.72, "hypertension"),
        ];

        let entities = best_spans(&spans);
        assert_eq!(entities.diseases, "diabetes");
        assert_eq!(entities.medications, "metformin");
    }

    #[test]
    fn ties_go_to_the_first_seen_span() {
        let spans = vec![
            span(MEDICATION_GROUP, 0.80, "aspirin"),
            span(MEDICATION_GROUP, 0.80, "ibuprofen"),
        ];

        assert_eq!(best_spans(&spans).medications, "aspirin");
    }

    #[test]
    fn unrelated_entity_groups_are_ignored() {
        let spans = vec![
            span("SIGN_SYMPTOM", 0.99, "fever"),
            span(DISEASE_GROUP, 0.40, "flu"),
        ];

        let entities = best_spans(&spans);
        assert_eq!(entities.diseases, "flu");
        assert_eq!(entities.medications, "");
    }

    #[test]
    fn no_spans_yields_empty_strings() {
        let entities = best_spans(&[]);
        assert_eq!(entities, ExtractedEntities::default());
    }

    #[test]
    fn parses_object_on_first_line_ignoring_trailing_prose() {
        let response = "{\"diseases\": \"lupus\", \"medications\": \"prednisone\"}\nHope that helps!";
        let entities = parse_first_line(response).unwrap();
        assert_eq!(entities.diseases, "lupus");
        assert_eq!(entities.medications, "prednisone");
    }

    #[test]
    fn rejects_non_object_first_line() {
        assert!(parse_first_line("Sure! Here are the entities:").is_err());
        assert!(parse_first_line("").is_err());
    }

    struct ScriptedAgent(&'static str);

    #[async_trait]
    impl ChatAgent for ScriptedAgent {
        async fn chat_completion(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn llm_extractor_parses_well_formed_reply() {
        let extractor = LlmExtractor::with_agent(ScriptedAgent(
            "{\"diseases\": \"gout\", \"medications\": \"allopurinol\"}",
        ));
        let entities = extractor.extract("criteria").await.unwrap();
        assert_eq!(entities.diseases, "gout");
        assert_eq!(entities.medications, "allopurinol");
    }

    #[tokio::test]
    async fn llm_extractor_surfaces_parse_failure_as_typed_error() {
        let extractor = LlmExtractor::with_agent(ScriptedAgent("I could not find any entities."));
        assert!(extractor.extract("criteria").await.is_err());
    }

    struct FailingExtractor;

    #[async_trait]
    impl EntityExtractor for FailingExtractor {
        async fn extract(&self, _text: &str) -> Result<ExtractedEntities> {
            Err(anyhow!("model unavailable"))
        }
    }

    struct FixedExtractor(ExtractedEntities);

    #[async_trait]
    impl EntityExtractor for FixedExtractor {
        async fn extract(&self, _text: &str) -> Result<ExtractedEntities> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn extraction_failure_defaults_to_empty_strings() {
        let rows = vec![flatten(&Study::default())];
        let annotated = annotate_rows(&FailingExtractor, rows).await;

        assert_eq!(annotated.len(), 1);
        assert_eq!(annotated[0].diseases, "");
        assert_eq!(annotated[0].medications, "");
    }

    #[tokio::test]
    async fn successful_extraction_lands_on_the_row() {
        let rows = vec![flatten(&Study::default())];
        let extractor = FixedExtractor(ExtractedEntities {
            diseases: "psoriasis".to_string(),
            medications: "adalimumab".to_string(),
        });

        let annotated = annotate_rows(&extractor, rows).await;
        assert_eq!(annotated[0].diseases, "psoriasis");
        assert_eq!(annotated[0].medications, "adalimumab");
    }
}
