use anyhow::Result;
use tracing::info;

use crate::store::AnalyticsStore;

/// Stage 2: shape the filtered rows into the table the embedding stage
/// reads. The criteria text is lightly cleaned (markdown list markers and
/// collapsed whitespace) so the embeddings see prose, not bullet syntax.
const TRANSFORM_SQL: &str = "
CREATE OR REPLACE TABLE custom_eligibility_criteria AS
SELECT
    nct_id,
    brief_title,
    trim(regexp_replace(regexp_replace(eligibility_criteria, '\\* ', '', 'g'), '\\s+', ' ', 'g'))
        AS custom_criteria
FROM filtered_studies
WHERE eligibility_criteria <> 'Unknown';
";

pub fn transform_criteria(store: &AnalyticsStore) -> Result<()> {
    store.execute_script(TRANSFORM_SQL)?;
    info!("custom_eligibility_criteria rebuilt");
    Ok(())
}
