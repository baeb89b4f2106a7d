use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use duckdb::{params, Connection};
use tracing::info;

use trialstream_common::{AnnotatedRow, EmbeddedCriteria, FlatRow};

/// Wrapper around the embedded analytical store. Tables are created on
/// first load with columns matching the row type's field names; subsequent
/// loads append. Read paths treat a missing table as empty so the web
/// surface can degrade to its no-data page.
pub struct AnalyticsStore {
    conn: Connection,
}

impl AnalyticsStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating data dir {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening duckdb at {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn load_studies(&mut self, rows: &[FlatRow], table_name: &str) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (
                nct_id TEXT,
                brief_title TEXT,
                acronym TEXT,
                overall_status TEXT,
                start_date TEXT,
                primary_completion_date TEXT,
                study_first_post_date TEXT,
                last_update_post_date TEXT,
                conditions TEXT,
                interventions TEXT,
                locations TEXT,
                study_type TEXT,
                phases TEXT,
                eligibility_criteria TEXT,
                sex TEXT,
                minimum_age TEXT,
                maximum_age TEXT,
                std_ages TEXT,
                normalized_minimum_age_years DOUBLE,
                normalized_maximum_age_years DOUBLE
            );"
        ))?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table_name} VALUES
                 (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.nct_id,
                    row.brief_title,
                    row.acronym,
                    row.overall_status,
                    row.start_date,
                    row.primary_completion_date,
                    row.study_first_post_date,
                    row.last_update_post_date,
                    row.conditions,
                    row.interventions,
                    row.locations,
                    row.study_type,
                    row.phases,
                    row.eligibility_criteria,
                    row.sex,
                    row.minimum_age,
                    row.maximum_age,
                    row.std_ages,
                    row.normalized_minimum_age_years,
                    row.normalized_maximum_age_years,
                ])?;
            }
        }
        tx.commit()?;

        info!(table = table_name, rows = rows.len(), "loaded rows");
        Ok(())
    }

    pub fn load_filtered(&mut self, rows: &[AnnotatedRow], table_name: &str) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (
                nct_id TEXT,
                brief_title TEXT,
                acronym TEXT,
                overall_status TEXT,
                start_date TEXT,
                primary_completion_date TEXT,
                study_first_post_date TEXT,
                last_update_post_date TEXT,
                conditions TEXT,
                interventions TEXT,
                locations TEXT,
                study_type TEXT,
                phases TEXT,
                eligibility_criteria TEXT,
                sex TEXT,
                minimum_age TEXT,
                maximum_age TEXT,
                std_ages TEXT,
                normalized_minimum_age_years DOUBLE,
                normalized_maximum_age_years DOUBLE,
                diseases TEXT,
                medications TEXT
            );"
        ))?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table_name} VALUES
                 (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ))?;
            for annotated in rows {
                let row = &annotated.row;
                stmt.execute(params![
                    row.nct_id,
                    row.brief_title,
                    row.acronym,
                    row.overall_status,
                    row.start_date,
                    row.primary_completion_date,
                    row.study_first_post_date,
                    row.last_update_post_date,
                    row.conditions,
                    row.interventions,
                    row.locations,
                    row.study_type,
                    row.phases,
                    row.eligibility_criteria,
                    row.sex,
                    row.minimum_age,
                    row.maximum_age,
                    row.std_ages,
                    row.normalized_minimum_age_years,
                    row.normalized_maximum_age_years,
                    annotated.diseases,
                    annotated.medications,
                ])?;
            }
        }
        tx.commit()?;

        info!(table = table_name, rows = rows.len(), "loaded filtered rows");
        Ok(())
    }

    pub fn load_embeddings(&mut self, rows: &[EmbeddedCriteria], table_name: &str) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (
                nct_id TEXT,
                brief_title TEXT,
                custom_criteria TEXT,
                criteria_embeddings TEXT
            );"
        ))?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table_name} VALUES (?, ?, ?, ?)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.nct_id,
                    row.brief_title,
                    row.custom_criteria,
                    row.criteria_embeddings,
                ])?;
            }
        }
        tx.commit()?;

        info!(table = table_name, rows = rows.len(), "loaded embeddings");
        Ok(())
    }

    /// Run an arbitrary SQL script (the stage-2 transform).
    pub fn execute_script(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).context("executing SQL script")
    }

    /// Input of the embedding stage. Empty when the transform has not run.
    pub fn read_transformed_criteria(&self) -> Result<Vec<(String, String, String)>> {
        let Ok(mut stmt) = self.conn.prepare(
            "SELECT nct_id, brief_title, custom_criteria FROM custom_eligibility_criteria",
        ) else {
            return Ok(Vec::new());
        };

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Input of the similarity server. Empty when embeddings were never
    /// generated.
    pub fn read_embeddings(&self) -> Result<Vec<EmbeddedCriteria>> {
        let Ok(mut stmt) = self.conn.prepare(
            "SELECT nct_id, brief_title, custom_criteria, criteria_embeddings
             FROM criteria_embeddings",
        ) else {
            return Ok(Vec::new());
        };

        let rows = stmt
            .query_map([], |row| {
                Ok(EmbeddedCriteria {
                    nct_id: row.get(0)?,
                    brief_title: row.get(1)?,
                    custom_criteria: row.get(2)?,
                    criteria_embeddings: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    #[cfg(test)]
    pub(crate) fn count(&self, table_name: &str) -> Result<i64> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table_name}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use trialstream_common::Study;

    fn temp_store() -> (tempfile::TempDir, AnalyticsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalyticsStore::open(dir.path().join("test.duckdb")).unwrap();
        (dir, store)
    }

    #[test]
    fn load_and_count_studies() {
        let (_dir, mut store) = temp_store();
        let rows = vec![flatten(&Study::default()), flatten(&Study::default())];

        store.load_studies(&rows, "studies").unwrap();
        assert_eq!(store.count("studies").unwrap(), 2);

        // Appends, does not replace.
        store.load_studies(&rows, "studies").unwrap();
        assert_eq!(store.count("studies").unwrap(), 4);
    }

    #[test]
    fn missing_tables_read_as_empty() {
        let (_dir, store) = temp_store();
        assert!(store.read_transformed_criteria().unwrap().is_empty());
        assert!(store.read_embeddings().unwrap().is_empty());
    }

    #[test]
    fn embeddings_round_trip() {
        let (_dir, mut store) = temp_store();
        let rows = vec![EmbeddedCriteria {
            nct_id: "NCT00000001".to_string(),
            brief_title: "Title".to_string(),
            custom_criteria: "criteria text".to_string(),
            criteria_embeddings: "[0.1,0.2]".to_string(),
        }];

        store.load_embeddings(&rows, "criteria_embeddings").unwrap();
        let read = store.read_embeddings().unwrap();
        assert_eq!(read, rows);
    }
}
