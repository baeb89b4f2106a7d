use serde::{Deserialize, Serialize};

// --- Source document ---
//
// Typed mirror of one ClinicalTrials.gov v2 study record. Every field is
// optional: the flattener substitutes defaults, it never fails on absence.

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    #[serde(default)]
    pub protocol_section: Option<ProtocolSection>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSection {
    #[serde(default)]
    pub identification_module: Option<IdentificationModule>,
    #[serde(default)]
    pub status_module: Option<StatusModule>,
    #[serde(default)]
    pub conditions_module: Option<ConditionsModule>,
    #[serde(default)]
    pub arms_interventions_module: Option<ArmsInterventionsModule>,
    #[serde(default)]
    pub contacts_locations_module: Option<ContactsLocationsModule>,
    #[serde(default)]
    pub design_module: Option<DesignModule>,
    #[serde(default)]
    pub eligibility_module: Option<EligibilityModule>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationModule {
    #[serde(default)]
    pub nct_id: Option<String>,
    #[serde(default)]
    pub brief_title: Option<String>,
    #[serde(default)]
    pub acronym: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusModule {
    #[serde(default)]
    pub overall_status: Option<String>,
    #[serde(default)]
    pub start_date_struct: Option<DateStruct>,
    #[serde(default)]
    pub primary_completion_date_struct: Option<DateStruct>,
    #[serde(default)]
    pub study_first_post_date_struct: Option<DateStruct>,
    #[serde(default)]
    pub last_update_post_date_struct: Option<DateStruct>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateStruct {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsModule {
    #[serde(default)]
    pub conditions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmsInterventionsModule {
    #[serde(default)]
    pub interventions: Option<Vec<Intervention>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsLocationsModule {
    #[serde(default)]
    pub locations: Option<Vec<Location>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignModule {
    #[serde(default)]
    pub study_type: Option<String>,
    #[serde(default)]
    pub phases: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityModule {
    #[serde(default)]
    pub eligibility_criteria: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub minimum_age: Option<String>,
    #[serde(default)]
    pub maximum_age: Option<String>,
    #[serde(default)]
    pub std_ages: Option<Vec<String>>,
}

// --- Flattened rows ---

/// One study flattened to fixed named fields. Every field carries a value;
/// defaults stand in for anything the source record omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    pub nct_id: String,
    pub brief_title: String,
    pub acronym: String,
    pub overall_status: String,
    pub start_date: String,
    pub primary_completion_date: String,
    pub study_first_post_date: String,
    pub last_update_post_date: String,
    pub conditions: String,
    pub interventions: String,
    pub locations: String,
    pub study_type: String,
    pub phases: String,
    pub eligibility_criteria: String,
    pub sex: String,
    pub minimum_age: String,
    pub maximum_age: String,
    pub std_ages: String,
    /// Canonical year values derived from the raw age strings. An
    /// unparseable string normalizes to positive infinity ("no limit").
    pub normalized_minimum_age_years: f64,
    pub normalized_maximum_age_years: f64,
}

/// A status-filtered row enriched with extracted entities. Rows that did
/// not pass the status filter never carry these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    #[serde(flatten)]
    pub row: FlatRow,
    pub diseases: String,
    pub medications: String,
}

/// One row of the criteria_embeddings table: the embedding vector is stored
/// serialized as a JSON array string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedCriteria {
    pub nct_id: String,
    pub brief_title: String,
    pub custom_criteria: String,
    pub criteria_embeddings: String,
}
