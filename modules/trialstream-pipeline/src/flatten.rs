use trialstream_common::{FlatRow, Study};

/// Flatten one nested study record into a row with fixed named fields.
/// Pure and infallible: every nested lookup has an explicit default, so a
/// record missing arbitrarily many optional keys still yields a full row.
/// The per-field placeholder strings are load-bearing — downstream SQL and
/// the age normalizer depend on them — so they are not unified.
pub fn flatten(study: &Study) -> FlatRow {
    let protocol = study.protocol_section.as_ref();

    let identification = protocol.and_then(|p| p.identification_module.as_ref());
    let status = protocol.and_then(|p| p.status_module.as_ref());
    let design = protocol.and_then(|p| p.design_module.as_ref());
    let eligibility = protocol.and_then(|p| p.eligibility_module.as_ref());

    let conditions = protocol
        .and_then(|p| p.conditions_module.as_ref())
        .and_then(|m| m.conditions.as_deref())
        .filter(|c| !c.is_empty())
        .map(|c| c.join(", "))
        .unwrap_or_else(|| "No conditions listed".to_string());

    let interventions = protocol
        .and_then(|p| p.arms_interventions_module.as_ref())
        .and_then(|m| m.interventions.as_deref())
        .filter(|i| !i.is_empty())
        .map(|items| {
            items
                .iter()
                .map(|i| i.name.as_deref().unwrap_or("No intervention name listed"))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_else(|| "No interventions listed".to_string());

    let locations = protocol
        .and_then(|p| p.contacts_locations_module.as_ref())
        .and_then(|m| m.locations.as_deref())
        .filter(|l| !l.is_empty())
        .map(|items| {
            items
                .iter()
                .map(|l| {
                    format!(
                        "{} - {}",
                        l.city.as_deref().unwrap_or("No City"),
                        l.country.as_deref().unwrap_or("No Country")
                    )
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_else(|| "No locations listed".to_string());

    let phases = design
        .and_then(|d| d.phases.as_deref())
        .filter(|p| !p.is_empty())
        .map(|p| p.join(", "))
        .unwrap_or_else(|| "Not Available".to_string());

    let std_ages = eligibility
        .and_then(|e| e.std_ages.as_deref())
        .filter(|a| !a.is_empty())
        .map(|a| a.join(", "))
        .unwrap_or_else(|| "Unknown".to_string());

    FlatRow {
        nct_id: field(identification.and_then(|m| m.nct_id.as_deref()), "Unknown"),
        brief_title: field(identification.and_then(|m| m.brief_title.as_deref()), "Unknown"),
        acronym: field(identification.and_then(|m| m.acronym.as_deref()), "Unknown"),
        overall_status: field(status.and_then(|m| m.overall_status.as_deref()), "Unknown"),
        start_date: date_field(status.and_then(|m| m.start_date_struct.as_ref())),
        primary_completion_date: date_field(
            status.and_then(|m| m.primary_completion_date_struct.as_ref()),
        ),
        study_first_post_date: date_field(
            status.and_then(|m| m.study_first_post_date_struct.as_ref()),
        ),
        last_update_post_date: date_field(
            status.and_then(|m| m.last_update_post_date_struct.as_ref()),
        ),
        conditions,
        interventions,
        locations,
        study_type: field(design.and_then(|d| d.study_type.as_deref()), "Unknown"),
        phases,
        eligibility_criteria: field(
            eligibility.and_then(|e| e.eligibility_criteria.as_deref()),
            "Unknown",
        ),
        sex: field(eligibility.and_then(|e| e.sex.as_deref()), "Unknown"),
        minimum_age: field(eligibility.and_then(|e| e.minimum_age.as_deref()), "0 Year"),
        maximum_age: field(
            eligibility.and_then(|e| e.maximum_age.as_deref()),
            "120 Years",
        ),
        std_ages,
        normalized_minimum_age_years: 0.0,
        normalized_maximum_age_years: 0.0,
    }
}

fn field(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}

fn date_field(value: Option<&trialstream_common::DateStruct>) -> String {
    value
        .and_then(|d| d.date.as_deref())
        .unwrap_or("Unknown Date")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialstream_common::*;

    #[test]
    fn empty_record_gets_all_defaults() {
        let row = flatten(&Study::default());

        assert_eq!(row.nct_id, "Unknown");
        assert_eq!(row.brief_title, "Unknown");
        assert_eq!(row.acronym, "Unknown");
        assert_eq!(row.overall_status, "Unknown");
        assert_eq!(row.start_date, "Unknown Date");
        assert_eq!(row.primary_completion_date, "Unknown Date");
        assert_eq!(row.study_first_post_date, "Unknown Date");
        assert_eq!(row.last_update_post_date, "Unknown Date");
        assert_eq!(row.conditions, "No conditions listed");
        assert_eq!(row.interventions, "No interventions listed");
        assert_eq!(row.locations, "No locations listed");
        assert_eq!(row.study_type, "Unknown");
        assert_eq!(row.phases, "Not Available");
        assert_eq!(row.eligibility_criteria, "Unknown");
        assert_eq!(row.sex, "Unknown");
        assert_eq!(row.minimum_age, "0 Year");
        assert_eq!(row.maximum_age, "120 Years");
        assert_eq!(row.std_ages, "Unknown");
    }

    #[test]
    fn partially_populated_record_keeps_per_field_defaults() {
        let study = Study {
            protocol_section: Some(ProtocolSection {
                identification_module: Some(IdentificationModule {
                    nct_id: Some("NCT01234567".to_string()),
                    brief_title: Some("A Study".to_string()),
                    acronym: None,
                }),
                ..Default::default()
            }),
        };

        let row = flatten(&study);
        assert_eq!(row.nct_id, "NCT01234567");
        assert_eq!(row.brief_title, "A Study");
        assert_eq!(row.acronym, "Unknown");
        assert_eq!(row.phases, "Not Available");
    }

    #[test]
    fn joins_lists_with_comma_space() {
        let study = Study {
            protocol_section: Some(ProtocolSection {
                conditions_module: Some(ConditionsModule {
                    conditions: Some(vec!["Asthma".to_string(), "COPD".to_string()]),
                }),
                design_module: Some(DesignModule {
                    study_type: Some("INTERVENTIONAL".to_string()),
                    phases: Some(vec!["PHASE1".to_string(), "PHASE2".to_string()]),
                }),
                ..Default::default()
            }),
        };

        let row = flatten(&study);
        assert_eq!(row.conditions, "Asthma, COPD");
        assert_eq!(row.phases, "PHASE1, PHASE2");
        assert_eq!(row.study_type, "INTERVENTIONAL");
    }

    #[test]
    fn formats_locations_as_city_dash_country() {
        let study = Study {
            protocol_section: Some(ProtocolSection {
                contacts_locations_module: Some(ContactsLocationsModule {
                    locations: Some(vec![
                        Location {
                            city: Some("Boston".to_string()),
                            country: Some("United States".to_string()),
                        },
                        Location {
                            city: None,
                            country: Some("Canada".to_string()),
                        },
                    ]),
                }),
                ..Default::default()
            }),
        };

        let row = flatten(&study);
        assert_eq!(row.locations, "Boston - United States, No City - Canada");
    }

    #[test]
    fn empty_lists_take_the_absent_list_placeholders() {
        let study = Study {
            protocol_section: Some(ProtocolSection {
                conditions_module: Some(ConditionsModule {
                    conditions: Some(vec![]),
                }),
                arms_interventions_module: Some(ArmsInterventionsModule {
                    interventions: Some(vec![]),
                }),
                contacts_locations_module: Some(ContactsLocationsModule {
                    locations: Some(vec![]),
                }),
                ..Default::default()
            }),
        };

        let row = flatten(&study);
        assert_eq!(row.conditions, "No conditions listed");
        assert_eq!(row.interventions, "No interventions listed");
        assert_eq!(row.locations, "No locations listed");
    }

    #[test]
    fn intervention_without_name_gets_entry_level_default() {
        let study = Study {
            protocol_section: Some(ProtocolSection {
                arms_interventions_module: Some(ArmsInterventionsModule {
                    interventions: Some(vec![
                        Intervention {
                            name: Some("Metformin".to_string()),
                        },
                        Intervention { name: None },
                    ]),
                }),
                ..Default::default()
            }),
        };

        let row = flatten(&study);
        assert_eq!(row.interventions, "Metformin, No intervention name listed");
    }
}
