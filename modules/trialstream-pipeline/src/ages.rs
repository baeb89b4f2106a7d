use regex::Regex;
use tracing::warn;

use trialstream_common::{FlatRow, TrialStreamError};

/// Years per unit. Calendar approximations, not calendar-aware.
fn years_per_unit(unit: &str) -> f64 {
    match unit {
        "year" | "years" => 1.0,
        "month" | "months" => 1.0 / 12.0,
        "week" | "weeks" => 1.0 / 52.0,
        "day" | "days" => 1.0 / 365.0,
        "hour" | "hours" => 1.0 / 8760.0,
        "minute" | "minutes" => 1.0 / 525_600.0,
        _ => unreachable!("unit list is fixed by the regex"),
    }
}

/// Convert a free-text age expression like "24 Months" into years.
/// The unit word must follow the integer magnitude after optional
/// whitespace; matching is case-insensitive and anchored at the start.
pub fn to_years(age_str: &str) -> Result<f64, TrialStreamError> {
    let re = Regex::new(r"^(\d+)\s*(years|year|months|month|weeks|week|days|day|hours|hour|minutes|minute)")
        .expect("valid regex");

    let lowered = age_str.to_lowercase();
    let captures = re
        .captures(&lowered)
        .ok_or_else(|| TrialStreamError::AgeFormat(age_str.to_string()))?;

    let value: f64 = captures[1]
        .parse()
        .map_err(|_| TrialStreamError::AgeFormat(age_str.to_string()))?;
    Ok(value * years_per_unit(&captures[2]))
}

/// Fill the two derived year fields on every row. Pure transform: returns a
/// new sequence rather than mutating shared rows in place. A string the
/// converter rejects becomes positive infinity for that field only — the
/// "no limit" sentinel — and never aborts the batch.
pub fn normalize_ages(rows: Vec<FlatRow>) -> Vec<FlatRow> {
    rows.into_iter()
        .map(|mut row| {
            row.normalized_minimum_age_years = years_or_unbounded(&row.minimum_age);
            row.normalized_maximum_age_years = years_or_unbounded(&row.maximum_age);
            row
        })
        .collect()
}

fn years_or_unbounded(age_str: &str) -> f64 {
    match to_years(age_str) {
        Ok(years) => years,
        Err(e) => {
            warn!(error = %e, "treating age as unbounded");
            f64::INFINITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use trialstream_common::Study;

    #[test]
    fn converts_each_recognized_unit() {
        assert_eq!(to_years("1 Year").unwrap(), 1.0);
        assert_eq!(to_years("24 Months").unwrap(), 2.0);
        assert_eq!(to_years("52 Weeks").unwrap(), 1.0);
        assert_eq!(to_years("365 Days").unwrap(), 1.0);
        assert_eq!(to_years("8760 Hours").unwrap(), 1.0);
        assert_eq!(to_years("525600 Minutes").unwrap(), 1.0);
    }

    #[test]
    fn linear_in_magnitude() {
        assert_eq!(to_years("2 years").unwrap(), 2.0 * to_years("1 year").unwrap());
        assert_eq!(to_years("6 months").unwrap(), 6.0 * to_years("1 month").unwrap());
    }

    #[test]
    fn default_boundary_strings() {
        assert_eq!(to_years("0 Year").unwrap(), 0.0);
        assert_eq!(to_years("120 Years").unwrap(), 120.0);
    }

    #[test]
    fn case_insensitive_and_tight_whitespace() {
        assert_eq!(to_years("18 YEARS").unwrap(), 18.0);
        assert_eq!(to_years("18years").unwrap(), 18.0);
    }

    #[test]
    fn rejects_unknown_formats() {
        for bad in ["unknown", "", "years 5", "N/A", "eighteen years"] {
            let err = to_years(bad).unwrap_err();
            assert!(err.to_string().contains(bad), "error should name the input");
        }
    }

    #[test]
    fn unparseable_age_becomes_infinity_without_aborting() {
        let mut row = flatten(&Study::default());
        row.minimum_age = "unknown".to_string();
        row.maximum_age = "30 Years".to_string();

        let rows = normalize_ages(vec![row]);
        assert_eq!(rows[0].normalized_minimum_age_years, f64::INFINITY);
        assert_eq!(rows[0].normalized_maximum_age_years, 30.0);
    }

    #[test]
    fn min_and_max_normalized_independently() {
        let mut row = flatten(&Study::default());
        row.minimum_age = "6 Months".to_string();
        row.maximum_age = "not stated".to_string();

        let rows = normalize_ages(vec![row]);
        assert_eq!(rows[0].normalized_minimum_age_years, 0.5);
        assert_eq!(rows[0].normalized_maximum_age_years, f64::INFINITY);
    }
}
