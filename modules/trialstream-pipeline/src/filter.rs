use std::collections::HashSet;

use trialstream_common::FlatRow;

/// Keep only rows whose overall status is in the allow-list. Exact string
/// equality, no casing or spelling normalization; relative order preserved.
pub fn filter_by_status(rows: &[FlatRow], allowed_statuses: &HashSet<String>) -> Vec<FlatRow> {
    rows.iter()
        .filter(|row| allowed_statuses.contains(&row.overall_status))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use trialstream_common::Study;

    fn row_with_status(status: &str) -> FlatRow {
        let mut row = flatten(&Study::default());
        row.overall_status = status.to_string();
        row
    }

    #[test]
    fn keeps_only_allowed_statuses() {
        let rows = vec![
            row_with_status("AVAILABLE"),
            row_with_status("WITHDRAWN"),
            row_with_status("RECRUITING"),
        ];
        let allowed: HashSet<String> =
            ["AVAILABLE".to_string(), "RECRUITING".to_string()].into();

        let filtered = filter_by_status(&rows, &allowed);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].overall_status, "AVAILABLE");
        assert_eq!(filtered[1].overall_status, "RECRUITING");
    }

    #[test]
    fn match_is_case_sensitive() {
        let rows = vec![row_with_status("available")];
        let allowed: HashSet<String> = ["AVAILABLE".to_string()].into();

        assert!(filter_by_status(&rows, &allowed).is_empty());
    }

    #[test]
    fn preserves_relative_order() {
        let rows = vec![
            row_with_status("A"),
            row_with_status("B"),
            row_with_status("A"),
            row_with_status("C"),
            row_with_status("A"),
        ];
        let allowed: HashSet<String> = ["A".to_string(), "C".to_string()].into();

        let statuses: Vec<_> = filter_by_status(&rows, &allowed)
            .into_iter()
            .map(|r| r.overall_status)
            .collect();
        assert_eq!(statuses, vec!["A", "A", "C", "A"]);
    }

    #[test]
    fn empty_allow_list_filters_everything() {
        let rows = vec![row_with_status("AVAILABLE")];
        assert!(filter_by_status(&rows, &HashSet::new()).is_empty());
    }
}
