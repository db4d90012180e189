//! Feature catalog for the UCI Air Quality dataset.

/// Raw value the sensors write when a reading was not recorded.
pub const SENTINEL: f64 = -200.0;

/// Source column holding the calendar date.
pub const DATE_COLUMN: &str = "Date";
/// Source column holding the time of day.
pub const TIME_COLUMN: &str = "Time";

/// Ground-truth pollutant concentrations.
pub const POLLUTANTS: [&str; 5] = ["CO(GT)", "NMHC(GT)", "C6H6(GT)", "NOx(GT)", "NO2(GT)"];

/// Metal-oxide sensor responses.
pub const SENSORS: [&str; 5] = [
    "PT08.S1(CO)",
    "PT08.S2(NMHC)",
    "PT08.S3(NOx)",
    "PT08.S4(NO2)",
    "PT08.S5(O3)",
];

/// Temperature, relative humidity, absolute humidity.
pub const METEO: [&str; 3] = ["T", "RH", "AH"];

/// All analysed features in canonical order: pollutants, sensors, meteo.
pub fn all_features() -> Vec<&'static str> {
    POLLUTANTS
        .iter()
        .chain(SENSORS.iter())
        .chain(METEO.iter())
        .copied()
        .collect()
}

/// Display label for charts: the part before the first `(`.
pub fn short_name(feature: &str) -> &str {
    feature.split('(').next().unwrap_or(feature)
}

/// Columns produced by spreadsheet export noise or trailing separators.
///
/// Covers blank headers, `Unnamed: n`, the `column_n` names Polars gives
/// blank CSV headers, and renamed duplicates.
pub fn is_artifact_column(name: &str) -> bool {
    let name = name.trim();
    let placeholder = name
        .strip_prefix("column_")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));

    name.is_empty()
        || placeholder
        || name.starts_with("Unnamed")
        || name.contains("_duplicated_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_has_thirteen_features() {
        let features = all_features();
        assert_eq!(features.len(), 13);
        assert_eq!(features[0], "CO(GT)");
        assert_eq!(features[5], "PT08.S1(CO)");
        assert_eq!(features[12], "AH");
    }

    #[test]
    fn short_names_strip_parenthesised_suffix() {
        assert_eq!(short_name("NOx(GT)"), "NOx");
        assert_eq!(short_name("PT08.S5(O3)"), "PT08.S5");
        assert_eq!(short_name("RH"), "RH");
    }

    #[test]
    fn artifact_columns() {
        assert!(is_artifact_column("Unnamed: 15"));
        assert!(is_artifact_column(""));
        assert!(is_artifact_column("_duplicated_0"));
        assert!(is_artifact_column("column_16"));
        assert!(is_artifact_column("column_17_duplicated_0"));
        assert!(!is_artifact_column("column_a"));
        assert!(!is_artifact_column("T"));
        assert!(!is_artifact_column("Date"));
    }
}
