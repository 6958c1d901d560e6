// SPDX-License-Identifier: MIT

use super::code;
use crate::error::AppError;
use once_cell::sync::Lazy;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TEMPERATURE_YEARS: std::ops::RangeInclusive<u32> = 2022..=2024;
const PRECIPITATION_YEARS: std::ops::RangeInclusive<u32> = 2021..=2023;

static CLIMATE_COLUMNS: Lazy<Vec<String>> = Lazy::new(|| {
    let monthly = |years: std::ops::RangeInclusive<u32>, suffix: &'static str| {
        years.flat_map(move |y| (1..=12).map(move |m| format!("y{}{:02}_{}", y, m, suffix)))
    };
    monthly(TEMPERATURE_YEARS, "avg_temp")
        .chain(monthly(PRECIPITATION_YEARS, "avg_precip"))
        .collect()
});

/// Month columns of the climate table: `yYYYMM_avg_temp` for 2022-2024
/// followed by `yYYYMM_avg_precip` for 2021-2023
pub fn climate_columns() -> &'static [String] {
    &CLIMATE_COLUMNS
}

/// Monthly climate figures for one administrative division
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecord {
    #[serde(deserialize_with = "code")]
    pub admin_code: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl ClimateRecord {
    /// Reject keys that are not month columns
    pub fn validate(&self) -> Result<(), AppError> {
        let unknown: Vec<&str> = self
            .values
            .keys()
            .filter(|k| !CLIMATE_COLUMNS.contains(k))
            .map(String::as_str)
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "unknown climate fields: {}",
                unknown.join(", ")
            )))
        }
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut values = BTreeMap::new();
        for (i, column) in CLIMATE_COLUMNS.iter().enumerate() {
            values.insert(column.clone(), row.get::<_, Option<f64>>(i + 1)?);
        }
        Ok(Self {
            admin_code: row.get(0)?,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_layout() {
        let columns = climate_columns();
        assert_eq!(columns.len(), 72);
        assert_eq!(columns[0], "y202201_avg_temp");
        assert_eq!(columns[35], "y202412_avg_temp");
        assert_eq!(columns[36], "y202101_avg_precip");
        assert_eq!(columns[71], "y202312_avg_precip");
    }

    #[test]
    fn test_validate_rejects_unknown_keys() {
        let record: ClimateRecord = serde_json::from_value(json!({
            "admin_code": "156430100",
            "y202207_avg_temp": 30.1,
            "y202007_avg_temp": 29.0
        }))
        .unwrap();
        let err = record.validate().unwrap_err();
        assert!(err.to_string().contains("y202007_avg_temp"));
    }

    #[test]
    fn test_numeric_admin_code_and_nulls() {
        let record: ClimateRecord = serde_json::from_value(json!({
            "admin_code": 156110000,
            "y202201_avg_precip": null,
            "y202201_avg_temp": -3.5
        }))
        .unwrap();
        assert!(record.validate().is_ok());
        assert_eq!(record.admin_code, "156110000");
        assert_eq!(record.value("y202201_avg_temp"), Some(-3.5));
        assert_eq!(record.value("y202201_avg_precip"), None);
    }
}
