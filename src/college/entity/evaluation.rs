// SPDX-License-Identifier: MIT

use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A user's evaluation of a college
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub evaluation_id: i64,
    pub college_id: i64,
    pub user_id: i64,
    #[serde(rename = "Dietary_evaluation")]
    pub dietary: Option<String>,
    #[serde(rename = "Traffic_evaluation")]
    pub traffic: Option<String>,
    #[serde(rename = "Evaluation")]
    pub overall: Option<String>,
}

impl Evaluation {
    pub(crate) const COLUMNS: &'static str =
        "evaluation_id, college_id, user_id, dietary_evaluation, traffic_evaluation, evaluation";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            evaluation_id: row.get(0)?,
            college_id: row.get(1)?,
            user_id: row.get(2)?,
            dietary: row.get(3)?,
            traffic: row.get(4)?,
            overall: row.get(5)?,
        })
    }
}

/// Evaluation text for create and update. On update, absent fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationInput {
    #[serde(rename = "Dietary_evaluation", default)]
    pub dietary: Option<String>,
    #[serde(rename = "Traffic_evaluation", default)]
    pub traffic: Option<String>,
    #[serde(rename = "Evaluation", default)]
    pub overall: Option<String>,
}

impl EvaluationInput {
    pub fn apply_to(&self, evaluation: &mut Evaluation) {
        if self.dietary.is_some() {
            evaluation.dietary = self.dietary.clone();
        }
        if self.traffic.is_some() {
            evaluation.traffic = self.traffic.clone();
        }
        if self.overall.is_some() {
            evaluation.overall = self.overall.clone();
        }
    }
}
