// SPDX-License-Identifier: MIT

use super::code;
use crate::college::geo::Wkt;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// An administrative division (province, city or county)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminDivision {
    #[serde(rename = "OBJECTID")]
    pub object_id: i64,
    pub admin_code: String,
    pub shape: Wkt,
    pub name: String,
}

impl AdminDivision {
    pub(crate) const COLUMNS: &'static str = "object_id, admin_code, shape, name";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            object_id: row.get(0)?,
            admin_code: row.get(1)?,
            shape: row.get(2)?,
            name: row.get(3)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdminDivision {
    #[serde(deserialize_with = "code")]
    pub admin_code: String,
    pub shape: Wkt,
    pub name: String,
}
