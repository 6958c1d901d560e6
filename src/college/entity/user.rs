// SPDX-License-Identifier: MIT

use rusqlite::Row;
use serde::{Deserialize, Serialize};

text_enum! {
    "role",
    pub enum Role {
        Admin => "admin",
        User => "user",
    }
}

/// A registered account. The password digest never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub province: String,
    pub city: String,
    pub address: String,
    pub role: Role,
    /// `"lng,lat"` from geocoding the address
    pub location: String,
    pub citycode: String,
    pub adcode: i64,
}

impl User {
    pub(crate) const COLUMNS: &'static str =
        "user_id, username, password, province, city, address, role, location, citycode, adcode";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            province: row.get(3)?,
            city: row.get(4)?,
            address: row.get(5)?,
            role: row.get(6)?,
            location: row.get(7)?,
            citycode: row.get(8)?,
            adcode: row.get(9)?,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub province: String,
    pub city: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
