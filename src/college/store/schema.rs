// SPDX-License-Identifier: MIT

//! Table definitions. Every statement is idempotent.

use crate::college::entity::climate_columns;

/// Bumped whenever the DDL below changes
pub const SCHEMA_VERSION: i32 = 1;

const COLLEGE_COLUMNS_DDL: &str = "
    college_id      INTEGER NOT NULL,
    shape           TEXT NOT NULL,
    province        TEXT NOT NULL,
    name            TEXT NOT NULL,
    category        TEXT,
    nature          TEXT,
    type            TEXT,
    is_985          INTEGER NOT NULL DEFAULT 0,
    is_211          INTEGER NOT NULL DEFAULT 0,
    is_double_first INTEGER NOT NULL DEFAULT 0,
    city            TEXT,
    affiliation     TEXT,
    address         TEXT,
    longitude       REAL,
    latitude        REAL,
    admin_code      TEXT";

const BASE_DDL: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    username  TEXT NOT NULL UNIQUE,
    password  TEXT NOT NULL,
    province  TEXT NOT NULL,
    city      TEXT NOT NULL,
    address   TEXT NOT NULL,
    role      TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user')),
    location  TEXT NOT NULL,
    citycode  TEXT NOT NULL,
    adcode    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS admin_divisions (
    object_id   INTEGER NOT NULL UNIQUE,
    admin_code  TEXT PRIMARY KEY CHECK (length(admin_code) <= 9),
    shape       TEXT NOT NULL,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evaluations (
    evaluation_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    college_id          INTEGER NOT NULL REFERENCES colleges(college_id),
    user_id             INTEGER NOT NULL,
    dietary_evaluation  TEXT,
    traffic_evaluation  TEXT,
    evaluation          TEXT
);
CREATE INDEX IF NOT EXISTS idx_evaluations_college ON evaluations(college_id);
CREATE INDEX IF NOT EXISTS idx_evaluations_user ON evaluations(user_id);

CREATE TABLE IF NOT EXISTS college_reviews (
    review_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    college_id      INTEGER,
    user_id         INTEGER NOT NULL,
    status          TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'approved', 'rejected')),
    submit_time     TEXT NOT NULL,
    review_time     TEXT,
    reviewer_id     INTEGER,
    review_comment  TEXT,
    review_type     TEXT NOT NULL DEFAULT 'new' CHECK (review_type IN ('new', 'update'))
);
CREATE INDEX IF NOT EXISTS idx_reviews_status ON college_reviews(status);

CREATE TABLE IF NOT EXISTS modification_history (
    history_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type        TEXT NOT NULL CHECK (entity_type IN ('college', 'evaluation')),
    entity_id          INTEGER NOT NULL,
    old_data           TEXT,
    new_data           TEXT,
    user_id            INTEGER NOT NULL,
    modification_time  TEXT NOT NULL,
    modification_type  TEXT NOT NULL CHECK (modification_type IN ('update', 'delete'))
);
CREATE INDEX IF NOT EXISTS idx_history_entity ON modification_history(entity_type, entity_id);
";

/// Full DDL for the store
pub fn ddl() -> String {
    let climate = climate_columns()
        .iter()
        .map(|c| format!("    {} REAL", c))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "{base}
CREATE TABLE IF NOT EXISTS colleges (
    object_id INTEGER NOT NULL UNIQUE,{college},
    PRIMARY KEY (college_id),
    UNIQUE (name)
);

CREATE TABLE IF NOT EXISTS pending_colleges (
    review_id    INTEGER PRIMARY KEY REFERENCES college_reviews(review_id),
    user_id      INTEGER NOT NULL REFERENCES users(user_id),
    submit_time  TEXT NOT NULL,{college}
);

CREATE TABLE IF NOT EXISTS climate_data (
    admin_code TEXT PRIMARY KEY CHECK (length(admin_code) <= 9),
{climate}
);
",
        base = BASE_DDL,
        college = COLLEGE_COLUMNS_DDL,
        climate = climate,
    )
}
