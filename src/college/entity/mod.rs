// SPDX-License-Identifier: MIT

//! Entity types stored in the database and exchanged over HTTP

/// Declares a closed set of text values stored as TEXT columns and exchanged
/// as JSON strings.
macro_rules! text_enum {
    (
        $label:literal,
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::error::AppError::validation(format!(
                        "invalid {} '{}', expected one of: {}",
                        $label,
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                text.parse::<$name>().map_err(serde::de::Error::custom)
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value.as_str()?.parse::<$name>().map_err(|e| {
                    rusqlite::types::FromSqlError::Other(Box::new(e))
                })
            }
        }
    };
}

pub mod climate;
pub mod college;
pub mod division;
pub mod evaluation;
pub mod history;
pub mod review;
pub mod user;

pub use climate::{climate_columns, ClimateRecord};
pub use college::{
    College, CollegeCategory, CollegeDetail, CollegeInfo, CollegeNature, CollegePatch,
    CollegeQuery, NewCollege, Submission, WriteOutcome,
};
pub use division::{AdminDivision, NewAdminDivision};
pub use evaluation::{Evaluation, EvaluationInput};
pub use history::{EntityType, ModificationHistory, ModificationType};
pub use review::{
    CollegeReview, PendingCollege, PendingReview, ReviewDecision, ReviewStatus, ReviewType,
};
pub use user::{LoginRequest, RegisterRequest, Role, User};

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FlagRepr {
    fn into_bool<E: de::Error>(self) -> Result<bool, E> {
        match self {
            FlagRepr::Bool(b) => Ok(b),
            FlagRepr::Int(0) => Ok(false),
            FlagRepr::Int(1) => Ok(true),
            FlagRepr::Int(n) => Err(E::custom(format!("flag must be 0 or 1, got {}", n))),
            FlagRepr::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                other => Err(E::custom(format!(
                    "flag must be 0/1 or true/false, got '{}'",
                    other
                ))),
            },
        }
    }
}

/// Program flags accept JSON booleans, `0`/`1`, or their string forms
pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    FlagRepr::deserialize(deserializer)?.into_bool()
}

pub fn optional_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Option::<FlagRepr>::deserialize(deserializer)?
        .map(FlagRepr::into_bool)
        .transpose()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CodeRepr {
    Text(String),
    Int(i64),
}

impl From<CodeRepr> for String {
    fn from(code: CodeRepr) -> Self {
        match code {
            CodeRepr::Text(s) => s,
            CodeRepr::Int(n) => n.to_string(),
        }
    }
}

/// Administrative codes arrive as strings or integers
pub fn code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(CodeRepr::deserialize(deserializer)?.into())
}

pub fn optional_code<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<CodeRepr>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "flag")]
        a: bool,
        #[serde(default, deserialize_with = "optional_flag")]
        b: Option<bool>,
        #[serde(default, deserialize_with = "optional_code")]
        code: Option<String>,
    }

    #[test]
    fn test_flags_accept_bool_and_int() {
        let flags: Flags = serde_json::from_value(json!({"a": 1, "b": false})).unwrap();
        assert!(flags.a);
        assert_eq!(flags.b, Some(false));

        let flags: Flags = serde_json::from_value(json!({"a": true})).unwrap();
        assert!(flags.a);
        assert_eq!(flags.b, None);

        assert!(serde_json::from_value::<Flags>(json!({"a": 2})).is_err());
    }

    #[test]
    fn test_code_accepts_number() {
        let flags: Flags = serde_json::from_value(json!({"code": 156430100})).unwrap();
        assert_eq!(flags.code.as_deref(), Some("156430100"));
    }

    #[test]
    fn test_text_enum_round_trip() {
        let category: CollegeCategory = "理工类".parse().unwrap();
        assert_eq!(category, CollegeCategory::Engineering);
        assert_eq!(CollegeCategory::ALL.len(), 13);
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("admin"));

        let err = "理学".parse::<CollegeCategory>().unwrap_err();
        assert!(err.to_string().starts_with("invalid category '理学'"));
    }
}
