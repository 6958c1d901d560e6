// SPDX-License-Identifier: MIT

use super::evaluation::Evaluation;
use super::{flag, optional_code, optional_flag};
use crate::college::geo::Wkt;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

text_enum! {
    "category",
    pub enum CollegeCategory {
        Comprehensive => "综合类",
        Engineering => "理工类",
        Normal => "师范类",
        Medical => "医药类",
        Finance => "财经类",
        Arts => "艺术类",
        Agriculture => "农林类",
        PoliticsLaw => "政法类",
        Other => "其他",
        Language => "语言类",
        Sports => "体育类",
        Military => "军事类",
        Ethnic => "民族类",
    }
}

text_enum! {
    "nature",
    pub enum CollegeNature {
        Public => "公办",
        Private => "民办",
        SinoForeign => "中外合办",
    }
}

/// Column values shared by published colleges and pending submissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeInfo {
    pub college_id: i64,
    pub shape: Wkt,
    pub province: String,
    pub name: String,
    pub category: Option<CollegeCategory>,
    pub nature: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_985: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_211: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_double_first: bool,
    pub city: Option<String>,
    pub affiliation: Option<String>,
    pub address: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "optional_code")]
    pub admin_code: Option<String>,
}

impl CollegeInfo {
    /// Column list matching [`CollegeInfo::from_row_at`], shared by the
    /// `College` and `PendingCollege` tables
    pub(crate) const COLUMNS: &'static str = "college_id, shape, province, name, category, \
        nature, type, is_985, is_211, is_double_first, city, affiliation, address, longitude, \
        latitude, admin_code";

    pub(crate) fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            college_id: row.get(offset)?,
            shape: row.get(offset + 1)?,
            province: row.get(offset + 2)?,
            name: row.get(offset + 3)?,
            category: row.get(offset + 4)?,
            nature: row.get(offset + 5)?,
            kind: row.get(offset + 6)?,
            is_985: row.get(offset + 7)?,
            is_211: row.get(offset + 8)?,
            is_double_first: row.get(offset + 9)?,
            city: row.get(offset + 10)?,
            affiliation: row.get(offset + 11)?,
            address: row.get(offset + 12)?,
            longitude: row.get(offset + 13)?,
            latitude: row.get(offset + 14)?,
            admin_code: row.get(offset + 15)?,
        })
    }

    /// `"lng,lat"` for map lookups
    pub fn location(&self) -> Option<String> {
        match (self.longitude, self.latitude) {
            (Some(lng), Some(lat)) => Some(format!("{},{}", lng, lat)),
            _ => None,
        }
    }
}

/// A published college
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct College {
    #[serde(rename = "OBJECTID")]
    pub object_id: i64,
    #[serde(flatten)]
    pub info: CollegeInfo,
}

impl College {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            object_id: row.get(0)?,
            info: CollegeInfo::from_row_at(row, 1)?,
        })
    }
}

/// Payload for adding a college
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCollege {
    pub college_id: i64,
    pub shape: Wkt,
    pub province: String,
    pub name: String,
    pub category: CollegeCategory,
    pub nature: CollegeNature,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_985: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_211: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_double_first: bool,
    pub city: String,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default, deserialize_with = "optional_code")]
    pub admin_code: Option<String>,
}

impl From<NewCollege> for CollegeInfo {
    fn from(new: NewCollege) -> Self {
        Self {
            college_id: new.college_id,
            shape: new.shape,
            province: new.province,
            name: new.name,
            category: Some(new.category),
            nature: Some(new.nature.to_string()),
            kind: new.kind,
            is_985: new.is_985,
            is_211: new.is_211,
            is_double_first: new.is_double_first,
            city: Some(new.city),
            affiliation: new.affiliation,
            address: new.address,
            longitude: Some(new.longitude),
            latitude: Some(new.latitude),
            admin_code: new.admin_code,
        }
    }
}

/// Partial update; absent or null fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollegePatch {
    #[serde(default)]
    pub shape: Option<Wkt>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<CollegeCategory>,
    #[serde(default)]
    pub nature: Option<CollegeNature>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub is_985: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub is_211: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub is_double_first: Option<bool>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "optional_code")]
    pub admin_code: Option<String>,
}

impl CollegePatch {
    pub fn apply_to(&self, info: &mut CollegeInfo) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        fn set_some<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut info.shape, &self.shape);
        set(&mut info.province, &self.province);
        set(&mut info.name, &self.name);
        set_some(&mut info.category, &self.category);
        set_some(&mut info.nature, &self.nature.map(|n| n.to_string()));
        set_some(&mut info.kind, &self.kind);
        set(&mut info.is_985, &self.is_985);
        set(&mut info.is_211, &self.is_211);
        set(&mut info.is_double_first, &self.is_double_first);
        set_some(&mut info.city, &self.city);
        set_some(&mut info.affiliation, &self.affiliation);
        set_some(&mut info.address, &self.address);
        set_some(&mut info.longitude, &self.longitude);
        set_some(&mut info.latitude, &self.latitude);
        set_some(&mut info.admin_code, &self.admin_code);
    }
}

/// Search filters. `name` is a substring match, the rest are equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollegeQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub nature: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub is_985: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub is_211: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub is_double_first: Option<bool>,
}

/// A college with its evaluations
#[derive(Debug, Clone, Serialize)]
pub struct CollegeDetail {
    pub college: College,
    pub evaluations: Vec<Evaluation>,
}

/// Acknowledgement for a change queued for moderation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub message: String,
    pub review_id: i64,
}

/// Result of an add or update: applied directly (admins) or queued for review
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WriteOutcome {
    Applied(College),
    Submitted(Submission),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_college_json() -> serde_json::Value {
        json!({
            "college_id": 10533,
            "shape": "POINT(112.93 28.17)",
            "province": "湖南",
            "name": "中南大学",
            "category": "综合类",
            "nature": "公办",
            "type": "普通本科",
            "is_985": 1,
            "is_211": true,
            "city": "长沙",
            "longitude": 112.93,
            "latitude": 28.17,
            "admin_code": 156430100
        })
    }

    #[test]
    fn test_new_college_accepts_mixed_flags() {
        let new: NewCollege = serde_json::from_value(new_college_json()).unwrap();
        assert!(new.is_985);
        assert!(new.is_211);
        assert!(!new.is_double_first);
        assert_eq!(new.admin_code.as_deref(), Some("156430100"));

        let info = CollegeInfo::from(new);
        assert_eq!(info.nature.as_deref(), Some("公办"));
        assert_eq!(info.location().as_deref(), Some("112.93,28.17"));
    }

    #[test]
    fn test_new_college_rejects_bad_wkt_and_category() {
        let mut body = new_college_json();
        body["shape"] = json!("POINT(112.93)");
        assert!(serde_json::from_value::<NewCollege>(body).is_err());

        let mut body = new_college_json();
        body["category"] = json!("理学");
        assert!(serde_json::from_value::<NewCollege>(body).is_err());
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let new: NewCollege = serde_json::from_value(new_college_json()).unwrap();
        let mut info = CollegeInfo::from(new);
        let patch = json!({"address": "麓山南路932号", "is_985": 0, "name": null});
        let patch: CollegePatch = serde_json::from_value(patch).unwrap();
        patch.apply_to(&mut info);

        assert_eq!(info.address.as_deref(), Some("麓山南路932号"));
        assert!(!info.is_985);
        assert_eq!(info.name, "中南大学");
        assert_eq!(info.city.as_deref(), Some("长沙"));
    }

    #[test]
    fn test_college_serializes_flat() {
        let new: NewCollege = serde_json::from_value(new_college_json()).unwrap();
        let info = CollegeInfo::from(new);
        let college = College { object_id: 7, info };
        let value = serde_json::to_value(&college).unwrap();
        assert_eq!(value["OBJECTID"], 7);
        assert_eq!(value["name"], "中南大学");
        assert_eq!(value["type"], "普通本科");
        assert_eq!(value["shape"], "POINT(112.93 28.17)");
        assert_eq!(value["is_985"], true);
    }
}
