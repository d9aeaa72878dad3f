//! Field definitions and the fixed schemas the toolbox creates

use crate::types::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Short,
    Long,
    Float,
    Double,
    Date,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::Text => "TEXT",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Date => "DATE",
        };
        write!(f, "{}", name)
    }
}

/// A single attribute field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub length: Option<u32>,
    pub nullable: bool,
    pub required: bool,
}

impl FieldDef {
    pub fn text(name: &str, length: u32) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Text,
            precision: None,
            scale: None,
            length: Some(length),
            nullable: true,
            required: false,
        }
    }

    pub fn long(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Long,
            precision: None,
            scale: None,
            length: None,
            nullable: true,
            required: false,
        }
    }

    /// DOUBLE(8, 4) with a display length of 12
    pub fn double(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Double,
            precision: Some(8),
            scale: Some(4),
            length: Some(12),
            nullable: true,
            required: false,
        }
    }
}

impl std::fmt::Display for FieldDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let opt = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        write!(
            f,
            "{} {} precision={} scale={} length={} {}",
            self.name,
            self.field_type,
            opt(self.precision),
            opt(self.scale),
            opt(self.length),
            if self.nullable { "NULLABLE" } else { "NON_NULLABLE" }
        )
    }
}

/// Attribute value stored in a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Long(i64),
    Double(f64),
    Null,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(v) => Some(*v),
            FieldValue::Long(v) => Some(*v as f64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Long(v) => Some(v.to_string()),
            FieldValue::Double(v) => Some(v.to_string()),
            FieldValue::Null => None,
        }
    }
}

/// A table row or feature: optional point geometry plus named attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub geometry: Option<Point>,
    pub values: BTreeMap<String, FieldValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geometry(point: Point) -> Self {
        Self {
            geometry: Some(point),
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, field: &str, value: FieldValue) {
        self.values.insert(field.to_string(), value);
    }

    /// Case-insensitive field lookup
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, value)| value)
    }
}

/// Observer modifier fields, in the order they are added
pub const OBSERVER_FIELDS: [&str; 8] = [
    "OFFSETA", "OFFSETB", "VERT1", "VERT2", "AZIMUTH1", "AZIMUTH2", "RADIUS1", "RADIUS2",
];

/// Coordinate fields an observer table must carry on top of the modifiers
pub const OBSERVER_TABLE_COORD_FIELDS: [&str; 2] = ["X", "Y"];

pub const FULL_NAME_LENGTH: u32 = 260;
pub const DTED_TYPE_LENGTH: u32 = 15;
pub const PRODUCT_LENGTH: u32 = 25;
pub const SERIES_LENGTH: u32 = 5;

pub fn observer_fields() -> Vec<FieldDef> {
    OBSERVER_FIELDS.iter().map(|name| FieldDef::double(name)).collect()
}

pub fn dted_catalog_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::text("FULL_NAME", FULL_NAME_LENGTH),
        FieldDef::text("DTED_TYPE", DTED_TYPE_LENGTH),
    ]
}

pub fn rpf_catalog_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::text("FULL_NAME", FULL_NAME_LENGTH),
        FieldDef::text("PRODUCT", PRODUCT_LENGTH),
        FieldDef::text("SERIES", SERIES_LENGTH),
        FieldDef::long("SCALE"),
    ]
}

/// Companion table listing product/scale pairs of an RPF catalog
pub fn rpf_uid_table_fields() -> Vec<FieldDef> {
    vec![FieldDef::text("PRODUCT", PRODUCT_LENGTH), FieldDef::long("SCALE")]
}

/// Name of the companion uid table for an RPF catalog
pub fn rpf_uid_table_name(catalog_name: &str) -> String {
    format!("{}_uids", catalog_name)
}

/// Name of the coverage table of a VPF catalog
pub fn vpf_table_name(catalog_name: &str) -> String {
    format!("{}_features", catalog_name)
}

/// Tile polygons of a VPF catalog
pub fn vpf_feature_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::text("PRODUCT", PRODUCT_LENGTH),
        FieldDef::text("LIBRARY", 20),
        FieldDef::long("SCALE"),
        FieldDef::long("TILE_ID"),
    ]
}

/// Coverage/feature-class listing of a VPF catalog
pub fn vpf_table_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::text("PRODUCT", PRODUCT_LENGTH),
        FieldDef::text("PATH", 255),
        FieldDef::text("LIBRARY", 20),
        FieldDef::text("COVERAGE", 15),
        FieldDef::text("FEAT_CLS", 10),
        FieldDef::text("COV_DESC", 100),
        FieldDef::text("FC_DESC", 100),
        FieldDef::text("FC_TYPE", 1),
        FieldDef::long("GEOSYM_PID"),
        FieldDef::text("FAC_CODES", 100),
    ]
}

/// Names from `required` that are absent from `present`, keeping `required` order.
/// Field names compare case-insensitively.
pub fn missing_fields<S: AsRef<str>>(present: &[S], required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|req| !present.iter().any(|p| p.as_ref().eq_ignore_ascii_case(req)))
        .map(|req| req.to_string())
        .collect()
}
