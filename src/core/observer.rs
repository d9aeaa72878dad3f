//! Observer records used to parameterize visibility analysis

use crate::core::envelope::z_factor;
use crate::core::schema::{
    missing_fields, FieldValue, Row, OBSERVER_FIELDS, OBSERVER_TABLE_COORD_FIELDS,
};
use crate::core::units::convert_linear_units;
use crate::types::{Envelope, MaError, MaResult, Point, SpatialReference, SpatialReferenceKind};

/// Search radii are padded by this factor when sizing an analysis extent
const RADIUS_BUFFER: f64 = 1.5;

/// A visibility observer with its angular and distance modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct Observer {
    pub x: f64,
    pub y: f64,
    /// Surface elevation at the observer, when known
    pub z: Option<f64>,
    /// Height of the observer above the surface (OFFSETA)
    pub offset_a: f64,
    /// Height added to target cells (OFFSETB)
    pub offset_b: f64,
    /// Near search distance (RADIUS1)
    pub radius1: f64,
    /// Far search distance (RADIUS2)
    pub radius2: f64,
    /// Left azimuth limit in degrees (AZIMUTH1)
    pub azimuth1: f64,
    /// Right azimuth limit in degrees (AZIMUTH2)
    pub azimuth2: f64,
    /// Upper vertical angle (VERT1)
    pub vert1: f64,
    /// Lower vertical angle (VERT2)
    pub vert2: f64,
    pub spatial_reference: SpatialReference,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: None,
            offset_a: 0.0,
            offset_b: 0.0,
            radius1: 0.0,
            radius2: 1000.0,
            azimuth1: 0.0,
            azimuth2: 360.0,
            vert1: 90.0,
            vert2: -90.0,
            spatial_reference: SpatialReference::geographic_wgs84(),
        }
    }
}

/// Text-encoded tool parameters for one observer.
///
/// Empty strings and "#" leave the corresponding default in place.
#[derive(Debug, Clone, Default)]
pub struct ObserverParams {
    pub x: Option<String>,
    pub y: Option<String>,
    pub z: Option<String>,
    pub offset_a: Option<String>,
    pub offset_b: Option<String>,
    pub radius1: Option<String>,
    pub radius2: Option<String>,
    pub azimuth1: Option<String>,
    pub azimuth2: Option<String>,
    pub vert1: Option<String>,
    pub vert2: Option<String>,
}

fn parse_param(name: &str, value: &Option<String>) -> MaResult<Option<f64>> {
    match value.as_deref().map(str::trim) {
        None | Some("") | Some("#") => Ok(None),
        Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
            MaError::InvalidParameter(format!("{} must be a number, got '{}'", name, text))
        }),
    }
}

impl Observer {
    /// Observer at (x, y) with default modifiers
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    /// Build an observer from tool parameters; X and Y are required
    pub fn from_params(params: &ObserverParams, sr: Option<SpatialReference>) -> MaResult<Self> {
        let x = parse_param("X", &params.x)?;
        let y = parse_param("Y", &params.y)?;
        let (x, y) = match (x, y) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                return Err(MaError::InvalidParameter(
                    "Coordinate values X and Y are empty".to_string(),
                ))
            }
        };

        let mut observer = Observer::at(x, y);
        observer.z = parse_param("Z", &params.z)?;

        let modifiers: [(&str, &Option<String>, &mut f64); 8] = [
            ("OFFSETA", &params.offset_a, &mut observer.offset_a),
            ("OFFSETB", &params.offset_b, &mut observer.offset_b),
            ("RADIUS1", &params.radius1, &mut observer.radius1),
            ("RADIUS2", &params.radius2, &mut observer.radius2),
            ("AZIMUTH1", &params.azimuth1, &mut observer.azimuth1),
            ("AZIMUTH2", &params.azimuth2, &mut observer.azimuth2),
            ("VERT1", &params.vert1, &mut observer.vert1),
            ("VERT2", &params.vert2, &mut observer.vert2),
        ];
        for (name, raw, slot) in modifiers {
            if let Some(value) = parse_param(name, raw)? {
                *slot = value;
            }
        }

        if let Some(sr) = sr {
            observer.spatial_reference = sr;
        }

        log::debug!("Observer from parameters: {:?}", observer);
        Ok(observer)
    }

    /// Read an observer back from a feature, falling back to defaults for absent fields
    pub fn from_row(row: &Row, sr: SpatialReference) -> MaResult<Self> {
        let point = row.geometry.ok_or_else(|| {
            MaError::InvalidParameter("Observer feature has no point geometry".to_string())
        })?;
        let mut observer = Observer::at(point.x, point.y);
        observer.spatial_reference = sr;

        let value = |field: &str, default: f64| {
            row.get(field).and_then(FieldValue::as_f64).unwrap_or(default)
        };
        observer.offset_a = value("OFFSETA", observer.offset_a);
        observer.offset_b = value("OFFSETB", observer.offset_b);
        observer.radius1 = value("RADIUS1", observer.radius1);
        observer.radius2 = value("RADIUS2", observer.radius2);
        observer.azimuth1 = value("AZIMUTH1", observer.azimuth1);
        observer.azimuth2 = value("AZIMUTH2", observer.azimuth2);
        observer.vert1 = value("VERT1", observer.vert1);
        observer.vert2 = value("VERT2", observer.vert2);
        // Observer elevation is stored in the geometry with OFFSETA already added
        observer.z = point.z.map(|z| z - observer.offset_a);
        Ok(observer)
    }

    /// Feature to insert for this observer.
    ///
    /// The geometry z, when set, is the surface elevation plus OFFSETA.
    pub fn to_row(&self) -> Row {
        let mut row = Row::with_geometry(Point {
            x: self.x,
            y: self.y,
            z: self.z.map(|z| z + self.offset_a),
        });
        row.set("OFFSETA", FieldValue::Double(self.offset_a));
        row.set("OFFSETB", FieldValue::Double(self.offset_b));
        row.set("VERT1", FieldValue::Double(self.vert1));
        row.set("VERT2", FieldValue::Double(self.vert2));
        row.set("AZIMUTH1", FieldValue::Double(self.azimuth1));
        row.set("AZIMUTH2", FieldValue::Double(self.azimuth2));
        row.set("RADIUS1", FieldValue::Double(self.radius1));
        row.set("RADIUS2", FieldValue::Double(self.radius2));
        row
    }

    pub fn max_radius(&self) -> f64 {
        self.radius1.max(self.radius2)
    }
}

/// Observer modifier fields missing from a feature class
pub fn missing_observer_fields<S: AsRef<str>>(field_names: &[S]) -> Vec<String> {
    missing_fields(field_names, &OBSERVER_FIELDS)
}

/// Fields missing from a table that observers are created from (adds X and Y)
pub fn missing_observer_table_fields<S: AsRef<str>>(field_names: &[S]) -> Vec<String> {
    let required: Vec<&str> = OBSERVER_TABLE_COORD_FIELDS
        .iter()
        .chain(OBSERVER_FIELDS.iter())
        .copied()
        .collect();
    missing_fields(field_names, &required)
}

/// Expand the extent of a set of observers by 1.5 times their largest radius.
///
/// Radii are in `distance_units`. For geographic data the padding is converted
/// to meters and then to degrees with the z-factor of the extent's
/// mid-latitude; for projected data it is converted to the dataset's linear unit.
pub fn observer_extent(
    extent: &Envelope,
    observers: &[Observer],
    distance_units: &str,
    spatial_reference: &SpatialReference,
) -> MaResult<Envelope> {
    let max_radius = observers
        .iter()
        .map(Observer::max_radius)
        .fold(0.0_f64, f64::max);
    let padded = max_radius * RADIUS_BUFFER;

    let distance = match &spatial_reference.kind {
        SpatialReferenceKind::Geographic => {
            let meters = convert_linear_units(padded, distance_units, "meters")?;
            meters * z_factor(extent.mid_latitude())?
        }
        SpatialReferenceKind::Projected { linear_unit } => {
            convert_linear_units(padded, distance_units, linear_unit)?
        }
        SpatialReferenceKind::Unknown => return Err(MaError::UnknownCoordinateSystem),
    };

    log::debug!(
        "Observer extent padding: {} {} -> {} dataset units",
        padded,
        distance_units,
        distance
    );
    Ok(extent.expand(distance))
}
