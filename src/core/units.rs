//! Linear, angular and area unit conversion
//!
//! Unit names typed by users are loose ("m", "Meters", "US_Survey_Feet",
//! "sq. km"). Each canonical unit carries a case-insensitive pattern; names
//! are matched against the patterns of one family, most specific first.
//! Conversions go through the family's base unit (meters, radians, square
//! meters) unless both sides are the same unit.

use crate::types::{MaError, MaResult};
use regex::Regex;
use std::f64::consts::PI;
use std::sync::OnceLock;

/// A unit belonging to one family with a fixed factor to the family base
pub trait MeasureUnit: Copy + PartialEq + std::fmt::Debug + 'static {
    /// Family name used in messages ("linear", "angular", "area")
    const FAMILY: &'static str;

    /// Units of the family, in pattern-matching order
    fn all() -> &'static [Self];

    /// Canonical display name
    fn name(&self) -> &'static str;

    /// Lenient recognition pattern, matched against a normalized name
    fn pattern(&self) -> &'static str;

    /// Size of one unit expressed in the family base unit
    fn to_base(&self) -> f64;

    /// Compiled patterns for the family
    fn compiled() -> &'static [(Self, Regex)];
}

fn compile_patterns<U: MeasureUnit>() -> Vec<(U, Regex)> {
    U::all()
        .iter()
        .filter_map(|unit| match Regex::new(&format!("(?i)^(?:{})$", unit.pattern())) {
            Ok(re) => Some((*unit, re)),
            Err(e) => {
                log::error!("Invalid pattern for {}: {}", unit.name(), e);
                None
            }
        })
        .collect()
}

/// Collapse separators so "US_Survey  Feet" and "us survey feet" look alike
fn normalize_name(name: &str) -> String {
    name.trim()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Resolve a loosely formatted unit name to a canonical unit of family `U`
pub fn parse_unit<U: MeasureUnit>(name: &str) -> MaResult<U> {
    let normalized = normalize_name(name);

    if let Some(unit) = U::all().iter().find(|u| u.name() == normalized) {
        return Ok(*unit);
    }

    U::compiled()
        .iter()
        .find(|(_, re)| re.is_match(&normalized))
        .map(|(unit, _)| *unit)
        .ok_or_else(|| MaError::UnknownUnit(format!("{} ({} units)", name, U::FAMILY)))
}

/// Convert `value` between two units of the same family
pub fn convert<U: MeasureUnit>(value: f64, from: U, to: U) -> f64 {
    if from == to {
        return value;
    }
    value * from.to_base() / to.to_base()
}

fn convert_named<U: MeasureUnit>(value: f64, from: &str, to: &str) -> MaResult<f64> {
    let from_unit: U = parse_unit(from)?;
    let to_unit: U = parse_unit(to)?;
    let out = convert(value, from_unit, to_unit);
    log::debug!(
        "Converted {} {} to {} {}",
        value,
        from_unit.name(),
        out,
        to_unit.name()
    );
    Ok(out)
}

/// Linear units; base unit is the meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinearUnit {
    Meters,
    Kilometers,
    Feet,
    UsSurveyFeet,
    Miles,
    NauticalMiles,
}

impl MeasureUnit for LinearUnit {
    const FAMILY: &'static str = "linear";

    fn all() -> &'static [Self] {
        // Survey feet before feet, nautical miles before miles, km before m
        &[
            LinearUnit::UsSurveyFeet,
            LinearUnit::Feet,
            LinearUnit::NauticalMiles,
            LinearUnit::Miles,
            LinearUnit::Kilometers,
            LinearUnit::Meters,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            LinearUnit::Meters => "meters",
            LinearUnit::Kilometers => "kilometers",
            LinearUnit::Feet => "feet",
            LinearUnit::UsSurveyFeet => "us survey feet",
            LinearUnit::Miles => "miles",
            LinearUnit::NauticalMiles => "nautical miles",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            LinearUnit::Meters => r"m(et(er|re)s?)?|meter|metre",
            LinearUnit::Kilometers => r"k(ilo)?m(et(er|re)s?)?|kilometer|kilometre",
            LinearUnit::Feet => r"f(ee|oo)?t|international ?f(ee|oo)?t",
            LinearUnit::UsSurveyFeet => r"us ?survey ?f(ee|oo)?t|ftus|us ?ft|survey ?f(ee|oo)?t",
            LinearUnit::Miles => r"mi(les?)?|statute ?miles?",
            LinearUnit::NauticalMiles => r"n(aut(ical)?)?\.? ?m(i(les?)?)?",
        }
    }

    fn to_base(&self) -> f64 {
        match self {
            LinearUnit::Meters => 1.0,
            LinearUnit::Kilometers => 1000.0,
            LinearUnit::Feet => 0.3048,
            LinearUnit::UsSurveyFeet => 1200.0 / 3937.0,
            LinearUnit::Miles => 1609.344,
            LinearUnit::NauticalMiles => 1852.0,
        }
    }

    fn compiled() -> &'static [(Self, Regex)] {
        static PATTERNS: OnceLock<Vec<(LinearUnit, Regex)>> = OnceLock::new();
        PATTERNS.get_or_init(compile_patterns::<LinearUnit>)
    }
}

/// Angular units; base unit is the radian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AngularUnit {
    Degrees,
    Radians,
    Gradians,
    Mils,
}

impl MeasureUnit for AngularUnit {
    const FAMILY: &'static str = "angular";

    fn all() -> &'static [Self] {
        &[
            AngularUnit::Gradians,
            AngularUnit::Radians,
            AngularUnit::Degrees,
            AngularUnit::Mils,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            AngularUnit::Degrees => "degrees",
            AngularUnit::Radians => "radians",
            AngularUnit::Gradians => "gradians",
            AngularUnit::Mils => "mils",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            AngularUnit::Degrees => r"deg(\.|rees?|s)?|decimal ?degrees?|°",
            AngularUnit::Radians => r"rad(ians?|s)?",
            AngularUnit::Gradians => r"grad(ians?|s)?|gons?",
            AngularUnit::Mils => r"mils?",
        }
    }

    fn to_base(&self) -> f64 {
        match self {
            AngularUnit::Degrees => PI / 180.0,
            AngularUnit::Radians => 1.0,
            AngularUnit::Gradians => 2.0 * PI / 400.0,
            AngularUnit::Mils => 2.0 * PI / 6400.0,
        }
    }

    fn compiled() -> &'static [(Self, Regex)] {
        static PATTERNS: OnceLock<Vec<(AngularUnit, Regex)>> = OnceLock::new();
        PATTERNS.get_or_init(compile_patterns::<AngularUnit>)
    }
}

/// Area units; base unit is the square meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaUnit {
    SquareMeters,
    SquareFeet,
    SquareKilometers,
    SquareMiles,
    Acres,
    Hectares,
}

impl MeasureUnit for AreaUnit {
    const FAMILY: &'static str = "area";

    fn all() -> &'static [Self] {
        &[
            AreaUnit::SquareKilometers,
            AreaUnit::SquareMiles,
            AreaUnit::SquareFeet,
            AreaUnit::SquareMeters,
            AreaUnit::Acres,
            AreaUnit::Hectares,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            AreaUnit::SquareMeters => "square meters",
            AreaUnit::SquareFeet => "square feet",
            AreaUnit::SquareKilometers => "square kilometers",
            AreaUnit::SquareMiles => "square miles",
            AreaUnit::Acres => "acres",
            AreaUnit::Hectares => "hectares",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            AreaUnit::SquareMeters => r"sq(uare)?\.? ?m(et(er|re)s?)?|m2|m\^2",
            AreaUnit::SquareFeet => r"sq(uare)?\.? ?f(ee|oo)?t|ft2|ft\^2",
            AreaUnit::SquareKilometers => r"sq(uare)?\.? ?k(ilo)?m(et(er|re)s?)?|km2|km\^2",
            AreaUnit::SquareMiles => r"sq(uare)?\.? ?mi(les?)?|mi2|mi\^2",
            AreaUnit::Acres => r"ac(res?|s)?",
            AreaUnit::Hectares => r"h(ect)?a(res?)?|has",
        }
    }

    fn to_base(&self) -> f64 {
        match self {
            AreaUnit::SquareMeters => 1.0,
            AreaUnit::SquareFeet => 0.09290304,
            AreaUnit::SquareKilometers => 1.0e6,
            AreaUnit::SquareMiles => 2589998.0,
            AreaUnit::Acres => 4046.856,
            AreaUnit::Hectares => 10000.0,
        }
    }

    fn compiled() -> &'static [(Self, Regex)] {
        static PATTERNS: OnceLock<Vec<(AreaUnit, Regex)>> = OnceLock::new();
        PATTERNS.get_or_init(compile_patterns::<AreaUnit>)
    }
}

macro_rules! unit_str_impls {
    ($($unit:ty),*) => {
        $(
            impl std::str::FromStr for $unit {
                type Err = MaError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    parse_unit(s)
                }
            }

            impl std::fmt::Display for $unit {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.name())
                }
            }
        )*
    };
}

unit_str_impls!(LinearUnit, AngularUnit, AreaUnit);

/// Convert between linear units named by free-form strings
pub fn convert_linear_units(value: f64, from: &str, to: &str) -> MaResult<f64> {
    convert_named::<LinearUnit>(value, from, to)
}

/// Convert between angular units named by free-form strings
pub fn convert_angular_units(value: f64, from: &str, to: &str) -> MaResult<f64> {
    convert_named::<AngularUnit>(value, from, to)
}

/// Convert between area units named by free-form strings
pub fn convert_area_units(value: f64, from: &str, to: &str) -> MaResult<f64> {
    convert_named::<AreaUnit>(value, from, to)
}
