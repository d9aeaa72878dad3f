use approx::assert_relative_eq;
use matools::core::units::{AngularUnit, AreaUnit, LinearUnit, MeasureUnit};
use matools::{convert_angular_units, convert_area_units, convert_linear_units, MaError, MaResult};

const MAGNITUDES: [f64; 7] = [0.0, 1.0, -1.0, -250.75, 1e-6, 1e9, 12345.678];

/// Every unit of a family converts to the base unit and back to the input value
fn assert_round_trips<U: MeasureUnit>(base: &str, convert: fn(f64, &str, &str) -> MaResult<f64>) {
    for unit in U::all() {
        for value in MAGNITUDES {
            let there = convert(value, unit.name(), base).unwrap();
            let back = convert(there, base, unit.name()).unwrap();
            assert_relative_eq!(back, value, max_relative = 1e-12);
        }
    }
}

#[test]
fn test_linear_conversions() {
    assert_relative_eq!(convert_linear_units(1.0, "km", "m").unwrap(), 1000.0);
    assert_relative_eq!(convert_linear_units(1000.0, "Meters", "Kilometers").unwrap(), 1.0);
    assert_relative_eq!(convert_linear_units(1.0, "miles", "feet").unwrap(), 5280.0, epsilon = 1e-9);
    assert_relative_eq!(convert_linear_units(1.0, "Nautical Miles", "meters").unwrap(), 1852.0);
    assert_relative_eq!(
        convert_linear_units(3937.0, "US_Survey_Feet", "meters").unwrap(),
        1200.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_angular_conversions() {
    assert_relative_eq!(
        convert_angular_units(180.0, "degrees", "radians").unwrap(),
        std::f64::consts::PI
    );
    assert_relative_eq!(convert_angular_units(400.0, "gradians", "degrees").unwrap(), 360.0, epsilon = 1e-9);
    assert_relative_eq!(convert_angular_units(6400.0, "mils", "deg").unwrap(), 360.0, epsilon = 1e-9);
}

#[test]
fn test_area_conversions() {
    assert_relative_eq!(convert_area_units(1.0, "sq. km", "square meters").unwrap(), 1.0e6);
    assert_relative_eq!(convert_area_units(1.0, "hectares", "m2").unwrap(), 10000.0);
    assert_relative_eq!(convert_area_units(100.0, "hectares", "square kilometers").unwrap(), 1.0);
    assert_relative_eq!(convert_area_units(1.0, "acres", "square meters").unwrap(), 4046.856);
}

#[test]
fn test_same_unit_is_identity() {
    let value = 0.1 + 0.2;
    assert_eq!(convert_linear_units(value, "feet", "ft").unwrap(), value);
    assert_eq!(convert_area_units(value, "Acres", "ACRES").unwrap(), value);
}

#[test]
fn test_zero_and_negative_values() {
    assert_eq!(convert_linear_units(0.0, "km", "m").unwrap(), 0.0);
    assert_relative_eq!(convert_linear_units(-2.0, "km", "m").unwrap(), -2000.0);
}

#[test]
fn test_unknown_units_are_errors() {
    assert!(matches!(
        convert_linear_units(1.0, "furlongs", "m"),
        Err(MaError::UnknownUnit(_))
    ));
    assert!(matches!(
        convert_area_units(1.0, "sq. km", "km"),
        Err(MaError::UnknownUnit(_))
    ));
    // Units from another family are not recognized
    assert!(convert_angular_units(1.0, "meters", "degrees").is_err());
}

#[test]
fn test_linear_round_trip_through_meters() {
    assert_round_trips::<LinearUnit>("meters", convert_linear_units);
}

#[test]
fn test_angular_round_trip_through_radians() {
    assert_round_trips::<AngularUnit>("radians", convert_angular_units);
}

#[test]
fn test_area_round_trip_through_square_meters() {
    assert_round_trips::<AreaUnit>("square meters", convert_area_units);
}
