//! WKT validation as request DTOs see it

use validator::Validate;

use bikeshare_server::models::geometry::{validate_linestring, validate_point, validate_polygon, WktError};
use bikeshare_server::zone::CreateMapZoneRequest;

#[test]
fn test_ewkt_prefix_and_case_are_accepted() {
    let c = validate_point("SRID=4326;point(13.0038 55.6050)").unwrap();
    assert_eq!((c.x(), c.y()), (13.0038, 55.6050));
}

#[test]
fn test_point_bounds() {
    assert!(matches!(
        validate_point("POINT(181 0)"),
        Err(WktError::OutOfBounds(_, _))
    ));
    assert!(matches!(
        validate_point("POINT(0 -90.5)"),
        Err(WktError::OutOfBounds(_, _))
    ));
    assert!(validate_point("POINT(-180 90)").is_ok());
}

#[test]
fn test_wrong_geometry_type() {
    assert!(matches!(
        validate_point("LINESTRING(0 0, 1 1)"),
        Err(WktError::WrongType("Point"))
    ));
    assert!(matches!(
        validate_polygon("POINT(1 1)"),
        Err(WktError::WrongType("Polygon"))
    ));
}

#[test]
fn test_linestring_needs_two_points() {
    assert!(validate_linestring("LINESTRING(13.0 55.0, 13.1 55.1, 13.2 55.0)").is_ok());
    assert!(validate_linestring("LINESTRING(13.0 55.0)").is_err());
}

#[test]
fn test_polygon_rings_must_close() {
    assert!(validate_polygon("POLYGON((0 0, 1 0, 1 1, 0 0))").is_ok());
    assert!(validate_polygon("POLYGON((0 0, 1 0, 1 1, 0 1))").is_err());
    assert!(validate_polygon("POLYGON((0 0, 1 1, 0 0))").is_err());
}

#[test]
fn test_non_ascii_text_is_rejected_cleanly() {
    assert!(matches!(validate_point("ÉÉÉ(1 2)"), Err(WktError::Malformed(_))));
    assert!(matches!(
        validate_polygon("SRID=4326;POLYGON((0 0, 1 0, ü 1, 0 0))"),
        Err(WktError::Malformed(_))
    ));
}

#[test]
fn test_map_zone_request_reports_boundary_field() {
    let request: CreateMapZoneRequest = serde_json::from_value(serde_json::json!({
        "zone_name": "Centrum",
        "zone_type_id": 1,
        "city_id": 1,
        "boundary": "POLYGON((0 0, 1 0, 1 1))"
    }))
    .unwrap();

    let errors = request.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("boundary"));
}
