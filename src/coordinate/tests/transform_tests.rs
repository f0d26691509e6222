//! Tests for the coordinate transform engine

extern crate std;

use std::sync::Arc;
use approx::assert_abs_diff_eq;

use super::test_utils::{count_failures, hits, registry, transform_between, UTM31N_WKT, WGS84_WKT};
use crate::coordinate::{CoordinateTransform, Point, TransformDirection, TransformStatus};
use crate::crs::{Crs, CrsError, CrsIdType, CrsResolver};

use TransformDirection::{Forward, Reverse};

#[test]
fn test_same_crs_is_short_circuited() {
    let transform = transform_between("EPSG:4326", "EPSG:4326");
    std::assert!(transform.is_initialised());
    std::assert!(transform.is_short_circuited());
    std::assert_eq!(transform.status(), TransformStatus::ShortCircuited);

    let p = Point::new_3d(12.5, -45.25, 130.0);
    std::assert_eq!(transform.transform(&p, Forward).unwrap(), p);
    std::assert_eq!(transform.transform(&p, Reverse).unwrap(), p);
}

#[test]
fn test_short_circuit_passes_non_finite_values_through() {
    let transform = transform_between("EPSG:3857", "EPSG:3857");

    let p = transform.transform(&Point::new(f64::NAN, f64::INFINITY), Forward).unwrap();
    std::assert!(p.x.is_nan());
    std::assert_eq!(p.y, f64::INFINITY);

    let huge = Point::new(f64::MAX, -f64::MAX);
    std::assert_eq!(transform.transform(&huge, Forward).unwrap(), huge);
}

#[test]
fn test_alias_resolves_to_equivalent_crs() {
    let transform = transform_between("WGS84", "EPSG:4326");
    std::assert!(transform.is_short_circuited());
}

#[test]
fn test_wgs84_to_web_mercator() {
    let transform = transform_between("EPSG:4326", "EPSG:3857");
    std::assert_eq!(transform.status(), TransformStatus::Active);
    std::assert!(!transform.is_short_circuited());

    let origin = transform.transform_xy(0.0, 0.0, Forward).unwrap();
    assert_abs_diff_eq!(origin.x, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(origin.y, 0.0, epsilon = 1e-6);

    let p = transform.transform_xy(10.0, 20.0, Forward).unwrap();
    assert_abs_diff_eq!(p.x, 1_113_194.907_932_7, epsilon = 1e-3);
    std::assert!(p.y > 2_000_000.0 && p.y < 2_500_000.0);

    // Deterministic across calls
    std::assert_eq!(transform.transform_xy(10.0, 20.0, Forward).unwrap(), p);
}

#[test]
fn test_utm_origin_offset() {
    let transform = transform_between("EPSG:4326", "EPSG:32631");
    let p = transform.transform_xy(3.0, 0.0, Forward).unwrap();
    assert_abs_diff_eq!(p.x, 500_000.0, epsilon = 1e-4);
    assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-4);
}

#[test]
fn test_round_trip() {
    let pairs = [("EPSG:4326", "EPSG:3857"), ("EPSG:4326", "EPSG:32631"), ("EPSG:3857", "EPSG:32631")];
    let geographic = [(2.35, 48.85), (-0.5, 10.0), (4.0, -33.3)];

    for (source, destination) in pairs {
        let to_source = transform_between("EPSG:4326", source);
        let transform = transform_between(source, destination);

        for &(lon, lat) in &geographic {
            let p = to_source.transform_xy(lon, lat, Forward).unwrap();
            let there = transform.transform(&p, Forward).unwrap();
            let back = transform.transform(&there, Reverse).unwrap();
            assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-6);
            assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_z_is_carried_through() {
    let transform = transform_between("EPSG:4326", "EPSG:3857");

    let flat = transform.transform(&Point::new(1.0, 1.0), Forward).unwrap();
    std::assert!(!flat.has_z());

    let raised = transform.transform(&Point::new_3d(1.0, 1.0, 250.0), Forward).unwrap();
    std::assert!(raised.has_z());
    assert_abs_diff_eq!(raised.z_value(), 250.0, epsilon = 1e-6);
}

#[test]
fn test_in_place_matches_point_path() {
    let transform = transform_between("EPSG:4326", "EPSG:32631");
    let expected = transform.transform(&Point::new_3d(5.0, 45.0, 0.0), Forward).unwrap();

    let (mut x, mut y, mut z) = (5.0, 45.0, 0.0);
    transform.transform_in_place(&mut x, &mut y, &mut z, Forward).unwrap();
    std::assert_eq!((x, y, z), (expected.x, expected.y, expected.z_value()));
}

#[test]
fn test_in_place_failure_leaves_values() {
    let transform = transform_between("EPSG:4326", "EPSG:3857");
    let (mut x, mut y, mut z) = (0.0, 95.0, 0.0);
    std::assert!(transform.transform_in_place(&mut x, &mut y, &mut z, Forward).is_err());
    std::assert_eq!((x, y, z), (0.0, 95.0, 0.0));
}

#[test]
fn test_out_of_domain_input_fails_and_notifies() {
    let mut transform = transform_between("EPSG:4326", "EPSG:3857");
    let failures = count_failures(&mut transform);
    let (_, receiver) = transform.invalid_transform_channel();

    let err = transform.transform_xy(0.0, 95.0, Forward).unwrap_err();
    let failure = err.transform_failure().unwrap();
    std::assert_eq!(failure.coordinate, Some((0.0, 95.0, 0.0)));
    std::assert_eq!(failure.direction, Forward);

    std::assert_eq!(hits(&failures), 1);
    std::assert_eq!(&receiver.try_recv().unwrap(), failure);

    // The transform itself stays usable
    std::assert_eq!(transform.status(), TransformStatus::Active);
    std::assert!(transform.transform_xy(1.0, 1.0, Forward).is_ok());
    std::assert_eq!(hits(&failures), 1);
}

#[test]
fn test_far_pole_of_polar_stereographic_fails() {
    let mut transform = transform_between("EPSG:4326", "EPSG:3413");
    let failures = count_failures(&mut transform);

    // The north pole is the projection origin, whatever the longitude
    for lon in [-45.0, 10.0] {
        let north = transform.transform_xy(lon, 90.0, Forward).unwrap();
        assert_abs_diff_eq!(north.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(north.y, 0.0, epsilon = 1e-6);
    }

    // The south pole is singular and must not land on the origin
    let err = transform.transform_xy(-45.0, -90.0, Forward).unwrap_err();
    std::assert_eq!(err.transform_failure().unwrap().coordinate, Some((-45.0, -90.0, 0.0)));
    std::assert_eq!(hits(&failures), 1);

    let mut xs = [-45.0, -45.0];
    let mut ys = [60.0, -90.0];
    std::assert!(transform.transform_coords(&mut xs, &mut ys, None, Forward).is_err());
    std::assert_eq!(ys, [60.0, -90.0]);
    std::assert_eq!(hits(&failures), 2);

    // Points away from the singularity still transform
    let greenland = transform.transform_xy(-45.0, 70.0, Forward).unwrap();
    let back = transform.transform(&greenland, Reverse).unwrap();
    assert_abs_diff_eq!(back.x, -45.0, epsilon = 1e-7);
    assert_abs_diff_eq!(back.y, 70.0, epsilon = 1e-7);
}

#[test]
fn test_wrapped_longitude_is_accepted() {
    let transform = transform_between("EPSG:4326", "EPSG:3857");
    let wrapped = transform.transform_xy(190.0, 10.0, Forward).unwrap();
    let expected = transform.transform_xy(-170.0, 10.0, Forward).unwrap();
    assert_abs_diff_eq!(wrapped.x, expected.x, epsilon = 1e-3);
    assert_abs_diff_eq!(wrapped.y, expected.y, epsilon = 1e-3);
}

#[test]
fn test_non_finite_input_fails_when_active() {
    let mut transform = transform_between("EPSG:4326", "EPSG:3857");
    let failures = count_failures(&mut transform);
    std::assert!(matches!(transform.transform_xy(f64::NAN, 0.0, Forward), Err(CrsError::Transform(_))));
    std::assert_eq!(hits(&failures), 1);
}

#[test]
fn test_removed_observer_is_not_called() {
    let mut transform = transform_between("EPSG:4326", "EPSG:3857");
    let hits_counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&hits_counter);
    let id = transform.on_invalid_transform(move |_| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    std::assert!(transform.remove_observer(id));
    std::assert!(transform.transform_xy(0.0, 100.0, Forward).is_err());
    std::assert_eq!(hits(&hits_counter), 0);
}

#[test]
fn test_batch_matches_single_point_transform() {
    let transform = transform_between("EPSG:4326", "EPSG:32631");
    let input = [(0.5, 40.0, 10.0), (3.0, 45.0, 20.0), (6.5, 50.5, 30.0), (1.0, -20.0, 0.0)];

    let mut xs: Vec<f64> = input.iter().map(|c| c.0).collect();
    let mut ys: Vec<f64> = input.iter().map(|c| c.1).collect();
    let mut zs: Vec<f64> = input.iter().map(|c| c.2).collect();
    transform.transform_coords(&mut xs, &mut ys, Some(&mut zs), Forward).unwrap();

    for (i, &(x, y, z)) in input.iter().enumerate() {
        let single = transform.transform(&Point::new_3d(x, y, z), Forward).unwrap();
        assert_abs_diff_eq!(xs[i], single.x, epsilon = 1e-9);
        assert_abs_diff_eq!(ys[i], single.y, epsilon = 1e-9);
        assert_abs_diff_eq!(zs[i], single.z_value(), epsilon = 1e-9);
    }
}

#[test]
fn test_batch_without_z() {
    let transform = transform_between("EPSG:4326", "EPSG:3857");
    let mut xs = [0.0, 10.0];
    let mut ys = [0.0, 0.0];
    transform.transform_coords(&mut xs, &mut ys, None, Forward).unwrap();
    assert_abs_diff_eq!(xs[1], 1_113_194.907_932_7, epsilon = 1e-3);
    assert_abs_diff_eq!(ys[0], 0.0, epsilon = 1e-6);
}

#[test]
fn test_batch_is_all_or_nothing() {
    let mut transform = transform_between("EPSG:4326", "EPSG:3857");
    let failures = count_failures(&mut transform);

    let mut xs = [1.0, 2.0, 3.0];
    let mut ys = [10.0, 95.0, 20.0];
    let err = transform.transform_coords(&mut xs, &mut ys, None, Forward).unwrap_err();

    std::assert_eq!(err.transform_failure().map(|f| f.count), Some(3));
    std::assert_eq!(xs, [1.0, 2.0, 3.0]);
    std::assert_eq!(ys, [10.0, 95.0, 20.0]);
    std::assert_eq!(hits(&failures), 1);
}

#[test]
fn test_batch_length_mismatch() {
    let transform = transform_between("EPSG:4326", "EPSG:3857");
    let mut xs = [1.0, 2.0];
    let mut ys = [1.0];
    std::assert!(matches!(
        transform.transform_coords(&mut xs, &mut ys, None, Forward),
        Err(CrsError::InvalidInput(_))
    ));

    let mut ys = [1.0, 2.0];
    let mut zs = [0.0; 3];
    std::assert!(matches!(
        transform.transform_coords(&mut xs, &mut ys, Some(&mut zs), Forward),
        Err(CrsError::InvalidInput(_))
    ));
}

#[test]
fn test_batch_short_circuit_is_noop() {
    let transform = transform_between("EPSG:3857", "EPSG:3857");
    let mut xs = [f64::NAN, 5.0];
    let mut ys = [1.0, 1e300];
    transform.transform_coords(&mut xs, &mut ys, None, Forward).unwrap();
    std::assert!(xs[0].is_nan());
    std::assert_eq!(ys, [1.0, 1e300]);
}

#[test]
fn test_transform_points() {
    let transform = transform_between("EPSG:4326", "EPSG:3857");
    let mut ring = vec![Point::new(0.0, 0.0), Point::new_3d(10.0, 0.0, 5.0), Point::new(10.0, 10.0)];
    transform.transform_points(&mut ring, Forward).unwrap();

    assert_abs_diff_eq!(ring[1].x, 1_113_194.907_932_7, epsilon = 1e-3);
    std::assert!(!ring[0].has_z());
    std::assert!(ring[1].has_z());

    transform.transform_points(&mut ring, Reverse).unwrap();
    assert_abs_diff_eq!(ring[2].x, 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(ring[2].y, 10.0, epsilon = 1e-9);
}

#[test]
fn test_set_dest_crs_reinitialises() {
    let registry = registry();
    let mut transform = transform_between("EPSG:4326", "EPSG:4326");
    std::assert!(transform.is_short_circuited());

    transform.set_dest_crs(registry.resolve_id("EPSG:3857").unwrap());
    std::assert!(transform.is_initialised());
    std::assert!(!transform.is_short_circuited());
    let p = transform.transform_xy(10.0, 0.0, Forward).unwrap();
    assert_abs_diff_eq!(p.x, 1_113_194.907_932_7, epsilon = 1e-3);

    transform.set_source_crs(registry.resolve_id("EPSG:3857").unwrap());
    std::assert!(transform.is_short_circuited());
    std::assert_eq!(transform.transform_xy(10.0, 0.0, Forward).unwrap(), Point::new(10.0, 0.0));
}

#[test]
fn test_set_dest_crs_id() {
    let mut transform = transform_between("EPSG:4326", "EPSG:3857");

    transform.set_dest_crs_id("wgs84").unwrap();
    std::assert!(transform.is_short_circuited());
    std::assert_eq!(transform.dest_crs().and_then(|c| c.authid()), Some("EPSG:4326"));

    transform.set_dest_crs_id("EPSG:32631").unwrap();
    std::assert_eq!(transform.status(), TransformStatus::Active);
}

#[test]
fn test_set_dest_crs_id_failure_leaves_transform_unchanged() {
    let mut transform = transform_between("EPSG:4326", "EPSG:3857");

    let err = transform.set_dest_crs_id("EPSG:not-a-code").unwrap_err();
    std::assert!(matches!(err, CrsError::CrsResolution(_)));
    std::assert!(transform.set_dest_crs_id("FOO:1").is_err());

    std::assert_eq!(transform.dest_crs().and_then(|c| c.authid()), Some("EPSG:3857"));
    std::assert_eq!(transform.status(), TransformStatus::Active);
}

#[test]
fn test_unbound_transform_is_not_usable() {
    let mut transform = CoordinateTransform::default();
    let failures = count_failures(&mut transform);

    std::assert!(!transform.is_initialised());
    std::assert_eq!(transform.status(), TransformStatus::Uninitialized);
    std::assert!(matches!(transform.transform_xy(0.0, 0.0, Forward), Err(CrsError::NotUsable(_))));

    transform.initialise();
    std::assert_eq!(transform.status(), TransformStatus::Failed);
    std::assert!(transform.failure_reason().is_some());
    std::assert!(matches!(transform.transform_xy(0.0, 0.0, Forward), Err(CrsError::NotUsable(_))));

    // Unusable engines report to the caller only
    std::assert_eq!(hits(&failures), 0);
}

#[test]
fn test_crs_without_definition_fails_initialisation() {
    let registry = registry();
    let source = registry.resolve_id("EPSG:4326").unwrap();
    let broken = Arc::new(Crs::from_catalog("USER:424242", "", "Broken"));

    let transform = CoordinateTransform::with_resolver(source, broken, registry);
    std::assert!(transform.is_initialised());
    std::assert_eq!(transform.status(), TransformStatus::Failed);
    std::assert!(matches!(transform.transform_xy(1.0, 1.0, Forward), Err(CrsError::NotUsable(_))));
}

#[test]
fn test_initialise_is_idempotent() {
    let mut transform = transform_between("EPSG:4326", "EPSG:3857");
    let before = transform.transform_xy(5.0, 5.0, Forward).unwrap();
    transform.initialise();
    transform.initialise();
    std::assert_eq!(transform.status(), TransformStatus::Active);
    std::assert_eq!(transform.transform_xy(5.0, 5.0, Forward).unwrap(), before);
}

#[test]
fn test_constructors() {
    let from_ids = CoordinateTransform::from_ids("EPSG:4326", "EPSG:32631").unwrap();
    std::assert_eq!(from_ids.status(), TransformStatus::Active);

    let from_wkt = CoordinateTransform::from_wkt(WGS84_WKT, UTM31N_WKT).unwrap();
    std::assert_eq!(from_wkt.status(), TransformStatus::Active);
    std::assert_eq!(from_wkt.source_crs().map(|c| c.description()), Some("WGS 84"));
    std::assert!(from_wkt.dest_crs().and_then(|c| c.wkt()).is_some());

    let from_srid = CoordinateTransform::from_srid(4326, UTM31N_WKT, CrsIdType::Epsg).unwrap();
    let a = from_srid.transform_xy(3.0, 0.0, Forward).unwrap();
    let b = from_ids.transform_xy(3.0, 0.0, Forward).unwrap();
    std::assert_eq!(a, b);

    std::assert!(CoordinateTransform::from_ids("EPSG:4326", "NOPE:1").is_err());
    std::assert!(CoordinateTransform::from_wkt("GEOGCS[\"no authority\"]", UTM31N_WKT).is_err());
}

#[test]
fn test_shared_crs_handles() {
    let registry = registry();
    let wgs84 = registry.resolve_id("EPSG:4326").unwrap();
    let mercator = registry.resolve_id("EPSG:3857").unwrap();

    let a = CoordinateTransform::with_resolver(Arc::clone(&wgs84), Arc::clone(&mercator), registry.clone());
    let b = CoordinateTransform::with_resolver(Arc::clone(&mercator), Arc::clone(&wgs84), registry);
    std::assert!(Arc::ptr_eq(a.source_crs().unwrap(), b.dest_crs().unwrap()));
    std::assert_eq!(Arc::strong_count(&wgs84), 4);
}

#[test]
fn test_display() {
    let transform = transform_between("EPSG:4326", "EPSG:3857");
    std::assert_eq!(transform.to_string(), "EPSG:4326 -> EPSG:3857 (active)");
    std::assert_eq!(CoordinateTransform::default().to_string(), "<unset> -> <unset> (uninitialized)");
}
