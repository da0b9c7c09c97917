use sky_catalog_fetch::domain::{BoundingBox, CoordinateRecord, DEFAULT_SIZE};

const EPS: f64 = 1e-9;

#[test]
fn bounding_box_is_center_plus_minus_half_size() {
    for &(ra, dec, size) in &[(150.0, 2.0, 0.03), (0.1, -89.0, 0.5), (359.9, 45.0, 1.0)] {
        let bbox = BoundingBox::around(ra, dec, size);
        assert!((bbox.ra_min - (ra - size / 2.0)).abs() < EPS);
        assert!((bbox.ra_max - (ra + size / 2.0)).abs() < EPS);
        assert!((bbox.dec_min - (dec - size / 2.0)).abs() < EPS);
        assert!((bbox.dec_max - (dec + size / 2.0)).abs() < EPS);
        assert!(bbox.ra_min < bbox.ra_max);
        assert!(bbox.dec_min < bbox.dec_max);
    }
}

#[test]
fn example_cutout_box() {
    let record = CoordinateRecord::new(150.0, 2.0).with_size(0.03);
    let bbox = record.bounding_box();
    assert!((bbox.ra_min - 149.985).abs() < EPS);
    assert!((bbox.ra_max - 150.015).abs() < EPS);
    assert!((bbox.dec_min - 1.985).abs() < EPS);
    assert!((bbox.dec_max - 2.015).abs() < EPS);
}

#[test]
fn missing_size_uses_default() {
    let record = CoordinateRecord::new(10.0, -5.0);
    assert_eq!(record.resolved_size(), DEFAULT_SIZE);
    assert_eq!(record.bounding_box(), BoundingBox::around(10.0, -5.0, 0.03));
}

#[test]
fn blank_name_counts_as_absent() {
    let record = CoordinateRecord::new(10.0, -5.0).with_name("  ");
    assert_eq!(record.label(), "");
}
