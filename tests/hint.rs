//! Coverage for the traversal hint accelerant of §4.7.

use nalgebra::{Point3, Unit, Vector3};
use raytrace_accel::hint;
use raytrace_accel::prelude::*;

fn unit_triangle_at(x: f64) -> Triangle<f64> {
    let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
    Triangle::new(
        [
            Point3::new(x, 0.0, 0.0),
            Point3::new(x + 1.0, 0.0, 0.0),
            Point3::new(x, 1.0, 0.0),
        ],
        [n, n, n],
    )
}

fn eight_triangle_bvh() -> Result<RayObject<f64>, Box<dyn std::error::Error>> {
    let mut tree = create_bvh::<f64>(BvhConfig::default());
    for i in 0..8 {
        add(
            &mut tree,
            RayObject::Primitive(Primitive::triangle(
                ObjectHandle(i),
                FaceHandle(0),
                unit_triangle_at(f64::from(i) * 3.0),
            )),
        )?;
    }
    done(&mut tree, &CancelToken::new())?;
    Ok(tree)
}

/// Running a query with a hint seeded against the same scene must reach the
/// same result as running it with no hint at all, for both a primary ray
/// (where a hint only tightens traversal order and the full tree is always
/// walked regardless) and a shadow ray (where a hint hit can short-circuit
/// the traversal outright).
fn assert_hinted_matches_unhinted(tree: &RayObject<f64>, mode: RayMode) {
    for i in 0..8 {
        let x = f64::from(i) * 3.0 + 0.25;
        let ray = || Ray::new(Point3::new(x, 0.25, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));

        let mut unhinted = RayState::new(ray(), 1.0e15, mode);
        let unhinted_found = raycast(tree, &mut unhinted).expect("unhinted raycast");

        // Seed the hint around the exact triangle this ray should hit, so
        // the seeded run and the unhinted run are deciding between the same
        // candidates via two different traversal orders.
        let query_bb = Aabb::new(
            Point3::new(f64::from(i) * 3.0, 0.0, -1.0),
            Point3::new(f64::from(i) * 3.0 + 1.0, 1.0, 1.0),
        );
        let mut seeded = TraversalHint::new();
        hint::seed(tree, &query_bb, &mut seeded);

        let mut hinted = RayState::new(ray(), 1.0e15, mode);
        hinted.hint = Some(seeded);
        let hinted_found = raycast(tree, &mut hinted).expect("hinted raycast");

        assert_eq!(hinted_found, unhinted_found, "hit/miss disagreement for triangle {i}");
        assert_eq!(
            hinted.hit.as_ref().map(|h| h.object),
            unhinted.hit.as_ref().map(|h| h.object),
            "object disagreement for triangle {i}"
        );
        if let (Some(a), Some(b)) = (hinted.hit.as_ref(), unhinted.hit.as_ref()) {
            assert!((a.distance - b.distance).abs() < 1e-9, "distance disagreement for triangle {i}");
        }
    }
}

#[test]
fn seeded_hint_matches_unhinted_mirror_ray() -> Result<(), Box<dyn std::error::Error>> {
    let tree = eight_triangle_bvh()?;
    assert_hinted_matches_unhinted(&tree, RayMode::Mirror);
    Ok(())
}

#[test]
fn seeded_hint_matches_unhinted_shadow_ray() -> Result<(), Box<dyn std::error::Error>> {
    let tree = eight_triangle_bvh()?;
    assert_hinted_matches_unhinted(&tree, RayMode::Shadow);
    Ok(())
}

#[test]
fn seeded_hint_still_misses_ray_that_clears_the_scene() -> Result<(), Box<dyn std::error::Error>> {
    let tree = eight_triangle_bvh()?;
    let query_bb = Aabb::new(Point3::new(0.0, 0.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    let mut seeded = TraversalHint::new();
    hint::seed(&tree, &query_bb, &mut seeded);

    let ray = Ray::new(Point3::new(500.0, 500.0, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));
    let mut state = RayState::new(ray, 1.0e15, RayMode::Mirror);
    state.hint = Some(seeded);
    assert!(!raycast(&tree, &mut state)?);
    assert!(state.hit.is_none());
    Ok(())
}

#[test]
fn hint_overflow_surfaces_once_capacity_is_exhausted() {
    let empty = Empty::<f64>::new();
    let ptr: *const dyn ApiNode<f64> = &empty;

    let mut hint = TraversalHint::<f64>::new();
    for i in 0..HINT_CAPACITY {
        hint.accept(ptr).unwrap_or_else(|err| panic!("entry {i} should still fit: {err}"));
    }

    let overflow = hint.accept(ptr);
    assert!(matches!(
        overflow,
        Err(AccelError::Tree(TreeError::HintOverflow { capacity })) if capacity == HINT_CAPACITY
    ));
}
