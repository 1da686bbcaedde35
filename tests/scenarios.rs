//! End-to-end acceptance scenarios for the acceleration core's public API.

use nalgebra::{Matrix4, Point3, Unit, Vector3};
use raytrace_accel::prelude::*;
use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

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

fn one_triangle_bvh(x: f64, object: u64, face: u64) -> Result<RayObject<f64>, Box<dyn std::error::Error>> {
    let mut tree = create_bvh::<f64>(BvhConfig::default());
    add(
        &mut tree,
        RayObject::Primitive(Primitive::triangle(ObjectHandle(object), FaceHandle(face), unit_triangle_at(x))),
    )?;
    done(&mut tree, &CancelToken::new())?;
    Ok(tree)
}

#[test]
fn single_triangle_miss() -> Result<(), Box<dyn std::error::Error>> {
    let tree = one_triangle_bvh(0.0, 1, 1)?;
    let ray = Ray::new(Point3::new(0.5, 0.5, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)));
    let mut state = RayState::new(ray, 1.0e15, RayMode::Mirror);
    assert!(!raycast(&tree, &mut state)?);
    assert!(state.hit.is_none());
    Ok(())
}

#[test]
fn single_triangle_hit() -> Result<(), Box<dyn std::error::Error>> {
    let tree = one_triangle_bvh(0.0, 1, 1)?;
    let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));
    let mut state = RayState::new(ray, 1.0e15, RayMode::Mirror);
    assert!(raycast(&tree, &mut state)?);
    let hit = state.hit.as_ref().expect("hit recorded");
    assert!((hit.distance - 1.0).abs() < 1e-9);
    assert!(hit.u + hit.v <= 1.0 + 1e-9);
    assert_eq!(hit.object, Some(ObjectHandle(1)));
    assert_eq!(hit.face, Some(FaceHandle(1)));
    Ok(())
}

#[test]
fn self_intersection_suppression() -> Result<(), Box<dyn std::error::Error>> {
    let tree = one_triangle_bvh(0.0, 1, 1)?;
    let ray = Ray::new(Point3::new(0.25, 0.25, 0.0), Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)));
    let mut state = RayState::new(ray, 1.0e15, RayMode::Mirror).with_origin(ObjectHandle(1), FaceHandle(1));
    assert!(!raycast(&tree, &mut state)?);
    Ok(())
}

/// An `ApiNode` wrapper that counts how many times it is actually traversed,
/// to observe whether `raycast`'s last-hit cache really bypasses it.
struct CountingNode {
    inner: Bvh<f64>,
    calls: Arc<AtomicUsize>,
}

impl ApiNode<f64> for CountingNode {
    fn raycast(&self, state: &mut RayState<'_, f64>) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.raycast(state)
    }
    fn add(&mut self, object: RayObject<f64>) -> Result<()> {
        self.inner.add(object)
    }
    fn done(&mut self, cancel: &CancelToken) -> Result<()> {
        self.inner.done(cancel)
    }
    fn bb(&self) -> Cow<'_, Aabb<f64>> {
        self.inner.bb()
    }
    fn cost(&self) -> f64 {
        self.inner.cost()
    }
    fn id(&self) -> RayObjectId {
        self.inner.id()
    }
}

#[test]
fn shadow_last_hit_reuse() -> Result<(), Box<dyn std::error::Error>> {
    let tree_a = one_triangle_bvh(0.0, 1, 1)?;

    let calls = Arc::new(AtomicUsize::new(0));
    let mut inner_b = Bvh::new(BvhConfig::default());
    ApiNode::add(
        &mut inner_b,
        RayObject::Primitive(Primitive::triangle(ObjectHandle(2), FaceHandle(1), unit_triangle_at(100.0))),
    )?;
    ApiNode::done(&mut inner_b, &CancelToken::new())?;
    let tree_b = RayObject::Node(Box::new(CountingNode {
        inner: inner_b,
        calls: Arc::clone(&calls),
    }));

    let ray_hits_a = Ray::new(Point3::new(0.25, 0.25, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));
    let mut state = RayState::new(ray_hits_a, 1.0e15, RayMode::Shadow);
    assert!(raycast(&tree_a, &mut state)?);
    assert!(state.last_hit.is_some());

    state.ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));
    state.hit = None;
    state.max_distance = 1.0e15;

    let calls_before = calls.load(Ordering::SeqCst);
    assert!(raycast(&tree_b, &mut state)?);
    assert_eq!(
        calls.load(Ordering::SeqCst),
        calls_before,
        "the last-hit cache should have satisfied the query without traversing tree_b"
    );

    Ok(())
}

#[test]
fn instance_identity_preserves_distance() -> Result<(), Box<dyn std::error::Error>> {
    let target = Arc::new(one_triangle_bvh(0.0, 1, 1)?);
    let instance = create_instance(Arc::clone(&target), Matrix4::identity(), ObjectHandle(2), ObjectHandle(1))?;

    let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));

    let mut state_target = RayState::new(ray.clone(), 1.0e15, RayMode::Mirror);
    raycast(&target, &mut state_target)?;
    let direct_distance = state_target.hit.expect("direct hit").distance;

    let mut state_instance = RayState::new(ray, 1.0e15, RayMode::Mirror);
    raycast(&instance, &mut state_instance)?;
    let instance_hit = state_instance.hit.expect("instance hit");

    assert!((instance_hit.distance - direct_distance).abs() < 1e-5);
    assert_eq!(instance_hit.object, Some(ObjectHandle(2)));
    Ok(())
}

#[test]
fn instance_scale_doubles_distance() -> Result<(), Box<dyn std::error::Error>> {
    let target = Arc::new(one_triangle_bvh(0.0, 1, 1)?);
    let scale = Matrix4::new_scaling(2.0);
    let instance = create_instance(Arc::clone(&target), scale, ObjectHandle(2), ObjectHandle(1))?;

    // Target hits at distance 1 along -z from (0.25, 0.25, 1); scaled by 2 the
    // same world ray must hit at distance 2 (the geometry itself moved twice
    // as far from the origin).
    let ray = Ray::new(Point3::new(0.5, 0.5, 2.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));
    let mut state = RayState::new(ray, 1.0e15, RayMode::Mirror);
    assert!(raycast(&instance, &mut state)?);
    let hit = state.hit.expect("scaled instance hit");
    assert!((hit.distance - 2.0).abs() < 1e-5);
    Ok(())
}

#[test]
fn degenerate_input_is_tolerated() -> Result<(), Box<dyn std::error::Error>> {
    let mut tree = create_bvh::<f64>(BvhConfig::default());
    add(
        &mut tree,
        RayObject::Primitive(Primitive::triangle(ObjectHandle(1), FaceHandle(1), unit_triangle_at(0.0))),
    )?;

    let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
    let nan_triangle = Triangle::new(
        [
            Point3::new(f64::NAN, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        [n, n, n],
    );
    add(
        &mut tree,
        RayObject::Primitive(Primitive::triangle(ObjectHandle(9), FaceHandle(9), nan_triangle)),
    )?;
    done(&mut tree, &CancelToken::new())?;

    let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));
    let mut state = RayState::new(ray, 1.0e15, RayMode::Mirror);
    assert!(raycast(&tree, &mut state)?);
    let hit = state.hit.expect("hit recorded despite degenerate sibling");
    assert_eq!(hit.object, Some(ObjectHandle(1)));
    Ok(())
}

#[test]
fn tie_break_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let build = || -> Result<RayObject<f64>, Box<dyn std::error::Error>> {
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
    };

    let first = build()?;
    let second = build()?;

    for i in 0..8 {
        let x = f64::from(i) * 3.0 + 0.25;
        let ray = || Ray::new(Point3::new(x, 0.25, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));

        let mut state_a = RayState::new(ray(), 1.0e15, RayMode::Mirror);
        raycast(&first, &mut state_a)?;
        let mut state_b = RayState::new(ray(), 1.0e15, RayMode::Mirror);
        raycast(&second, &mut state_b)?;

        let hit_a = state_a.hit.take();
        let hit_b = state_b.hit.take();
        assert_eq!(hit_a.as_ref().map(|h| h.object), hit_b.as_ref().map(|h| h.object));
        assert_eq!(
            hit_a.map(|h| h.distance).unwrap_or(-1.0),
            hit_b.map(|h| h.distance).unwrap_or(-1.0)
        );
    }

    Ok(())
}
