//! Builds one triangle into a BVH, then wraps it in two instances at
//! different transforms (identity, and a 2x uniform scale shifted along x),
//! confirming a world-space ray sees the right copy at the right distance.

use nalgebra::{Matrix4, Point3, Unit, Vector3};
use raytrace_accel::prelude::*;
use std::sync::Arc;

fn build_target() -> Result<Arc<RayObject<f64>>, Box<dyn std::error::Error>> {
    let mut tree: RayObject<f64> = create_bvh(BvhConfig::default());

    let vertices = [
        Point3::new(-1.0, -1.0, 0.0),
        Point3::new(1.0, -1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let normal = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
    let triangle = Triangle::new(vertices, [normal, normal, normal]);
    add(
        &mut tree,
        RayObject::Primitive(Primitive::triangle(ObjectHandle(0), FaceHandle(0), triangle)),
    )?;
    done(&mut tree, &CancelToken::new())?;

    Ok(Arc::new(tree))
}

fn hit_distance(tree: &RayObject<f64>, origin: Point3<f64>) -> Result<Option<f64>, Box<dyn std::error::Error>> {
    let ray = Ray::new(origin, Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)));
    let mut state = RayState::new(ray, 1.0e6, RayMode::Mirror);
    Ok(if raycast(tree, &mut state)? {
        Some(state.hit.expect("raycast reported a hit").distance)
    } else {
        None
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = build_target()?;

    let identity = create_instance(
        Arc::clone(&target),
        Matrix4::identity(),
        ObjectHandle(1),
        ObjectHandle(0),
    )?;

    let scaled_and_shifted = create_instance(
        Arc::clone(&target),
        Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0)) * Matrix4::new_scaling(2.0),
        ObjectHandle(2),
        ObjectHandle(0),
    )?;

    println!("identity instance: {:?}", hit_distance(&identity, Point3::new(0.0, 0.0, -5.0))?);
    println!(
        "scaled instance:   {:?}",
        hit_distance(&scaled_and_shifted, Point3::new(5.0, 0.0, -5.0))?
    );
    println!(
        "scaled instance, unshifted origin (expect miss): {:?}",
        hit_distance(&scaled_and_shifted, Point3::new(0.0, 0.0, -5.0))?
    );

    Ok(())
}
