//! Builds a single triangle into a BVH and casts a primary ray and a shadow
//! ray against it, printing the resulting hit distance and barycentrics.

use nalgebra::{Point3, Unit, Vector3};
use raytrace_accel::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Building a one-triangle BVH...");

    let mut tree: RayObject<f64> = create_bvh(BvhConfig::default());

    let vertices = [
        Point3::new(-1.0, -1.0, 0.0),
        Point3::new(1.0, -1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let normal = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
    let triangle = Triangle::new(vertices, [normal, normal, normal]);
    let primitive = RayObject::Primitive(Primitive::triangle(ObjectHandle(0), FaceHandle(0), triangle));

    add(&mut tree, primitive)?;
    done(&mut tree, &CancelToken::new())?;

    let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)));
    let mut state = RayState::new(ray, 1.0e6, RayMode::Mirror);
    if raycast(&tree, &mut state)? {
        let hit = state.hit.as_ref().expect("raycast reported a hit");
        println!("primary ray hit at distance {} (u={}, v={})", hit.distance, hit.u, hit.v);
    } else {
        println!("primary ray missed");
    }

    let shadow_ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)));
    let mut shadow_state = RayState::new(shadow_ray, 1.0e6, RayMode::Shadow);
    println!("shadow ray blocked: {}", raycast(&tree, &mut shadow_state)?);

    Ok(())
}
