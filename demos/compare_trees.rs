//! Builds the same handful of triangles into every tree kind and confirms
//! each one reports the same hit distance for a shared set of rays,
//! demonstrating that the tree kind is an implementation detail behind the
//! shared `ApiNode` dispatch.

use nalgebra::{Point3, Unit, Vector3};
use raytrace_accel::prelude::*;

fn sample_triangles() -> Vec<(ObjectHandle, FaceHandle, Triangle<f64>)> {
    let mut out = Vec::new();
    for i in 0..6 {
        let offset = f64::from(i) * 2.0;
        let vertices = [
            Point3::new(offset - 1.0, -1.0, 0.0),
            Point3::new(offset + 1.0, -1.0, 0.0),
            Point3::new(offset, 1.0, 0.0),
        ];
        let normal = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        out.push((
            ObjectHandle(i as u64),
            FaceHandle(0),
            Triangle::new(vertices, [normal, normal, normal]),
        ));
    }
    out
}

fn build(mut tree: RayObject<f64>) -> Result<RayObject<f64>, Box<dyn std::error::Error>> {
    for (object, face, triangle) in sample_triangles() {
        add(&mut tree, RayObject::Primitive(Primitive::triangle(object, face, triangle)))?;
    }
    done(&mut tree, &CancelToken::new())?;
    Ok(tree)
}

fn cast(tree: &RayObject<f64>, x: f64) -> Result<Option<f64>, Box<dyn std::error::Error>> {
    let ray = Ray::new(Point3::new(x, 0.0, -5.0), Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)));
    let mut state = RayState::new(ray, 1.0e6, RayMode::Mirror);
    Ok(if raycast(tree, &mut state)? {
        Some(state.hit.expect("raycast reported a hit").distance)
    } else {
        None
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let trees = vec![
        ("bvh", build(create_bvh(BvhConfig::default()))?),
        ("vbvh", build(create_vbvh(BvhConfig::default()))?),
        ("svbvh", build(create_svbvh(BvhConfig::default()))?),
        ("bih", build(create_bih(BvhConfig::default()))?),
        ("kdop_bvh", build(create_kdop_bvh(BvhConfig::default()))?),
        ("octree", build(create_octree(OctreeConfig::default())?)?),
    ];

    for x in [0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 20.0] {
        let mut reference: Option<Option<f64>> = None;
        for (name, tree) in &trees {
            let distance = cast(tree, x)?;
            println!("x={x:>5} {name:>8}: {distance:?}");
            match (reference, distance) {
                (None, d) => reference = Some(d),
                (Some(Some(r)), Some(d)) => assert!((r - d).abs() < 1.0e-9, "{name} disagreed at x={x}"),
                (Some(None), None) => {}
                (Some(_), _) => panic!("{name} disagreed at x={x}"),
            }
        }
    }

    println!("all tree kinds agree");
    Ok(())
}
