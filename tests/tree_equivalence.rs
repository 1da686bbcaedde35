//! Confirms every tree kind reports the same set of (object, face) hits for
//! the same primitives and the same rays, per the cross-tree equivalence
//! property: tree kind is an implementation detail of `ApiNode`, not
//! something that should change what a query returns.

use nalgebra::{Point3, Unit, Vector3};
use raytrace_accel::prelude::*;

fn triangles() -> Vec<(ObjectHandle, FaceHandle, Triangle<f64>)> {
    (0..10)
        .map(|i| {
            let x = f64::from(i) * 2.5;
            let n = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
            let triangle = Triangle::new(
                [Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 0.0, 0.0), Point3::new(x, 1.0, 0.0)],
                [n, n, n],
            );
            (ObjectHandle(i as u64), FaceHandle(0), triangle)
        })
        .collect()
}

fn build(mut tree: RayObject<f64>) -> Result<RayObject<f64>, Box<dyn std::error::Error>> {
    for (object, face, triangle) in triangles() {
        add(&mut tree, RayObject::Primitive(Primitive::triangle(object, face, triangle)))?;
    }
    done(&mut tree, &CancelToken::new())?;
    Ok(tree)
}

fn hit_pair(tree: &RayObject<f64>, x: f64, y: f64) -> Result<Option<(u64, u64)>, Box<dyn std::error::Error>> {
    let ray = Ray::new(Point3::new(x, y, 1.0), Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)));
    let mut state = RayState::new(ray, 1.0e15, RayMode::Mirror);
    Ok(if raycast(tree, &mut state)? {
        let hit = state.hit.expect("raycast reported a hit");
        Some((hit.object.unwrap().0, hit.face.unwrap().0))
    } else {
        None
    })
}

#[test]
fn all_tree_kinds_agree_on_hit_set() -> Result<(), Box<dyn std::error::Error>> {
    let trees: Vec<(&str, RayObject<f64>)> = vec![
        ("bvh", build(create_bvh(BvhConfig::default()))?),
        ("vbvh", build(create_vbvh(BvhConfig::default()))?),
        ("svbvh", build(create_svbvh(BvhConfig::default()))?),
        ("bih", build(create_bih(BvhConfig::default()))?),
        ("kdop_bvh", build(create_kdop_bvh(BvhConfig::default()))?),
        ("octree", build(create_octree(OctreeConfig::default())?)?),
    ];

    let probes = [
        (0.25, 0.25),
        (2.5 + 0.25, 0.25),
        (5.0 + 0.25, 0.25),
        (100.0, 100.0),
        (-5.0, -5.0),
    ];

    for &(x, y) in &probes {
        let mut reference: Option<Option<(u64, u64)>> = None;
        for (name, tree) in &trees {
            let observed = hit_pair(tree, x, y)?;
            match reference {
                None => reference = Some(observed),
                Some(expected) => assert_eq!(expected, observed, "{name} disagreed at ({x}, {y})"),
            }
        }
    }

    Ok(())
}
