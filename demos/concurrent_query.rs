//! Casts many rays against one finished tree from multiple threads at once,
//! demonstrating the read-only concurrency contract of §5: a built tree is
//! immutable and safe to query from any number of threads provided each
//! thread owns its own `RayState`.

use nalgebra::{Point3, Unit, Vector3};
use rayon::prelude::*;
use raytrace_accel::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut tree: RayObject<f64> = create_bvh(BvhConfig::default());
    for i in 0..64 {
        let offset = f64::from(i) * 2.0;
        let vertices = [
            Point3::new(offset - 1.0, -1.0, 0.0),
            Point3::new(offset + 1.0, -1.0, 0.0),
            Point3::new(offset, 1.0, 0.0),
        ];
        let normal = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        let triangle = Triangle::new(vertices, [normal, normal, normal]);
        add(
            &mut tree,
            RayObject::Primitive(Primitive::triangle(ObjectHandle(i), FaceHandle(0), triangle)),
        )?;
    }
    done(&mut tree, &CancelToken::new())?;

    let hits: Vec<Option<f64>> = (0..64)
        .into_par_iter()
        .map(|i| -> Result<Option<f64>, raytrace_accel::error::AccelError> {
            let x = f64::from(i) * 2.0;
            let ray = Ray::new(Point3::new(x, 0.0, -5.0), Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0)));
            let mut state = RayState::new(ray, 1.0e6, RayMode::Mirror);
            Ok(if raycast(&tree, &mut state)? {
                Some(state.hit.expect("raycast reported a hit").distance)
            } else {
                None
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let found = hits.iter().filter(|hit| hit.is_some()).count();
    println!("{found}/64 concurrent rays hit their matching triangle");
    assert_eq!(found, 64);

    Ok(())
}
