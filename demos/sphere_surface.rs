// Extract a sphere from a continuous density field with both interpolation modes
use voxsettle_core::{Drawable, Point3f};
use voxsettle_sim::{marching_cubes, DensityField, Interpolation, Lattice};

fn main() {
    println!("Sphere isosurface");
    println!("=================\n");

    let lattice = Lattice::from_bounds(
        Point3f::new(-2.0, -2.0, -2.0),
        Point3f::new(2.0, 2.0, 2.0),
        [20, 20, 20],
    );
    let field = DensityField::sphere(&lattice, Point3f::origin(), 1.0);

    for interpolation in [Interpolation::Midpoint, Interpolation::Linear] {
        let soup = marching_cubes(&field, 0.0, interpolation);
        let (min, max) = soup.bounding_box();
        let mean_radius = soup
            .points()
            .iter()
            .map(|p| p.coords.magnitude())
            .sum::<f32>()
            / soup.vertex_count().max(1) as f32;

        println!("{:?}:", interpolation);
        println!("  - Triangles: {}", soup.triangle_count());
        println!("  - Bounds: {:.3} .. {:.3}", min.x, max.x);
        println!("  - Mean vertex radius: {:.4}", mean_radius);
    }
}
