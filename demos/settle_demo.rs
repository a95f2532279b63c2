//! Voxelize a floating ring, let it settle and report the surface each tick
//!
//! Usage: `settle_demo [config.json]`. Without a path the default
//! configuration is used at a lower resolution.

use anyhow::{Context, Result};
use voxsettle_core::{Drawable, Point3f, TriangleMesh, Vector3f};
use voxsettle_sim::{SimulationConfig, Simulator};

/// A square torus-like ring built from four boxes, raised off the floor
fn ring() -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    let boxes = [
        (Point3f::new(-1.0, 0.5, -1.0), Point3f::new(1.0, 0.9, -0.6)),
        (Point3f::new(-1.0, 0.5, 0.6), Point3f::new(1.0, 0.9, 1.0)),
        (Point3f::new(-1.0, 0.5, -0.6), Point3f::new(-0.6, 0.9, 0.6)),
        (Point3f::new(0.6, 0.5, -0.6), Point3f::new(1.0, 0.9, 0.6)),
    ];

    for (min, max) in boxes {
        let base = mesh.vertex_count();
        for z in [min.z, max.z] {
            for (x, y) in [(min.x, min.y), (max.x, min.y), (max.x, max.y), (min.x, max.y)] {
                mesh.add_vertex(Point3f::new(x, y, z));
            }
        }
        let faces = [
            [0, 2, 1], [0, 3, 2],
            [4, 5, 6], [4, 6, 7],
            [0, 1, 5], [0, 5, 4],
            [3, 7, 6], [3, 6, 2],
            [0, 4, 7], [0, 7, 3],
            [1, 2, 6], [1, 6, 5],
        ];
        for [a, b, c] in faces {
            mesh.add_face([base + a, base + b, base + c]);
        }
    }

    // unreferenced vertex: stretches the bounds down so the ring has room to fall
    mesh.add_vertex(Point3f::new(0.0, -1.0, 0.0));
    mesh
}

fn main() -> Result<()> {
    println!("voxsettle settling demo");
    println!("=======================");

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_json_file(&path)
            .with_context(|| format!("loading configuration {}", path))?,
        None => SimulationConfig::default()
            .with_resolution([24, 24, 24])
            .with_cast_directions(vec![Vector3f::new(1.0, 0.0137, 0.0291)]),
    };

    let mut sim = Simulator::new(ring(), config)?;
    println!(
        "Voxelized {} cells on a {:?} lattice",
        sim.grid().len(),
        sim.lattice().dimensions
    );

    let initial = sim.geometry();
    println!("Initial surface: {} triangles", initial.triangle_count());

    for _ in 0..40 {
        let moved = sim.update(1.0 / 60.0);
        let soup = sim.geometry();
        println!(
            "tick {:>3}: moved {:>5}, surface {:>6} triangles",
            sim.tick_count(),
            moved,
            soup.triangle_count()
        );
        if moved == 0 {
            println!("Grid is at rest");
            break;
        }
    }

    let (min, max) = sim.geometry().bounding_box();
    println!(
        "Final bounds: ({:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2})",
        min.x, min.y, min.z, max.x, max.y, max.z
    );

    let buffer = sim.render_buffer();
    println!(
        "Render buffer: {} of {} vertex slots live, {} bytes",
        buffer.draw_count(),
        buffer.capacity(),
        buffer.as_bytes().len()
    );

    Ok(())
}
