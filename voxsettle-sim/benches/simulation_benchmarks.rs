use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use voxsettle_core::{Point3f, TriangleMesh, TriangleRayCounter, Vector3f};
use voxsettle_sim::{DensityField, GravityStepper, MarchingCubes, ParallelConfig, Voxelizer};

const RESOLUTIONS: [usize; 3] = [16, 24, 32];

fn octahedron() -> TriangleMesh {
    let vertices = vec![
        Point3f::new(1.0, 0.0, 0.0),
        Point3f::new(-1.0, 0.0, 0.0),
        Point3f::new(0.0, 1.0, 0.0),
        Point3f::new(0.0, -1.0, 0.0),
        Point3f::new(0.0, 0.0, 1.0),
        Point3f::new(0.0, 0.0, -1.0),
    ];
    let faces = vec![
        [0, 2, 4], [2, 1, 4], [1, 3, 4], [3, 0, 4],
        [2, 0, 5], [1, 2, 5], [3, 1, 5], [0, 3, 5],
    ];
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

fn voxelizer(resolution: usize) -> Voxelizer {
    Voxelizer::new([resolution; 3]).with_cast_directions(vec![Vector3f::new(1.0, 0.0137, 0.0291)])
}

fn voxelize(c: &mut Criterion) {
    let mesh = octahedron();
    let counter = TriangleRayCounter::default();

    let mut g = c.benchmark_group("voxelize");
    g.sample_size(10);

    for resolution in RESOLUTIONS {
        let sequential = voxelizer(resolution);
        let parallel = voxelizer(resolution).with_parallel(ParallelConfig::default().with_enabled(true));

        g.bench_with_input(BenchmarkId::new("sequential", resolution), &sequential, |b, v| {
            b.iter(|| std::hint::black_box(v).voxelize(std::hint::black_box(&mesh), &counter));
        });
        g.bench_with_input(BenchmarkId::new("parallel", resolution), &parallel, |b, v| {
            b.iter(|| std::hint::black_box(v).voxelize(std::hint::black_box(&mesh), &counter));
        });
    }

    g.finish();
}

fn gravity_step(c: &mut Criterion) {
    let mesh = octahedron();
    let stepper = GravityStepper::new(10, Default::default());

    let mut g = c.benchmark_group("gravity step");

    for resolution in RESOLUTIONS {
        let voxelization = voxelizer(resolution).voxelize(&mesh, &TriangleRayCounter::default());
        g.bench_with_input(BenchmarkId::from_parameter(resolution), &voxelization, |b, v| {
            b.iter_batched(
                || v.grid.clone(),
                |mut grid| stepper.step(&mut grid, v.lattice.dimensions),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    g.finish();
}

fn extract(c: &mut Criterion) {
    let mesh = octahedron();
    let extractor = MarchingCubes::default();

    let mut g = c.benchmark_group("marching cubes");

    for resolution in RESOLUTIONS {
        let voxelization = voxelizer(resolution).voxelize(&mesh, &TriangleRayCounter::default());
        let field = DensityField::from_occupancy(&voxelization.grid, &voxelization.lattice);
        g.bench_with_input(BenchmarkId::from_parameter(resolution), &field, |b, field| {
            b.iter(|| extractor.extract(std::hint::black_box(field)));
        });
    }

    g.finish();
}

criterion_group!(benches, voxelize, gravity_step, extract);
criterion_main!(benches);
