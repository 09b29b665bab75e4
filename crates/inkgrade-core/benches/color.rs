use criterion::{black_box, criterion_group, criterion_main, Criterion};

use inkgrade_core::color;
use inkgrade_core::colorimetry::{ciede2000, color_difference, rgb_to_lab, Rgb};
use inkgrade_core::geometry::BoundingBox;
use inkgrade_core::model::{ColorConfig, ColorRegion};
use inkgrade_core::raster::{Rgba, RgbaBuffer};

fn bench_delta_e(c: &mut Criterion) {
    let mut group = c.benchmark_group("delta_e");

    let a = rgb_to_lab(Rgb::new(255, 204, 0));
    let b = rgb_to_lab(Rgb::new(240, 180, 20));
    group.bench_function("ciede2000_lab", |bench| {
        bench.iter(|| ciede2000(black_box(a), black_box(b)))
    });

    group.bench_function("color_difference_rgb", |bench| {
        bench.iter(|| {
            color_difference(
                black_box(Rgb::new(30, 144, 255)),
                black_box(Rgb::new(0, 0, 205)),
            )
        })
    });

    group.finish();
}

fn bench_region_analysis(c: &mut Criterion) {
    let mut canvas = RgbaBuffer::filled(600, 400, Rgba::new(255, 255, 255, 255));
    canvas.fill_rect(50, 50, 200, 200, Rgba::new(250, 200, 10, 255));
    canvas.fill_rect(300, 100, 250, 250, Rgba::new(40, 120, 220, 255));

    let config = ColorConfig {
        canvas_width: 600,
        canvas_height: 400,
        regions: vec![
            ColorRegion {
                id: "sun".into(),
                bounds: BoundingBox::new(50.0, 50.0, 200.0, 200.0),
                target_color: Rgb::new(255, 204, 0),
                outline_path: None,
            },
            ColorRegion {
                id: "sea".into(),
                bounds: BoundingBox::new(300.0, 100.0, 250.0, 250.0),
                target_color: Rgb::new(30, 110, 230),
                outline_path: None,
            },
        ],
        delta_e_tolerance: 20.0,
    };

    c.bench_function("color_analyze_two_regions", |b| {
        b.iter(|| color::analyze(black_box(&canvas), black_box(&config)))
    });
}

criterion_group!(benches, bench_delta_e, bench_region_analysis);
criterion_main!(benches);
