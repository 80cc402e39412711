use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use detector::Frame;
use harness::compositor::{DEFAULT_DISPLAY_SCALE, Panel, compose};
use image::Rgb;

/// Benchmark labelling, concatenating and scaling one pair of frames
fn benchmark_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");

    let sizes = [
        (640, 480, "VGA"),
        (1280, 720, "HD"),
        (1920, 1080, "Full HD"),
    ];

    for (width, height, label) in sizes {
        let fast = Frame::from_pixel(width, height, Rgb([90, 90, 90]));
        let reference = Frame::from_pixel(width, height, Rgb([160, 160, 160]));

        group.bench_with_input(BenchmarkId::new("side_by_side", label), &label, |b, _| {
            b.iter(|| {
                compose(
                    Panel {
                        frame: fast.clone(),
                        label: "TFLite INT8",
                        latency_ms: 12.3,
                    },
                    Panel {
                        frame: reference.clone(),
                        label: "PyTorch FP32",
                        latency_ms: 45.6,
                    },
                    black_box(DEFAULT_DISPLAY_SCALE),
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

/// Scale 1.0 skips the resize, isolating overlay and concatenation cost
fn benchmark_compose_unscaled(c: &mut Criterion) {
    let fast = Frame::from_pixel(1280, 720, Rgb([90, 90, 90]));
    let reference = Frame::from_pixel(1280, 720, Rgb([160, 160, 160]));

    c.bench_function("compose_unscaled_hd", |b| {
        b.iter(|| {
            compose(
                Panel {
                    frame: fast.clone(),
                    label: "CoreML FP16",
                    latency_ms: 8.1,
                },
                Panel {
                    frame: reference.clone(),
                    label: "PyTorch FP32",
                    latency_ms: 45.6,
                },
                black_box(1.0),
            )
            .unwrap()
        });
    });
}

criterion_group!(benches, benchmark_compose, benchmark_compose_unscaled);
criterion_main!(benches);
