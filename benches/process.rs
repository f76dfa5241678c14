use criterion::{criterion_group, criterion_main, Criterion};
use edgy::{
    image::{LumaView, PixelsMut},
    EdgeDetector, EdgeParams,
};

fn gradient_frame(width: u32, height: u32) -> Vec<u8> {
    (0..width * height)
        .map(|i| ((i % width) * 255 / width) as u8 ^ ((i / width) as u8 & 0x40))
        .collect()
}

pub fn benchmark_process(c: &mut Criterion) {
    let dims = [(320, 240), (640, 480), (1280, 720), (1920, 1080)];
    let detector = EdgeDetector::new(EdgeParams::new(50)).unwrap();

    let mut group = c.benchmark_group("process");
    for dim in dims.iter() {
        let luma = gradient_frame(dim.0, dim.1);
        let mut pixels = vec![0u32; luma.len()];
        group.bench_function(format!("{}x{}", dim.0, dim.1), |b| {
            b.iter(|| {
                let src = LumaView::new(&luma, dim.0, dim.1).unwrap();
                let mut dst = PixelsMut::new(&mut pixels, dim.0, dim.1).unwrap();
                detector.process(&src, &mut dst).unwrap()
            })
        });
    }
}

criterion_group!(benches, benchmark_process);
criterion_main!(benches);
