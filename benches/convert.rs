use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fb_present::config::PresentConfig;
use fb_present::core::convert::{
    pack_padded, pack_row, swizzle_bgra_to_rgba, swizzle_tiles, PackOrder,
};
use fb_present::core::{Extent, FramebufferRenderer, PaddedLayout, TexelFormat, TexelView, Viewport};
use fb_present::core::raster::draw_textured_quad;
use fb_present::core::Filter;
use fb_present::gu::{GuRenderer, SoftGu};
use glam::Vec2;

const SIZES: [(u32, u32); 3] = [(256, 224), (320, 240), (640, 480)];

/// Deterministic BGRA noise
fn frame(width: u32, height: u32) -> Vec<u8> {
    (0..width * height * 4)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
        .collect()
}

fn bench_pack_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_565");
    for (w, h) in SIZES {
        let src = frame(w, h);
        let mut dst = vec![0u8; (w * h * 2) as usize];
        group.throughput(Throughput::Elements((w * h) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}x{}", w, h)), &src, |b, src| {
            b.iter(|| pack_row(black_box(&mut dst), black_box(src), PackOrder::RedHigh))
        });
    }
    group.finish();
}

fn bench_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("bgra_to_rgba");
    for (w, h) in SIZES {
        let src = frame(w, h);
        let mut dst = vec![0u8; src.len()];
        group.throughput(Throughput::Elements((w * h) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}x{}", w, h)), &src, |b, src| {
            b.iter(|| swizzle_bgra_to_rgba(black_box(&mut dst), black_box(src)))
        });
    }
    group.finish();
}

fn bench_padded_pack(c: &mut Criterion) {
    let (w, h) = (320, 240);
    let src = frame(w, h);
    let layout = PaddedLayout::new(w, h, 512, 256);
    let mut dst = vec![0u8; layout.dst_len(2)];
    let mut tiled = vec![0u8; dst.len()];

    c.bench_function("pack_padded_320x240_into_512x256", |b| {
        b.iter(|| pack_padded(black_box(&mut dst), black_box(&src), layout, PackOrder::BlueHigh))
    });
    c.bench_function("swizzle_tiles_512x256", |b| {
        b.iter(|| swizzle_tiles(black_box(&mut tiled), black_box(&dst), 512, 256, 2))
    });
}

fn bench_soft_quad(c: &mut Criterion) {
    let texels = vec![0x5Au8; 512 * 256 * 2];
    let view = TexelView {
        data: &texels,
        width: 512,
        height: 256,
        stride: 512,
        format: TexelFormat::Packed565(PackOrder::BlueHigh),
        tiled: false,
    };
    let mut target = vec![0u32; 480 * 272];
    let rect = Viewport::fit(Extent::new(320, 240), Extent::new(480, 272), true);

    for filter in [Filter::Nearest, Filter::Linear] {
        c.bench_function(&format!("soft_quad_{:?}", filter), |b| {
            b.iter(|| {
                draw_textured_quad(
                    black_box(&mut target),
                    480,
                    272,
                    rect,
                    Vec2::ZERO,
                    Vec2::new(320.0, 240.0),
                    &view,
                    filter,
                )
            })
        });
    }
}

fn bench_console_frame(c: &mut Criterion) {
    let mut renderer = GuRenderer::new(SoftGu::new(), PresentConfig::default());
    if renderer.init().is_err() {
        return;
    }
    let src = frame(320, 240);

    c.bench_function("console_end_draw_320x240", |b| {
        b.iter(|| {
            let target = renderer.begin_draw(320, 240);
            target.pixels[..src.len()].copy_from_slice(&src);
            renderer.end_draw();
        })
    });
}

criterion_group!(
    benches,
    bench_pack_row,
    bench_reorder,
    bench_padded_pack,
    bench_soft_quad,
    bench_console_frame,
);

criterion_main!(benches);
