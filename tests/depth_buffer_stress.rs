use mt_rasterizer::core::depth_buffer::{DepthBuffer, LockStrategy};
use mt_rasterizer::core::frame_buffer::FrameBuffer;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::thread;

const WIDTH: usize = 16;
const HEIGHT: usize = 8;
const THREADS: usize = 8;

struct Write {
    x: usize,
    y: usize,
    z: f32,
    color: u32,
}

/// 每次写入的深度互不相同，胜者唯一
fn random_writes(seed: u64, count: usize) -> Vec<Write> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut writes: Vec<Write> = (0..count)
        .map(|i| Write {
            x: rng.random_range(0..WIDTH),
            y: rng.random_range(0..HEIGHT),
            z: 1.0 + i as f32 * 0.01,
            color: i as u32 + 1,
        })
        .collect();
    writes.shuffle(&mut rng);
    writes
}

/// 顺序执行得到每个像素的期望 (1/z, 颜色)
fn sequential_result(writes: &[Write]) -> Vec<(f32, u32)> {
    let mut expected = vec![(f32::NEG_INFINITY, 0u32); WIDTH * HEIGHT];
    for w in writes {
        let slot = &mut expected[w.y * WIDTH + w.x];
        let inv_z = 1.0 / w.z;
        if inv_z > slot.0 {
            *slot = (inv_z, w.color);
        }
    }
    expected
}

fn run_concurrently(strategy: LockStrategy, writes: &[Write]) -> (DepthBuffer, FrameBuffer) {
    let depth = DepthBuffer::new(WIDTH, HEIGHT, strategy).unwrap();
    let frame = FrameBuffer::new(WIDTH, HEIGHT).unwrap();
    let chunk = writes.len().div_ceil(THREADS);

    thread::scope(|scope| {
        for part in writes.chunks(chunk) {
            let (depth, frame) = (&depth, &frame);
            scope.spawn(move || {
                for w in part {
                    depth.test_and_write(w.x, w.y, w.z, || frame.put(w.x, w.y, w.color));
                }
            });
        }
    });
    (depth, frame)
}

fn assert_matches_sequential(strategy: LockStrategy, seed: u64) {
    let writes = random_writes(seed, 20_000);
    let expected = sequential_result(&writes);
    let (depth, frame) = run_concurrently(strategy, &writes);

    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let (inv_z, color) = expected[y * WIDTH + x];
            assert_eq!(depth.reciprocal_at(x, y), inv_z, "像素 ({x}, {y}) 深度不一致");
            if inv_z.is_finite() {
                assert_eq!(frame.get(x, y), Some(color), "像素 ({x}, {y}) 颜色与深度不一致");
            }
        }
    }
}

#[test]
fn per_pixel_locks_match_sequential_result() {
    for seed in [1, 7, 42] {
        assert_matches_sequential(LockStrategy::PerPixel, seed);
    }
}

#[test]
fn striped_locks_match_sequential_result() {
    for seed in [3, 99] {
        assert_matches_sequential(LockStrategy::Striped { locks: 5 }, seed);
    }
}

#[test]
fn clear_resets_after_concurrent_writes() {
    let writes = random_writes(5, 1_000);
    let (depth, _) = run_concurrently(LockStrategy::PerPixel, &writes);
    depth.clear();
    assert!(depth.to_depth_vec().iter().all(|d| d.is_infinite()));
    assert!(depth.test_and_set(0, 0, 100.0));
}
