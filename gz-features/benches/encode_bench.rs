use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gz_board::{Position, Stones, N};
use gz_features::{set_features, zeroed_features, MOVE_HISTORY};

fn full_history() -> (Vec<Stones>, gz_board::Color) {
    let mut board = Position::new();
    let mut snapshots = Vec::new();
    // A diagonal opening gives every snapshot some stones.
    for i in 0..MOVE_HISTORY {
        let col = (b'A' + (i % 8) as u8) as char;
        board.play_gtp(&format!("{}{}", col, 1 + i % N));
        snapshots.insert(0, board.stones());
    }
    (snapshots, board.to_play())
}

fn bench_set_features(c: &mut Criterion) {
    let (snapshots, to_play) = full_history();
    let history: Vec<&Stones> = snapshots.iter().collect();
    let mut out = zeroed_features();

    c.bench_function("set_features_full_history", |b| {
        b.iter(|| {
            set_features(black_box(&history), black_box(to_play), &mut out);
            black_box(out[0]);
        })
    });
}

criterion_group!(benches, bench_set_features);
criterion_main!(benches);
