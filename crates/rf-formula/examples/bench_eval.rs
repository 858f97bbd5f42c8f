//! Quick benchmark: formula evaluation throughput.
//! Run:
//!   cargo run -p rf-formula --release --example bench_eval

use rf_formula::Formula;

fn rand_f64(state: &mut u64) -> f64 {
    // xorshift64*
    *state ^= *state >> 12;
    *state ^= *state << 25;
    *state ^= *state >> 27;
    let x = (*state).wrapping_mul(2685821657736338717u64);
    // Map to [0, 1)
    (x >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
}

fn median(mut xs: Vec<f64>) -> f64 {
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    xs[xs.len() / 2]
}

fn bench(label: &str, f: &mut Formula, rounds: usize, iters: usize) {
    let n = 200_000usize;
    let mut state = 0x0123_4567_89ab_cdefu64;
    let xs: Vec<f64> = (0..n).map(|_| rand_f64(&mut state) * 8.0 - 4.0).collect();

    // Warmup
    let mut acc = 0.0;
    for &x in xs.iter().take(10_000) {
        acc += f.eval1(x);
    }
    std::hint::black_box(acc);

    println!("--- {label} ---");
    let mut m_evals = Vec::new();
    for r in 0..rounds {
        let start = std::time::Instant::now();
        let mut acc = 0.0;
        for _ in 0..iters {
            for &x in &xs {
                acc += f.eval1(x);
            }
        }
        std::hint::black_box(acc);
        let elapsed = start.elapsed().as_secs_f64();
        let evals = (n as f64 * iters as f64) / elapsed / 1e6;
        m_evals.push(evals);
        println!("  Round {}: {:.1} Meval/s", r + 1, evals);
    }
    println!("Median: {:.1} Meval/s", median(m_evals));
}

fn main() {
    let rounds = 5;
    let iters = 5;

    let mut gaus = Formula::new("bench_gaus", "gaus(0)");
    gaus.set_parameters(&[1.0, 0.0, 1.0]);
    bench("gaus(0)", &mut gaus, rounds, iters);

    let mut poly = Formula::new("bench_poly", "pol5");
    poly.set_parameters(&[1.0, -0.5, 0.25, -0.125, 0.0625, -0.03125]);
    bench("pol5", &mut poly, rounds, iters);

    let mut mixed = Formula::new("bench_mixed", "[0]*sin(x)+[1]*exp(-[2]*x)+landau(3)");
    mixed.set_parameters(&[1.0, 2.0, 0.5, 1.0, 0.0, 1.0]);
    bench("mixed transcendentals", &mut mixed, rounds, iters);
}
