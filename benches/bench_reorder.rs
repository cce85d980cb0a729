use dd::Manager;

fn clock<F>(s: &str, f: F)
where
    F: FnOnce(),
{
    let start = std::time::Instant::now();
    f();
    let end = start.elapsed();
    println!("{}: time {}", s, end.as_secs_f64());
}

/// Builds a BDD whose variable order is deliberately bad (interleaved pairs
/// that only matter far apart) and sifts it back down, the classic case
/// sifting is supposed to help with.
fn bench_reorder_sift(n: usize) {
    let mut dd = Manager::new();
    let x: Vec<_> = (0..n).map(|i| dd.create_bdd_var(format!("x{i}"))).collect();
    let y: Vec<_> = (0..n).map(|i| dd.create_bdd_var(format!("y{i}"))).collect();
    let mut f = dd.bdd_zero();
    for i in 0..n {
        let pair = dd.bdd_and(x[i], y[i]).unwrap();
        f = dd.bdd_or(f, pair).unwrap();
    }
    println!("   node count before sift {:?}", dd.live_node_count());
    clock(&format!("-bench reorder sift n={n}-"), || {
        dd.sift_all_bdd();
    });
    println!("   node count after sift {:?}", dd.live_node_count());
}

fn main() {
    clock("bench reorder1", || bench_reorder_sift(200));
}
