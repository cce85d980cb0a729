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

fn bench_bdd_conjunction(n: usize) {
    let mut dd = Manager::new();
    let x: Vec<_> = (0..n).map(|i| dd.create_bdd_var(format!("x{i}"))).collect();
    let mut b = dd.bdd_one();
    clock(&format!("-bench bdd conjunction n={n}-"), || {
        for &xi in &x {
            b = dd.bdd_and(b, xi).unwrap();
        }
    });
    println!("   node count {:?}", dd.live_node_count());
}

fn bench_bdd_conjunction_reverse(n: usize) {
    let mut dd = Manager::new();
    let x: Vec<_> = (0..n).map(|i| dd.create_bdd_var(format!("x{i}"))).collect();
    let mut b = dd.bdd_one();
    clock(&format!("-bench bdd conjunction (reverse order) n={n}-"), || {
        for &xi in x.iter().rev() {
            b = dd.bdd_and(b, xi).unwrap();
        }
    });
    println!("   node count {:?}", dd.live_node_count());
}

fn bench_bdd_count() {
    let mut dd = Manager::new();
    let x0 = dd.create_bdd_var("x0");
    let x1 = dd.create_bdd_var("x1");
    let x2 = dd.create_bdd_var("x2");
    let b = dd.bdd_and(x0, x1).unwrap();
    let b = dd.bdd_or(b, x2).unwrap();
    println!("   node count {:?}", dd.live_node_count());
    let count: dd::bigcount::U128Count = dd.bdd_count(b);
    println!("   satisfying assignments {:?}", count);
}

fn main() {
    clock("bench bdd1", || bench_bdd_conjunction(1000));
    clock("bench bdd2", || bench_bdd_conjunction_reverse(1000));
    clock("bench bdd3", bench_bdd_count);
}
