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

fn bench_add_sum(n: usize) {
    let mut dd = Manager::new();
    let x: Vec<_> = (0..n).map(|i| dd.create_bdd_var(format!("x{i}"))).collect();
    let terms: Vec<_> = x.iter().map(|&xi| dd.bdd_to_add(xi).unwrap()).collect();
    let mut acc = dd.add_const(0.0).unwrap();
    clock(&format!("-bench add sum n={n}-"), || {
        for &t in &terms {
            acc = dd.add_plus(acc, t).unwrap();
        }
    });
    println!("   node count {:?}", dd.live_node_count());
    println!("   max leaf {:?}", dd.add_find_max(acc));
}

fn bench_add_ite() {
    let mut dd = Manager::new();
    let x0 = dd.create_bdd_var("x0");
    let x1 = dd.create_bdd_var("x1");
    let a = dd.bdd_to_add(x0).unwrap();
    let b = dd.bdd_to_add(x1).unwrap();
    let hi = dd.add_const(10.0).unwrap();
    let lo = dd.add_const(1.0).unwrap();
    let f = dd.add_ite(a, hi, lo).unwrap();
    let g = dd.add_times(f, b).unwrap();
    println!("   node count {:?}", dd.live_node_count());
    println!("   min leaf {:?}, max leaf {:?}", dd.add_find_min(g), dd.add_find_max(g));
}

fn main() {
    clock("bench add1", || bench_add_sum(500));
    clock("bench add2", bench_add_ite);
}
