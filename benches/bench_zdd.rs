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

/// Builds the ZDD of all singleton sets `{x_i}` and unions them, the
/// textbook way to grow a ZDD proportional to the number of variables
/// rather than the number of combinations.
fn bench_zdd_singletons(n: usize) {
    let mut dd = Manager::new();
    let vars: Vec<_> = (0..n).map(|i| dd.create_zdd_var(format!("x{i}"))).collect();
    let one = dd.zdd_one();
    let zero = dd.zdd_zero();
    let singles: Vec<_> = vars.iter().map(|&v| dd.unique_inter_zdd(v, one, zero)).collect();
    let mut acc = zero;
    clock(&format!("-bench zdd singleton union n={n}-"), || {
        for s in singles {
            let s = match s {
                dd::Outcome::Value(h) => h,
                _ => panic!("unexpected reorder/error while building singletons"),
            };
            acc = dd.zdd_union(acc, s).unwrap();
        }
    });
    println!("   node count {:?}", dd.live_node_count());
    println!("   combination count {:?}", dd.zdd_count(acc));
}

fn bench_zdd_change() {
    let mut dd = Manager::new();
    let v0 = dd.create_zdd_var("x0");
    let v1 = dd.create_zdd_var("x1");
    let one = dd.zdd_one();
    let zero = dd.zdd_zero();
    let s0 = match dd.unique_inter_zdd(v0, one, zero) {
        dd::Outcome::Value(h) => h,
        _ => panic!("unexpected reorder/error"),
    };
    let combos = dd.zdd_union(s0, one).unwrap();
    let toggled = dd.zdd_change(combos, v1).unwrap();
    println!("   node count {:?}", dd.live_node_count());
    println!("   combination count {:?}", dd.zdd_count(toggled));
}

fn main() {
    clock("bench zdd1", || bench_zdd_singletons(500));
    clock("bench zdd2", bench_zdd_change);
}
