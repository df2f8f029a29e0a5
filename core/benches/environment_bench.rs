use lispy::{Environment, Symbol, Value};
use std::time::{Duration, Instant};

fn bench_put_operations(n: usize) -> Duration {
    let symbols: Vec<Symbol> = (0..n).map(|i| Symbol::new(&format!("var{i}"))).collect();
    let start = Instant::now();

    let env = Environment::new();
    for (i, sym) in symbols.iter().enumerate() {
        env.put(*sym, Value::Number(i as i64));
    }

    start.elapsed()
}

fn bench_def_from_nested_scope(n: usize) -> Duration {
    let root = Environment::new();
    let leaf = root.extend().extend().extend();
    let symbols: Vec<Symbol> = (0..n).map(|i| Symbol::new(&format!("global{i}"))).collect();
    let start = Instant::now();

    for (i, sym) in symbols.iter().enumerate() {
        leaf.def(*sym, Value::Number(i as i64));
    }

    start.elapsed()
}

fn main() {
    println!("Environment put()/def() Performance Benchmark");
    println!("============================================\n");

    let test_sizes = vec![10, 100, 1000, 10000];

    for size in test_sizes {
        let put = bench_put_operations(size);
        let def = bench_def_from_nested_scope(size);
        let put_per_op = put.as_nanos() / size as u128;
        let def_per_op = def.as_nanos() / size as u128;

        println!("{size:5} bindings: put {put:?} ({put_per_op} ns/op), def {def:?} ({def_per_op} ns/op)");
    }
}
