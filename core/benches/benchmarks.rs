use codspeed_criterion_compat::{Criterion, black_box, criterion_group, criterion_main};
use lispy::{
    BuiltinKind, Environment, Interpreter, Numeric, Pool, Symbol, Value, conditional, parse,
};
use std::time::Duration;

// ============================================================================
// Benchmark Builtins
// ============================================================================

fn arithmetic(args: &[Value], op: fn(&Numeric, &Numeric) -> Result<Numeric, String>) -> Value {
    let mut nums = args.iter().filter_map(Numeric::from_value);
    let Some(mut acc) = nums.next() else {
        return Value::error("no numbers");
    };
    for n in nums {
        match op(&acc, &n) {
            Ok(next) => acc = next,
            Err(e) => return Value::error(e),
        }
    }
    acc.into_value()
}

fn add(_: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(&args, Numeric::add)
}

fn sub(_: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(&args, Numeric::sub)
}

fn mul(_: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    arithmetic(&args, Numeric::mul)
}

fn equal(_: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    Value::bool(args.windows(2).all(|pair| pair[0] == pair[1]))
}

fn lambda(_: &mut Interpreter, _: &Environment, args: Vec<Value>) -> Value {
    match <[Value; 2]>::try_from(args) {
        Ok([Value::QExpr(formals), Value::QExpr(body)]) => {
            let formals = formals
                .into_iter()
                .filter_map(|f| match f {
                    Value::Symbol(sym) => Some(sym),
                    _ => None,
                })
                .collect();
            Value::lambda(formals, body)
        }
        _ => Value::error("bad lambda"),
    }
}

fn def(_: &mut Interpreter, env: &Environment, args: Vec<Value>) -> Value {
    let mut args = args.into_iter();
    if let Some(Value::QExpr(names)) = args.next() {
        for (name, value) in names.into_iter().zip(args) {
            if let Value::Symbol(sym) = name {
                env.def(sym, value);
            }
        }
    }
    Value::default()
}

fn interpreter() -> Interpreter {
    let mut interp = Interpreter::new();
    interp.add_builtin("+", add);
    interp.add_builtin("-", sub);
    interp.add_builtin("*", mul);
    interp.add_builtin("==", equal);
    interp.add_builtin("\\", lambda);
    interp.add_builtin("def", def);
    interp.add_builtin_kind("if", conditional, BuiltinKind::Conditional);
    interp
}

// ============================================================================
// Parsing Benchmarks
// ============================================================================

fn bench_parse_small(c: &mut Criterion) {
    let mut pool = Pool::new();
    c.bench_function("parse small expr", |b| {
        b.iter(|| {
            let tree = parse(black_box("(+ 1 2)"), &mut pool);
            pool.release(black_box(tree));
        })
    });
}

fn bench_parse_large_list(c: &mut Criterion) {
    let numbers: Vec<String> = (0..1000).map(|i| i.to_string()).collect();
    let expr = format!("{{{}}}", numbers.join(" "));
    let mut pool = Pool::new();

    c.bench_function("parse large list (1000 elements)", |b| {
        b.iter(|| {
            let tree = parse(black_box(&expr), &mut pool);
            pool.release(tree);
        })
    });
}

fn bench_parse_deep_nesting(c: &mut Criterion) {
    let mut expr = String::from("1");
    for _ in 0..100 {
        expr = format!("(+ {expr} 1)");
    }
    let mut pool = Pool::new();

    c.bench_function("parse deep nesting (100 levels)", |b| {
        b.iter(|| {
            let tree = parse(black_box(&expr), &mut pool);
            pool.release(tree);
        })
    });
}

fn bench_parse_strings(c: &mut Criterion) {
    let mut pool = Pool::new();
    c.bench_function("parse escaped string", |b| {
        b.iter(|| {
            let tree = parse(black_box(r#""Line 1\nLine 2\tTabbed""#), &mut pool);
            pool.release(tree);
        })
    });
}

// ============================================================================
// Evaluation Benchmarks
// ============================================================================

fn bench_eval_arithmetic(c: &mut Criterion) {
    let mut interp = interpreter();
    c.bench_function("eval nested arithmetic", |b| {
        b.iter(|| black_box(interp.eval_str("(+ (* 2 3) (- 10 5) (* 20 4))")))
    });
}

fn bench_eval_lambda_invocation(c: &mut Criterion) {
    let mut interp = interpreter();
    c.bench_function("eval lambda invocation", |b| {
        b.iter(|| black_box(interp.eval_str("((\\ {x} {+ x 1}) 42)")))
    });
}

fn bench_eval_currying(c: &mut Criterion) {
    let mut interp = interpreter();
    interp.eval_str("(def {add3} (\\ {a b c} {+ a b c}))");
    c.bench_function("eval curried application", |b| {
        b.iter(|| black_box(interp.eval_str("(((add3 1) 2) 3)")))
    });
}

fn bench_recursive_fibonacci(c: &mut Criterion) {
    let mut interp = interpreter();
    interp.eval_str(
        "(def {fib} (\\ {n} {if (== n 0) {0} {if (== n 1) {1} {+ (fib (- n 1)) (fib (- n 2))}}}))",
    );
    c.bench_function("recursive fibonacci(10)", |b| {
        b.iter(|| black_box(interp.eval_str("(fib 10)")))
    });
}

fn bench_tail_recursion(c: &mut Criterion) {
    let mut interp = interpreter();
    interp.eval_str("(def {countdown} (\\ {n} {if (== n 0) {0} {countdown (- n 1)}}))");
    c.bench_function("tail recursion countdown(10000)", |b| {
        b.iter(|| black_box(interp.eval_str("(countdown 10000)")))
    });
}

// ============================================================================
// Pool and Environment Benchmarks
// ============================================================================

fn bench_pool_copy(c: &mut Criterion) {
    let mut pool = Pool::new();
    let tree = parse("{1 {2 {3 {4 {5 \"six\"}}}} (seven 8.0)}", &mut pool);
    c.bench_function("pool deep copy", |b| {
        b.iter(|| {
            let copy = pool.copy(black_box(&tree));
            pool.release(copy);
        })
    });
}

fn bench_env_lookup_chain(c: &mut Criterion) {
    let root = Environment::new();
    root.put(Symbol::new("deep"), Value::Number(1));
    let mut scopes = vec![root.clone()];
    for _ in 0..10 {
        let child = scopes[scopes.len() - 1].extend();
        scopes.push(child);
    }
    let leaf = scopes[scopes.len() - 1].clone();
    let sym = Symbol::new("deep");

    c.bench_function("env lookup through 10 scopes", |b| {
        b.iter(|| black_box(leaf.lookup(black_box(sym))))
    });
}

fn bench_symbol_intern_repeated(c: &mut Criterion) {
    c.bench_function("symbol intern repeated", |b| {
        b.iter(|| black_box(Symbol::new("common-symbol")))
    });
}

// ============================================================================
// Criterion Configuration and Main
// ============================================================================

criterion_group! {
    name = parsing_benches;
    config = Criterion::default()
        .sample_size(100)
        .measurement_time(Duration::from_secs(10));
    targets =
        bench_parse_small,
        bench_parse_large_list,
        bench_parse_deep_nesting,
        bench_parse_strings
}

criterion_group! {
    name = eval_benches;
    config = Criterion::default()
        .sample_size(100)
        .measurement_time(Duration::from_secs(10));
    targets =
        bench_eval_arithmetic,
        bench_eval_lambda_invocation,
        bench_eval_currying,
        bench_recursive_fibonacci,
        bench_tail_recursion
}

criterion_group! {
    name = storage_benches;
    config = Criterion::default()
        .sample_size(100)
        .measurement_time(Duration::from_secs(10));
    targets =
        bench_pool_copy,
        bench_env_lookup_chain,
        bench_symbol_intern_repeated
}

criterion_main!(parsing_benches, eval_benches, storage_benches);
