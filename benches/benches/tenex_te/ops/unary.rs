use benches::sample_data;
use criterion::{black_box, Criterion};
use tenex_core::{device::Target, dtype::DType, error::Result, expr::var};
use tenex_te::{build, placeholder, schedule_injective_for, Context, Module, NDArray, Tensor};

// Constants for benchmark data sizes
const SIZES: [(usize, &str); 3] = [(1000, "small"), (100_000, "medium"), (1_000_000, "large")];

fn compile(op: impl Fn(&Tensor) -> Result<Tensor>) -> Result<Module> {
    let a = placeholder([var("n")], "A")?;
    let b = op(&a)?;
    let s = schedule_injective_for(Target::Llvm, &[b.clone()])?;
    build(&s, &[a, b], Target::Llvm, "bench")
}

fn bench_module(b: &mut criterion::Bencher, module: &Module, data: &[f32]) {
    let ctx = Context::cpu(0);
    let mut input = NDArray::from_slice(data, &[data.len()], ctx).unwrap();
    let mut output = NDArray::empty(&[data.len()], DType::F32, ctx).unwrap();

    b.iter(|| {
        module.call(&mut [&mut input, &mut output]).unwrap();
        black_box(&output);
    })
}

type Operation = (&'static str, fn(f32) -> f32, fn(&Tensor) -> Result<Tensor>);

pub fn basic(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("unary/basic");
    group.warm_up_time(core::time::Duration::from_millis(500));
    group.measurement_time(core::time::Duration::from_secs(3));
    group.sample_size(50);

    let operations: [Operation; 12] = [
        ("floor", |x| x * 200.0 - 100.0, Tensor::floor),
        ("ceil", |x| x * 200.0 - 100.0, Tensor::ceil),
        ("sign", |x| x - 0.5, Tensor::sign),
        ("trunc", |x| x * 200.0 - 100.0, Tensor::trunc),
        ("abs", |x| x - 0.5, Tensor::abs),
        ("round", |x| x * 200.0 - 100.0, Tensor::round),
        ("exp", |x| x * 2.0 - 1.0, Tensor::exp),
        ("tanh", |x| x * 20.0 - 10.0, Tensor::tanh),
        ("sigmoid", |x| x * 10.0 - 5.0, Tensor::sigmoid),
        ("log", |x| x + 0.01, Tensor::log),
        ("sqrt", |x| x, Tensor::sqrt),
        ("rsqrt", |x| x + 0.01, Tensor::rsqrt),
    ];

    for (op_name, transform, op) in &operations {
        let module = compile(op).unwrap();
        for &(size, size_name) in &SIZES {
            let data = sample_data(size, transform);
            let bench_name = format!("{}/cpu/{}", op_name, size_name);

            group.bench_function(&bench_name, |b| bench_module(b, &module, &data));
        }
    }

    group.finish();
}

pub fn fused_chain(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("unary/fused");
    group.sample_size(30);

    let module = compile(|t| t.abs()?.sqrt()?.log()?.tanh()).unwrap();
    for &(size, size_name) in &SIZES {
        let data = sample_data(size, |x| x - 0.5);
        group.bench_function(format!("abs_sqrt_log_tanh/cpu/{}", size_name), |b| {
            bench_module(b, &module, &data)
        });
    }

    group.finish();
}
