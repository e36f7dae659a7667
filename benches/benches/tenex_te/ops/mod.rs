mod unary;

use criterion::criterion_group;

criterion_group!(benches, unary::basic, unary::fused_chain);
