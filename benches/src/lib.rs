/// Deterministic benchmark input: `size` values cycling through `[0, 1)`, then `transform`ed.
pub fn sample_data(size: usize, transform: impl Fn(f32) -> f32) -> Vec<f32> {
    (0..size).map(|i| transform((i % 10) as f32 / 10.0)).collect()
}
