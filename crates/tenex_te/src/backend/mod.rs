pub mod cpu;

use crate::{LoweredFunc, NDArray};
use dashmap::DashMap;
use std::sync::{Arc, LazyLock};
use tenex_core::{
    buffer::Buffer,
    device::{Device, DeviceKind, Target},
    dtype::DType,
    error::Result,
};

/// A code generator plus runtime for one family of targets.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;
    fn targets(&self) -> &[Target];
    fn device_kind(&self) -> DeviceKind;
    /// Number of devices of [`Backend::device_kind`] visible to this process.
    fn device_count(&self) -> usize;
    fn alloc(&self, size: usize, dtype: DType, device: Device) -> Result<Box<dyn Buffer>>;
    fn compile(&self, func: &LoweredFunc, target: Target) -> Result<Arc<dyn Kernel>>;
}

/// A compiled function, ready to run on arrays that passed argument checks.
pub trait Kernel: Send + Sync {
    fn launch(&self, inputs: &[&NDArray], output: &mut NDArray, num_els: usize) -> Result<()>;
}

// ────────────────────────────────────────────────────────────────────────────
//  Registry
// ────────────────────────────────────────────────────────────────────────────

static BACKENDS: LazyLock<DashMap<Target, Arc<dyn Backend>>> = LazyLock::new(|| {
    let map: DashMap<Target, Arc<dyn Backend>> = DashMap::with_capacity_and_shard_amount(16, 4);
    let cpu: Arc<dyn Backend> = Arc::new(cpu::CpuBackend);
    for &target in cpu.targets() {
        map.insert(target, Arc::clone(&cpu));
    }
    map
});

/// Makes `backend` serve every target it lists, replacing earlier registrations.
pub fn register_backend(backend: Arc<dyn Backend>) {
    for &target in backend.targets() {
        tracing::debug!(backend = backend.name(), %target, "registering backend");
        BACKENDS.insert(target, Arc::clone(&backend));
    }
}

pub fn backend_for_target(target: Target) -> Option<Arc<dyn Backend>> {
    BACKENDS.get(&target).map(|b| Arc::clone(b.value()))
}

pub fn backend_for_device(kind: DeviceKind) -> Option<Arc<dyn Backend>> {
    BACKENDS
        .iter()
        .find(|entry| entry.value().device_kind() == kind)
        .map(|entry| Arc::clone(entry.value()))
}
