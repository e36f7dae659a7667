use crate::backend::backend_for_device;
use std::fmt;
use tenex_core::{
    device::{Device, DeviceKind, Target},
    error::Result,
};

/// A device handle as seen by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Context {
    device: Device,
}

impl Context {
    pub const fn new(kind: DeviceKind, id: usize) -> Self {
        Self {
            device: Device::new(kind, id),
        }
    }

    pub const fn cpu(id: usize) -> Self {
        Self::new(DeviceKind::Cpu, id)
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn kind(&self) -> DeviceKind {
        self.device.kind
    }

    pub fn id(&self) -> usize {
        self.device.id
    }

    /// Whether a registered backend drives this device.
    pub fn exists(&self) -> bool {
        backend_for_device(self.device.kind).is_some_and(|b| self.device.id < b.device_count())
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.device, f)
    }
}

/// Context for the device that target `name` runs on.
pub fn context(name: &str, id: usize) -> Result<Context> {
    let target: Target = name.parse()?;
    Ok(Context::new(target.device_kind(), id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_context_exists() -> Result<()> {
        let ctx = context("llvm", 0)?;
        assert_eq!(ctx, Context::cpu(0));
        assert!(ctx.exists());
        assert!(!Context::cpu(1).exists());
        assert_eq!(ctx.to_string(), "cpu(0)");
        Ok(())
    }

    #[test]
    fn gpu_target_maps_to_its_device_kind() -> Result<()> {
        let ctx = context("nvptx", 0)?;
        assert_eq!(ctx.kind(), DeviceKind::Cuda);
        assert!(context("not-a-target", 0).is_err());
        Ok(())
    }
}
