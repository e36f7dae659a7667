use crate::error::{Error, Result};
use std::{cell::Cell, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceKind {
    Cpu,
    Cuda,
    OpenCL,
    Aocl,
    Vulkan,
    Metal,
    Rocm,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::OpenCL => "opencl",
            Self::Aocl => "aocl",
            Self::Vulkan => "vulkan",
            Self::Metal => "metal",
            Self::Rocm => "rocm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Device {
    pub kind: DeviceKind,
    pub id: usize,
}

impl Device {
    pub const fn new(kind: DeviceKind, id: usize) -> Self {
        Self { kind, id }
    }

    pub const fn cpu() -> Self {
        Self::new(DeviceKind::Cpu, 0)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.as_str(), self.id)
    }
}

/// A compilation target. Several targets may share one device kind
/// (e.g. `cuda` and `nvptx` both run on CUDA devices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    Llvm,
    Cuda,
    Nvptx,
    Rocm,
    OpenCL,
    SdAccel,
    AoclSwEmu,
    Metal,
    Vulkan,
}

impl Target {
    pub const ALL: [Target; 9] = [
        Target::Cuda,
        Target::OpenCL,
        Target::Metal,
        Target::Rocm,
        Target::Vulkan,
        Target::Llvm,
        Target::Nvptx,
        Target::SdAccel,
        Target::AoclSwEmu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llvm => "llvm",
            Self::Cuda => "cuda",
            Self::Nvptx => "nvptx",
            Self::Rocm => "rocm",
            Self::OpenCL => "opencl",
            Self::SdAccel => "sdaccel",
            Self::AoclSwEmu => "aocl_sw_emu",
            Self::Metal => "metal",
            Self::Vulkan => "vulkan",
        }
    }

    pub fn device_kind(&self) -> DeviceKind {
        match self {
            Self::Llvm => DeviceKind::Cpu,
            Self::Cuda | Self::Nvptx => DeviceKind::Cuda,
            Self::Rocm => DeviceKind::Rocm,
            Self::OpenCL | Self::SdAccel => DeviceKind::OpenCL,
            Self::AoclSwEmu => DeviceKind::Aocl,
            Self::Metal => DeviceKind::Metal,
            Self::Vulkan => DeviceKind::Vulkan,
        }
    }

    pub fn is_gpu(&self) -> bool {
        !matches!(self, Self::Llvm)
    }

    pub fn max_num_threads(&self) -> usize {
        match self {
            Self::Cuda | Self::Nvptx => 512,
            _ => 256,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "llvm" | "cpu" | "c" => Ok(Self::Llvm),
            "cuda" => Ok(Self::Cuda),
            "nvptx" => Ok(Self::Nvptx),
            "rocm" => Ok(Self::Rocm),
            "opencl" => Ok(Self::OpenCL),
            "sdaccel" => Ok(Self::SdAccel),
            "aocl_sw_emu" => Ok(Self::AoclSwEmu),
            "metal" => Ok(Self::Metal),
            "vulkan" => Ok(Self::Vulkan),
            other => Err(Error::InvalidTarget(other.to_string())),
        }
    }
}

thread_local! {
    static CURRENT_TARGET: Cell<Option<Target>> = const { Cell::new(None) };
}

pub fn get_current_target() -> Option<Target> {
    CURRENT_TARGET.with(|t| t.get())
}

/// Makes `target` the current target for this thread until dropped.
pub struct TargetGuard {
    prev_target: Option<Target>,
}

impl TargetGuard {
    pub fn new(target: Target) -> Self {
        let prev_target = CURRENT_TARGET.with(|t| t.replace(Some(target)));
        Self { prev_target }
    }
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        CURRENT_TARGET.with(|t| t.set(self.prev_target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_target_roundtrips_its_name() -> Result<()> {
        for target in Target::ALL {
            assert_eq!(target.as_str().parse::<Target>()?, target);
        }
        assert_eq!("cpu".parse::<Target>()?, Target::Llvm);
        Ok(())
    }

    #[test]
    fn unknown_target_is_rejected() {
        match "tpu".parse::<Target>() {
            Err(Error::InvalidTarget(name)) => assert_eq!(name, "tpu"),
            other => panic!("expected InvalidTarget, got {:?}", other),
        }
    }

    #[test]
    fn device_kinds() {
        assert_eq!(Target::Nvptx.device_kind(), DeviceKind::Cuda);
        assert_eq!(Target::SdAccel.device_kind(), DeviceKind::OpenCL);
        assert_eq!(Target::AoclSwEmu.device_kind(), DeviceKind::Aocl);
        assert!(!Target::Llvm.is_gpu());
    }

    #[test]
    fn guard_nests_and_restores() {
        assert_eq!(get_current_target(), None);
        {
            let _outer = TargetGuard::new(Target::Llvm);
            {
                let _inner = TargetGuard::new(Target::Cuda);
                assert_eq!(get_current_target(), Some(Target::Cuda));
            }
            assert_eq!(get_current_target(), Some(Target::Llvm));
        }
        assert_eq!(get_current_target(), None);
    }
}
