pub mod cpu;

use crate::{
    device::{Device, DeviceKind},
    dtype::DType,
    error::{Error, Result},
};
use cpu::CpuBuffer;
use std::ffi::c_void;

pub struct BufferManager {}

impl BufferManager {
    pub fn create(size: usize, device: Device, dtype: DType) -> Result<Box<dyn Buffer>> {
        let buffer: Box<dyn Buffer> = match device.kind {
            DeviceKind::Cpu => Box::new(CpuBuffer::new(size, dtype)?),
            _ => {
                return Err(Error::InvalidDevice(format!(
                    "no in-tree allocator for {}",
                    device
                )))
            }
        };

        Ok(buffer)
    }
}

pub trait Buffer: Send + Sync {
    fn as_ptr(&self) -> *const c_void;
    fn as_mut_ptr(&mut self) -> *mut c_void;
    /// Number of elements.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn dtype(&self) -> DType;
    fn device(&self) -> Device;

    /// # Safety
    /// `src` must be valid for reads of `size_in_bytes` bytes and must not overlap this buffer.
    unsafe fn copy_from_host(&mut self, src: *const c_void, size_in_bytes: usize) -> Result<()>;

    /// # Safety
    /// `dest` must be valid for writes of `size_in_bytes` bytes and must not overlap this buffer.
    unsafe fn copy_to_host(&self, dest: *mut c_void, size_in_bytes: usize) -> Result<()>;

    fn size_in_bytes(&self) -> usize {
        self.len() * self.dtype().size_in_bytes()
    }
}
