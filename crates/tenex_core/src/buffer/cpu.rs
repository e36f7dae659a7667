use crate::{
    buffer::Buffer,
    device::Device,
    dtype::DType,
    error::{Error, Result},
};
use std::{ffi::c_void, ptr};

/// Host memory. Backed by `u64` words so every supported dtype is aligned.
pub struct CpuBuffer {
    data: Vec<u64>,
    len: usize,
    dtype: DType,
}

impl CpuBuffer {
    pub fn new(size: usize, dtype: DType) -> Result<Self> {
        let total_size = size
            .checked_mul(dtype.size_in_bytes())
            .ok_or_else(|| Error::InvalidArgument("Overflow in allocation".into()))?;
        Ok(Self {
            data: vec![0; total_size.div_ceil(8)],
            len: size,
            dtype,
        })
    }
}

impl Buffer for CpuBuffer {
    fn as_ptr(&self) -> *const c_void {
        self.data.as_ptr() as *const _
    }

    fn as_mut_ptr(&mut self) -> *mut c_void {
        self.data.as_mut_ptr() as *mut _
    }

    fn len(&self) -> usize {
        self.len
    }

    fn dtype(&self) -> DType {
        self.dtype
    }

    fn device(&self) -> Device {
        Device::cpu()
    }

    unsafe fn copy_from_host(&mut self, src: *const c_void, size_in_bytes: usize) -> Result<()> {
        if size_in_bytes != self.size_in_bytes() {
            return Err(Error::InvalidArgument(format!(
                "Size mismatch in copy_from_host: got {}, buffer holds {}",
                size_in_bytes,
                self.size_in_bytes()
            )));
        }
        ptr::copy_nonoverlapping(src as *const u8, self.data.as_mut_ptr() as *mut u8, size_in_bytes);
        Ok(())
    }

    unsafe fn copy_to_host(&self, dest: *mut c_void, size_in_bytes: usize) -> Result<()> {
        if size_in_bytes > self.size_in_bytes() {
            return Err(Error::InvalidArgument(format!(
                "Size mismatch in copy_to_host: requested {}, available {}",
                size_in_bytes,
                self.size_in_bytes()
            )));
        }
        ptr::copy_nonoverlapping(self.data.as_ptr() as *const u8, dest as *mut u8, size_in_bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_initialised_and_sized_in_elements() -> Result<()> {
        let buffer = CpuBuffer::new(5, DType::F16)?;
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.size_in_bytes(), 10);

        let mut host = vec![1u16; 5];
        unsafe { buffer.copy_to_host(host.as_mut_ptr() as *mut c_void, 10)? };
        assert_eq!(host, vec![0; 5]);
        Ok(())
    }

    #[test]
    fn host_roundtrip() -> Result<()> {
        let mut buffer = CpuBuffer::new(3, DType::F32)?;
        let src = [1.0f32, -2.5, 3.25];
        let mut dst = [0.0f32; 3];
        unsafe {
            buffer.copy_from_host(src.as_ptr() as *const c_void, 12)?;
            buffer.copy_to_host(dst.as_mut_ptr() as *mut c_void, 12)?;
        }
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn rejects_wrong_size_and_overflow() {
        let mut buffer = CpuBuffer::new(2, DType::F64).unwrap();
        let src = [0u8; 4];
        assert!(unsafe { buffer.copy_from_host(src.as_ptr() as *const c_void, 4) }.is_err());
        assert!(CpuBuffer::new(usize::MAX, DType::F64).is_err());
    }
}
