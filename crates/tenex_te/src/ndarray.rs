use crate::{backend::backend_for_device, Context};
use half::{bf16, f16};
use std::{ffi::c_void, fmt};
use tenex_core::{
    buffer::Buffer,
    dtype::{DType, Element},
    error::{Error, Result},
    layout::Layout,
};

/// A concrete array living on a device, used for kernel arguments.
pub struct NDArray {
    buffer: Box<dyn Buffer>,
    layout: Layout,
    ctx: Context,
}

impl NDArray {
    /// Zero-filled array.
    pub fn empty(shape: &[usize], dtype: DType, ctx: Context) -> Result<Self> {
        let backend = backend_for_device(ctx.kind())
            .filter(|b| ctx.id() < b.device_count())
            .ok_or_else(|| Error::InvalidDevice(format!("{} does not exist", ctx)))?;

        let layout = Layout::from_shape(shape);
        let buffer = backend.alloc(layout.size(), dtype, ctx.device())?;
        Ok(Self { buffer, layout, ctx })
    }

    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], ctx: Context) -> Result<Self> {
        let size = Layout::compute_size(shape);
        if data.len() != size {
            return Err(Error::ShapeMismatch {
                expected: format!("{:?}", shape),
                got: format!("{} elements", data.len()),
                msg: "data length must match the shape".into(),
            });
        }

        let mut array = Self::empty(shape, T::DTYPE, ctx)?;
        unsafe {
            array
                .buffer
                .copy_from_host(data.as_ptr() as *const c_void, std::mem::size_of_val(data))?;
        }
        Ok(array)
    }

    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize], ctx: Context) -> Result<Self> {
        Self::from_slice(&data, shape, ctx)
    }

    pub fn zeros_like(other: &NDArray) -> Result<Self> {
        Self::empty(other.shape(), other.dtype(), other.ctx)
    }

    /// A view with `dim0` and `dim1` swapped. The buffer is not moved, so
    /// `to_vec` still returns elements in storage order.
    pub fn transpose(mut self, dim0: usize, dim1: usize) -> Result<Self> {
        self.layout.transpose(dim0, dim1)?;
        Ok(self)
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype() {
            return Err(Error::DTypeMismatch {
                expected: self.dtype(),
                got: T::DTYPE,
            });
        }
        let mut out = vec![T::default(); self.buffer.len()];
        unsafe {
            self.buffer
                .copy_to_host(out.as_mut_ptr() as *mut c_void, self.buffer.size_in_bytes())?;
        }
        Ok(out)
    }

    /// Values widened to `f64`, whatever the element type.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        fn widen<T: Element>(array: &NDArray) -> Result<Vec<f64>> {
            Ok(array.to_vec::<T>()?.into_iter().map(Element::to_f64).collect())
        }

        match self.dtype() {
            DType::BF16 => widen::<bf16>(self),
            DType::F16 => widen::<f16>(self),
            DType::F32 => widen::<f32>(self),
            DType::F64 => widen::<f64>(self),
            DType::I32 => widen::<i32>(self),
            DType::I64 => widen::<i64>(self),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn dtype(&self) -> DType {
        self.buffer.dtype()
    }

    pub fn context(&self) -> Context {
        self.ctx
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn buffer(&self) -> &dyn Buffer {
        self.buffer.as_ref()
    }

    pub fn buffer_mut(&mut self) -> &mut dyn Buffer {
        self.buffer.as_mut()
    }
}

impl fmt::Debug for NDArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NDArray({}, shape={:?}, {})", self.dtype(), self.shape(), self.ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_host_data() -> Result<()> {
        let array = NDArray::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], Context::cpu(0))?;
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array.size(), 6);
        assert_eq!(array.dtype(), DType::F32);
        assert_eq!(array.to_vec::<f32>()?, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(array.to_f64_vec()?[5], 6.0);
        Ok(())
    }

    #[test]
    fn empty_is_zeroed() -> Result<()> {
        let array = NDArray::empty(&[4], DType::I64, Context::cpu(0))?;
        assert_eq!(array.to_vec::<i64>()?, vec![0; 4]);
        let like = NDArray::zeros_like(&array)?;
        assert_eq!(like.shape(), &[4]);
        assert_eq!(like.dtype(), DType::I64);
        Ok(())
    }

    #[test]
    fn transpose_is_a_view() -> Result<()> {
        let array = NDArray::from_slice(&[1i32, 2, 3, 4, 5, 6], &[2, 3], Context::cpu(0))?.transpose(0, 1)?;
        assert_eq!(array.shape(), &[3, 2]);
        assert!(!array.is_contiguous());
        assert_eq!(array.to_vec::<i32>()?, vec![1, 2, 3, 4, 5, 6]);
        Ok(())
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            NDArray::from_slice(&[1.0f32, 2.0], &[3], Context::cpu(0)),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            NDArray::empty(&[2], DType::F32, Context::cpu(3)),
            Err(Error::InvalidDevice(_))
        ));

        let array = NDArray::empty(&[2], DType::F32, Context::cpu(0)).unwrap();
        assert!(matches!(array.to_vec::<f64>(), Err(Error::DTypeMismatch { .. })));
    }
}
