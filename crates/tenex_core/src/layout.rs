use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
}

impl Layout {
    pub fn new(shape: &[usize], strides: &[usize], offset: usize) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(Error::InvalidShape {
                message: format!("{} dims but {} strides", shape.len(), strides.len()),
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            strides: strides.to_vec(),
            offset,
        })
    }

    pub fn from_shape(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            strides: Self::compute_strides(shape),
            offset: 0,
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == Self::compute_strides(&self.shape)
    }

    pub fn transpose(&mut self, dim0: usize, dim1: usize) -> Result<()> {
        if dim0 >= self.ndim() || dim1 >= self.ndim() {
            return Err(Error::InvalidShape {
                message: format!("cannot swap dims {} and {} of a rank {} layout", dim0, dim1, self.ndim()),
            });
        }
        self.shape.swap(dim0, dim1);
        self.strides.swap(dim0, dim1);
        Ok(())
    }

    /// Kernel metadata: `dims ++ strides ++ [offset]`.
    pub fn metadata(&self) -> Vec<usize> {
        let mut metadata = Vec::with_capacity(2 * self.ndim() + 1);
        metadata.extend_from_slice(&self.shape);
        metadata.extend_from_slice(&self.strides);
        metadata.push(self.offset);
        metadata
    }

    // helper

    pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
        if shape.is_empty() {
            return vec![];
        }

        let mut strides = vec![1; shape.len()];
        for i in (0..shape.len() - 1).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }

    pub fn compute_size(shape: &[usize]) -> usize {
        shape.iter().product()
    }
}
