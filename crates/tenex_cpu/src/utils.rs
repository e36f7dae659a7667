#[inline]
pub fn is_contiguous(num_dims: usize, dims: &[usize], strides: &[usize]) -> bool {
    let mut acc = 1;
    for d in 0..num_dims {
        let dim_idx = num_dims - 1 - d;
        if dims[dim_idx] > 1 && acc != strides[dim_idx] {
            return false;
        }
        acc *= dims[dim_idx];
    }
    true
}

#[inline]
pub fn get_strided_index(idx: usize, num_dims: usize, dims: &[usize], strides: &[usize]) -> usize {
    let mut strided_i = 0;
    let mut remaining_idx = idx;

    for d in 0..num_dims {
        let dim_idx = num_dims - 1 - d;
        strided_i += (remaining_idx % dims[dim_idx]) * strides[dim_idx];
        remaining_idx /= dims[dim_idx];
    }

    strided_i
}

/// One past the largest element index reachable through `dims`/`strides`.
#[inline]
pub fn strided_extent(num_dims: usize, dims: &[usize], strides: &[usize]) -> usize {
    if dims[..num_dims].iter().any(|&d| d == 0) {
        return 0;
    }
    1 + (0..num_dims).map(|d| (dims[d] - 1) * strides[d]).sum::<usize>()
}
