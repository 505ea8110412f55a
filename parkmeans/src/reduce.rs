//! Element-wise reduction primitives used by the collective algorithms.
//!
//! Collectives move little-endian byte buffers between ranks. [`Element`]
//! maps a Rust scalar onto its [`DataType`] and wire encoding so typed
//! buffers can be staged for sending and written back after receiving.

use crate::error::{ParkmeansError, Result};
use crate::types::{DataType, ReduceOp};

/// Scalar types that collectives can transfer and reduce.
pub trait Element: Copy + Send + Sync + 'static {
    const DTYPE: DataType;

    fn reduce(a: Self, b: Self, op: ReduceOp) -> Self;
    fn read_le(bytes: &[u8]) -> Self;
    fn write_le(self, bytes: &mut [u8]);
}

macro_rules! impl_element {
    (int: $($ty:ty => $dt:expr),*) => {
        $(
            impl Element for $ty {
                const DTYPE: DataType = $dt;

                #[inline]
                fn reduce(a: Self, b: Self, op: ReduceOp) -> Self {
                    match op {
                        ReduceOp::Sum => a.wrapping_add(b),
                        ReduceOp::Min => a.min(b),
                        ReduceOp::Max => a.max(b),
                    }
                }
                impl_element!(@le $ty);
            }
        )*
    };
    (float: $($ty:ty => $dt:expr),*) => {
        $(
            impl Element for $ty {
                const DTYPE: DataType = $dt;

                #[inline]
                fn reduce(a: Self, b: Self, op: ReduceOp) -> Self {
                    match op {
                        ReduceOp::Sum => a + b,
                        ReduceOp::Min => a.min(b),
                        ReduceOp::Max => a.max(b),
                    }
                }
                impl_element!(@le $ty);
            }
        )*
    };
    (@le $ty:ty) => {
        #[inline]
        fn read_le(bytes: &[u8]) -> Self {
            let mut raw = [0u8; std::mem::size_of::<$ty>()];
            raw.copy_from_slice(bytes);
            Self::from_le_bytes(raw)
        }

        #[inline]
        fn write_le(self, bytes: &mut [u8]) {
            bytes.copy_from_slice(&self.to_le_bytes());
        }
    };
}

impl_element!(int: u8 => DataType::U8, u32 => DataType::U32);
impl_element!(float: f32 => DataType::F32, f64 => DataType::F64);

/// Encode a typed slice into a contiguous little-endian byte buffer.
pub fn to_bytes<T: Element>(values: &[T]) -> Vec<u8> {
    let size = T::DTYPE.size_in_bytes();
    let mut out = vec![0u8; values.len() * size];
    for (chunk, v) in out.chunks_exact_mut(size).zip(values) {
        v.write_le(chunk);
    }
    out
}

/// Decode a little-endian byte buffer into `dst`, which must match its length exactly.
pub fn copy_from_bytes<T: Element>(dst: &mut [T], bytes: &[u8]) -> Result<()> {
    let size = T::DTYPE.size_in_bytes();
    let expected = dst.len() * size;
    if bytes.len() != expected {
        return Err(ParkmeansError::BufferSizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    for (d, chunk) in dst.iter_mut().zip(bytes.chunks_exact(size)) {
        *d = T::read_le(chunk);
    }
    Ok(())
}

/// Element-wise reduce on byte slices interpreted as `T` elements: `dst = dst op src`.
///
/// Both slices must hold the same number of bytes.
pub(crate) fn reduce_slice<T: Element>(dst: &mut [u8], src: &[u8], op: ReduceOp) -> Result<()> {
    if dst.len() != src.len() {
        return Err(ParkmeansError::BufferSizeMismatch {
            expected: dst.len(),
            actual: src.len(),
        });
    }
    let size = T::DTYPE.size_in_bytes();
    for (d, s) in dst.chunks_exact_mut(size).zip(src.chunks_exact(size)) {
        let r = T::reduce(T::read_le(d), T::read_le(s), op);
        r.write_le(d);
    }
    Ok(())
}
