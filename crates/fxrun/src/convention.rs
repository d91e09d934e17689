//! # Calling convention
//!
//! How argument blobs cross into the sandbox and how the result comes back.
//!
//! 1. All argument blobs are concatenated, in call order, into one buffer `L`.
//! 2. The guest's allocator is asked for `len(L) + slack` bytes and returns a base `a`.
//! 3. `L` is copied into guest memory at `a`.
//! 4. The entrypoint receives `[a, len(arg_0), ..., len(arg_{n-1})]`, so argument
//!    `i` starts at `a + len(arg_0) + ... + len(arg_{i-1})`.
//! 5. The entrypoint returns `b`; the output is the guest memory range `[a, a + b)`.
//!
//! Every value crossing the boundary is an `i32`, so all sizes are checked
//! against `i32::MAX` before anything is allocated.

use wasmtime::Val;

use crate::error::ArgumentError;

/// Minimum headroom reserved after the linear input for the guest's output.
pub const DEFAULT_SLACK: u32 = 100;

/// Argument blobs laid out back to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linear {
    buffer: Vec<u8>,
    lengths: Vec<i32>,
}

impl Linear {
    /// Concatenates `args` in order, recording each length.
    pub fn new<A: AsRef<[u8]>>(args: &[A]) -> Result<Self, ArgumentError> {
        let total: usize = args.iter().map(|a| a.as_ref().len()).sum();
        let mut buffer = Vec::with_capacity(total);
        let mut lengths = Vec::with_capacity(args.len());

        for (index, arg) in args.iter().enumerate() {
            let arg = arg.as_ref();
            let len = i32::try_from(arg.len()).map_err(|_| ArgumentError::TooLarge { index, len: arg.len() })?;
            lengths.push(len);
            buffer.extend_from_slice(arg);
        }
        if i32::try_from(buffer.len()).is_err() {
            return Err(ArgumentError::TooLarge { index: args.len().saturating_sub(1), len: buffer.len() });
        }

        Ok(Self { buffer, lengths })
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn lengths(&self) -> &[i32] {
        &self.lengths
    }

    /// Number of bytes to request from the guest allocator.
    pub fn alloc_size(&self, slack: u32) -> Result<i32, ArgumentError> {
        let want = self.buffer.len() as u64 + u64::from(slack);
        i32::try_from(want).map_err(|_| ArgumentError::TooLarge {
            index: self.lengths.len().saturating_sub(1),
            len: self.buffer.len(),
        })
    }

    /// Entrypoint parameters: the base pointer, then one length per argument.
    pub fn params(&self, base: i32) -> Vec<Val> {
        std::iter::once(base)
            .chain(self.lengths.iter().copied())
            .map(Val::I32)
            .collect()
    }

    /// Start offset of argument `index` inside guest memory, as the guest computes it.
    pub fn offset_of(&self, base: u32, index: usize) -> Option<u32> {
        if index >= self.lengths.len() {
            return None;
        }
        let before: u64 = self.lengths[..index].iter().map(|&l| l as u64).sum();
        u32::try_from(u64::from(base) + before).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(params: &[Val]) -> Vec<i32> {
        params.iter().map(|v| v.unwrap_i32()).collect()
    }

    #[test]
    fn test_concatenates_in_order() {
        let lin = Linear::new(&[b"ab".as_slice(), b"".as_slice(), b"cde".as_slice()]).unwrap();
        assert_eq!(lin.buffer(), b"abcde");
        assert_eq!(lin.lengths(), &[2, 0, 3]);
    }

    #[test]
    fn test_params_put_base_first() {
        let lin = Linear::new(&[vec![0u8; 4], vec![0u8; 4]]).unwrap();
        assert_eq!(ints(&lin.params(1024)), vec![1024, 4, 4]);
    }

    #[test]
    fn test_zero_arguments_degenerate_to_base_only() {
        let lin = Linear::new::<Vec<u8>>(&[]).unwrap();
        assert!(lin.buffer().is_empty());
        assert_eq!(ints(&lin.params(64)), vec![64]);
        assert_eq!(lin.alloc_size(DEFAULT_SLACK).unwrap(), 100);
    }

    #[test]
    fn test_offsets_are_prefix_sums() {
        let args = [vec![1u8; 3], vec![2u8; 5], vec![3u8; 7], vec![4u8; 1]];
        let lin = Linear::new(&args).unwrap();
        let base = 2048;

        for (i, arg) in args.iter().enumerate() {
            let start = lin.offset_of(base, i).unwrap() as usize;
            let local = start - base as usize;
            assert_eq!(&lin.buffer()[local..local + arg.len()], arg.as_slice());
        }
        assert_eq!(lin.offset_of(base, 4), None);
    }

    #[test]
    fn test_alloc_size_adds_slack() {
        let lin = Linear::new(&[b"Hello World!"]).unwrap();
        assert_eq!(lin.alloc_size(100).unwrap(), 112);
        assert_eq!(lin.alloc_size(0).unwrap(), 12);
    }

    #[test]
    fn test_alloc_size_overflow() {
        let lin = Linear::new(&[vec![0u8; 16]]).unwrap();
        assert_eq!(
            lin.alloc_size(u32::MAX),
            Err(ArgumentError::TooLarge { index: 0, len: 16 })
        );
    }
}
