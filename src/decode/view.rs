//! Typed, bounds-checked view over the raw scalars of one cell

use std::marker::PhantomData;

use byteorder::ByteOrder;

use crate::error::{Result, StManError};

/// Scalars `[start, start + len)` of a raw block, read with byte order `B`
#[derive(Debug, Clone, Copy)]
pub struct SampleView<'a, B> {
    bytes: &'a [u8],
    width: usize,
    _order: PhantomData<B>,
}

impl<'a, B: ByteOrder> SampleView<'a, B> {
    /// `start` and `len` are counted in scalars of `width` bytes
    pub fn new(raw: &'a [u8], width: usize, start: u64, len: usize) -> Result<Self> {
        let available = raw.len() as u64;
        let end = start
            .checked_mul(width as u64)
            .and_then(|begin| begin.checked_add((len * width) as u64))
            .unwrap_or(u64::MAX);
        if end > available {
            return Err(StManError::ShortBlock {
                needed: end,
                available,
            });
        }
        // end fits in the block, so begin cannot overflow
        let begin = start * width as u64;
        Ok(Self {
            bytes: &raw[begin as usize..end as usize],
            width,
            _order: PhantomData,
        })
    }

    /// Number of scalars in the view
    pub fn len(&self) -> usize {
        self.bytes.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn scalar(&self, i: usize) -> &'a [u8] {
        &self.bytes[i * self.width..(i + 1) * self.width]
    }

    pub fn i16_at(&self, i: usize) -> i16 {
        B::read_i16(self.scalar(i))
    }

    pub fn i32_at(&self, i: usize) -> i32 {
        B::read_i32(self.scalar(i))
    }

    pub fn f32_at(&self, i: usize) -> f32 {
        B::read_f32(self.scalar(i))
    }
}
