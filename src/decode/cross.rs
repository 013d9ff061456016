//! Cross-correlation layouts: interleaved (re, im) pairs

use byteorder::ByteOrder;
use num_complex::Complex64;

use super::SampleView;

pub(super) fn decode_int16<B: ByteOrder>(view: &SampleView<'_, B>, scale: f64) -> Vec<Complex64> {
    pairs(view, |i| f64::from(view.i16_at(i)) / scale)
}

pub(super) fn decode_int32<B: ByteOrder>(view: &SampleView<'_, B>, scale: f64) -> Vec<Complex64> {
    pairs(view, |i| f64::from(view.i32_at(i)) / scale)
}

pub(super) fn decode_float32<B: ByteOrder>(view: &SampleView<'_, B>) -> Vec<Complex64> {
    pairs(view, |i| f64::from(view.f32_at(i)))
}

fn pairs<B: ByteOrder>(view: &SampleView<'_, B>, value: impl Fn(usize) -> f64) -> Vec<Complex64> {
    (0..view.len() / 2)
        .map(|k| Complex64::new(value(2 * k), value(2 * k + 1)))
        .collect()
}
