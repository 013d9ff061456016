//! Tests for the sample decoders
//!
//! These tests verify:
//! - Int16/Int32 de-quantization round trip and repeatable decoding
//! - Byte-swap symmetry between big- and little-endian blocks
//! - Autocorrelation expansion for 1-4 polarizations
//! - Per-baseline, per-spectral-window and block offsets
//! - Bounds checking of short blocks and invalid cells

use asdmstman::decode::{decode_cell, ByteOrderKind};
use asdmstman::index::{DataType, IndexEntry};
use asdmstman::{Complex64, StManError};

// =============================================================================
// Helper Functions
// =============================================================================

/// Deterministic visibilities in roughly [-1, 1]
fn sample_values(count: usize, seed: u64) -> Vec<Complex64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) as f64 / (1u64 << 31) as f64) * 2.0 - 1.0
    };
    (0..count).map(|_| Complex64::new(next(), next())).collect()
}

fn quantize_i16(values: &[Complex64], scale: f64, big_endian: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        for x in [v.re, v.im] {
            let q = (x * scale).round() as i16;
            out.extend_from_slice(&if big_endian { q.to_be_bytes() } else { q.to_le_bytes() });
        }
    }
    out
}

fn quantize_i32(values: &[Complex64], scale: f64) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| [v.re, v.im])
        .flat_map(|x| ((x * scale).round() as i32).to_le_bytes())
        .collect()
}

fn floats(values: &[f32], big_endian: bool) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
        .collect()
}

/// Reverse the bytes of every `width`-byte scalar
fn swap_scalars(raw: &[u8], width: usize) -> Vec<u8> {
    raw.chunks(width)
        .flat_map(|chunk| chunk.iter().rev().copied())
        .collect()
}

// =============================================================================
// Integer Decoder Tests
// =============================================================================

#[test]
fn test_int16_round_trip_within_quantization() {
    let scale = 1000.0;
    let entry = IndexEntry::packed(0, DataType::Int16, 3, 16, 2).with_scale_factors(vec![scale]);
    let values = sample_values(3 * 16 * 2, 1);
    let raw = quantize_i16(&values, scale, false);

    for baseline in 0..3u32 {
        let out = decode_cell(&raw, &entry, ByteOrderKind::Little, baseline, 0).unwrap();
        let expected = &values[baseline as usize * 32..(baseline as usize + 1) * 32];
        assert_eq!(out.len(), 32);
        for (got, want) in out.iter().zip(expected) {
            assert!((got.re - want.re).abs() <= 1.0 / scale);
            assert!((got.im - want.im).abs() <= 1.0 / scale);
        }
    }
}

#[test]
fn test_int32_round_trip_within_quantization() {
    let scale = 1.0e6;
    let entry = IndexEntry::packed(0, DataType::Int32, 2, 8, 4).with_scale_factors(vec![scale]);
    let values = sample_values(2 * 8 * 4, 2);
    let raw = quantize_i32(&values, scale);

    let out = decode_cell(&raw, &entry, ByteOrderKind::Little, 1, 0).unwrap();

    for (got, want) in out.iter().zip(&values[32..]) {
        assert!((got.re - want.re).abs() <= 1.0 / scale);
        assert!((got.im - want.im).abs() <= 1.0 / scale);
    }
}

#[test]
fn test_decode_is_repeatable() {
    let entry = IndexEntry::packed(0, DataType::Int16, 1, 64, 4).with_scale_factors(vec![37.5]);
    let raw = quantize_i16(&sample_values(256, 3), 37.5, false);

    let first = decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 0).unwrap();
    let second = decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 0).unwrap();

    let bits = |v: &[Complex64]| -> Vec<(u64, u64)> {
        v.iter().map(|c| (c.re.to_bits(), c.im.to_bits())).collect()
    };
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn test_scale_factor_per_spectral_window() {
    // One baseline, two spectral windows with different scales
    let mut entry = IndexEntry::packed(0, DataType::Int16, 1, 1, 1).with_scale_factors(vec![10.0, 4.0]);
    entry.n_spw = 2;
    entry.step_spw = 2;
    entry.step_bl = 4;
    let raw: Vec<u8> = [20i16, -10, 8, 2].iter().flat_map(|v| v.to_le_bytes()).collect();

    let spw0 = decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 0).unwrap();
    let spw1 = decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 1).unwrap();

    assert_eq!(spw0, vec![Complex64::new(2.0, -1.0)]);
    assert_eq!(spw1, vec![Complex64::new(2.0, 0.5)]);
}

// =============================================================================
// Float Decoder Tests
// =============================================================================

#[test]
fn test_float32_exact() {
    let entry = IndexEntry::packed(0, DataType::Float32, 2, 2, 1);
    let raw = floats(&[1.0, 2.0, 3.0, 4.0, 5.5, -6.5, 7.25, 8.0], false);

    let out = decode_cell(&raw, &entry, ByteOrderKind::Little, 1, 0).unwrap();

    assert_eq!(out, vec![Complex64::new(5.5, -6.5), Complex64::new(7.25, 8.0)]);
}

#[test]
fn test_float32_ignores_scale_factors() {
    let entry = IndexEntry::packed(0, DataType::Float32, 1, 1, 1).with_scale_factors(vec![1000.0]);
    let raw = floats(&[3.0, -1.0], false);

    let out = decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 0).unwrap();

    assert_eq!(out, vec![Complex64::new(3.0, -1.0)]);
}

#[test]
fn test_block_offset_skips_prefix() {
    let mut entry = IndexEntry::packed(0, DataType::Float32, 1, 1, 1);
    entry.block_offset = 4;
    let raw = floats(&[9.0, 9.0, 9.0, 9.0, 1.5, 2.5], false);

    let out = decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 0).unwrap();

    assert_eq!(out, vec![Complex64::new(1.5, 2.5)]);
}

// =============================================================================
// Byte Order Tests
// =============================================================================

#[test]
fn test_byte_swap_symmetry_int16() {
    let entry = IndexEntry::packed(0, DataType::Int16, 2, 8, 2).with_scale_factors(vec![200.0]);
    let big = quantize_i16(&sample_values(32, 4), 200.0, true);
    let little = swap_scalars(&big, 2);

    let from_big = decode_cell(&big, &entry, ByteOrderKind::Big, 1, 0).unwrap();
    let from_little = decode_cell(&little, &entry, ByteOrderKind::Little, 1, 0).unwrap();

    assert_eq!(from_big, from_little);
}

#[test]
fn test_byte_swap_symmetry_int32_and_float() {
    let int_entry = IndexEntry::packed(0, DataType::Int32, 1, 4, 2).with_scale_factors(vec![3.0]);
    let little: Vec<u8> = (0..16i32).flat_map(|v| (v * 1000 - 7000).to_le_bytes()).collect();
    let big = swap_scalars(&little, 4);
    assert_eq!(
        decode_cell(&big, &int_entry, ByteOrderKind::Big, 0, 0).unwrap(),
        decode_cell(&little, &int_entry, ByteOrderKind::Little, 0, 0).unwrap()
    );

    let float_entry = IndexEntry::packed(0, DataType::AutoFloat32, 1, 3, 4);
    let values: Vec<f32> = (0..18).map(|v| v as f32 * 0.75 - 3.0).collect();
    let big = floats(&values, true);
    let little = swap_scalars(&big, 4);
    assert_eq!(
        decode_cell(&big, &float_entry, ByteOrderKind::Big, 0, 0).unwrap(),
        decode_cell(&little, &float_entry, ByteOrderKind::Little, 0, 0).unwrap()
    );
}

#[test]
fn test_host_order_needs_no_swap() {
    assert!(!ByteOrderKind::host().needs_swap());
    assert_eq!(ByteOrderKind::from_big_endian(true), ByteOrderKind::Big);
    assert_ne!(ByteOrderKind::Big.needs_swap(), ByteOrderKind::Little.needs_swap());
}

// =============================================================================
// Autocorrelation Decoder Tests
// =============================================================================

#[test]
fn test_auto_two_pol_real() {
    let entry = IndexEntry::packed(0, DataType::AutoFloat32, 1, 2, 2);
    let raw = floats(&[1.0, 2.0, 3.0, 4.0], false);

    let out = decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 0).unwrap();

    let expected: Vec<Complex64> = [1.0, 2.0, 3.0, 4.0]
        .iter()
        .map(|&v| Complex64::new(v, 0.0))
        .collect();
    assert_eq!(out, expected);
}

#[test]
fn test_auto_three_pol_conjugate_exact() {
    let n_chan = 32;
    let entry = IndexEntry::packed(0, DataType::AutoFloat32, 2, n_chan, 3);
    let values: Vec<f32> = (0..2 * n_chan * 4).map(|i| (i as f32 * 0.37).sin()).collect();
    let raw = floats(&values, false);

    for baseline in 0..2 {
        let out = decode_cell(&raw, &entry, ByteOrderKind::Little, baseline, 0).unwrap();
        assert_eq!(out.len(), 4 * n_chan as usize);
        for chan in out.chunks(4) {
            assert_eq!(chan[2], chan[1].conj());
            assert_eq!(chan[0].im, 0.0);
            assert_eq!(chan[3].im, 0.0);
        }
    }
}

#[test]
fn test_auto_four_pol_independent_cross_hands() {
    let entry = IndexEntry::packed(0, DataType::AutoFloat32, 1, 1, 4);
    let raw = floats(&[10.0, 1.0, 2.0, 3.0, 4.0, 20.0], false);

    let out = decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 0).unwrap();

    assert_eq!(
        out,
        vec![
            Complex64::new(10.0, 0.0),
            Complex64::new(1.0, 2.0),
            Complex64::new(3.0, 4.0),
            Complex64::new(20.0, 0.0),
        ]
    );
    assert_ne!(out[2], out[1].conj());
}

// =============================================================================
// Bounds Tests
// =============================================================================

#[test]
fn test_short_block() {
    let entry = IndexEntry::packed(0, DataType::Float32, 2, 4, 2);
    let raw = vec![0u8; entry.extent_bytes() as usize - 1];

    // First baseline fits, second runs past the end
    assert!(decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 0).is_ok());
    assert!(matches!(
        decode_cell(&raw, &entry, ByteOrderKind::Little, 1, 0),
        Err(StManError::ShortBlock { .. })
    ));
}

#[test]
fn test_cell_outside_entry() {
    let entry = IndexEntry::packed(0, DataType::Float32, 2, 1, 1);
    let raw = vec![0u8; 16];

    assert!(matches!(
        decode_cell(&raw, &entry, ByteOrderKind::Little, 2, 0),
        Err(StManError::InvalidState(_))
    ));
    assert!(matches!(
        decode_cell(&raw, &entry, ByteOrderKind::Little, 0, 1),
        Err(StManError::InvalidState(_))
    ));
}
