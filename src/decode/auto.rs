//! Autocorrelation layout
//!
//! Parallel-hand products (XX, YY) of an autocorrelation are real, so only
//! their real part is stored. Per channel:
//!
//! | n_pol | stored scalars                           | output            |
//! |-------|------------------------------------------|-------------------|
//! | 1, 2  | `XX [YY]`                                | `XX [YY]`         |
//! | 3     | `XX XY_re XY_im YY`                      | `XX XY conj(XY) YY` |
//! | 4     | `XX XY_re XY_im YX_re YX_im YY`          | `XX XY YX YY`     |

use byteorder::ByteOrder;
use num_complex::Complex64;

use crate::error::{Result, StManError};
use crate::index::{auto_scalars_per_chan, UNCHECKED_ENTRY};

use super::SampleView;

pub(super) fn decode<B: ByteOrder>(
    view: &SampleView<'_, B>,
    n_chan: u32,
    n_pol: u32,
) -> Result<Vec<Complex64>> {
    // IndexEntry::check rejects every other polarization count
    debug_assert!(auto_scalars_per_chan(n_pol).is_some());
    let per_chan = auto_scalars_per_chan(n_pol).ok_or_else(|| {
        StManError::corrupt(
            UNCHECKED_ENTRY,
            format!("autocorrelation entry with {} polarizations", n_pol),
        )
    })?;
    let out_pols = if n_pol == 3 { 4 } else { n_pol as usize };

    let mut out = Vec::with_capacity(n_chan as usize * out_pols);
    for chan in 0..n_chan as usize {
        let base = chan * per_chan;
        let value = |k: usize| f64::from(view.f32_at(base + k));
        let real = |k: usize| Complex64::new(value(k), 0.0);

        match n_pol {
            3 => {
                let xy = Complex64::new(value(1), value(2));
                out.extend([real(0), xy, xy.conj(), real(3)]);
            }
            4 => {
                let xy = Complex64::new(value(1), value(2));
                let yx = Complex64::new(value(3), value(4));
                out.extend([real(0), xy, yx, real(5)]);
            }
            _ => out.extend((0..per_chan).map(real)),
        }
    }
    Ok(out)
}
