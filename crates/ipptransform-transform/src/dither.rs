// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered (Bayer) dithering for 1-bit raster/PCL output (§4.3). The 64x64
// threshold matrix is generated by the standard recursive Bayer
// construction (each doubling interleaves four copies of the previous
// matrix, offset by a quarter-range step) rather than carried as a literal
// 4096-entry table.

/// Size of one side of the threshold matrix; 64 = 2^6, per §4.3.
const SIZE: usize = 64;

/// The bi-level threshold (§4.3: "For bi-level, matrix is uniformly 127").
pub const BILEVEL_THRESHOLD: u8 = 127;

/// An ordered-dither threshold matrix, lazily built once and reused across
/// every page of a job.
pub struct BayerMatrix {
    values: Vec<u8>,
}

impl BayerMatrix {
    pub fn new() -> Self {
        let order = recursive_bayer(SIZE);
        Self { values: order }
    }

    /// Threshold for pixel `(x, y)`, tiled every `SIZE` pixels in each axis.
    pub fn threshold(&self, x: u32, y: u32) -> u8 {
        let col = (x as usize) % SIZE;
        let row = (y as usize) % SIZE;
        self.values[row * SIZE + col]
    }

    /// `true` when an 8-bit gray sample `p` should be printed as ink at
    /// `(x, y)` — i.e. `p <= threshold` (§4.3: darker-than-threshold prints).
    pub fn is_ink(&self, x: u32, y: u32, sample: u8) -> bool {
        sample <= self.threshold(x, y)
    }
}

impl Default for BayerMatrix {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds an `n`x`n` (n a power of two) ordered-dither threshold matrix in
/// row-major `u8` form, scaled to the full 0..=255 range.
fn recursive_bayer(n: usize) -> Vec<u8> {
    assert!(n.is_power_of_two());
    // Base 2x2 Bayer matrix, values 0..4.
    let mut side = 2usize;
    let mut matrix: Vec<u32> = vec![0, 2, 3, 1];

    while side < n {
        let next_side = side * 2;
        let mut next = vec![0u32; next_side * next_side];
        // Each of the 2x2 quadrant offsets {0,2,3,1} (in units of
        // `matrix.len()`) is added to a tiled copy of the current matrix,
        // producing the next power-of-two Bayer matrix.
        let offsets = [(0, 0, 0u32), (1, 0, 2u32), (0, 1, 3u32), (1, 1, 1u32)];
        for (ox, oy, quad) in offsets {
            let base = quad * (side * side) as u32;
            for row in 0..side {
                for col in 0..side {
                    let v = matrix[row * side + col] + base;
                    let target_row = oy * side + row;
                    let target_col = ox * side + col;
                    next[target_row * next_side + target_col] = v;
                }
            }
        }
        matrix = next;
        side = next_side;
    }

    let total = (side * side) as u32;
    matrix
        .into_iter()
        .map(|v| ((v * 256) / total).min(255) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_64x64_with_every_threshold_distinct_at_that_scale() {
        let m = BayerMatrix::new();
        assert_eq!(m.values.len(), SIZE * SIZE);
        let mut sorted = m.values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        // Values may collapse slightly under the 0..256 rescale, but most
        // of the 4096 cells should remain distinguishable.
        assert!(sorted.len() > SIZE * SIZE / 2);
    }

    #[test]
    fn threshold_tiles_across_page_width() {
        let m = BayerMatrix::new();
        assert_eq!(m.threshold(0, 0), m.threshold(SIZE as u32, 0));
        assert_eq!(m.threshold(3, 5), m.threshold(3 + 2 * SIZE as u32, 5 + SIZE as u32));
    }

    #[test]
    fn darker_samples_are_more_likely_to_ink() {
        let m = BayerMatrix::new();
        let mut black_ink = 0;
        let mut white_ink = 0;
        for y in 0..SIZE as u32 {
            for x in 0..SIZE as u32 {
                if m.is_ink(x, y, 0) {
                    black_ink += 1;
                }
                if m.is_ink(x, y, 255) {
                    white_ink += 1;
                }
            }
        }
        assert_eq!(black_ink, SIZE * SIZE);
        assert_eq!(white_ink, 0);
    }

    #[test]
    fn bilevel_forces_uniform_midpoint_threshold() {
        assert_eq!(BILEVEL_THRESHOLD, 127);
    }
}
