// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// LayoutGrid computation (§3, §4.2 Imposition): up to 16 cells per output
// page computed from the media crop box, number-up, imposition, and
// orientation-requested, plus the booklet page-order mapping.

use ipptransform_core::{Imposition, LayoutCell, LayoutGrid, OrientationRequested, PrintOptions};

/// Build the grid of cell rectangles (points, origin bottom-left) for one
/// output page, and the order in which input-page slots fill them.
///
/// Returns the grid plus a `fill_order`: `fill_order[i]` is the index into
/// `grid.cells` that the i-th incoming input page should be drawn into.
/// Booklet forces a 2-cell vertical stack regardless of `number_up`.
pub fn build_grid(opts: &PrintOptions) -> (LayoutGrid, Vec<usize>) {
    let (crop_x1, crop_y1, crop_x2, crop_y2) = opts.media.crop_box_points();
    let crop_w = crop_x2 - crop_x1;
    let crop_h = crop_y2 - crop_y1;

    if matches!(opts.imposition, Imposition::Booklet) {
        let cells = vec![
            LayoutCell {
                x1: crop_x1,
                y1: crop_y1 + crop_h / 2.0,
                x2: crop_x2,
                y2: crop_y2,
            },
            LayoutCell {
                x1: crop_x1,
                y1: crop_y1,
                x2: crop_x2,
                y2: crop_y1 + crop_h / 2.0,
            },
        ];
        return (LayoutGrid { cells }, vec![0, 1]);
    }

    let (cols, rows) = opts.number_up_grid();
    let cell_w = crop_w / cols as f64;
    let cell_h = crop_h / rows as f64;

    // Row-major, top-to-bottom, left-to-right cell rectangles indexed by
    // (row, col) with row 0 at the top of the page.
    let mut cells = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let x1 = crop_x1 + col as f64 * cell_w;
            let x2 = x1 + cell_w;
            let y2 = crop_y2 - row as f64 * cell_h;
            let y1 = y2 - cell_h;
            cells.push(LayoutCell { x1, y1, x2, y2 });
        }
    }

    let fill_order = fill_order(cols, rows, opts.orientation_requested);
    (LayoutGrid { cells }, fill_order)
}

/// Order in which grid cells receive successive input pages, per §4.2:
/// portrait = row-major top-left; landscape = column-major bottom-left;
/// reverse-portrait = row-major reversed; reverse-landscape = column-major
/// top-right.
fn fill_order(cols: u32, rows: u32, orientation: OrientationRequested) -> Vec<usize> {
    let idx = |row: u32, col: u32| (row * cols + col) as usize;
    let mut order = Vec::with_capacity((cols * rows) as usize);

    match orientation {
        OrientationRequested::Portrait => {
            for row in 0..rows {
                for col in 0..cols {
                    order.push(idx(row, col));
                }
            }
        }
        OrientationRequested::ReversePortrait => {
            for row in (0..rows).rev() {
                for col in (0..cols).rev() {
                    order.push(idx(row, col));
                }
            }
        }
        OrientationRequested::Landscape => {
            // Column-major, starting at the bottom-left cell.
            for col in 0..cols {
                for row in (0..rows).rev() {
                    order.push(idx(row, col));
                }
            }
        }
        OrientationRequested::ReverseLandscape => {
            // Column-major, starting at the top-right cell.
            for col in (0..cols).rev() {
                for row in 0..rows {
                    order.push(idx(row, col));
                }
            }
        }
    }
    order
}

/// Booklet input-page ordering (§4.2, invariant 5): for `n` input pages
/// padded up to a multiple of 4, produces the sequence of (possibly `None`
/// for padding) input-page indices in the order they should be drawn across
/// the booklet's output pages so that folding the stack yields correct
/// reading order: page N, 1, 2, N-1, 3, N-2, ...
pub fn booklet_page_order(input_page_count: usize) -> Vec<Option<usize>> {
    let padded = input_page_count.div_ceil(4) * 4;
    let mut pages: Vec<Option<usize>> = (0..padded)
        .map(|i| if i < input_page_count { Some(i) } else { None })
        .collect();
    // pages is currently [0, 1, .., padded-1] (0-indexed). Reorder into the
    // sheet sequence: each sheet consumes 4 pages, so for sheet k (0-indexed),
    // front = (last-2k, 2k), back = (2k+1, last-2k-1).
    let mut order = Vec::with_capacity(padded);
    let last = padded - 1;
    let sheets = padded / 4;
    for k in 0..sheets {
        order.push(pages[last - 2 * k]);
        order.push(pages[2 * k]);
        order.push(pages[2 * k + 1]);
        order.push(pages[last - 2 * k - 1]);
    }
    // Any entries beyond the original page count remain `None` (blank).
    for slot in order.iter_mut() {
        if let Some(i) = slot {
            if *i >= input_page_count {
                *slot = None;
            }
        }
    }
    std::mem::take(&mut pages);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_up_grid_has_two_cells() {
        let mut opts = PrintOptions::defaults_for(ipptransform_core::OutputFormat::Pdf);
        opts.number_up = 2;
        let (grid, order) = build_grid(&opts);
        assert_eq!(grid.cells.len(), 2);
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn booklet_forces_two_cells() {
        let mut opts = PrintOptions::defaults_for(ipptransform_core::OutputFormat::Pdf);
        opts.imposition = Imposition::Booklet;
        let (grid, order) = build_grid(&opts);
        assert_eq!(grid.cells.len(), 2);
        assert_eq!(order, vec![0, 1]);
        // Top cell above the bottom cell.
        assert!(grid.cells[0].y1 > grid.cells[1].y1);
    }

    #[test]
    fn booklet_order_for_eight_pages() {
        let order = booklet_page_order(8);
        // Sheet 0: 8,1 / 2,7 ; Sheet 1: 6,3 / 4,5 (1-indexed pages -> 0-indexed here)
        assert_eq!(
            order,
            vec![
                Some(7),
                Some(0),
                Some(1),
                Some(6),
                Some(5),
                Some(2),
                Some(3),
                Some(4),
            ]
        );
    }

    #[test]
    fn booklet_order_pads_to_multiple_of_four() {
        let order = booklet_page_order(5);
        assert_eq!(order.len(), 8);
        assert!(order.iter().filter(|p| p.is_none()).count() == 3);
    }

    #[test]
    fn landscape_fill_order_is_column_major_bottom_left() {
        let order = fill_order(2, 2, OrientationRequested::Landscape);
        // idx(row,col) = row*cols+col; bottom row is row=1.
        assert_eq!(order, vec![2, 0, 3, 1]);
    }
}
