use std::ops::Deref;

use itertools::Itertools;

use super::error::{QRError, QRResult};
use super::metadata::Color;
use crate::builder::QR;

// Mask pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> QRResult<Self> {
        match pattern {
            0..=7 => Ok(Self(pattern)),
            _ => Err(QRError::InvalidMaskPattern),
        }
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Predicates take (row, column)
mod mask_functions {
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        ((r * c) & 1) + ((r * c) % 3) == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        (((r * c) & 1) + ((r * c) % 3)) & 1 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        (((r + c) & 1) + ((r * c) % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_function(self) -> fn(i16, i16) -> bool {
        match self.0 {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!("Invalid pattern"),
        }
    }
}

// Mask selection
//------------------------------------------------------------------------------

pub fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let best_mask = (0..8)
        .min_by_key(|&m| {
            let mut candidate = qr.clone();
            candidate.apply_mask(MaskPattern(m));
            compute_total_penalty(&candidate)
        })
        .expect("Should return atleast 1 mask");
    let best_mask = MaskPattern(best_mask);
    qr.apply_mask(best_mask);
    best_mask
}

pub fn compute_total_penalty(qr: &QR) -> u32 {
    compute_adjacent_penalty(qr)
        + compute_block_penalty(qr)
        + compute_finder_penalty(qr)
        + compute_balance_penalty(qr)
}

// Each run of 5 or more same colored modules in a row or column costs
// 3 + (run length - 5)
fn compute_adjacent_penalty(qr: &QR) -> u32 {
    let w = qr.width() as i16;
    let rows = (0..w).map(|r| line_run_penalty((0..w).map(move |c| *qr.get(r, c))));
    let cols = (0..w).map(|c| line_run_penalty((0..w).map(move |r| *qr.get(r, c))));
    rows.sum::<u32>() + cols.sum::<u32>()
}

fn line_run_penalty(line: impl Iterator<Item = Color>) -> u32 {
    let mut pen = 0;
    let runs = line.chunk_by(|&clr| clr);
    for (_, run) in &runs {
        let len = run.count() as u32;
        if len >= 5 {
            pen += 3 + (len - 5);
        }
    }
    pen
}

// Every same colored 2x2 block costs 3, overlaps included
fn compute_block_penalty(qr: &QR) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    for r in 0..w - 1 {
        for c in 0..w - 1 {
            let clr = *qr.get(r, c);
            if clr == *qr.get(r + 1, c) && clr == *qr.get(r, c + 1) && clr == *qr.get(r + 1, c + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}

// 1:1:3:1:1 finder sequence with four light modules on either side, scanned in
// both orientations over every row and column, 40 a piece
static FINDER_SEQUENCE: [Color; 11] = [
    Color::Dark,
    Color::Light,
    Color::Dark,
    Color::Dark,
    Color::Dark,
    Color::Light,
    Color::Dark,
    Color::Light,
    Color::Light,
    Color::Light,
    Color::Light,
];

fn compute_finder_penalty(qr: &QR) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    let len = FINDER_SEQUENCE.len() as i16;
    for i in 0..w {
        for j in 0..=w - len {
            let row_window = (0..len).map(|k| *qr.get(i, j + k));
            let col_window = (0..len).map(|k| *qr.get(j + k, i));
            pen += 40 * finder_matches(row_window) + 40 * finder_matches(col_window);
        }
    }
    pen
}

fn finder_matches(window: impl Iterator<Item = Color> + Clone) -> u32 {
    let forward = window.clone().eq(FINDER_SEQUENCE.iter().copied());
    let reverse = window.eq(FINDER_SEQUENCE.iter().rev().copied());
    forward as u32 + reverse as u32
}

// 10 per 5% deviation of the dark module share from an even split
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark = qr.count_dark_modules();
    let total = qr.width() * qr.width();
    let deviation = (dark * 20).abs_diff(total * 10) / total;
    deviation as u32 * 10
}

#[cfg(test)]
mod mask_tests {
    use super::{
        compute_adjacent_penalty, compute_balance_penalty, compute_block_penalty,
        compute_finder_penalty, MaskPattern,
    };
    use crate::builder::QR;
    use crate::common::error::QRError;
    use crate::common::metadata::{Color, ECLevel, Version};

    #[test]
    fn test_new_invalid_pattern() {
        assert_eq!(MaskPattern::new(8), Err(QRError::InvalidMaskPattern));
        assert!(MaskPattern::new(7).is_ok());
    }

    fn filled_qr(fill: impl Fn(i16, i16) -> Color) -> QR {
        let mut qr = QR::new(Version::new(1).unwrap(), ECLevel::L);
        qr.fill_data_with(fill);
        qr
    }

    #[test]
    fn test_penalties_on_uniform_grid() {
        let qr = filled_qr(|_, _| Color::Dark);
        // 21 rows and 21 columns, each a single run of 21
        assert_eq!(compute_adjacent_penalty(&qr), 42 * (3 + 16));
        assert_eq!(compute_block_penalty(&qr), 20 * 20 * 3);
        assert_eq!(compute_finder_penalty(&qr), 0);
        assert_eq!(compute_balance_penalty(&qr), 100);
    }

    #[test]
    fn test_penalties_on_checkerboard_grid() {
        let qr = filled_qr(|r, c| if (r + c) & 1 == 0 { Color::Dark } else { Color::Light });
        assert_eq!(compute_adjacent_penalty(&qr), 0);
        assert_eq!(compute_block_penalty(&qr), 0);
        assert_eq!(compute_finder_penalty(&qr), 0);
        assert_eq!(compute_balance_penalty(&qr), 0);
    }

    #[test]
    fn test_finder_penalty_counts_both_orientations() {
        // One row carrying the sequence forwards, one column backwards
        let seq = super::FINDER_SEQUENCE;
        let qr = filled_qr(|r, c| match (r, c) {
            (3, 0..=10) => seq[c as usize],
            (_, 17) if r <= 10 => seq[10 - r as usize],
            _ => Color::Light,
        });
        // The column scores twice: its core plus the light run below it also
        // matches the forward orientation four rows further down
        assert_eq!(compute_finder_penalty(&qr), 120);
    }
}
