use image::{GrayImage, Luma};

use crate::common::{
    bitstream::BitStream,
    iter::EncRegionIter,
    mask::MaskPattern,
    metadata::{
        generate_format_info, Color, ECLevel, Version, FORMAT_INFO_BIT_LEN,
        FORMAT_INFO_COORDS_MAIN, FORMAT_INFO_COORDS_SIDE, VERSION_INFO_BIT_LEN,
        VERSION_INFO_COORDS_BL, VERSION_INFO_COORDS_TR,
    },
};

// Module
//------------------------------------------------------------------------------

// A cell of the symbol; only Data modules are subject to masking
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Func(Color),
    Version(Color),
    Format(Color),
    Data(Color),
}

impl std::ops::Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Self::Target {
        match self {
            Module::Empty => &Color::Dark,
            Module::Func(c) => c,
            Module::Version(c) => c,
            Module::Format(c) => c,
            Module::Data(c) => c,
        }
    }
}

// QR symbol matrix
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct QR {
    version: Version,
    width: usize,
    ec_level: ECLevel,
    mask_pattern: Option<MaskPattern>,
    grid: Vec<Module>,
}

impl QR {
    pub(crate) fn new(version: Version, ec_level: ECLevel) -> Self {
        let width = version.width();
        Self { version, width, ec_level, mask_pattern: None, grid: vec![Module::Empty; width * width] }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    pub fn mask_pattern(&self) -> Option<MaskPattern> {
        self.mask_pattern
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&m| matches!(**m, Color::Dark)).count()
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.width as i16;
        debug_assert!((-w..w).contains(&r), "Row out of bounds: {r}");
        debug_assert!((-w..w).contains(&c), "Column out of bounds: {c}");

        (r.rem_euclid(w) * w + c.rem_euclid(w)) as usize
    }

    pub fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    fn set(&mut self, r: i16, c: i16, module: Module) {
        let index = self.coord_to_index(r, c);
        self.grid[index] = module;
    }

    #[cfg(test)]
    pub(crate) fn to_debug_str(&self) -> String {
        let w = self.width as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let ch = match self.get(i, j) {
                    Module::Empty => '.',
                    Module::Func(c) => c.select('F', 'f'),
                    Module::Version(c) => c.select('V', 'v'),
                    Module::Format(c) => c.select('M', 'm'),
                    Module::Data(c) => c.select('D', 'd'),
                };
                res.push(ch);
            }
            res.push('\n');
        }
        res
    }

    #[cfg(test)]
    pub(crate) fn fill_data_with(&mut self, fill: impl Fn(i16, i16) -> Color) {
        let w = self.width as i16;
        for r in 0..w {
            for c in 0..w {
                self.set(r, c, Module::Data(fill(r, c)));
            }
        }
    }
}


// Finder pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_finder_patterns(&mut self) {
        let far = self.width as i16 - 7;
        for (r, c) in [(0, 0), (0, far), (far, 0)] {
            self.draw_finder_pattern_at(r, c);
        }
    }

    // (r, c) is the top left module of the 7x7 finder. Rings are indexed by
    // chebyshev distance from the centre: core and outer ring dark, the ring
    // between them and the separator light. The separator ring falls outside
    // the finder and is clipped at the symbol edges.
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.width as i16;
        for i in -1..=7 {
            for j in -1..=7 {
                let (row, col) = (r + i, c + j);
                if !(0..w).contains(&row) || !(0..w).contains(&col) {
                    continue;
                }
                let ring = i16::max((i - 3).abs(), (j - 3).abs());
                let color = if ring == 2 || ring == 4 { Color::Light } else { Color::Dark };
                self.set(row, col, Module::Func(color));
            }
        }
    }
}

#[cfg(test)]
mod finder_pattern_tests {
    use super::QR;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_finder_patterns() {
        let mut qr = QR::new(Version::new(1).unwrap(), ECLevel::L);
        qr.draw_finder_patterns();
        assert_eq!(
            qr.to_debug_str(),
            "\n\
             fffffffF.....Ffffffff\n\
             fFFFFFfF.....FfFFFFFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFFFFFfF.....FfFFFFFf\n\
             fffffffF.....Ffffffff\n\
             FFFFFFFF.....FFFFFFFF\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             FFFFFFFF.............\n\
             fffffffF.............\n\
             fFFFFFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFFFFFfF.............\n\
             fffffffF.............\n"
        );
    }
}

// Timing pattern
//------------------------------------------------------------------------------

impl QR {
    // Row 6 and column 6 alternate dark/light between the finders, dark on
    // even indices
    fn draw_timing_patterns(&mut self) {
        let w = self.width as i16;
        for k in 8..w - 8 {
            let color = if k & 1 == 0 { Color::Dark } else { Color::Light };
            self.set(6, k, Module::Func(color));
            self.set(k, 6, Module::Func(color));
        }
    }
}


// Alignment pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_alignment_patterns(&mut self) {
        let positions = self.version.alignment_positions();
        let last = self.width as i16 - 7;
        for &r in positions {
            for &c in positions {
                // Centres that would land inside a finder are dropped
                if (r == 6 && c == 6) || (r == 6 && c == last) || (r == last && c == 6) {
                    continue;
                }
                self.draw_alignment_pattern_at(r, c);
            }
        }
    }

    // Concentric 5x5 square centred on (r, c): dark centre, light inner ring,
    // dark border
    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        for i in -2..=2i16 {
            for j in -2..=2i16 {
                let ring = i16::max(i.abs(), j.abs());
                let color = if ring == 1 { Color::Light } else { Color::Dark };
                self.set(r + i, c + j, Module::Func(color));
            }
        }
    }
}


// All function patterns
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_patterns();
        self.draw_alignment_patterns();
    }
}


// Format & version info
//------------------------------------------------------------------------------

impl QR {
    // Zero bits mark the format cells occupied so the codeword walker skips
    // them; the real values land when a mask is applied
    fn reserve_format_area(&mut self) {
        self.draw_format_info(0);
    }

    pub(crate) fn draw_format_info(&mut self, format_info: u32) {
        self.draw_number(format_info, FORMAT_INFO_BIT_LEN, Module::Format, &FORMAT_INFO_COORDS_MAIN);
        self.draw_number(format_info, FORMAT_INFO_BIT_LEN, Module::Format, &FORMAT_INFO_COORDS_SIDE);
        // Dark module
        self.set(-8, 8, Module::Format(Color::Dark));
    }

    fn draw_version_info(&mut self) {
        if *self.version < 7 {
            return;
        }
        let info = self.version.version_info();
        self.draw_number(info, VERSION_INFO_BIT_LEN, Module::Version, &VERSION_INFO_COORDS_TR);
        self.draw_number(info, VERSION_INFO_BIT_LEN, Module::Version, &VERSION_INFO_COORDS_BL);
    }

    // Stamps the number most significant bit first along the coordinate list,
    // wrapping each bit in the given module kind
    fn draw_number(
        &mut self,
        number: u32,
        bit_len: usize,
        kind: fn(Color) -> Module,
        coords: &[(i16, i16)],
    ) {
        for (i, &(r, c)) in (0..bit_len).rev().zip(coords) {
            let color = if number >> i & 1 == 1 { Color::Dark } else { Color::Light };
            self.set(r, c, kind(color));
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_encoding_region(&mut self, payload: &mut BitStream) {
        self.reserve_format_area();
        self.draw_version_info();
        self.draw_payload(payload);

        debug_assert!(!self.grid.contains(&Module::Empty), "Empty module found after placement");
    }

    fn draw_payload(&mut self, payload: &mut BitStream) {
        let mut remainder = 0;
        for (r, c) in EncRegionIter::new(self.version) {
            if !matches!(self.get(r, c), Module::Empty) {
                continue;
            }
            let module = match payload.take() {
                Some(true) => Module::Data(Color::Dark),
                Some(false) => Module::Data(Color::Light),
                // Unused cells past the codeword stream hold zero bits
                None => {
                    remainder += 1;
                    Module::Data(Color::Light)
                }
            };
            self.set(r, c, module);
        }

        debug_assert!(payload.take().is_none(), "Payload bits left over after placement");
        debug_assert!(
            remainder == self.version.remainder_bits(),
            "Incorrect number of remainder bits: Version {:?}, Empty bits {remainder}",
            self.version,
        );
    }

    pub(crate) fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask_pattern = Some(pattern);
        let mask_function = pattern.mask_function();
        let w = self.width as i16;
        for r in 0..w {
            for c in 0..w {
                if mask_function(r, c) {
                    if let Module::Data(clr) = self.get(r, c) {
                        self.set(r, c, Module::Data(!clr));
                    }
                }
            }
        }
        let format_info = generate_format_info(self.ec_level, pattern);
        self.draw_format_info(format_info);
    }
}


// Render
//------------------------------------------------------------------------------

impl QR {
    pub fn render(&self, module_size: u32) -> GrayImage {
        let qz_size = 4 * module_size;
        let qr_size = self.width as u32 * module_size;
        let total_size = qz_size + qr_size + qz_size;

        let mut canvas = GrayImage::new(total_size, total_size);
        for i in 0..total_size {
            for j in 0..total_size {
                if i < qz_size || i >= qz_size + qr_size || j < qz_size || j >= qz_size + qr_size {
                    canvas.put_pixel(j, i, Luma([255]));
                    continue;
                }
                let r = ((i - qz_size) / module_size) as i16;
                let c = ((j - qz_size) / module_size) as i16;

                let pixel = match self.get(r, c) {
                    Module::Empty => panic!("Empty module found at: {r} {c}"),
                    m => m.select(Luma([255]), Luma([0])),
                };

                canvas.put_pixel(j, i, pixel);
            }
        }

        canvas
    }

    pub fn to_str(&self, module_size: usize) -> String {
        let qz_size = 4 * module_size;
        let qr_size = self.width * module_size;
        let total_size = qz_size + qr_size + qz_size;

        let mut canvas = String::new();
        for i in 0..total_size {
            for j in 0..total_size {
                if i < qz_size || i >= qz_size + qr_size || j < qz_size || j >= qz_size + qr_size {
                    canvas.push('█');
                    continue;
                }
                let r = ((i - qz_size) / module_size) as i16;
                let c = ((j - qz_size) / module_size) as i16;

                match self.get(r, c) {
                    Module::Empty => panic!("Empty module found at: {r} {c}"),
                    m => canvas.push(m.select('█', ' ')),
                }
            }
            canvas.push('\n');
        }

        canvas
    }
}
