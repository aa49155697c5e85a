mod qr;

pub use qr::{Module, QR};

use std::iter;

use crate::common::{
    bitstream::BitStream,
    codec::{encode, encode_with_version},
    ec::ecc,
    error::QRResult,
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
};

// QR builder
//------------------------------------------------------------------------------

pub struct QRBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, version: None, ec_level: ECLevel::M, mask: None }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    // Clearing the version lets the builder pick the smallest fit
    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn unset_mask(&mut self) -> &mut Self {
        self.mask = None;
        self
    }
}

// A data block and the parity computed for it
struct Block<'a> {
    data: &'a [u8],
    ecc: Vec<u8>,
}

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        // Header, payload, terminator and padding as data codewords
        let (encoded, version) = match self.version {
            Some(v) => (encode_with_version(self.data, self.ec_level, v)?, v),
            None => encode(self.data, self.ec_level)?,
        };

        // Per block error correction, then interleave data and ec codewords
        let blocks = Self::split_into_blocks(encoded.data(), version, self.ec_level);
        let mut payload = BitStream::new(version.total_codewords() << 3);
        payload.extend(&Self::interleave(blocks.iter().map(|b| b.data)));
        payload.extend(&Self::interleave(blocks.iter().map(|b| b.ecc.as_slice())));

        let mut qr = QR::new(version, self.ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(&mut payload);

        match self.mask {
            Some(m) => qr.apply_mask(m),
            None => {
                apply_best_mask(&mut qr);
            }
        }

        Ok(qr)
    }

    // Carves the codeword stream into the version's block geometry, computing
    // the Reed-Solomon parity of each block as it is split off
    fn split_into_blocks(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<Block<'_>> {
        let (b1_size, b1_count, b2_size, b2_count) = version.data_codewords_per_block(ec_level);
        let ec_len = version.ecc_per_block(ec_level);

        debug_assert!(
            data.len() == b1_size * b1_count + b2_size * b2_count,
            "Data len {} doesn't match the block geometry",
            data.len()
        );

        let sizes =
            iter::repeat(b1_size).take(b1_count).chain(iter::repeat(b2_size).take(b2_count));
        let mut rest = data;
        sizes
            .map(|size| {
                let (head, tail) = rest.split_at(size);
                rest = tail;
                Block { data: head, ecc: ecc(head, ec_len) }
            })
            .collect()
    }

    // Round robin over the blocks, shorter ones dropping out as they run dry
    fn interleave<'b>(columns: impl Iterator<Item = &'b [u8]> + Clone) -> Vec<u8> {
        let longest = columns.clone().map(<[u8]>::len).max().unwrap_or(0);
        (0..longest)
            .flat_map(|i| columns.clone().filter_map(move |col| col.get(i).copied()))
            .collect()
    }
}

#[cfg(test)]
mod builder_tests {
    use test_case::test_case;

    use super::QRBuilder;
    use crate::common::error::QRError;
    use crate::common::mask::MaskPattern;
    use crate::common::metadata::{ECLevel, Version};

    fn v(version: usize) -> Version {
        Version::new(version).unwrap()
    }

    #[test]
    fn test_block_parity_simple() {
        let msg = b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11";
        let blocks = QRBuilder::split_into_blocks(msg, v(1), ECLevel::M);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data, msg);
        assert_eq!(blocks[0].ecc, b"\xc4\x23\x27\x77\xeb\xd7\xe7\xe2\x5d\x17");
    }

    #[test]
    fn test_block_parity_complex() {
        let msg = b"CUF\x86W&U\xc2w2\x06\x12\x06g&\xf6\xf6B\x07v\x86\xf2\x07&V\x16\xc6\xc7\x92\x06\
                    \xb6\xe6\xf7w2\x07v\x86W&R\x06\x86\x972\x07F\xf7vV\xc2\x06\x972\x10\xec\x11\xec\
                    \x11\xec\x11\xec";
        let expected_ecc = [
            b"\xd5\xc7\x0b\x2d\x73\xf7\xf1\xdf\xe5\xf8\x9a\x75\x9a\x6f\x56\xa1\x6f\x27",
            b"\x57\xcc\x60\x3c\xca\xb6\x7c\x9d\xc8\x86\x1b\x81\xd1\x11\xa3\xa3\x78\x85",
            b"\x94\x74\xb1\xd4\x4c\x85\x4b\xf2\xee\x4c\xc3\xe6\xbd\x0a\x6c\xf0\xc0\x8d",
            b"\xeb\x9f\x05\xad\x18\x93\x3b\x21\x6a\x28\xff\xac\x52\x02\x83\x20\xb2\xec",
        ];

        // Version 5-Q carves 62 codewords into two blocks of 15 then two of 16
        let blocks = QRBuilder::split_into_blocks(msg, v(5), ECLevel::Q);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].data.len(), 15);
        assert_eq!(blocks[1].data.len(), 15);
        assert_eq!(blocks[2].data.len(), 16);
        assert_eq!(blocks[3].data.len(), 16);
        assert_eq!(blocks[2].data[0], msg[30]);
        for (block, expected) in blocks.iter().zip(expected_ecc) {
            assert_eq!(block.ecc, expected);
        }
    }

    #[test]
    fn test_interleave() {
        let blocks: [&[u8]; 3] = [&[1, 2, 3], &[4, 5, 6], &[7, 8, 9, 0]];
        let interleaved = QRBuilder::interleave(blocks.into_iter());
        assert_eq!(interleaved, vec![1, 4, 7, 2, 5, 8, 3, 6, 9, 0]);
    }

    #[test]
    fn test_interleave_empty() {
        let interleaved = QRBuilder::interleave(std::iter::empty());
        assert!(interleaved.is_empty());
    }

    #[test_case("Hello, world!".to_string(), 1, ECLevel::L)]
    #[test_case("TEST".to_string(), 1, ECLevel::M)]
    #[test_case("12345".to_string(), 1, ECLevel::Q)]
    #[test_case("OK".to_string(), 1, ECLevel::H)]
    #[test_case("qrforge demo ".repeat(10).to_string(), 7, ECLevel::L)]
    #[test_case("A11111111111111".repeat(13).to_string(), 10, ECLevel::M)]
    #[test_case("1234567890".repeat(80).to_string(), 27, ECLevel::Q)]
    #[test_case("a".repeat(1200).to_string(), 40, ECLevel::H)]
    fn test_builder(data: String, version: usize, ec_level: ECLevel) {
        let qr = QRBuilder::new(data.as_bytes())
            .version(v(version))
            .ec_level(ec_level)
            .build()
            .unwrap();

        assert_eq!(qr.width(), version * 4 + 17);
        assert!(qr.mask_pattern().is_some());

        let img = qr.render(10);
        let mut img = rqrr::PreparedImage::prepare(img);
        let grids = img.detect_grids();
        assert_eq!(grids.len(), 1);
        let (meta, content) = grids[0].decode().unwrap();

        assert_eq!(version, meta.version.0 as usize);
        assert_eq!(data, content);
    }

    #[test]
    fn test_builder_picks_smallest_version() {
        let qr = QRBuilder::new(b"HELLO WORLD").ec_level(ECLevel::L).build().unwrap();
        assert_eq!(*qr.version(), 1);

        let qr = QRBuilder::new(b"HELLO WORLD").ec_level(ECLevel::H).build().unwrap();
        assert_eq!(*qr.version(), 2);
    }

    #[test]
    fn test_builder_mask_override() {
        for m in 0..8 {
            let pattern = MaskPattern::new(m).unwrap();
            let qr = QRBuilder::new(b"MASKED")
                .version(v(2))
                .ec_level(ECLevel::Q)
                .mask(pattern)
                .build()
                .unwrap();
            assert_eq!(qr.mask_pattern(), Some(pattern));

            let img = qr.render(8);
            let mut img = rqrr::PreparedImage::prepare(img);
            let grids = img.detect_grids();
            assert_eq!(grids.len(), 1);
            let (_, content) = grids[0].decode().unwrap();
            assert_eq!(content, "MASKED");
        }
    }

    #[test]
    fn test_builder_data_overflow() {
        let data = "1234567890".repeat(296);
        let res = QRBuilder::new(data.as_bytes()).version(v(40)).ec_level(ECLevel::H).build();
        assert_eq!(res.unwrap_err(), QRError::CapacityExceeded);
    }
}
