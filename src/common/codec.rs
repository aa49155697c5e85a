use super::bitstream::BitStream;
use super::error::{QRError, QRResult};
use super::metadata::{ECLevel, Version};

// Data codeword builder
//------------------------------------------------------------------------------

// Mode indicators
const MODE_ECI: u8 = 0b0111;
const MODE_BYTE: u8 = 0b0100;

// ECI assignment number for UTF-8, single byte designator
const ECI_UTF8: u8 = 26;

const PADDING_CODEWORDS: [u8; 2] = [0b11101100, 0b00010001];

// ECI header + byte mode header + char count indicator
fn header_bit_len(version: Version) -> usize {
    4 + 8 + 4 + version.char_count_bits()
}

pub fn encode(data: &[u8], ec_level: ECLevel) -> QRResult<(BitStream, Version)> {
    let version = find_best_version(data, ec_level)?;
    Ok((encode_with_version(data, ec_level, version)?, version))
}

pub fn encode_with_version(
    data: &[u8],
    ec_level: ECLevel,
    version: Version,
) -> QRResult<BitStream> {
    let bit_capacity = version.data_bit_capacity(ec_level);
    if header_bit_len(version) + data.len() * 8 > bit_capacity {
        return Err(QRError::CapacityExceeded);
    }

    let mut bs = BitStream::new(bit_capacity);
    push_header(data.len(), version, &mut bs);
    push_byte_data(data, &mut bs);
    push_terminator(&mut bs);
    pad_remaining_capacity(&mut bs);

    debug_assert!(bs.len() == bit_capacity, "Padded stream should fill the capacity");

    Ok(bs)
}

fn find_best_version(data: &[u8], ec_level: ECLevel) -> QRResult<Version> {
    (1..=40)
        .map(|v| Version::new(v).expect("1..=40 is valid"))
        .find(|v| header_bit_len(*v) + data.len() * 8 <= v.data_bit_capacity(ec_level))
        .ok_or(QRError::CapacityExceeded)
}

fn push_header(char_count: usize, version: Version, out: &mut BitStream) {
    out.push_bits(MODE_ECI, 4);
    out.push_bits(ECI_UTF8, 8);
    out.push_bits(MODE_BYTE, 4);

    let count_bits = version.char_count_bits();
    debug_assert!(
        char_count < (1 << count_bits),
        "Char count exceeds bit length: Char count {char_count}, Char count bits {count_bits}"
    );
    out.push_bits(char_count as u16, count_bits);
}

fn push_byte_data(data: &[u8], out: &mut BitStream) {
    for &b in data {
        out.push_bits(b, 8);
    }
}

fn push_terminator(out: &mut BitStream) {
    let term_len = std::cmp::min(4, out.capacity() - out.len());
    out.push_bits(0u8, term_len);
}

fn pad_remaining_capacity(out: &mut BitStream) {
    push_padding_bits(out);
    push_padding_codewords(out);
}

fn push_padding_bits(out: &mut BitStream) {
    let offset = out.len() & 7;
    if offset > 0 {
        out.push_bits(0u8, 8 - offset);
    }
}

fn push_padding_codewords(out: &mut BitStream) {
    debug_assert!(
        out.len() & 7 == 0,
        "Bit offset should be zero before padding codewords: {}",
        out.len() & 7
    );

    let remain_byte_capacity = (out.capacity() - out.len()) >> 3;
    PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity).for_each(|pc| {
        out.push_bits(pc, 8);
    });
}
