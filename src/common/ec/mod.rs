mod galois;

use galois::{generator, poly_mod, G};

pub(crate) use galois::MAX_GENERATOR_DEGREE;

// Reed-Solomon encoder
//------------------------------------------------------------------------------

// EC codewords for one block: remainder of data · x^ec_len by the degree
// ec_len generator, left padded with zeros to exactly ec_len codewords
pub(crate) fn ecc(data: &[u8], ec_len: usize) -> Vec<u8> {
    debug_assert!(ec_len <= MAX_GENERATOR_DEGREE, "No generator of degree {ec_len}");

    let mut dividend = Vec::with_capacity(data.len() + ec_len);
    dividend.extend(data.iter().map(|&b| G(b)));
    dividend.resize(data.len() + ec_len, G(0));

    poly_mod(&dividend, generator(ec_len)).iter().map(|g| g.0).collect()
}
