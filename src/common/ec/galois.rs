use std::ops::{Add, AddAssign, Mul};
use std::sync::OnceLock;

// GF(256) arithmetic
//------------------------------------------------------------------------------

// Field element of GF(2^8) with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub(crate) struct G(pub u8);

impl G {
    // α^pow, α = 2
    pub fn gen_pow(pow: usize) -> Self {
        Self(EXP[pow % 255])
    }
}

impl Add for G {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Mul for G {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        if self.0 == 0 || rhs.0 == 0 {
            return Self(0);
        }
        // EXP repeats past 254, so the summed logs need no modulo
        Self(EXP[LOG[self.0 as usize] as usize + LOG[rhs.0 as usize] as usize])
    }
}

// Log & antilog tables
//------------------------------------------------------------------------------

static EXP: [u8; 512] = build_exp();
static LOG: [u8; 256] = build_log();

const fn build_exp() -> [u8; 512] {
    let mut exp = [0u8; 512];
    let mut x: usize = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11d;
        }
        i += 1;
    }
    while i < 512 {
        exp[i] = exp[i - 255];
        i += 1;
    }
    exp
}

const fn build_log() -> [u8; 256] {
    let exp = build_exp();
    let mut log = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        log[exp[i] as usize] = i as u8;
        i += 1;
    }
    log
}

// Polynomial arithmetic
//------------------------------------------------------------------------------

// Coefficients are stored highest degree first

pub(crate) fn poly_mul(p: &[G], q: &[G]) -> Vec<G> {
    let mut prod = vec![G(0); p.len() + q.len() - 1];
    for (i, &pc) in p.iter().enumerate() {
        for (j, &qc) in q.iter().enumerate() {
            prod[i + j] += pc * qc;
        }
    }
    prod
}

// Synthetic division remainder, len = divisor len - 1. Divisor must be monic.
pub(crate) fn poly_mod(dividend: &[G], divisor: &[G]) -> Vec<G> {
    debug_assert!(divisor[0] == G(1), "Divisor should be monic");

    if dividend.len() < divisor.len() {
        return dividend.to_vec();
    }

    let mut rem = dividend.to_vec();
    let steps = dividend.len() - (divisor.len() - 1);
    for i in 0..steps {
        let lead = rem[i];
        if lead.0 != 0 {
            for (j, &d) in divisor.iter().enumerate() {
                rem[i + j] += lead * d;
            }
        }
    }
    rem.split_off(steps)
}

// Generator polynomials
//------------------------------------------------------------------------------

pub(crate) const MAX_GENERATOR_DEGREE: usize = 68;

// G_d(x) = ∏ (x + α^i) for i in 0..d, built iteratively and cached on first use
pub(crate) fn generator(degree: usize) -> &'static [G] {
    static GENERATOR_POLYNOMIALS: OnceLock<Vec<Vec<G>>> = OnceLock::new();
    let polys = GENERATOR_POLYNOMIALS.get_or_init(|| {
        let mut polys = Vec::with_capacity(MAX_GENERATOR_DEGREE + 1);
        polys.push(vec![G(1)]);
        for d in 1..=MAX_GENERATOR_DEGREE {
            let next = poly_mul(polys.last().unwrap(), &[G(1), G::gen_pow(d - 1)]);
            polys.push(next);
        }
        polys
    });
    &polys[degree]
}

#[cfg(test)]
pub(crate) fn eval_poly(poly: &[G], x: G) -> G {
    let mut acc = G(0);
    for &c in poly {
        acc = acc * x + c;
    }
    acc
}
