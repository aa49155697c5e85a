#![allow(clippy::items_after_test_module)]

//! QR Code symbol encoder.
//!
//! Builds the final module matrix for a message: byte mode data encoding
//! with a UTF-8 ECI header, Reed-Solomon error correction over GF(256),
//! block interleaving, function pattern layout, data masking with the
//! standard penalty rules, and format/version information placement.

pub mod builder;
mod common;

pub use builder::{Module, QRBuilder, QR};
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{Color, ECLevel, Version};
