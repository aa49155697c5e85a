use std::error::Error;

use qrforge::{ECLevel, QRBuilder};

fn main() -> Result<(), Box<dyn Error>> {
    let data = std::env::args().nth(1).unwrap_or_else(|| "HELLO WORLD".to_string());

    let qr = QRBuilder::new(data.as_bytes()).ec_level(ECLevel::M).build()?;
    println!("{}", qr.to_str(1));

    Ok(())
}
