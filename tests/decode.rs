//! End-to-end decoding: render a QR code to PNG bytes in memory, then
//! decode it back through the public API.

use image::{ImageFormat, Luma};
use qrcode::QrCode;

use qrdec::decode::{decode, EccLevel, VERSION_MAX, VERSION_MIN};
use qrdec::memstream::{Backend, MemStream};

// Renders `text` as a QR code and encodes it to PNG, using a MemStream as
// the encoder's sink.
fn qr_png(text: &str) -> Vec<u8> {
    let code = QrCode::new(text.as_bytes()).unwrap();
    let img = code.render::<Luma<u8>>().build();

    let mut sink = MemStream::new().unwrap();
    img.write_to(&mut sink, ImageFormat::Png).unwrap();
    sink.materialize().unwrap().to_vec()
}

#[test]
fn decodes_payload_from_generated_png() {
    let png = qr_png("Hello, World!");

    let codes = decode(&png).unwrap();
    assert_eq!(codes.len(), 1);

    let code = codes[0].as_ref().unwrap();
    assert_eq!(code.payload(), b"Hello, World!");
    assert_eq!(code.payload_str(), Some("Hello, World!"));
}

#[test]
fn reports_symbol_parameters_in_range() {
    let png = qr_png("https://example.com/some/longer/path?query=1");

    let codes = decode(&png).unwrap();
    assert_eq!(codes.len(), 1);

    let code = codes[0].as_ref().unwrap();
    assert!(code.version() >= VERSION_MIN && code.version() <= VERSION_MAX);
    assert!(code.mask() <= 7);
    // the qrcode encoder defaults to level M
    assert_eq!(code.ecc_level(), EccLevel::M);
    assert_eq!(code.ecc_level().to_string(), "M");
}

#[test]
fn decode_is_repeatable_on_the_same_input() {
    let png = qr_png("repeatable");

    let first = decode(&png).unwrap();
    let second = decode(&png).unwrap();

    let a = first[0].as_ref().unwrap();
    let b = second[0].as_ref().unwrap();
    assert_eq!(a, b);
}

#[test]
fn numeric_payload_survives_the_round_trip() {
    let png = qr_png("01234567");

    let codes = decode(&png).unwrap();
    let code = codes[0].as_ref().unwrap();
    assert_eq!(code.payload(), b"01234567");
}
