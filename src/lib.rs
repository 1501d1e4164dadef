//! # qrdec
//!
//! A Rust library for decoding QR codes from PNG images held in memory.
//!
//! `qrdec` delegates the heavy lifting: PNG pixel decoding goes to the
//! [`image`] crate and QR symbol extraction/error correction to [`rqrr`].
//! What this crate owns is the portable memory-backed stream abstraction
//! underneath: a growable byte region with a cursor-based read/write/seek
//! contract, presented uniformly through several backend strategies, so
//! that any consumer speaking the standard stream interface can work
//! against a buffer held entirely in memory.
//!
//! ## Features
//!
//! - Decode one or many QR symbols from an in-memory PNG.
//! - Report version, error correction level, mask, and payload per symbol.
//! - Growable in-memory streams with amortized golden-ratio growth.
//! - Interchangeable stream backends (in-memory, platform-native,
//!   temp-file fallback) behind one contract.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrdec = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Decode every QR symbol in a PNG file:
//!
//! ```rust,no_run
//! let img = std::fs::read("qr.png").expect("failed to read image");
//!
//! for code in qrdec::decode::decode(&img).expect("failed to load image") {
//!     match code {
//!         Ok(code) => println!(
//!             "v{} ecc {}: {:?}",
//!             code.version(),
//!             code.ecc_level(),
//!             code.payload_str()
//!         ),
//!         Err(err) => eprintln!("undecodable symbol: {}", err),
//!     }
//! }
//! ```
//!
//! Use a memory-backed stream directly:
//!
//! ```rust
//! use std::io::{Read, Seek, SeekFrom, Write};
//! use qrdec::memstream::{MemFile, Mode};
//!
//! let mut file = MemFile::new();
//! file.open(Mode::ReadWrite).unwrap();
//! file.write_all(b"hello world").unwrap();
//! file.seek(SeekFrom::Start(0)).unwrap();
//!
//! let mut text = String::new();
//! file.read_to_string(&mut text).unwrap();
//! assert_eq!(text, "hello world");
//! ```
//!
//! ## Modules
//!
//! - [`decode`]: QR decoding over in-memory PNG bytes.
//! - [`memstream`]: memory-backed streams and their backend strategies.

#![forbid(unsafe_code)]

mod buffer;
pub mod decode;
pub mod memstream;
