/// QR decoding glue: PNG bytes in, decoded symbols out.
///
/// Pixel decoding is delegated to the `image` crate and symbol
/// extraction/error correction to `rqrr`; this module only stages the
/// input through the memory stream core, converts to 8-bit grayscale, and
/// shapes the per-symbol results. One undecodable symbol never fails the
/// batch.
use std::fmt;
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::str;

use image::{ImageFormat, ImageReader};
use log::debug;
use thiserror::Error;

use crate::memstream::{self, MemFile, Mode};

/// The minimum QR symbol version a decode can report.
pub const VERSION_MIN: u16 = 1;
/// The maximum QR symbol version a decode can report.
pub const VERSION_MAX: u16 = 40;

const PNG_BYTES_TO_CHECK: usize = 4;
const PNG_SIGNATURE: [u8; PNG_BYTES_TO_CHECK] = [0x89, b'P', b'N', b'G'];

/*---- Errors ----*/

/// Failure of a whole decode call: the input never produced pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input does not carry a PNG signature.
    #[error("failed to load image: not a PNG")]
    UnsupportedFormat,
    /// The PNG did not decode to pixels.
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
    /// Staging the bytes through the memory stream failed.
    #[error(transparent)]
    Stream(#[from] memstream::Error),
}

/// Failure of a single located symbol; the rest of the batch stands.
#[derive(Debug, Error)]
#[error("failed to decode QR symbol: {0}")]
pub struct CodeError(#[from] rqrr::DeQRError);

/// Per-symbol outcome of a decode call.
pub type CodeResult = Result<Code, CodeError>;

/*---- Decoded symbols ----*/

/// Error correction level of a decoded symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccLevel {
    M,
    L,
    H,
    Q,
}

impl EccLevel {
    // The format info carries two ECC bits; their order is M, L, H, Q.
    fn from_index(level: u16) -> Self {
        match level & 0b11 {
            0 => EccLevel::M,
            1 => EccLevel::L,
            2 => EccLevel::H,
            _ => EccLevel::Q,
        }
    }
}

impl fmt::Display for EccLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EccLevel::M => "M",
            EccLevel::L => "L",
            EccLevel::H => "H",
            EccLevel::Q => "Q",
        })
    }
}

/// A decoded QR symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    version: u16,
    ecc_level: EccLevel,
    mask: u8,
    payload: Vec<u8>,
}

impl Code {
    /// Symbol version, in `VERSION_MIN..=VERSION_MAX`.
    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn ecc_level(&self) -> EccLevel {
        self.ecc_level
    }

    /// Mask pattern applied to the symbol, in `0..=7`.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Decoded payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as text, when it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        str::from_utf8(&self.payload).ok()
    }
}

/*---- Decoding ----*/

/// Decodes every QR symbol found in a PNG image held in memory.
///
/// The input bytes are staged through a [`MemFile`] so the image decoder
/// only ever consumes the standard read/seek stream interface, then
/// converted to 8-bit grayscale and scanned for symbols. Returns one
/// [`CodeResult`] per located symbol; an empty vector means the image
/// decoded fine but carries no QR code.
///
/// # Example
///
/// ```rust,no_run
/// let img = std::fs::read("qr.png").unwrap();
/// for code in qrdec::decode::decode(&img).unwrap() {
///     match code {
///         Ok(code) => println!("payload: {:?}", code.payload_str()),
///         Err(err) => eprintln!("bad symbol: {}", err),
///     }
/// }
/// ```
pub fn decode(img: &[u8]) -> Result<Vec<CodeResult>, DecodeError> {
    // NOTE: only png is supported at the moment
    if img.len() < PNG_BYTES_TO_CHECK || img[..PNG_BYTES_TO_CHECK] != PNG_SIGNATURE {
        return Err(DecodeError::UnsupportedFormat);
    }

    let mut file = MemFile::new();
    file.open(Mode::ReadWrite)?;
    file.write_all(img).map_err(memstream::Error::from)?;
    file.seek(SeekFrom::Start(0)).map_err(memstream::Error::from)?;

    let reader = ImageReader::with_format(BufReader::new(&mut file), ImageFormat::Png);
    let gray = reader.decode()?.into_luma8();
    debug!("loaded {}x{} grayscale image", gray.width(), gray.height());

    let mut prepared = rqrr::PreparedImage::prepare(gray);
    let grids = prepared.detect_grids();
    debug!("identified {} QR grid(s)", grids.len());

    let mut codes = Vec::with_capacity(grids.len());
    for grid in &grids {
        codes.push(convert(grid.decode()));
    }
    Ok(codes)
}

fn convert(decoded: Result<(rqrr::MetaData, String), rqrr::DeQRError>) -> CodeResult {
    let (meta, content) = decoded?;
    let rqrr::Version(version) = meta.version;
    Ok(Code {
        version: version as u16,
        ecc_level: EccLevel::from_index(meta.ecc_level),
        mask: meta.mask as u8,
        payload: content.into_bytes(),
    })
}
