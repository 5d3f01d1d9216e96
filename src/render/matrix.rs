//! Module matrix built with the `qrcode` encoder

use qrcode::bits::Bits;
use qrcode::{Color, EcLevel, QrCode, Version};
use tracing::debug;

use super::RenderError;
use crate::config::style::{EncodingMode, ErrorCorrectionLevel, QrOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    size: usize,
    dark: Vec<bool>,
}

fn ec_level(level: ErrorCorrectionLevel) -> EcLevel {
    match level {
        ErrorCorrectionLevel::L => EcLevel::L,
        ErrorCorrectionLevel::M => EcLevel::M,
        ErrorCorrectionLevel::Q => EcLevel::Q,
        ErrorCorrectionLevel::H => EcLevel::H,
    }
}

/// Single byte segment in the given version
fn byte_bits(data: &[u8], version: Version, ec: EcLevel) -> Option<Bits> {
    let mut bits = Bits::new(version);
    bits.push_byte_data(data).ok()?;
    bits.push_terminator(ec).ok()?;
    Some(bits)
}

impl QrMatrix {
    pub fn encode(text: &str, options: &QrOptions) -> Result<Self, RenderError> {
        let ec = ec_level(options.error_correction_level);
        let data = text.as_bytes();
        let fixed = match options.type_number {
            0 => None,
            n @ 1..=40 => Some(Version::Normal(n as i16)),
            n => return Err(RenderError::Encode(format!("type number {n} out of range 1-40"))),
        };

        let code = match (options.mode, fixed) {
            (EncodingMode::Auto, None) => QrCode::with_error_correction_level(data, ec),
            (EncodingMode::Auto, Some(v)) => QrCode::with_version(data, v, ec),
            (EncodingMode::Byte, Some(v)) => {
                let bits = byte_bits(data, v, ec)
                    .ok_or_else(|| RenderError::Encode(format!("data does not fit version {v:?}")))?;
                QrCode::with_bits(bits, ec)
            }
            (EncodingMode::Byte, None) => {
                let bits = (1..=40)
                    .find_map(|n| byte_bits(data, Version::Normal(n), ec))
                    .ok_or_else(|| RenderError::Encode("data too long".to_string()))?;
                QrCode::with_bits(bits, ec)
            }
        }
        .map_err(|e| RenderError::Encode(e.to_string()))?;

        let size = code.width();
        let dark = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();
        debug!(size, bytes = data.len(), "Encoded QR matrix");
        Ok(Self { size, dark })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Out-of-range coordinates read as light
    pub fn is_dark(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 || x as usize >= self.size || y as usize >= self.size {
            return false;
        }
        self.dark[y as usize * self.size + x as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_version_grows_with_data() {
        let short = QrMatrix::encode("hi", &QrOptions::default()).unwrap();
        let long = QrMatrix::encode(&"x".repeat(200), &QrOptions::default()).unwrap();
        assert_eq!(short.size(), 21);
        assert!(long.size() > short.size());
    }

    #[test]
    fn test_finder_pattern_corners() {
        let m = QrMatrix::encode("https://example.com/", &QrOptions::default()).unwrap();
        let n = m.size() as isize;
        assert!(m.is_dark(0, 0));
        assert!(m.is_dark(n - 1, 0));
        assert!(m.is_dark(0, n - 1));
        assert!(!m.is_dark(7, 7));
        assert!(!m.is_dark(-1, 0));
        assert!(!m.is_dark(n, 0));
    }

    #[test]
    fn test_fixed_version_and_overflow() {
        let opts = QrOptions { type_number: 5, ..QrOptions::default() };
        assert_eq!(QrMatrix::encode("abc", &opts).unwrap().size(), 37);

        let tiny = QrOptions { type_number: 1, ..QrOptions::default() };
        assert!(matches!(QrMatrix::encode(&"x".repeat(100), &tiny), Err(RenderError::Encode(_))));

        let bad = QrOptions { type_number: 41, ..QrOptions::default() };
        assert!(QrMatrix::encode("abc", &bad).is_err());
    }

    #[test]
    fn test_auto_mode() {
        let opts = QrOptions { mode: EncodingMode::Auto, ..QrOptions::default() };
        assert!(QrMatrix::encode("0123456789", &opts).is_ok());
    }
}
