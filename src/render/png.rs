//! PNG encoding for rasters

use image::RgbaImage;

use super::RenderError;

/// Encode an RGBA raster as an 8-bit PNG
pub fn encode_rgba(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyRaster);
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Png(e.to_string()))?;
        writer
            .write_image_data(image.as_raw())
            .map_err(|e| RenderError::Png(e.to_string()))?;
        writer.finish().map_err(|e| RenderError::Png(e.to_string()))?;
    }

    if out.is_empty() {
        return Err(RenderError::EmptyRaster);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_signature() {
        let img = RgbaImage::new(4, 4);
        let bytes = encode_rgba(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_empty_raster_rejected() {
        assert!(matches!(encode_rgba(&RgbaImage::new(0, 0)), Err(RenderError::EmptyRaster)));
    }
}
