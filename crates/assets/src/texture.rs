use image::ImageFormat;
use tableau_scene::TextureImage;
use tracing::debug;

use crate::error::AssetError;

/// Decode PNG bytes into an RGBA8 texture.
pub fn decode_png(bytes: &[u8]) -> Result<TextureImage, AssetError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!(width, height, bytes = bytes.len(), "PNG decoded");
    Ok(TextureImage::new(width, height, rgba.into_raw()))
}

#[cfg(test)]
pub(crate) fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut out,
        rgba,
        width,
        height,
        image::ExtendedColorType::Rgba8,
        ImageFormat::Png,
    )
    .unwrap();
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rgba_png() {
        let pixels = [255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 255, 128];
        let png = encode_png(2, 2, &pixels);
        let tex = decode_png(&png).unwrap();
        assert_eq!((tex.width, tex.height), (2, 2));
        assert_eq!(tex.rgba, pixels);
        assert!(tex.is_well_formed());
    }

    #[test]
    fn rejects_non_png_bytes() {
        assert!(matches!(decode_png(b"not a png"), Err(AssetError::Image(_))));
    }
}
