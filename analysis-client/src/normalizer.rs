//! Downscale and re-encode photos before they are uploaded.

use crate::asset::{jpeg_file_name, ImageAsset};
use crate::config::ClientConfig;
use crate::error::ClientError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Target size for a `width`×`height` image inside a `max_width`×`max_height` box.
///
/// The longer side decides: landscape images are bounded by width, everything
/// else by height. Never scales up and never returns a zero dimension. If the
/// other side still overflows a non-square box, it is scaled down as well.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (mut w, mut h) = (width, height);

    if w > h {
        if w > max_width {
            h = scale(h, max_width, w);
            w = max_width;
        }
    } else if h > max_height {
        w = scale(w, max_height, h);
        h = max_height;
    }

    if h > max_height {
        w = scale(w, max_height, h);
        h = max_height;
    }
    if w > max_width {
        h = scale(h, max_width, w);
        w = max_width;
    }

    (w.max(1), h.max(1))
}

fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    ((value as f64 * numerator as f64) / denominator as f64).round() as u32
}

/// Flatten the alpha channel by compositing onto a white background.
pub fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba: RgbaImage = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let over_white = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, image::Rgb([over_white(r), over_white(g), over_white(b)]));
    }

    rgb
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ClientError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ClientError::Decode(format!("JPEG encoding failed: {}", e)))?;
    Ok(buffer)
}

/// Resizes to a bounding box and re-encodes as JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for Normalizer {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            quality: config.jpeg_quality,
        }
    }
}

impl Normalizer {
    /// Decode `asset`, fit it inside the box and return a new JPEG asset.
    ///
    /// Images already within bounds keep their size but are still re-encoded.
    pub fn normalize(&self, asset: &ImageAsset) -> Result<ImageAsset, ClientError> {
        let decoded = image::load_from_memory(&asset.bytes).map_err(|e| {
            tracing::warn!(file = %asset.file_name, error = %e, "Failed to decode image");
            ClientError::Decode(e.to_string())
        })?;

        let (src_w, src_h) = (decoded.width(), decoded.height());
        let (dst_w, dst_h) = fit_within(src_w, src_h, self.max_width, self.max_height);

        let resized = if (dst_w, dst_h) == (src_w, src_h) {
            decoded
        } else {
            decoded.resize_exact(dst_w, dst_h, FilterType::Lanczos3)
        };

        let bytes = encode_jpeg(&flatten_alpha(&resized), self.quality)?;

        tracing::debug!(
            file = %asset.file_name,
            from = ?(src_w, src_h),
            to = ?(dst_w, dst_h),
            input_bytes = asset.size(),
            output_bytes = bytes.len(),
            "Normalized image"
        );

        Ok(ImageAsset {
            file_name: jpeg_file_name(&asset.file_name),
            mime_type: JPEG_MIME_TYPE.to_string(),
            bytes,
            dimensions: Some((dst_w, dst_h)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;

    fn png_asset(width: u32, height: u32, with_alpha: bool) -> ImageAsset {
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new(&mut buffer);
        if with_alpha {
            let img = RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 0]));
            encoder
                .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
                .unwrap();
        } else {
            let img = RgbImage::from_pixel(width, height, image::Rgb([90, 120, 150]));
            encoder
                .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
                .unwrap();
        }
        ImageAsset::new("face.png", "image/png", buffer)
    }

    #[test]
    fn landscape_is_bounded_by_width() {
        assert_eq!(fit_within(4000, 3000, 1024, 1024), (1024, 768));
        assert_eq!(fit_within(3000, 1999, 1024, 1024), (1024, 682));
    }

    #[test]
    fn portrait_and_square_are_bounded_by_height() {
        assert_eq!(fit_within(3000, 4000, 1024, 1024), (768, 1024));
        assert_eq!(fit_within(2048, 2048, 1024, 1024), (1024, 1024));
    }

    #[test]
    fn small_images_are_never_upscaled() {
        assert_eq!(fit_within(640, 480, 1024, 1024), (640, 480));
        assert_eq!(fit_within(1, 1, 1024, 1024), (1, 1));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within(10_000, 3, 1024, 1024), (1024, 1));
    }

    #[test]
    fn non_square_box_bounds_both_sides() {
        let (w, h) = fit_within(1200, 1000, 1024, 512);
        assert!(w <= 1024 && h <= 512, "{}x{}", w, h);
        assert_eq!(h, 512);
    }

    #[test]
    fn normalize_resizes_and_reencodes_as_jpeg() {
        let out = Normalizer::default()
            .normalize(&png_asset(2048, 1024, false))
            .unwrap();

        assert_eq!(out.mime_type, "image/jpeg");
        assert_eq!(out.file_name, "face.jpg");
        assert_eq!(out.dimensions, Some((1024, 512)));
        assert_eq!(image::guess_format(&out.bytes).unwrap(), image::ImageFormat::Jpeg);

        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 512));
    }

    #[test]
    fn normalize_keeps_size_of_small_images() {
        let out = Normalizer::default()
            .normalize(&png_asset(300, 200, false))
            .unwrap();

        assert_eq!(out.dimensions, Some((300, 200)));
        assert_eq!(out.mime_type, "image/jpeg");
    }

    #[test]
    fn transparent_pixels_become_white() {
        let out = Normalizer::default()
            .normalize(&png_asset(8, 8, true))
            .unwrap();

        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        let [r, g, b] = decoded.get_pixel(4, 4).0;
        assert!(r > 240 && g > 240 && b > 240, "{:?}", (r, g, b));
    }

    #[test]
    fn undecodable_bytes_fail_with_decode_error() {
        let asset = ImageAsset::new("face.jpg", "image/jpeg", b"definitely not a jpeg".to_vec());
        assert!(matches!(
            Normalizer::default().normalize(&asset),
            Err(ClientError::Decode(_))
        ));
    }
}
