use crate::image_classifier::models::model_config::{Normalization, TensorLayout};
use image::{imageops, DynamicImage};
use tract_onnx::prelude::*;

/// Scales to fit `width` x `height`, padding the short side with black.
pub fn resize_image(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() as u64 * height as u64 == image.height() as u64 * width as u64 {
        return image.resize_exact(width, height, imageops::FilterType::Triangle);
    }

    let (w, h) = (image.width() as f32, image.height() as f32);
    let scale = (width as f32 / w).min(height as f32 / h);
    let new_w = ((w * scale) as u32).clamp(1, width);
    let new_h = ((h * scale) as u32).clamp(1, height);

    let scaled = image
        .resize_exact(new_w, new_h, imageops::FilterType::Triangle)
        .to_rgb8();
    let mut padded = image::RgbImage::new(width, height);

    let x_offset = (width - new_w) / 2;
    let y_offset = (height - new_h) / 2;
    imageops::overlay(&mut padded, &scaled, x_offset as i64, y_offset as i64);

    DynamicImage::from(padded)
}

fn normalize(value: u8, normalization: Normalization) -> f32 {
    match normalization {
        Normalization::UnitRange => value as f32 / 255.0,
        Normalization::SignedUnit => value as f32 / 127.5 - 1.0,
    }
}

pub fn image_to_tensor(
    image: &DynamicImage,
    layout: TensorLayout,
    normalization: Normalization,
) -> Tensor {
    let rgb = image.to_rgb8();
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);

    match layout {
        TensorLayout::Nchw => tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
            normalize(rgb.get_pixel(x as u32, y as u32)[c], normalization)
        })
        .into_tensor(),
        TensorLayout::Nhwc => tract_ndarray::Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
            normalize(rgb.get_pixel(x as u32, y as u32)[c], normalization)
        })
        .into_tensor(),
    }
}

pub fn resize_image_to_tensor(
    image: &DynamicImage,
    width: u32,
    height: u32,
    layout: TensorLayout,
    normalization: Normalization,
) -> Tensor {
    let resized = resize_image(image, width, height);
    image_to_tensor(&resized, layout, normalization)
}

pub fn softmax(scores: &[f32]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = scores.iter().map(|&s| (s as f64 - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        let mut img = ImageBuffer::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgb(color);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_nchw_square() {
        let image = solid(100, 100, [255, 0, 0]);

        let tensor = resize_image_to_tensor(
            &image,
            64,
            64,
            TensorLayout::Nchw,
            Normalization::UnitRange,
        );
        assert_eq!(tensor.shape(), &[1, 3, 64, 64]);

        let slice = tensor.as_slice::<f32>().unwrap();
        assert_eq!(slice[0], 1.0);
        assert_eq!(slice[64 * 64], 0.0);
        assert_eq!(slice[2 * 64 * 64], 0.0);
    }

    #[test]
    fn test_nhwc_signed_unit() {
        let image = solid(10, 10, [255, 0, 255]);

        let tensor =
            resize_image_to_tensor(&image, 8, 8, TensorLayout::Nhwc, Normalization::SignedUnit);
        assert_eq!(tensor.shape(), &[1, 8, 8, 3]);

        let slice = tensor.as_slice::<f32>().unwrap();
        assert_eq!(&slice[0..3], &[1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_rectangle_is_letterboxed() {
        let image = solid(200, 100, [255, 0, 0]);

        let resized = resize_image(&image, 64, 64).to_rgb8();

        assert_eq!(resized.get_pixel(32, 32), &Rgb([255, 0, 0]));
        assert_eq!(resized.get_pixel(32, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probabilities = softmax(&[1.0, 2.0, 3.0]);

        let total: f64 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(probabilities[2] > probabilities[1]);
    }
}
