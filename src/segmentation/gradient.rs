use super::types::GradientMap;
use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::separable_filter_equal;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use ndarray::Array2;

/// Normalized 1-D Gaussian kernel of `size` taps (forced odd).
///
/// Sigma follows the usual rule for a kernel given only by its size:
/// `0.3 * ((size - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = (size | 1) as usize;
    let radius = (size / 2) as f32;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let denom = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

fn channel(image: &RgbImage, c: usize) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y)[c]])
    })
}

/// Euclidean magnitude of the Sobel derivatives of one 8-bit channel.
fn sobel_magnitude(channel: &GrayImage) -> Array2<f32> {
    let gx = horizontal_sobel(channel);
    let gy = vertical_sobel(channel);
    let (width, height) = channel.dimensions();

    let mut magnitude = Array2::<f32>::zeros((height as usize, width as usize));
    for (x, y, dx) in gx.enumerate_pixels() {
        let dy = gy.get_pixel(x, y)[0] as f32;
        magnitude[[y as usize, x as usize]] = (dx[0] as f32).hypot(dy);
    }
    magnitude
}

/// Compute the combined edge-strength map of a colour image
///
/// Each channel is blurred and differentiated on its own; the map keeps the
/// strongest response per pixel so an edge living in one channel only is not
/// diluted. Sobel output is `i16`, so responses above 255 survive.
///
/// # Arguments
/// * `image` - Photo, already normalized in resolution
/// * `blur_kernel` - Side of the Gaussian kernel used to suppress sensor noise
pub fn gradient_magnitude(image: &RgbImage, blur_kernel: u32) -> GradientMap {
    let _span = tracing::debug_span!("gradient_magnitude").entered();

    let (width, height) = image.dimensions();
    let mut data = Array2::<f32>::zeros((height as usize, width as usize));
    if width == 0 || height == 0 {
        return GradientMap { data };
    }

    let blurred = separable_filter_equal(image, &gaussian_kernel(blur_kernel));
    for c in 0..3 {
        let magnitude = sobel_magnitude(&channel(&blurred, c));
        data.zip_mut_with(&magnitude, |acc, &m| *acc = acc.max(m));
    }

    GradientMap { data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    fn step_image(left: [u8; 3], right: [u8; 3]) -> RgbImage {
        RgbImage::from_fn(40, 20, |x, _| if x < 20 { Rgb(left) } else { Rgb(right) })
    }

    fn peak(map: &GradientMap) -> f32 {
        map.data.iter().cloned().fold(0.0, f32::max)
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(9);
        assert_eq!(k.len(), 9);
        assert_relative_eq!(k.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        for i in 0..4 {
            assert_relative_eq!(k[i], k[8 - i]);
        }
        assert!(k[4] > k[3]);
        assert_eq!(gaussian_kernel(8).len(), 9);
    }

    #[test]
    fn uniform_image_has_no_gradient() {
        let image = RgbImage::from_pixel(32, 24, Rgb([120, 80, 200]));
        let map = gradient_magnitude(&image, 9);
        assert_eq!((map.width(), map.height()), (32, 24));
        assert!(map.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn magnitude_is_non_negative() {
        let image = RgbImage::from_fn(30, 30, |x, y| {
            Rgb([(x * 8) as u8, (y * 8) as u8, ((x * y) % 256) as u8])
        });
        let map = gradient_magnitude(&image, 9);
        assert!(map.data.iter().all(|&v| v >= 0.0));
        assert!(peak(&map) > 0.0);
    }

    #[test]
    fn single_channel_edge_is_not_diluted() {
        let red_only = gradient_magnitude(&step_image([200, 50, 50], [50, 50, 50]), 9);
        let all_channels = gradient_magnitude(&step_image([200, 200, 200], [50, 50, 50]), 9);
        assert_relative_eq!(peak(&red_only), peak(&all_channels));
        assert!(peak(&red_only) > 150.0);
    }

    #[test]
    fn blur_spreads_a_dot_beyond_the_sobel_footprint() {
        let mut image = RgbImage::from_pixel(21, 21, Rgb([0, 0, 0]));
        image.put_pixel(10, 10, Rgb([255, 255, 255]));

        let blurred = gradient_magnitude(&image, 9);
        assert!(blurred.get(13, 10) > 0.0);
        assert_relative_eq!(blurred.get(13, 10), blurred.get(7, 10));

        let sharp = gradient_magnitude(&image, 1);
        assert_eq!(sharp.get(13, 10), 0.0);
    }

    #[test]
    fn edge_response_exceeds_eight_bits() {
        let map = gradient_magnitude(&step_image([255, 255, 255], [0, 0, 0]), 3);
        assert!(peak(&map) > 255.0);
    }

    #[test]
    fn symmetric_image_gives_rotation_invariant_map() {
        let (w, h) = (31u32, 21u32);
        let image = RgbImage::from_fn(w, h, |x, y| {
            if (10..=20).contains(&x) && (5..=15).contains(&y) {
                Rgb([230, 40, 90])
            } else {
                Rgb([20, 160, 60])
            }
        });
        assert_eq!(image::imageops::rotate180(&image), image);

        let map = gradient_magnitude(&image, 9);
        for y in 0..h {
            for x in 0..w {
                assert_relative_eq!(
                    map.get(x, y),
                    map.get(w - 1 - x, h - 1 - y),
                    epsilon = 1e-3
                );
            }
        }
    }
}
