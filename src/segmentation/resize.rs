use crate::config::{ResizeBounds, ResizeMode};
use image::{imageops, RgbImage};
use std::borrow::Cow;

/// Output dimensions `(width, height)` for an image of `width x height`, or
/// `None` when it already fits inside `bounds`.
///
/// Portrait photos (taller than wide) are measured against
/// `short_side x long_side`, everything else against `long_side x short_side`.
pub fn target_dimensions(
    width: u32,
    height: u32,
    bounds: ResizeBounds,
    mode: ResizeMode,
) -> Option<(u32, u32)> {
    let min_side = width.min(height);
    let max_side = width.max(height);
    if min_side <= bounds.short_side && max_side <= bounds.long_side {
        return None;
    }

    let (target_w, target_h) = if height > width {
        (bounds.short_side, bounds.long_side)
    } else {
        (bounds.long_side, bounds.short_side)
    };
    let w_multi = target_w as f64 / width as f64;
    let h_multi = target_h as f64 / height as f64;

    let (w_multi, h_multi) = match mode {
        ResizeMode::Reference => (w_multi, h_multi),
        ResizeMode::PreserveAspect => {
            let factor = w_multi.min(h_multi).min(1.0);
            (factor, factor)
        }
    };

    let new_w = ((width as f64 * w_multi).round() as u32).max(1);
    let new_h = ((height as f64 * h_multi).round() as u32).max(1);
    Some((new_w, new_h))
}

/// Bring a photo down to the configured working resolution
///
/// Returns the input untouched when it is already within bounds; otherwise
/// resamples with a bicubic filter.
pub fn normalize_resolution(
    image: &RgbImage,
    bounds: ResizeBounds,
    mode: ResizeMode,
) -> Cow<'_, RgbImage> {
    let _span = tracing::debug_span!("normalize_resolution").entered();

    let (width, height) = image.dimensions();
    match target_dimensions(width, height, bounds, mode) {
        None => Cow::Borrowed(image),
        Some((new_w, new_h)) => {
            tracing::debug!("Resizing {}x{} -> {}x{}", width, height, new_w, new_h);
            Cow::Owned(imageops::resize(
                image,
                new_w,
                new_h,
                imageops::FilterType::CatmullRom,
            ))
        }
    }
}
