use image::{Rgb, RgbImage};

pub const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);
pub const SUBJECT: Rgb<u8> = Rgb([220, 200, 180]);

/// 200x160 photo of a bright 80x80 block on a flat dark backdrop.
/// The block spans x in 60..140 and y in 40..120.
pub fn isolated_subject() -> RgbImage {
    RgbImage::from_fn(200, 160, |x, y| {
        if (60..140).contains(&x) && (40..120).contains(&y) {
            SUBJECT
        } else {
            BACKGROUND
        }
    })
}

pub fn uniform(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([128, 140, 150]))
}
