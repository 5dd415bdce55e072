//! Conversion of Z-buffer depth into 8-bit grayscale, and cleanup of the
//! resulting image.

use castdepth_core::DepthScale;
use image::{GrayImage, Luma};

use crate::rasterizer::DepthBuffer;

/// Maps one depth value through a shift/scale to an intensity.
///
/// The result is clamped to `0..=255` and truncated toward zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn shift_scale(depth: f32, scale: DepthScale) -> u8 {
    let value = (depth + scale.shift) * scale.scale;
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0) as u8
}

/// Converts a depth buffer into a grayscale image of the same size.
#[must_use]
pub fn depth_to_gray(buffer: &DepthBuffer, scale: DepthScale) -> GrayImage {
    GrayImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        let depth = buffer.get(x, y).unwrap_or(crate::rasterizer::CLEAR_DEPTH);
        Luma([shift_scale(depth, scale)])
    })
}

/// Pixels at or below this value count as background when finding holes.
const BACKGROUND_MAX: u8 = 1;

/// Values below this count as "not near-plane white" when blanking spans.
const SPAN_EDGE_MAX: u8 = 220;

/// Fills holes in a depth map, then blanks white spans between darker walls.
///
/// 1. Background pixels (`<= 1`) that cannot reach the image border through
///    4-connected background are enclosed by the cast: the zero-valued ones
///    become 255. Background that reaches the border is forced to 0.
/// 2. In each row, every run that steps up from `< 220` to 255 and back down
///    below 220 is set to 0, from the last dark pixel before the run to its
///    last white pixel. Rows where the up and down steps don't pair up are
///    left alone.
pub fn fill_holes(image: &mut GrayImage) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let (w, h) = (width as usize, height as usize);
    let background: Vec<bool> = image.pixels().map(|p| p.0[0] <= BACKGROUND_MAX).collect();

    let mut outside = vec![false; w * h];
    let mut frontier: Vec<usize> = (0..w)
        .flat_map(|x| [x, (h - 1) * w + x])
        .chain((0..h).flat_map(|y| [y * w, y * w + w - 1]))
        .filter(|&i| background[i])
        .collect();
    while let Some(i) = frontier.pop() {
        if outside[i] {
            continue;
        }
        outside[i] = true;
        let (x, y) = (i % w, i / w);
        let neighbors = [
            (x > 0).then(|| i - 1),
            (x + 1 < w).then(|| i + 1),
            (y > 0).then(|| i - w),
            (y + 1 < h).then(|| i + w),
        ];
        frontier.extend(
            neighbors
                .into_iter()
                .flatten()
                .filter(|&n| background[n] && !outside[n]),
        );
    }

    for (i, pixel) in image.pixels_mut().enumerate() {
        if outside[i] {
            pixel.0[0] = 0;
        } else if pixel.0[0] == 0 {
            pixel.0[0] = 255;
        }
    }

    for y in 0..height {
        let row: Vec<u8> = (0..width).map(|x| image.get_pixel(x, y).0[0]).collect();
        let starts: Vec<usize> = row
            .windows(2)
            .enumerate()
            .filter(|(_, p)| p[0] < SPAN_EDGE_MAX && p[1] == 255)
            .map(|(x, _)| x)
            .collect();
        let ends: Vec<usize> = row
            .windows(2)
            .enumerate()
            .filter(|(_, p)| p[0] == 255 && p[1] < SPAN_EDGE_MAX)
            .map(|(x, _)| x)
            .collect();
        if starts.len() != ends.len() {
            continue;
        }
        for (start, end) in starts.into_iter().zip(ends) {
            for x in start..=end {
                #[allow(clippy::cast_possible_truncation)]
                image.put_pixel(x as u32, y, Luma([0]));
            }
        }
    }
}
