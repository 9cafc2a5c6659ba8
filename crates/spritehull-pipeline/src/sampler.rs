//! Alpha sampling over a sprite image.
//!
//! [`AlphaSampler`] owns the alpha plane of the source image. The
//! pipeline treats one instance as the immutable source and clones it
//! into working copies, which [`erase_contour`](AlphaSampler::erase_contour)
//! mutates so that successive traces find successive opaque blobs.

use image::{GrayImage, Luma, RgbaImage};
use tiny_skia::{FillRule, LineJoin, Mask, PathBuilder, Stroke, Transform};

use crate::types::{Contour, Dimensions, Region};

/// The alpha channel of an image, addressable by integer pixel.
#[derive(Debug, Clone)]
pub struct AlphaSampler {
    alpha: GrayImage,
}

impl AlphaSampler {
    /// Extract the alpha channel of an RGBA image.
    #[must_use]
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let alpha = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            Luma([image.get_pixel(x, y).0[3]])
        });
        Self { alpha }
    }

    /// Wrap an existing single-channel alpha plane.
    #[must_use]
    pub const fn from_alpha(alpha: GrayImage) -> Self {
        Self { alpha }
    }

    /// Image dimensions in pixels.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.alpha.width(),
            height: self.alpha.height(),
        }
    }

    /// Alpha value of pixel `(x, y)`.
    ///
    /// Callers must stay inside the image; there is no clamping.
    #[must_use]
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha.get_pixel(x, y).0[0]
    }

    /// Whether pixel `(x, y)` is strictly more opaque than `threshold`.
    #[must_use]
    pub fn is_opaque(&self, x: u32, y: u32, threshold: u8) -> bool {
        self.alpha_at(x, y) > threshold
    }

    /// First pixel in `rect` whose alpha exceeds `threshold`.
    ///
    /// Scans row-major from the top-left corner, so the result is the
    /// topmost, then leftmost, opaque pixel. Contour tracing depends on
    /// this order for reproducible seeds. The part of `rect` outside
    /// the image is ignored.
    #[must_use]
    pub fn first_opaque_in(&self, rect: Region, threshold: u8) -> Option<(u32, u32)> {
        let right = rect.left.saturating_add(rect.width).min(self.alpha.width());
        let bottom = rect.top.saturating_add(rect.height).min(self.alpha.height());
        (rect.top..bottom)
            .flat_map(|y| (rect.left..right).map(move |x| (x, y)))
            .find(|&(x, y)| self.is_opaque(x, y, threshold))
    }

    /// Paint a traced contour fully transparent.
    ///
    /// The contour (in `region`-relative coordinates) is filled with the
    /// even-odd rule and its outline stroked `stroke_width` pixels wide
    /// with miter joins. Rasterisation is aliased so coverage is
    /// all-or-nothing.
    ///
    /// Every pixel the fill covers gets alpha 0. The stroke only clears
    /// pixels above `threshold` that connect (4-neighbour, through
    /// covered opaque pixels) to an opaque pixel inside the fill, so a
    /// wide stroke never bites into a neighbouring blob.
    #[allow(clippy::cast_possible_truncation)]
    pub fn erase_contour(
        &mut self,
        contour: &Contour,
        region: Region,
        stroke_width: f64,
        threshold: u8,
    ) {
        let Some((first, rest)) = contour.points().split_first() else {
            return;
        };
        let ox = f64::from(region.left);
        let oy = f64::from(region.top);

        let mut pb = PathBuilder::new();
        pb.move_to((first.x + ox) as f32, (first.y + oy) as f32);
        for p in rest {
            pb.line_to((p.x + ox) as f32, (p.y + oy) as f32);
        }
        pb.close();
        let Some(path) = pb.finish() else {
            return;
        };

        let (width, height) = (self.alpha.width(), self.alpha.height());
        let (Some(mut fill), Some(mut band)) = (Mask::new(width, height), Mask::new(width, height))
        else {
            return;
        };
        fill.fill_path(&path, FillRule::EvenOdd, false, Transform::identity());

        let stroke = Stroke {
            width: stroke_width as f32,
            line_join: LineJoin::Miter,
            ..Stroke::default()
        };
        if let Some(outline) = path.stroke(&stroke, 1.0) {
            band.fill_path(&outline, FillRule::Winding, false, Transform::identity());
        }

        let erase = blob_cover(
            self.alpha.as_raw(),
            fill.data(),
            band.data(),
            width as usize,
            threshold,
        );
        for (alpha, clear) in self.alpha.iter_mut().zip(erase) {
            if clear {
                *alpha = 0;
            }
        }
    }

    /// Number of pixels whose alpha exceeds `threshold` inside `rect`.
    #[must_use]
    pub fn count_opaque_in(&self, rect: Region, threshold: u8) -> u64 {
        let right = rect.left.saturating_add(rect.width).min(self.alpha.width());
        let bottom = rect.top.saturating_add(rect.height).min(self.alpha.height());
        (rect.top..bottom)
            .flat_map(|y| (rect.left..right).map(move |x| (x, y)))
            .map(|(x, y)| u64::from(self.is_opaque(x, y, threshold)))
            .sum()
    }
}

/// Pixels to clear: everything under `fill`, plus the opaque pixels
/// under `band` reachable from an opaque filled pixel through opaque
/// pixels under `band` or `fill`.
fn blob_cover(alpha: &[u8], fill: &[u8], band: &[u8], width: usize, threshold: u8) -> Vec<bool> {
    let opaque = |i: usize| alpha[i] > threshold;
    let mut erase: Vec<bool> = fill.iter().map(|&c| c > 0).collect();
    let mut pending: Vec<usize> = (0..erase.len())
        .filter(|&i| erase[i] && opaque(i))
        .collect();

    while let Some(i) = pending.pop() {
        let (x, y) = (i % width, i / width);
        let neighbours = [
            (x > 0).then(|| i - 1),
            (x + 1 < width).then(|| i + 1),
            (y > 0).then(|| i - width),
            Some(i + width).filter(|&n| n < erase.len()),
        ];
        for n in neighbours.into_iter().flatten() {
            if !erase[n] && band[n] > 0 && opaque(n) {
                erase[n] = true;
                pending.push(n);
            }
        }
    }
    erase
}
