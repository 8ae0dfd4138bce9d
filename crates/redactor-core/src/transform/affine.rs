//! 2D affine matrices and source sampling.
//!
//! For rotation by angle θ and uniform scale s around center C, the forward
//! transform of a canvas point p is:
//! ```text
//! p' = C + s * R(θ) * (p - C)
//! R(θ) = | cos -sin |
//!        | sin  cos |
//! ```
//! With y pointing down, positive θ turns content clockwise on screen.

use crate::decode::{Bitmap, CHANNELS};

/// Interpolation filter for sampling the base image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationFilter {
    /// Pick the pixel under the sample point.
    Nearest,
    /// Weight the 4 nearest pixels by distance.
    #[default]
    Bilinear,
}

/// A 2x3 affine matrix mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Scale by `scale` and rotate clockwise by `angle_degrees`, both
    /// around `(cx, cy)`.
    pub fn about_center(cx: f64, cy: f64, scale: f64, angle_degrees: f64) -> Self {
        let angle_rad = angle_degrees.to_radians();
        let (sin, cos) = angle_rad.sin_cos();

        let a = scale * cos;
        let b = scale * sin;
        let c = -scale * sin;
        let d = scale * cos;

        Affine {
            a,
            b,
            c,
            d,
            e: cx - (a * cx + c * cy),
            f: cy - (b * cx + d * cy),
        }
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// The inverse transform, or `None` when the matrix is singular
    /// (scale of zero).
    pub fn invert(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-12 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// Sample `image` at continuous pixel coordinates, where integer values
/// address pixel centers.
///
/// Points outside the image rect (more than half a pixel beyond the edge
/// centers) return `None`. Inside, neighbours are clamped to the edge.
pub fn sample(image: &Bitmap, x: f64, y: f64, filter: InterpolationFilter) -> Option<[u8; 4]> {
    let (w, h) = (image.width as f64, image.height as f64);
    if image.is_empty() || x < -0.5 || y < -0.5 || x >= w - 0.5 || y >= h - 0.5 {
        return None;
    }

    match filter {
        InterpolationFilter::Nearest => {
            let px = (x.round().max(0.0) as u32).min(image.width - 1);
            let py = (y.round().max(0.0) as u32).min(image.height - 1);
            image.pixel(px, py)
        }
        InterpolationFilter::Bilinear => sample_bilinear(image, x, y),
    }
}

#[inline]
fn get_pixel(image: &Bitmap, px: usize, py: usize) -> [f64; 4] {
    let idx = (py * image.width as usize + px) * CHANNELS;
    let p = &image.pixels[idx..idx + CHANNELS];
    [p[0] as f64, p[1] as f64, p[2] as f64, p[3] as f64]
}

/// Bilinear interpolation in premultiplied space so transparent
/// neighbours do not bleed dark fringes.
fn sample_bilinear(image: &Bitmap, x: f64, y: f64) -> Option<[u8; 4]> {
    if !image.is_well_formed() {
        return None;
    }

    let max_x = image.width as i64 - 1;
    let max_y = image.height as i64 - 1;

    let x0f = x.floor();
    let y0f = y.floor();
    let fx = x - x0f;
    let fy = y - y0f;

    let x0 = (x0f as i64).clamp(0, max_x) as usize;
    let y0 = (y0f as i64).clamp(0, max_y) as usize;

    // Exactly on a pixel center: no blending, keeps identity renders exact.
    if fx == 0.0 && fy == 0.0 {
        return image.pixel(x0 as u32, y0 as u32);
    }

    let x1 = (x0f as i64 + 1).clamp(0, max_x) as usize;
    let y1 = (y0f as i64 + 1).clamp(0, max_y) as usize;

    let taps = [
        (get_pixel(image, x0, y0), (1.0 - fx) * (1.0 - fy)),
        (get_pixel(image, x1, y0), fx * (1.0 - fy)),
        (get_pixel(image, x0, y1), (1.0 - fx) * fy),
        (get_pixel(image, x1, y1), fx * fy),
    ];

    let mut premul = [0.0f64; 3];
    let mut alpha = 0.0f64;
    for (p, weight) in taps {
        let a = p[3] / 255.0;
        for i in 0..3 {
            premul[i] += p[i] * a * weight;
        }
        alpha += p[3] * weight;
    }

    if alpha <= 0.0 {
        return Some([0, 0, 0, 0]);
    }

    let norm = 255.0 / alpha;
    let mut result = [0u8; 4];
    for i in 0..3 {
        result[i] = (premul[i] * norm).clamp(0.0, 255.0).round() as u8;
    }
    result[3] = alpha.clamp(0.0, 255.0).round() as u8;
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
            "{:?} != {:?}",
            actual,
            expected
        );
    }

    #[test]
    fn test_identity_transform() {
        let t = Affine::about_center(50.0, 50.0, 1.0, 0.0);
        assert_eq!(t, Affine::IDENTITY);
    }

    #[test]
    fn test_center_is_fixed_point() {
        let t = Affine::about_center(40.0, 30.0, 1.7, 123.0);
        assert_close(t.apply(40.0, 30.0), (40.0, 30.0));
    }

    #[test]
    fn test_positive_angle_turns_clockwise_on_screen() {
        // A point right of center ends up below it after +90 degrees.
        let t = Affine::about_center(0.0, 0.0, 1.0, 90.0);
        assert_close(t.apply(10.0, 0.0), (0.0, 10.0));
    }

    #[test]
    fn test_scale_moves_points_away_from_center() {
        let t = Affine::about_center(100.0, 100.0, 2.0, 0.0);
        assert_close(t.apply(110.0, 100.0), (120.0, 100.0));
    }

    #[test]
    fn test_invert_round_trip() {
        let t = Affine::about_center(100.0, 80.0, 1.5, 37.0);
        let inv = t.invert().unwrap();
        let (x, y) = t.apply(12.0, 170.0);
        assert_close(inv.apply(x, y), (12.0, 170.0));
    }

    #[test]
    fn test_zero_scale_is_singular() {
        let t = Affine::about_center(10.0, 10.0, 0.0, 45.0);
        assert!(t.invert().is_none());
    }

    #[test]
    fn test_sample_on_pixel_center_is_exact() {
        let mut img = Bitmap::filled(3, 3, [0, 0, 0, 255]);
        img.pixels[4 * 4..4 * 4 + 4].copy_from_slice(&[9, 8, 7, 6]);
        let px = sample(&img, 1.0, 1.0, InterpolationFilter::Bilinear);
        assert_eq!(px, Some([9, 8, 7, 6]));
    }

    #[test]
    fn test_sample_outside_is_none() {
        let img = Bitmap::filled(4, 4, [1, 1, 1, 255]);
        assert!(sample(&img, -0.6, 1.0, InterpolationFilter::Bilinear).is_none());
        assert!(sample(&img, 1.0, 3.5, InterpolationFilter::Bilinear).is_none());
        assert!(sample(&img, 3.4, 3.4, InterpolationFilter::Bilinear).is_some());
    }

    #[test]
    fn test_sample_edge_clamps() {
        let img = Bitmap::filled(2, 2, [200, 100, 50, 255]);
        let px = sample(&img, -0.25, 1.3, InterpolationFilter::Bilinear);
        assert_eq!(px, Some([200, 100, 50, 255]));
    }

    #[test]
    fn test_bilinear_midpoint() {
        let img = Bitmap::new(2, 1, vec![0, 0, 0, 255, 200, 100, 50, 255]);
        let px = sample(&img, 0.5, 0.0, InterpolationFilter::Bilinear).unwrap();
        assert_eq!(px, [100, 50, 25, 255]);
    }

    #[test]
    fn test_bilinear_transparent_neighbor_no_dark_fringe() {
        let img = Bitmap::new(2, 1, vec![0, 0, 0, 0, 200, 100, 50, 255]);
        let px = sample(&img, 0.5, 0.0, InterpolationFilter::Bilinear).unwrap();
        assert_eq!(&px[..3], &[200, 100, 50]);
        assert_eq!(px[3], 128);
    }

    #[test]
    fn test_nearest_sampling() {
        let img = Bitmap::new(2, 1, vec![10, 10, 10, 255, 90, 90, 90, 255]);
        assert_eq!(
            sample(&img, 0.6, 0.0, InterpolationFilter::Nearest),
            Some([90, 90, 90, 255])
        );
    }
}
