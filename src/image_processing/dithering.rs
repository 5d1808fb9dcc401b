/// Dithering algorithms for monochrome displays
///
/// One error-diffusion algorithm (Floyd-Steinberg) and two families of ordered
/// dithering: dispersed-dot Bayer matrices and clustered-dot matrices. All of
/// them take an 8-bit grayscale image and return one whose samples are only
/// 0 or 255.
use image::{GrayImage, Luma};

use crate::cli::DitherMethod;

/// Dither a grayscale image to pure black and white
pub fn apply_dithering(img: &GrayImage, method: DitherMethod) -> GrayImage {
    match method {
        DitherMethod::FloydSteinberg => apply_floyd_steinberg_dithering(img),
        DitherMethod::Bayer4x4 => apply_ordered_dithering(img, &bayer_matrix(4), 4),
        DitherMethod::Bayer8x8 => apply_ordered_dithering(img, &bayer_matrix(8), 8),
        DitherMethod::Bayer16x16 => apply_ordered_dithering(img, &bayer_matrix(16), 16),
        DitherMethod::Cluster6x6 => apply_ordered_dithering(img, &cluster_matrix(6), 6),
        DitherMethod::Cluster8x8 => apply_ordered_dithering(img, &cluster_matrix(8), 8),
        DitherMethod::Cluster16x16 => apply_ordered_dithering(img, &cluster_matrix(16), 16),
    }
}

/// Floyd-Steinberg error diffusion
///
/// Error distribution pattern:
/// ```text
///          *   7/16
///   3/16  5/16  1/16
/// ```
fn apply_floyd_steinberg_dithering(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let w = width as usize;
    let h = height as usize;
    let mut working: Vec<f32> = img.pixels().map(|p| p[0] as f32).collect();

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let old_pixel = working[idx];
            let new_pixel = if old_pixel < 128.0 { 0.0 } else { 255.0 };
            working[idx] = new_pixel;

            let error = old_pixel - new_pixel;

            if x + 1 < w {
                working[idx + 1] += error * 7.0 / 16.0;
            }
            if y + 1 < h {
                let below = idx + w;
                if x > 0 {
                    working[below - 1] += error * 3.0 / 16.0;
                }
                working[below] += error * 5.0 / 16.0;
                if x + 1 < w {
                    working[below + 1] += error * 1.0 / 16.0;
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        Luma([working[y as usize * w + x as usize] as u8])
    })
}

/// Ordered dithering against an `n` x `n` threshold matrix of ranks `0..n*n`
///
/// A pixel is lit when its luminance exceeds the centre of its rank's interval.
fn apply_ordered_dithering(img: &GrayImage, matrix: &[u32], n: u32) -> GrayImage {
    let levels = n * n;
    let thresholds: Vec<u32> = matrix
        .iter()
        .map(|&rank| ((2 * rank + 1) * 255) / (2 * levels))
        .collect();

    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let t = thresholds[((y % n) * n + (x % n)) as usize];
        let lit = img.get_pixel(x, y)[0] as u32 > t;
        Luma([if lit { 255 } else { 0 }])
    })
}

/// Recursive Bayer (dispersed-dot) index matrix, `size` must be a power of two
pub fn bayer_matrix(size: u32) -> Vec<u32> {
    if size <= 1 {
        return vec![0];
    }

    let half = size / 2;
    let inner = bayer_matrix(half);
    let mut matrix = vec![0; (size * size) as usize];

    for y in 0..size {
        for x in 0..size {
            let base = 4 * inner[((y % half) * half + (x % half)) as usize];
            let offset = match (x / half, y / half) {
                (0, 0) => 0,
                (1, 0) => 2,
                (0, _) => 3,
                _ => 1,
            };
            matrix[(y * size + x) as usize] = base + offset;
        }
    }

    matrix
}

/// Clustered-dot index matrix
///
/// Cells are ranked by their distance from the centre of the tile, so as the
/// luminance rises a single dot grows outward from the middle. Ties are broken
/// by angle to keep the growth spiral-shaped rather than row-ordered.
pub fn cluster_matrix(size: u32) -> Vec<u32> {
    let centre = (size as f32 - 1.0) / 2.0;
    let mut cells: Vec<(u32, f32, f32)> = (0..size * size)
        .map(|i| {
            let dx = (i % size) as f32 - centre;
            let dy = (i / size) as f32 - centre;
            (i, dx * dx + dy * dy, dy.atan2(dx))
        })
        .collect();

    cells.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)));

    let mut matrix = vec![0; (size * size) as usize];
    for (rank, (index, _, _)) in cells.into_iter().enumerate() {
        matrix[index as usize] = rank as u32;
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn is_permutation(matrix: &[u32]) -> bool {
        let mut sorted = matrix.to_vec();
        sorted.sort_unstable();
        sorted.iter().enumerate().all(|(i, &v)| v == i as u32)
    }

    fn create_gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([(x * 255 / (width - 1)) as u8]))
    }

    #[test]
    fn test_bayer_matrix() {
        assert_eq!(bayer_matrix(2), vec![0, 2, 3, 1]);
        assert_eq!(
            bayer_matrix(4),
            vec![0, 8, 2, 10, 12, 4, 14, 6, 3, 11, 1, 9, 15, 7, 13, 5]
        );
        assert!(is_permutation(&bayer_matrix(8)));
        assert!(is_permutation(&bayer_matrix(16)));
    }

    #[test]
    fn test_cluster_matrix() {
        for size in [6, 8, 16] {
            let matrix = cluster_matrix(size);
            assert!(is_permutation(&matrix), "cluster {}x{}", size, size);

            // The first cell to light up sits next to the centre, the last in a corner
            let first = matrix.iter().position(|&r| r == 0).unwrap() as u32;
            let (fx, fy) = (first % size, first / size);
            assert!(fx == size / 2 || fx == size / 2 - 1);
            assert!(fy == size / 2 || fy == size / 2 - 1);

            let last = matrix.iter().position(|&r| r == size * size - 1).unwrap() as u32;
            assert!(last % size == 0 || last % size == size - 1);
        }
    }

    #[test]
    fn test_all_methods_bilevel() {
        let img = create_gradient(48, 16);
        for method in DitherMethod::iter() {
            let dithered = apply_dithering(&img, method);
            assert_eq!(dithered.dimensions(), img.dimensions());
            assert!(
                dithered.pixels().all(|p| p[0] == 0 || p[0] == 255),
                "{} produced grey levels",
                method
            );
        }
    }

    #[test]
    fn test_solid_inputs_stay_solid() {
        let black = GrayImage::from_pixel(16, 16, Luma([0]));
        let white = GrayImage::from_pixel(16, 16, Luma([255]));
        for method in DitherMethod::iter() {
            assert!(apply_dithering(&black, method).pixels().all(|p| p[0] == 0));
            assert!(apply_dithering(&white, method).pixels().all(|p| p[0] == 255));
        }
    }

    #[test]
    fn test_mid_grey_is_half_lit() {
        let grey = GrayImage::from_pixel(16, 16, Luma([128]));
        let dithered = apply_dithering(&grey, DitherMethod::Bayer4x4);
        let lit = dithered.pixels().filter(|p| p[0] == 255).count();
        assert_eq!(lit, 128);
    }
}
