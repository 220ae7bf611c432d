use image::GrayImage;
use ndarray::Array2;

/// Summed-area tables of a grayscale image and of its squared intensities.
///
/// Both tables have one extra leading row and column of zeros, so the sum of
/// the `w x h` block at `(x, y)` is four lookups.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    sum: Array2<f64>,
    sq_sum: Array2<f64>,
}

impl IntegralImage {
    pub fn new(image: &GrayImage) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let mut sum = Array2::<f64>::zeros((height + 1, width + 1));
        let mut sq_sum = Array2::<f64>::zeros((height + 1, width + 1));

        for y in 0..height {
            let mut row = 0.0;
            let mut sq_row = 0.0;
            for x in 0..width {
                let v = image.get_pixel(x as u32, y as u32)[0] as f64;
                row += v;
                sq_row += v * v;
                sum[[y + 1, x + 1]] = sum[[y, x + 1]] + row;
                sq_sum[[y + 1, x + 1]] = sq_sum[[y, x + 1]] + sq_row;
            }
        }

        Self { sum, sq_sum }
    }

    pub fn width(&self) -> usize {
        self.sum.ncols() - 1
    }

    pub fn height(&self) -> usize {
        self.sum.nrows() - 1
    }

    #[inline]
    fn block(table: &Array2<f64>, x: usize, y: usize, w: usize, h: usize) -> f64 {
        table[[y + h, x + w]] - table[[y, x + w]] - table[[y + h, x]] + table[[y, x]]
    }

    /// Sum of intensities in the block. The block must lie inside the image.
    #[inline]
    pub fn rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        Self::block(&self.sum, x, y, w, h)
    }

    /// Sum of squared intensities in the block.
    #[inline]
    pub fn rect_sq_sum(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        Self::block(&self.sq_sum, x, y, w, h)
    }

    /// Mean and variance of the block.
    pub fn rect_stats(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let area = (w * h) as f64;
        if area == 0.0 {
            return (0.0, 0.0);
        }
        let mean = self.rect_sum(x, y, w, h) / area;
        let variance = self.rect_sq_sum(x, y, w, h) / area - mean * mean;
        (mean, variance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_rect_sum_matches_direct_sum() {
        let img = GrayImage::from_fn(7, 5, |x, y| Luma([(x * 10 + y) as u8]));
        let integral = IntegralImage::new(&img);

        let mut expected = 0.0;
        for y in 1..4 {
            for x in 2..6 {
                expected += img.get_pixel(x, y)[0] as f64;
            }
        }
        assert_eq!(integral.rect_sum(2, 1, 4, 3), expected);
        assert_eq!(integral.width(), 7);
        assert_eq!(integral.height(), 5);
    }

    #[test]
    fn test_uniform_block_has_zero_variance() {
        let img = GrayImage::from_pixel(8, 8, Luma([42]));
        let integral = IntegralImage::new(&img);
        let (mean, var) = integral.rect_stats(0, 0, 8, 8);
        assert_eq!(mean, 42.0);
        assert!(var.abs() < 1e-9);
    }
}
