use image::Rgb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::class_names::NUM_CLASSES;

const PALETTE_SEED: u64 = 42;

/// Per-class display colors for the neural detector.
///
/// Generated from a fixed seed, so a class index maps to the same color in
/// every run and every process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPalette {
    colors: Vec<Rgb<u8>>,
}

impl ClassPalette {
    pub fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(PALETTE_SEED);
        let colors = (0..NUM_CLASSES)
            .map(|_| {
                Rgb([
                    rng.gen_range(0..255),
                    rng.gen_range(0..255),
                    rng.gen_range(0..255),
                ])
            })
            .collect();
        Self { colors }
    }

    /// Color for `class_id`, `None` outside the class table.
    pub fn color(&self, class_id: usize) -> Option<Rgb<u8>> {
        self.colors.get(class_id).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ClassPalette {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_deterministic() {
        let a = ClassPalette::new();
        let b = ClassPalette::new();
        assert_eq!(a, b);
        assert_eq!(a.len(), 80);
        assert!(a.color(79).is_some());
        assert!(a.color(80).is_none());
    }
}
