/// Per-modality score normalization.
///
/// Vector similarities already live in (0, 1] and pass through unchanged.
/// Keyword (BM25) scores are unbounded and may be negative; they are mapped with
/// the affine clip `clamp((raw + offset) / scale, 0, 1)`. Offset 2 and scale 4
/// assume typical scores fall in [-2, 2] and are configurable.

use crate::config::NormalizerConfig;
use crate::document::Modality;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreNormalizer {
    keyword_offset: f64,
    keyword_scale: f64,
}

impl Default for ScoreNormalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

impl ScoreNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        ScoreNormalizer {
            keyword_offset: config.keyword_offset,
            keyword_scale: config.keyword_scale,
        }
    }

    pub fn normalize(&self, modality: Modality, raw_score: f64) -> f64 {
        match modality {
            Modality::Vector => raw_score,
            Modality::Keyword => self.normalize_keyword(raw_score),
        }
    }

    pub fn normalize_keyword(&self, raw_score: f64) -> f64 {
        let scaled = (raw_score + self.keyword_offset) / self.keyword_scale;
        if scaled.is_nan() {
            return 0.0;
        }
        scaled.clamp(0.0, 1.0)
    }
}

/// Similarity in (0, 1] from a non-negative vector distance.
pub fn distance_to_similarity(distance: f64) -> f64 {
    if distance > 0.0 {
        1.0 / (1.0 + distance)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_anchor_points() {
        let n = ScoreNormalizer::default();
        assert_eq!(n.normalize(Modality::Keyword, -2.0), 0.0);
        assert_eq!(n.normalize(Modality::Keyword, 2.0), 1.0);
        assert_eq!(n.normalize(Modality::Keyword, 0.0), 0.5);
    }

    #[test]
    fn test_keyword_clamps() {
        let n = ScoreNormalizer::default();
        assert_eq!(n.normalize(Modality::Keyword, -17.3), 0.0);
        assert_eq!(n.normalize(Modality::Keyword, 42.0), 1.0);
        assert_eq!(n.normalize(Modality::Keyword, f64::NAN), 0.0);
    }

    #[test]
    fn test_vector_passes_through() {
        let n = ScoreNormalizer::default();
        assert_eq!(n.normalize(Modality::Vector, 0.37), 0.37);
    }

    #[test]
    fn test_custom_constants() {
        let n = ScoreNormalizer::new(&NormalizerConfig { keyword_offset: 0.0, keyword_scale: 10.0 });
        assert!((n.normalize(Modality::Keyword, 5.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_distance_to_similarity() {
        assert_eq!(distance_to_similarity(0.0), 1.0);
        assert_eq!(distance_to_similarity(-0.0), 1.0);
        assert_eq!(distance_to_similarity(1.0), 0.5);
        assert!(distance_to_similarity(3.0) < distance_to_similarity(1.0));
    }
}
