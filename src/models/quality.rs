//! Recall-quality rating supplied by the reviewer.
//!
//! - 0: complete blackout ("Again")
//! - 1: incorrect, but the answer was recognized
//! - 2: incorrect, but the answer seemed easy once shown
//! - 3: correct with serious difficulty
//! - 4: correct after hesitation
//! - 5: perfect recall

use crate::error::ReviewError;
use std::fmt;

/// A quality rating guaranteed to be in 0..=5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

/// How a rating affects the card's recall streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QualityBand {
    /// quality 0
    Lapse,
    /// quality 1 and 2
    Hard,
    /// quality 3 to 5
    Correct,
}

impl Quality {
    pub const AGAIN: Quality = Quality(0);
    pub const PERFECT: Quality = Quality(5);

    pub fn new(value: i64) -> Result<Self, ReviewError> {
        if (0..=5).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(ReviewError::InvalidQuality(value))
        }
    }

    /// All six ratings, lowest first.
    pub fn all() -> impl Iterator<Item = Quality> {
        (0..=5).map(Quality)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn band(self) -> QualityBand {
        match self.0 {
            0 => QualityBand::Lapse,
            1 | 2 => QualityBand::Hard,
            _ => QualityBand::Correct,
        }
    }

    /// Button caption used by the review screen.
    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "Blackout",
            1 => "Wrong",
            2 => "Wrong (familiar)",
            3 => "Difficult",
            4 => "Correct",
            _ => "Perfect",
        }
    }
}

impl TryFrom<i64> for Quality {
    type Error = ReviewError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_zero_to_five() {
        for value in 0..=5 {
            assert_eq!(Quality::new(value).unwrap().value() as i64, value);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(Quality::new(-1), Err(ReviewError::InvalidQuality(-1))));
        assert!(matches!(Quality::new(6), Err(ReviewError::InvalidQuality(6))));
        assert!(Quality::try_from(42).is_err());
    }

    #[test]
    fn test_bands() {
        let bands: Vec<QualityBand> = Quality::all().map(Quality::band).collect();
        assert_eq!(
            bands,
            vec![
                QualityBand::Lapse,
                QualityBand::Hard,
                QualityBand::Hard,
                QualityBand::Correct,
                QualityBand::Correct,
                QualityBand::Correct,
            ]
        );
    }
}
