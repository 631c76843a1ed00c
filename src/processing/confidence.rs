use crate::models::{Confidence, EventRecord};
use log::debug;

pub struct ConfidenceFusion;

impl ConfidenceFusion {
    /// Share of scored fields carrying a value, 0-100.
    pub fn completeness(record: &EventRecord) -> f32 {
        record.filled_fields() as f32 / EventRecord::SCORED_FIELDS as f32 * 100.0
    }

    pub fn label(score: f32) -> Confidence {
        if score > 70.0 {
            Confidence::High
        } else if score > 40.0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Blend completeness with OCR confidence (both 0-100) and store the label.
    pub fn fuse(record: &mut EventRecord, ocr_confidence: f32) -> f32 {
        let completeness = Self::completeness(record);
        let score = 0.5 * completeness + 0.5 * ocr_confidence.clamp(0.0, 100.0);
        record.confidence = Self::label(score);
        debug!(
            "Confidence fusion: completeness={:.1}, ocr={:.1}, final={:.1} -> {}",
            completeness, ocr_confidence, score, record.confidence
        );
        score
    }

    /// Completeness-only variant, for records with no OCR signal of their own.
    pub fn from_completeness(record: &mut EventRecord) -> f32 {
        let score = Self::completeness(record);
        record.confidence = Self::label(score);
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(filled: usize) -> EventRecord {
        let mut record = EventRecord::default();
        let fields = [
            &mut record.title,
            &mut record.description,
            &mut record.category,
            &mut record.venue_name,
            &mut record.venue_address,
            &mut record.contact_email,
            &mut record.contact_phone,
            &mut record.entry_fee,
        ];
        for field in fields.into_iter().take(filled) {
            *field = "x".to_string();
        }
        if filled > 8 {
            record.tags.push("workshop".to_string());
        }
        record
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(ConfidenceFusion::label(70.1), Confidence::High);
        assert_eq!(ConfidenceFusion::label(70.0), Confidence::Medium);
        assert_eq!(ConfidenceFusion::label(40.1), Confidence::Medium);
        assert_eq!(ConfidenceFusion::label(40.0), Confidence::Low);
        assert_eq!(ConfidenceFusion::label(0.0), Confidence::Low);
    }

    #[test]
    fn test_empty_record_is_low() {
        let mut record = EventRecord::default();
        let score = ConfidenceFusion::fuse(&mut record, 0.0);
        assert_eq!(score, 0.0);
        assert_eq!(record.confidence, Confidence::Low);
    }

    #[test]
    fn test_fuse_blends_both_signals() {
        let mut record = record_with(9);
        let score = ConfidenceFusion::fuse(&mut record, 60.0);
        assert!((score - 80.0).abs() < 1e-3);
        assert_eq!(record.confidence, Confidence::High);

        let mut record = record_with(3);
        let score = ConfidenceFusion::fuse(&mut record, 90.0);
        assert!((score - 61.666).abs() < 0.01);
        assert_eq!(record.confidence, Confidence::Medium);
    }

    #[test]
    fn test_completeness_only() {
        let mut record = record_with(7);
        ConfidenceFusion::from_completeness(&mut record);
        assert_eq!(record.confidence, Confidence::High);

        let mut record = record_with(4);
        ConfidenceFusion::from_completeness(&mut record);
        assert_eq!(record.confidence, Confidence::Medium);

        let mut record = record_with(3);
        ConfidenceFusion::from_completeness(&mut record);
        assert_eq!(record.confidence, Confidence::Low);
    }
}
