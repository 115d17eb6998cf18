use crate::loader::CorrelationRecord;
use std::fmt;

/// RGB color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const DARK_GREEN: Rgb = Rgb::new(0.0, 0.5, 0.0);
    pub const MAGENTA: Rgb = Rgb::new(0.8, 0.1, 0.8);
    pub const LIGHT_GREY: Rgb = Rgb::new(0.8, 0.8, 0.8);

    /// CSS `rgb(r, g, b)` with 0-255 channels
    pub fn to_css(&self) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("rgb({}, {}, {})", channel(self.r), channel(self.g), channel(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {:.2} {:.2}", self.r, self.g, self.b)
    }
}

/// Stroke pattern of a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

impl LineStyle {
    pub fn from_slipped(slipped: f64) -> Self {
        if slipped > 0.5 {
            LineStyle::Dashed
        } else {
            LineStyle::Solid
        }
    }

    /// Dash array and phase; the solid pattern is a very long dash
    pub fn dash_pattern(&self) -> ([u32; 2], u32) {
        match self {
            LineStyle::Dashed => ([15, 5], 0),
            LineStyle::Solid => ([100000, 1], 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationClass {
    Positive,
    Negative,
}

/// Thresholds and colors used to turn records into connectors
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationConfig {
    pub positive_threshold: f64,
    pub negative_threshold: f64,
    pub positive_color: Rgb,
    pub negative_color: Rgb,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            positive_threshold: 0.10,
            negative_threshold: -0.04,
            positive_color: Rgb::DARK_GREEN,
            negative_color: Rgb::MAGENTA,
        }
    }
}

/// A record that passed one of the threshold tests
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedConnector {
    pub record: CorrelationRecord,
    pub class: CorrelationClass,
    pub color: Rgb,
    pub style: LineStyle,
}

/// Filter records into positive and negative connectors.
///
/// Both thresholds are tested for every record, so an overlapping configuration
/// yields two connectors for one record. Values between the thresholds are dropped.
pub fn classify(
    records: &[CorrelationRecord],
    config: &ClassificationConfig,
) -> (Vec<ClassifiedConnector>, usize) {
    // no slipped data is carried by the correlation file
    let style = LineStyle::from_slipped(0.0);
    let mut connectors = Vec::new();

    for record in records {
        if record.value >= config.positive_threshold {
            connectors.push(ClassifiedConnector {
                record: *record,
                class: CorrelationClass::Positive,
                color: config.positive_color,
                style,
            });
        }
        if record.value <= config.negative_threshold {
            connectors.push(ClassifiedConnector {
                record: *record,
                class: CorrelationClass::Negative,
                color: config.negative_color,
                style,
            });
        }
    }

    let count = connectors.len();
    (connectors, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(i: usize, j: usize, value: f64) -> CorrelationRecord {
        CorrelationRecord { i, j, value }
    }

    #[test]
    fn thresholds_are_inclusive() {
        let records = [record(1, 2, 0.10), record(1, 3, -0.04), record(1, 4, 0.05)];
        let (connectors, count) = classify(&records, &ClassificationConfig::default());
        assert_eq!(count, 2);
        assert_eq!(connectors[0].class, CorrelationClass::Positive);
        assert_eq!(connectors[0].color, Rgb::DARK_GREEN);
        assert_eq!(connectors[1].class, CorrelationClass::Negative);
        assert_eq!(connectors[1].color, Rgb::MAGENTA);
        assert!(connectors.iter().all(|c| c.record.j != 4));
    }

    #[test]
    fn agcu_scenario_keeps_two_of_three() {
        let records = [record(1, 3, 0.20), record(2, 4, -0.50), record(1, 2, 0.05)];
        let (connectors, count) = classify(&records, &ClassificationConfig::default());
        assert_eq!(count, 2);
        assert_eq!((connectors[0].record.i, connectors[0].record.j), (1, 3));
        assert_eq!(connectors[0].class, CorrelationClass::Positive);
        assert_eq!((connectors[1].record.i, connectors[1].record.j), (2, 4));
        assert_eq!(connectors[1].class, CorrelationClass::Negative);
    }

    #[test]
    fn classification_is_idempotent() {
        let records: Vec<_> = (0..50)
            .map(|k| record(k + 1, 50 - k, (k as f64 - 25.0) / 50.0))
            .collect();
        let config = ClassificationConfig::default();
        assert_eq!(classify(&records, &config), classify(&records, &config));
    }

    #[test]
    fn overlapping_thresholds_emit_both_classes() {
        let config = ClassificationConfig {
            positive_threshold: -0.2,
            negative_threshold: 0.2,
            ..ClassificationConfig::default()
        };
        let (connectors, count) = classify(&[record(3, 9, 0.0)], &config);
        assert_eq!(count, 2);
        assert_eq!(connectors[0].class, CorrelationClass::Positive);
        assert_eq!(connectors[1].class, CorrelationClass::Negative);
    }

    #[test]
    fn connectors_default_to_solid() {
        let (connectors, _) = classify(&[record(1, 2, 0.9)], &ClassificationConfig::default());
        assert_eq!(connectors[0].style, LineStyle::Solid);
        assert_eq!(LineStyle::from_slipped(0.5), LineStyle::Solid);
        assert_eq!(LineStyle::from_slipped(0.51), LineStyle::Dashed);
        assert_eq!(LineStyle::Dashed.dash_pattern(), ([15, 5], 0));
    }

    #[test]
    fn colors_render_as_postscript_and_css() {
        assert_eq!(Rgb::MAGENTA.to_string(), "0.80 0.10 0.80");
        assert_eq!(Rgb::DARK_GREEN.to_css(), "rgb(0, 128, 0)");
    }
}
