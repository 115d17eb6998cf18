use crate::error::PlotError;

/// Half the width of a US-letter page in points; the ring is centred on it
pub const PAGE_CENTER: f64 = 306.0;

/// Angle numerator of the main labelled ring
pub const MAIN_RING_DEGREES: f64 = 360.0;
/// Angle numerator of the overlay ring, deliberately not 360
pub const OVERLAY_RING_DEGREES: f64 = 359.75;

/// Geometry shared by every ring and connector of one plot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParameters {
    pub num_bases: usize,
    pub scale_factor: f64,
    pub radius: f64,
    pub angle_per_base: f64,
    pub overlay_angle_per_base: f64,
    /// Ring centre (x and y) in scaled user space
    pub center: f64,
}

impl LayoutParameters {
    pub fn for_length(num_bases: usize) -> Result<Self, PlotError> {
        let scale_factor = scale_factor(num_bases)?;
        Ok(Self {
            num_bases,
            scale_factor,
            radius: radius(num_bases),
            angle_per_base: angle_per_base(num_bases),
            overlay_angle_per_base: ring_angle(OVERLAY_RING_DEGREES, num_bases),
            center: PAGE_CENTER / scale_factor,
        })
    }

    /// Endpoint distance from which connectors are routed through the centre
    pub fn center_threshold(&self) -> f64 {
        self.radius * 2.0 / 8.0 * 5.0
    }
}

/// Heuristic scaling factor, fitted against a range of sequence lengths.
///
/// The two branches do not meet at 76/77; plots are calibrated against that jump.
pub fn scale_factor(num_bases: usize) -> Result<f64, PlotError> {
    if num_bases == 0 {
        return Err(PlotError::Domain(
            "scale factor needs at least one base (log10 of 0)".to_string(),
        ));
    }
    let n = num_bases as f64;
    if num_bases > 76 {
        Ok(74.0875 / n + 0.020367)
    } else {
        Ok(-1.06 * n.log10() + 5.44)
    }
}

pub fn radius(num_bases: usize) -> f64 {
    3.0 * num_bases as f64 + 14.0
}

/// Degrees between adjacent bases; negative places bases clockwise
pub fn angle_per_base(num_bases: usize) -> f64 {
    ring_angle(MAIN_RING_DEGREES, num_bases)
}

pub fn ring_angle(degrees: f64, num_bases: usize) -> f64 {
    -degrees / (num_bases as f64 + 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_is_linear_in_length() {
        for n in 1..500 {
            assert_eq!(radius(n), (3 * n + 14) as f64);
        }
    }

    #[test]
    fn short_sequences_use_the_log_branch() {
        for n in 1..=76usize {
            let expected = -1.06 * (n as f64).log10() + 5.44;
            assert_eq!(scale_factor(n).unwrap(), expected);
        }
        assert_eq!(scale_factor(1).unwrap(), 5.44);
    }

    #[test]
    fn long_sequences_use_the_reciprocal_branch() {
        for n in 77..1000usize {
            assert_eq!(scale_factor(n).unwrap(), 74.0875 / n as f64 + 0.020367);
        }
    }

    #[test]
    fn scale_factor_jumps_between_76_and_77() {
        let at_76 = scale_factor(76).unwrap();
        let at_77 = scale_factor(77).unwrap();
        let step_below = scale_factor(75).unwrap() - at_76;
        assert!(at_76 - at_77 > 2.0);
        assert!((at_76 - at_77) > 100.0 * step_below);
    }

    #[test]
    fn empty_sequence_is_a_domain_error() {
        assert!(matches!(scale_factor(0), Err(PlotError::Domain(_))));
        assert!(LayoutParameters::for_length(0).is_err());
    }

    #[test]
    fn ring_angles_keep_distinct_constants() {
        let layout = LayoutParameters::for_length(4).unwrap();
        assert_eq!(layout.angle_per_base, -60.0);
        assert_eq!(layout.overlay_angle_per_base, -359.75 / 6.0);
        assert_ne!(layout.angle_per_base, layout.overlay_angle_per_base);
        assert_eq!(angle_per_base(4), layout.angle_per_base);
    }

    #[test]
    fn layout_is_a_pure_function_of_length() {
        assert_eq!(
            LayoutParameters::for_length(123).unwrap(),
            LayoutParameters::for_length(123).unwrap()
        );
        let layout = LayoutParameters::for_length(4).unwrap();
        assert_eq!(layout.radius, 26.0);
        assert_eq!(layout.center_threshold(), 32.5);
        assert!((layout.center * layout.scale_factor - PAGE_CENTER).abs() < 1e-9);
    }
}
