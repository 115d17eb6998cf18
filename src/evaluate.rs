use crate::error::PlotError;
use crate::loader::Base;
use std::collections::BTreeSet;

/// Pairing agreement between a plotted structure and a reference structure
#[derive(Debug, Clone, PartialEq)]
pub struct PairComparison {
    pub accepted: Vec<(usize, usize)>,
    pub missing: Vec<(usize, usize)>, // in the reference only
    pub extra: Vec<(usize, usize)>,   // in the plotted structure only
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStatistics {
    pub accepted: usize,
    pub missing: usize,
    pub extra: usize,
    pub sensitivity: f64,
    pub ppv: f64, // Positive Predictive Value
}

/// Base pairs (i < j) recorded in the pair-partner column
pub fn base_pairs(bases: &[Base]) -> BTreeSet<(usize, usize)> {
    bases
        .iter()
        .filter_map(|base| {
            base.pair_partner
                .filter(|&partner| partner > base.index)
                .map(|partner| (base.index, partner))
        })
        .collect()
}

pub fn compare_structures(
    predicted: &[Base],
    reference: &[Base],
    reference_source: &str,
) -> Result<PairComparison, PlotError> {
    if predicted.len() != reference.len() {
        return Err(PlotError::format(
            reference_source,
            1,
            format!(
                "reference has {} bases but the plotted structure has {}",
                reference.len(),
                predicted.len()
            ),
        ));
    }

    let predicted_pairs = base_pairs(predicted);
    let reference_pairs = base_pairs(reference);

    Ok(PairComparison {
        accepted: predicted_pairs.intersection(&reference_pairs).copied().collect(),
        missing: reference_pairs.difference(&predicted_pairs).copied().collect(),
        extra: predicted_pairs.difference(&reference_pairs).copied().collect(),
    })
}

/// Sensitivity and PPV of the accepted pairs.
///
/// Zero accepted pairs is rejected instead of reporting 0 or NaN.
pub fn summary_statistics(
    accepted: usize,
    missing: usize,
    extra: usize,
) -> Result<SummaryStatistics, PlotError> {
    if accepted == 0 {
        return Err(PlotError::Domain(format!(
            "sensitivity/PPV undefined with no accepted pairs ({} missing, {} extra)",
            missing, extra
        )));
    }

    Ok(SummaryStatistics {
        accepted,
        missing,
        extra,
        sensitivity: accepted as f64 / (accepted + missing) as f64,
        ppv: accepted as f64 / (accepted + extra) as f64,
    })
}

impl PairComparison {
    pub fn statistics(&self) -> Result<SummaryStatistics, PlotError> {
        summary_statistics(self.accepted.len(), self.missing.len(), self.extra.len())
    }
}
