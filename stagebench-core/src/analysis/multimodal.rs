use super::{Analyser, Conclusion, ConclusionKind};
use crate::report::BenchmarkReport;
use crate::stats::{m_value, Modality};

pub(crate) const DEFAULT_MIN_SAMPLE: usize = 15;

/// Flags Result-stage distributions with more than one mode.
#[derive(Debug, Clone, Copy)]
pub struct MultimodalDistributionAnalyser {
    min_sample: usize,
}

impl MultimodalDistributionAnalyser {
    pub fn new(min_sample: usize) -> Self {
        Self { min_sample }
    }
}

impl Default for MultimodalDistributionAnalyser {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SAMPLE)
    }
}

impl Analyser for MultimodalDistributionAnalyser {
    fn id(&self) -> &'static str {
        "MultimodalDistribution"
    }

    fn analyse(&self, report: &BenchmarkReport) -> Vec<Conclusion> {
        let values = report.result_values();
        if values.len() < self.min_sample {
            return Vec::new();
        }
        let m = m_value(&values);
        let shape = match Modality::from_m_value(m) {
            Modality::Unimodal => return Vec::new(),
            Modality::SeveralModes => "can have several modes",
            Modality::Bimodal => "is bimodal",
            Modality::Multimodal => "is multimodal",
        };
        vec![Conclusion::new(
            self.id(),
            ConclusionKind::Warning,
            &report.name,
            format!("It seems that the distribution {} (mValue = {:.2})", shape, m),
        )]
    }
}
