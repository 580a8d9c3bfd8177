//! Detection of measurements indistinguishable from "nothing was executed".

use super::ttest::{StudentTest, WelchTTest};
use super::StatisticalTest;

const ALPHA: f64 = 0.05;

/// Half of one CPU cycle in nanoseconds for a CPU running at `frequency_ghz`.
pub fn zero_measurement_threshold(frequency_ghz: f64) -> f64 {
    1.0 / frequency_ghz / 2.0
}

/// Whether per-operation timings `results` fail to exceed `threshold` nanoseconds.
///
/// Fewer than three values never count as a zero measurement.
pub fn check_zero_measurement_one_sample(results: &[f64], threshold: f64) -> bool {
    if results.len() < 3 {
        return false;
    }
    !StudentTest
        .is_greater_than(results, threshold, ALPHA)
        .null_hypothesis_rejected
}

/// Whether workload timings fail to exceed the overhead timings.
pub fn check_zero_measurement_two_samples(workload: &[f64], overhead: &[f64]) -> bool {
    if workload.len() < 3 || overhead.len() < 3 {
        return false;
    }
    !WelchTTest
        .is_greater(workload, overhead, 0.0, ALPHA)
        .null_hypothesis_rejected
}

#[cfg(test)]
mod tests {
    use super::*;

    // A CPU at about 3.7 GHz
    const THRESHOLD: f64 = 0.2702 / 2.0;

    #[test]
    fn test_around_one_cycle_is_not_zero() {
        let samples: [&[f64]; 2] = [
            &[
                0.27025, 0.27155, 0.27236, 0.27311, 0.27313, 0.27321, 0.27356, 0.27389, 0.27433,
                0.27473, 0.27507, 0.27520, 0.27543,
            ],
            &[
                0.27875, 0.27876, 0.27961, 0.28004, 0.28211, 0.28270, 0.28323, 0.28361, 0.28404,
                0.28452, 0.28456, 0.28584, 0.28651, 0.29015,
            ],
        ];
        for sample in samples {
            assert!(!check_zero_measurement_one_sample(sample, THRESHOLD));
        }
    }

    #[test]
    fn test_below_one_cycle_is_zero() {
        let samples: [&[f64]; 2] = [
            &[
                0.0, 0.0, 0.00191, 0.00530, 0.00820, 0.01383, 0.01617, 0.02183, 0.02421, 0.03640,
                0.03726, 0.04894, 0.05122, 0.05924, 0.06183,
            ],
            &[
                0.02203, 0.02523, 0.02567, 0.02706, 0.03048, 0.03461, 0.03953, 0.04127, 0.04396,
                0.04939, 0.05361, 0.05670, 0.06394, 0.06812, 0.06901,
            ],
        ];
        for sample in samples {
            assert!(check_zero_measurement_one_sample(sample, THRESHOLD));
        }
    }

    #[test]
    fn test_all_zero_is_zero() {
        assert!(check_zero_measurement_one_sample(&[0.0; 13], THRESHOLD));
    }

    #[test]
    fn test_too_few_values() {
        assert!(!check_zero_measurement_one_sample(&[0.0, 0.0], THRESHOLD));
    }

    #[test]
    fn test_two_samples() {
        let overhead = [1.0, 1.1, 0.9, 1.0, 1.05, 0.95];
        let same_as_overhead = [1.0, 1.05, 0.95, 1.1, 0.9, 1.0];
        let real_work = [5.0, 5.1, 4.9, 5.0, 5.05, 4.95];
        assert!(check_zero_measurement_two_samples(&same_as_overhead, &overhead));
        assert!(!check_zero_measurement_two_samples(&real_work, &overhead));
    }

    #[test]
    fn test_threshold_from_frequency() {
        assert!((zero_measurement_threshold(2.0) - 0.25).abs() < 1e-12);
    }
}
