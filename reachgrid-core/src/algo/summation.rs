//! Compensated summation for population totals.
//!
//! Population surfaces routinely hold millions of small cell values next to a
//! few very large ones, where naive `f64` accumulation drifts. Neumaier's
//! variant of Kahan summation keeps a running compensation term that also
//! handles addends larger than the running sum.

#[derive(Debug, Default, Clone, Copy)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    /// Combine two partial sums, as produced by parallel folds.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.add(other.sum);
        self.add(other.compensation);
        self
    }

    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for NeumaierSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl FromIterator<f64> for NeumaierSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sum = Self::new();
        sum.extend(iter);
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_small_addends_lost_by_naive_sum() {
        let values = [1.0e16, 1.0, -1.0e16, 1.0];
        let naive: f64 = values.iter().sum();
        let compensated: NeumaierSum = values.into_iter().collect();

        assert_eq!(compensated.total(), 2.0);
        assert_ne!(naive, 2.0);
    }

    #[test]
    fn merge_matches_sequential_sum() {
        let left: NeumaierSum = [0.1; 10].into_iter().collect();
        let right: NeumaierSum = [0.2; 10].into_iter().collect();
        let merged = left.merge(right);

        assert!((merged.total() - 3.0).abs() < 1e-15);
    }

    #[test]
    fn empty_sum_is_zero() {
        assert_eq!(NeumaierSum::new().total(), 0.0);
    }
}
