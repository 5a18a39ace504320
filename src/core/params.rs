//! Parameter set definition: dimension and diagnostic labels.

use std::iter::FromIterator;

/// A set of parameter definitions.
///
/// Each parameter carries a stable string label supplied by the caller.
/// Labels appear in log messages and diagnostic events so that warnings such
/// as the positive-definiteness fallback can name the parameter they concern.
/// The optimizers themselves address parameters by index.
#[derive(Debug, Clone)]
pub struct ParamSet {
    labels: Vec<String>,
}

impl ParamSet {
    /// Creates a parameter set of given dimension with generated labels
    /// `x1`, ..., `xn`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn of_dim(n: usize) -> Self {
        assert!(n > 0, "empty parameter set");
        Self {
            labels: (1..=n).map(|i| format!("x{}", i)).collect(),
        }
    }

    /// Creates the parameter set from caller-supplied labels.
    ///
    /// # Panics
    ///
    /// Panics if `labels` is empty.
    pub fn with_labels(labels: Vec<String>) -> Self {
        assert!(!labels.is_empty(), "empty parameter set");
        Self { labels }
    }

    /// Number of parameters.
    pub fn dim(&self) -> usize {
        self.labels.len()
    }

    /// Get the parameter labels.
    pub fn labels(&self) -> &[String] {
        self.labels.as_slice()
    }

    /// Get the label of parameter `j`.
    pub fn label(&self, j: usize) -> &str {
        &self.labels[j]
    }
}

impl FromIterator<String> for ParamSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::with_labels(iter.into_iter().collect())
    }
}

impl From<Vec<String>> for ParamSet {
    fn from(labels: Vec<String>) -> Self {
        Self::with_labels(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_labels() {
        let params = ParamSet::of_dim(3);
        assert_eq!(params.dim(), 3);
        assert_eq!(params.labels(), &["x1", "x2", "x3"]);
    }

    #[test]
    fn caller_labels() {
        let params: ParamSet = vec!["intercept".to_string(), "slope".to_string()]
            .into_iter()
            .collect();
        assert_eq!(params.dim(), 2);
        assert_eq!(params.label(1), "slope");
    }
}
