//! Demonstration-binary configuration: an alternative sample set loaded
//! from a TOML file, plus the one recoverable external failure mode in
//! this crate. Everything inside the [`crate::oil`]/[`crate::nfa`] core
//! stays panic-on-precondition-violation.

use serde::Deserialize;
use thiserror::Error;

use crate::nfa::MAX_SYMBOLS;
use crate::oil::OilOptions;

/// A hard-coded or file-loaded sample set plus the options to run `oil`
/// with: everything [`crate::oil::oil_with_options`] needs.
#[derive(Debug, Deserialize)]
pub struct SampleSet {
    pub alphabet_size: u8,
    pub sample_length: usize,
    pub buffer: Vec<u8>,
    pub positives: Vec<usize>,
    pub negatives: Vec<usize>,
    #[serde(default)]
    pub no_random_sort: bool,
    #[serde(default)]
    pub skip_search_best: bool,
}

impl SampleSet {
    /// Alphabet `{0,1,2,3}` (plus the sentinel symbol 12 used by the sample
    /// buffer itself, hence `alphabet_size: 13`), length-3 examples over
    /// `[1..=12]`, positives at `{3, 8}`, negatives at the rest.
    pub fn builtin_demo() -> SampleSet {
        SampleSet {
            alphabet_size: 13,
            sample_length: 3,
            buffer: (1..=12).collect(),
            positives: vec![3, 8],
            negatives: vec![0, 1, 2, 4, 5, 6, 7, 9],
            no_random_sort: false,
            skip_search_best: false,
        }
    }

    /// Parses a [`SampleSet`] from TOML text and checks it for internal
    /// consistency (the checks `oil_with_options` itself would otherwise
    /// only discover via a panic).
    pub fn from_toml_str(text: &str) -> Result<SampleSet, ConfigError> {
        let set: SampleSet = toml::from_str(text)?;
        set.validate()?;
        Ok(set)
    }

    pub fn options(&self) -> OilOptions {
        OilOptions {
            no_random_sort: self.no_random_sort,
            skip_search_best: self.skip_search_best,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.alphabet_size as usize > MAX_SYMBOLS {
            return Err(ConfigError::AlphabetTooLarge {
                got: self.alphabet_size,
                max: MAX_SYMBOLS,
            });
        }
        for &idx in self.positives.iter().chain(self.negatives.iter()) {
            if idx + self.sample_length > self.buffer.len() {
                return Err(ConfigError::SampleOutOfRange {
                    index: idx,
                    sample_length: self.sample_length,
                    buffer_len: self.buffer.len(),
                });
            }
        }
        Ok(())
    }
}

/// Failure modes of loading a [`SampleSet`] from a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config as TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("alphabet size {got} exceeds MAX_SYMBOLS ({max})")]
    AlphabetTooLarge { got: u8, max: usize },
    #[error(
        "sample at index {index} (length {sample_length}) falls outside the buffer (len {buffer_len})"
    )]
    SampleOutOfRange {
        index: usize,
        sample_length: usize,
        buffer_len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_demo_is_internally_consistent() {
        SampleSet::builtin_demo().validate().unwrap();
    }

    #[test]
    fn parses_minimal_toml() {
        let text = r#"
            alphabet_size = 2
            sample_length = 1
            buffer = [0, 1]
            positives = [0]
            negatives = [1]
        "#;
        let set = SampleSet::from_toml_str(text).unwrap();
        assert_eq!(set.alphabet_size, 2);
        assert!(!set.no_random_sort);
    }

    #[test]
    fn rejects_alphabet_over_max_symbols() {
        let text = format!(
            r#"
            alphabet_size = {}
            sample_length = 1
            buffer = [0, 1]
            positives = [0]
            negatives = [1]
        "#,
            MAX_SYMBOLS + 1
        );
        assert!(matches!(
            SampleSet::from_toml_str(&text),
            Err(ConfigError::AlphabetTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_sample_index() {
        let text = r#"
            alphabet_size = 2
            sample_length = 3
            buffer = [0, 1]
            positives = [0]
            negatives = []
        "#;
        assert!(matches!(
            SampleSet::from_toml_str(text),
            Err(ConfigError::SampleOutOfRange { .. })
        ));
    }
}
