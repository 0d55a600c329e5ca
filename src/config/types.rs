use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "dependentLanguages[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 同期処理の設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Reference language driving the key lifecycle.
    pub reference_language: String,

    /// Dependent languages kept in sync with the reference key set.
    /// The first entry is the primary one tracked by the cache.
    pub dependent_languages: Vec<String>,

    /// Parallel worker count for per-owner processing.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,

    /// Compute and report merges without writing files or the cache.
    pub dry_run: bool,

    /// Ignore the cache and reprocess every owner.
    pub force: bool,

    /// Remove cache entries for owners absent from the payload source.
    pub prune_stale: bool,

    pub output: OutputSettings,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            reference_language: "en_us".to_string(),
            dependent_languages: vec!["zh_cn".to_string()],
            num_threads: None,
            dry_run: false,
            force: false,
            prune_stale: false,
            output: OutputSettings::default(),
        }
    }
}

impl SyncSettings {
    /// Effective worker count.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1))
    }

    /// The primary dependent language, whose incoming fingerprint the
    /// cache tracks.
    #[must_use]
    pub fn primary_dependent(&self) -> Option<&str> {
        self.dependent_languages.first().map(String::as_str)
    }

    /// Validate the settings.
    ///
    /// # Errors
    /// Every problem found, as a list of [`ValidationError`].
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !is_language_code(&self.reference_language) {
            errors.push(ValidationError::new(
                "referenceLanguage",
                "must be a lowercase language code like 'en_us'",
            ));
        }

        if self.dependent_languages.is_empty() {
            errors.push(ValidationError::new(
                "dependentLanguages",
                "at least one dependent language is required",
            ));
        }
        for (i, language) in self.dependent_languages.iter().enumerate() {
            if !is_language_code(language) {
                errors.push(ValidationError::new(
                    format!("dependentLanguages[{i}]"),
                    "must be a lowercase language code like 'zh_cn'",
                ));
            } else if *language == self.reference_language {
                errors.push(ValidationError::new(
                    format!("dependentLanguages[{i}]"),
                    "must differ from referenceLanguage",
                ));
            }
        }

        if self.num_threads == Some(0) {
            errors.push(ValidationError::new("numThreads", "must be at least 1"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// `en_us`, `zh_cn`, ... — lowercase letters, digits and underscores.
fn is_language_code(code: &str) -> bool {
    !code.is_empty()
        && code.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// ログ出力の設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputSettings {
    pub verbosity: Verbosity,
    /// ANSI color in terminal output.
    pub color: bool,
    /// Optional log file; when set, output goes there instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { verbosity: Verbosity::Normal, color: true, log_file: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    #[default]
    Normal,
    /// Per-file detail.
    Verbose,
}

impl Verbosity {
    /// The corresponding tracing level filter directive.
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[googletest::test]
    fn test_defaults() {
        let settings = SyncSettings::default();

        assert_eq!(settings.reference_language, "en_us");
        expect_that!(settings.dependent_languages, eq(&vec!["zh_cn".to_string()]));
        expect_that!(settings.primary_dependent(), some(eq("zh_cn")));
        expect_that!(settings.dry_run, eq(false));
        expect_that!(settings.validate().is_ok(), eq(true));
    }

    #[googletest::test]
    fn test_worker_count_default_is_positive() {
        let settings = SyncSettings::default();

        expect_that!(settings.worker_count() >= 1, eq(true));
    }

    #[googletest::test]
    fn test_worker_count_explicit() {
        let settings = SyncSettings { num_threads: Some(3), ..SyncSettings::default() };

        expect_that!(settings.worker_count(), eq(3));
    }

    #[rstest]
    #[case::empty_reference("", vec!["zh_cn"], false)]
    #[case::uppercase_reference("EN_US", vec!["zh_cn"], false)]
    #[case::no_dependents("en_us", vec![], false)]
    #[case::dependent_equals_reference("en_us", vec!["en_us"], false)]
    #[case::valid("en_us", vec!["zh_cn", "ja_jp"], true)]
    fn test_validate(
        #[case] reference: &str,
        #[case] dependents: Vec<&str>,
        #[case] valid: bool,
    ) {
        let settings = SyncSettings {
            reference_language: reference.to_string(),
            dependent_languages: dependents.into_iter().map(String::from).collect(),
            ..SyncSettings::default()
        };

        assert_eq!(settings.validate().is_ok(), valid);
    }

    #[googletest::test]
    fn test_validate_zero_threads() {
        let settings = SyncSettings { num_threads: Some(0), ..SyncSettings::default() };

        let errors = settings.validate().unwrap_err();

        assert_eq!(errors[0].field_path, "numThreads");
    }

    #[googletest::test]
    fn test_settings_from_camel_case_json() {
        let json = r#"{
            "referenceLanguage": "en_us",
            "dependentLanguages": ["ja_jp"],
            "numThreads": 2,
            "output": {"verbosity": "verbose", "color": false}
        }"#;

        let settings: SyncSettings = serde_json::from_str(json).unwrap();

        expect_that!(settings.dependent_languages, eq(&vec!["ja_jp".to_string()]));
        expect_that!(settings.num_threads, some(eq(2)));
        expect_that!(settings.output.verbosity, eq(Verbosity::Verbose));
        expect_that!(settings.output.color, eq(false));
    }

    #[rstest]
    #[case(Verbosity::Quiet, "warn")]
    #[case(Verbosity::Normal, "info")]
    #[case(Verbosity::Verbose, "debug")]
    fn test_verbosity_filter_directive(#[case] verbosity: Verbosity, #[case] expected: &str) {
        assert_eq!(verbosity.filter_directive(), expected);
    }
}
