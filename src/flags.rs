//! Run flags: the raw clap surface and its validated form.

use clap::Args;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::sync::LazyLock;
use std::time::Duration;

use crate::errors::ValidationError;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_DEBOUNCE_MS: u64 = 5000;

static LOCALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}([-_][A-Za-z0-9]{2,8})*$").expect("locale regex is valid")
});

/// Flags accepted by `lingo run`, exactly as typed.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Override the configured source locale
    #[arg(long)]
    pub source_locale: Option<String>,

    /// Target locale (repeatable, replaces configured targets)
    #[arg(long = "target-locale")]
    pub target_locale: Vec<String>,

    /// Only process these buckets (repeatable)
    #[arg(long)]
    pub bucket: Vec<String>,

    /// Only process files matching this pattern (repeatable)
    #[arg(long)]
    pub file: Vec<String>,

    /// Only process keys matching this glob (repeatable)
    #[arg(long)]
    pub key: Vec<String>,

    /// Reprocess every key, including ones already translated
    #[arg(long)]
    pub force: bool,

    /// Override the stored API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Pause before any work and wait for confirmation
    #[arg(long)]
    pub debug: bool,

    /// Maximum number of tasks executed concurrently
    #[arg(long)]
    pub concurrency: Option<String>,

    /// Keep running and re-localize when source files change
    #[arg(long)]
    pub watch: bool,

    /// Debounce window for watch mode, in milliseconds
    #[arg(long)]
    pub debounce: Option<String>,

    /// Play a sound when the run succeeds or fails
    #[arg(long)]
    pub sound: bool,
}

/// Validated, normalized run configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFlags {
    pub source_locale: Option<String>,
    pub target_locale: Vec<String>,
    pub bucket: Vec<String>,
    pub file: Vec<String>,
    pub key: Vec<String>,
    pub force: bool,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub debug: bool,
    pub concurrency: usize,
    pub watch: bool,
    #[serde(serialize_with = "serialize_millis")]
    pub debounce: Duration,
    pub sound: bool,
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

impl Default for RunFlags {
    fn default() -> Self {
        Self {
            source_locale: None,
            target_locale: Vec::new(),
            bucket: Vec::new(),
            file: Vec::new(),
            key: Vec::new(),
            force: false,
            api_key: None,
            debug: false,
            concurrency: DEFAULT_CONCURRENCY,
            watch: false,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            sound: false,
        }
    }
}

impl RunArgs {
    /// Validate and normalize into [`RunFlags`].
    ///
    /// Values are trimmed; repeatable flags keep their command-line order.
    pub fn validate(&self) -> Result<RunFlags, ValidationError> {
        let source_locale = self
            .source_locale
            .as_deref()
            .map(|l| locale("source-locale", l))
            .transpose()?;
        let target_locale = self
            .target_locale
            .iter()
            .map(|l| locale("target-locale", l))
            .collect::<Result<Vec<_>, _>>()?;
        let bucket = non_empty_all("bucket", &self.bucket)?;
        let file = patterns("file", &self.file)?;
        let key = patterns("key", &self.key)?;
        let api_key = self
            .api_key
            .as_deref()
            .map(|k| non_empty("api-key", k))
            .transpose()?;
        let concurrency = match self.concurrency.as_deref() {
            Some(raw) => positive("concurrency", raw)? as usize,
            None => DEFAULT_CONCURRENCY,
        };
        let debounce_ms = match self.debounce.as_deref() {
            Some(raw) => positive("debounce", raw)?,
            None => DEFAULT_DEBOUNCE_MS,
        };

        Ok(RunFlags {
            source_locale,
            target_locale,
            bucket,
            file,
            key,
            force: self.force,
            api_key,
            debug: self.debug,
            concurrency,
            watch: self.watch,
            debounce: Duration::from_millis(debounce_ms),
            sound: self.sound,
        })
    }
}

fn non_empty(flag: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyValue { flag });
    }
    Ok(value.to_string())
}

fn non_empty_all(flag: &'static str, values: &[String]) -> Result<Vec<String>, ValidationError> {
    values.iter().map(|v| non_empty(flag, v)).collect()
}

fn locale(flag: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = non_empty(flag, value)?;
    if !LOCALE_RE.is_match(&value) {
        return Err(ValidationError::InvalidLocale { flag, value });
    }
    Ok(value)
}

fn patterns(flag: &'static str, values: &[String]) -> Result<Vec<String>, ValidationError> {
    values
        .iter()
        .map(|v| {
            let value = non_empty(flag, v)?;
            glob::Pattern::new(&value).map_err(|e| ValidationError::InvalidPattern {
                flag,
                value: value.clone(),
                message: e.msg.to_string(),
            })?;
            Ok(value)
        })
        .collect()
}

fn positive(flag: &'static str, raw: &str) -> Result<u64, ValidationError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::NotPositiveInteger {
            flag,
            value: raw.to_string(),
        }),
    }
}
