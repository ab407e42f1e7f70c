use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MenderError;

/// Top-level configuration loaded from `.mender.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
/// Credentials are never stored here permanently; API keys and tokens are
/// expected from the environment (`OPENAI_API_KEY`, `GH_TOKEN`) unless
/// explicitly written into a local, uncommitted config file.
///
/// # Examples
///
/// ```
/// use mender_core::MenderConfig;
///
/// let config = MenderConfig::default();
/// assert_eq!(config.publish.base_branch, "main");
/// assert_eq!(config.llm.model, "gpt-4o");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenderConfig {
    /// Model service settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Static-analysis scanner invocation settings.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Remediation engine settings.
    #[serde(default)]
    pub remedy: RemedyConfig,
    /// Branch/review-request publishing settings.
    #[serde(default)]
    pub publish: PublishConfig,
}

impl MenderConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MenderError::Io`] if the file cannot be read, or
    /// [`MenderError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mender_core::MenderConfig;
    /// use std::path::Path;
    ///
    /// let config = MenderConfig::from_file(Path::new(".mender.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, MenderError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`MenderError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use mender_core::MenderConfig;
    ///
    /// let toml = r#"
    /// [publish]
    /// base_branch = "develop"
    /// "#;
    /// let config = MenderConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.publish.base_branch, "develop");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, MenderError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Model service configuration.
///
/// The client speaks the OpenAI-compatible chat completions protocol, so any
/// provider exposing `/v1/chat/completions` works via `base_url`.
///
/// # Examples
///
/// ```
/// use mender_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.provider, "openai");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (e.g. `"openai"`, `"anthropic"`, `"ollama"`).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider. Falls back to `OPENAI_API_KEY` at run time.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
}

fn default_provider() -> String {
    "openai".into()
}

fn default_model() -> String {
    "gpt-4o".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Static-analysis scanner invocation configuration.
///
/// The scanner is an opaque external process: Mender runs it inside the
/// acquired working copy and then reads the JSON report it leaves behind.
/// A non-zero scanner exit status is logged but does not abort the run.
///
/// # Examples
///
/// ```
/// use mender_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert_eq!(config.program, "sonar-scanner");
/// assert_eq!(config.report.to_str(), Some("scan-report.json"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Scanner executable name or path.
    #[serde(default = "default_scan_program")]
    pub program: String,
    /// Arguments passed to the scanner, as a structured list (never a shell string).
    #[serde(default)]
    pub args: Vec<String>,
    /// Path of the JSON report the scanner writes, relative to the working copy.
    #[serde(default = "default_report_path")]
    pub report: PathBuf,
}

fn default_scan_program() -> String {
    "sonar-scanner".into()
}

fn default_report_path() -> PathBuf {
    PathBuf::from("scan-report.json")
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            program: default_scan_program(),
            args: Vec::new(),
            report: default_report_path(),
        }
    }
}

/// Remediation engine configuration.
///
/// # Examples
///
/// ```
/// use mender_core::RemedyConfig;
///
/// let config = RemedyConfig::default();
/// assert_eq!(config.fence_tag, "fixed");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemedyConfig {
    /// Language tag for the fenced block the model is asked to emit.
    ///
    /// The engine both requests this tag in the prompt and matches it during
    /// extraction, so only a deliberately delimited block is ever trusted.
    #[serde(default = "default_fence_tag")]
    pub fence_tag: String,
}

fn default_fence_tag() -> String {
    "fixed".into()
}

impl Default for RemedyConfig {
    fn default() -> Self {
        Self {
            fence_tag: default_fence_tag(),
        }
    }
}

/// Branch and review-request publishing configuration.
///
/// # Examples
///
/// ```
/// use mender_core::PublishConfig;
///
/// let config = PublishConfig::default();
/// assert_eq!(config.base_branch, "main");
/// assert_eq!(config.remote, "origin");
/// assert_eq!(config.command_timeout_secs, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Branch all per-file branches fork from and return to.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    /// Remote that per-file branches are pushed to.
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Fixed body text for every review request.
    #[serde(default = "default_review_body")]
    pub review_body: String,
    /// Timeout applied to every external `git`/`gh`/scanner invocation.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_base_branch() -> String {
    "main".into()
}

fn default_remote() -> String {
    "origin".into()
}

fn default_review_body() -> String {
    "This change request updates a single file flagged by static analysis.".into()
}

fn default_command_timeout_secs() -> u64 {
    300
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            base_branch: default_base_branch(),
            remote: default_remote(),
            review_body: default_review_body(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}
