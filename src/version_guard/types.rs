//! Outcome, report, and error types for the version guard.

use serde::Deserialize;

/// Result of a version check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The reentrancy flag was present; the server was not contacted.
    SkippedRecentCheck,
    /// The remote version matches, or could not be determined.
    UpToDate,
    /// A newer deployment was detected; caches were wiped and a reload issued.
    UpdatedAndReloading,
}

impl CheckOutcome {
    /// Display label for status text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SkippedRecentCheck => "Version check skipped after reload",
            Self::UpToDate => "Up to date",
            Self::UpdatedAndReloading => "Update found, reloading",
        }
    }
}

/// The document served at `/version.json`.
///
/// Only `version` is read; any other fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteVersionDescriptor {
    #[serde(default)]
    pub version: Option<String>,
}

impl RemoteVersionDescriptor {
    /// Parses a descriptor body.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::InvalidBody(e.to_string()))
    }
}

/// Allow-list of local-storage keys that survive a wipe.
///
/// A key is preserved when it contains any rule as a substring, which covers
/// both prefix rules (`sb-`) and exact-name rules (`library_admin_user`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreservedKeys {
    rules: Vec<String>,
}

impl PreservedKeys {
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(Into::into)
                .filter(|rule: &String| !rule.is_empty())
                .collect(),
        }
    }

    /// Returns true if `key` matches at least one rule.
    pub fn matches(&self, key: &str) -> bool {
        self.rules.iter().any(|rule| key.contains(rule.as_str()))
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }
}

/// Status of a single wipe step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The step ran; the count is the number of items it affected.
    Done(usize),
    /// The runtime lacks the API this step needs.
    Unsupported,
    /// The step failed, fully or partially.
    Failed(String),
}

impl StepStatus {
    /// True for `Done` and `Unsupported`.
    pub fn is_ok(&self) -> bool {
        !matches!(self, StepStatus::Failed(_))
    }
}

/// Aggregate result of `clear_all_caches`, one entry per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeReport {
    /// Cache Storage entries deleted.
    pub cache_storage: StepStatus,
    /// Service worker registrations removed.
    pub service_workers: StepStatus,
    /// Preserved local-storage entries captured before clearing.
    pub snapshot: StepStatus,
    /// Local storage cleared.
    pub local_clear: StepStatus,
    /// Session storage cleared.
    pub session_clear: StepStatus,
    /// Preserved entries written back and verified.
    pub restore: StepStatus,
}

impl WipeReport {
    /// True when no step failed.
    pub fn is_clean(&self) -> bool {
        [
            &self.cache_storage,
            &self.service_workers,
            &self.snapshot,
            &self.local_clear,
            &self.session_clear,
            &self.restore,
        ]
        .iter()
        .all(|step| step.is_ok())
    }
}

/// Errors from browser APIs other than storage and fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The API is not present in this runtime.
    Unsupported(&'static str),
    /// The API threw or rejected.
    Failed(String),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::Unsupported(api) => write!(f, "{} is not supported", api),
            PlatformError::Failed(msg) => write!(f, "Browser API failed: {}", msg),
        }
    }
}

impl std::error::Error for PlatformError {}

/// Errors from fetching the version descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    Network(String),
    /// The server answered with a non-2xx status.
    Status(u16),
    /// No response within the configured timeout.
    Timeout,
    /// The body was not a valid descriptor.
    InvalidBody(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Status(status) => write!(f, "Unexpected HTTP status {}", status),
            FetchError::Timeout => write!(f, "Request timed out"),
            FetchError::InvalidBody(msg) => write!(f, "Invalid version document: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_parsing() {
        let d = RemoteVersionDescriptor::from_json(r#"{"version":"1.3.0","built":"x"}"#).unwrap();
        assert_eq!(d.version.as_deref(), Some("1.3.0"));

        let d = RemoteVersionDescriptor::from_json(r#"{"commit":"abc"}"#).unwrap();
        assert_eq!(d.version, None);

        assert!(RemoteVersionDescriptor::from_json(r#"{"version":3}"#).is_err());
        assert!(RemoteVersionDescriptor::from_json("<html>").is_err());
    }

    #[test]
    fn test_preserved_keys_match_prefix_and_substring() {
        let keys = PreservedKeys::new(["sb-", "library_admin_user"]);

        assert!(keys.matches("sb-auth-token"));
        assert!(keys.matches("sb-xyz-auth-token-code-verifier"));
        assert!(keys.matches("library_admin_user"));
        assert!(keys.matches("legacy.sb-token"));
        assert!(!keys.matches("cart"));
        assert!(!keys.matches("SB-AUTH"));
    }

    #[test]
    fn test_empty_rules_match_nothing() {
        let keys = PreservedKeys::new(["", "keep"]);
        assert_eq!(keys.rules(), &["keep".to_string()]);
        assert!(!keys.matches("cart"));
        assert!(!PreservedKeys::default().matches("anything"));
    }

    #[test]
    fn test_report_cleanliness() {
        let mut report = WipeReport {
            cache_storage: StepStatus::Unsupported,
            service_workers: StepStatus::Done(0),
            snapshot: StepStatus::Done(1),
            local_clear: StepStatus::Done(3),
            session_clear: StepStatus::Done(0),
            restore: StepStatus::Done(1),
        };
        assert!(report.is_clean());

        report.restore = StepStatus::Failed("quota".to_string());
        assert!(!report.is_clean());
    }
}
