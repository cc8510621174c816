//! Recognition service settings loaded from environment variables.
//!
//! The AI service used for receipt scanning and dictation is optional. When
//! `GEMINI_API_KEY` is missing the bot keeps working and the scan/dictate
//! commands answer that the service is not configured.

/// Default model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default API base URL used when `GEMINI_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Connection settings for the recognition service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    /// API key sent with every request
    pub api_key: String,
    /// Model name (e.g., "gemini-2.0-flash")
    pub model: String,
    /// Base URL of the API, without trailing slash
    pub base_url: String,
}

/// Reads recognition settings from the environment.
///
/// Reads `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_BASE_URL`.
///
/// # Returns
///
/// `Some(settings)` when an API key is configured, `None` otherwise.
#[must_use]
pub fn load_recognition_settings() -> Option<RecognitionSettings> {
    settings_from_vars(
        std::env::var("GEMINI_API_KEY").ok(),
        std::env::var("GEMINI_MODEL").ok(),
        std::env::var("GEMINI_BASE_URL").ok(),
    )
}

fn settings_from_vars(
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
) -> Option<RecognitionSettings> {
    let api_key = api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())?;
    let model = model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let base_url = base_url
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    Some(RecognitionSettings {
        api_key,
        model,
        base_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_absent_without_api_key() {
        assert!(settings_from_vars(None, Some("m".to_string()), None).is_none());
        assert!(settings_from_vars(Some("  ".to_string()), None, None).is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = settings_from_vars(Some("key".to_string()), None, None);
        assert_eq!(
            settings,
            Some(RecognitionSettings {
                api_key: "key".to_string(),
                model: DEFAULT_MODEL.to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
            })
        );
    }

    #[test]
    fn test_settings_trims_base_url() {
        let settings = settings_from_vars(
            Some("key".to_string()),
            Some("custom".to_string()),
            Some("http://localhost:8080/".to_string()),
        );
        let settings = settings.as_ref();
        assert_eq!(settings.map(|s| s.base_url.as_str()), Some("http://localhost:8080"));
        assert_eq!(settings.map(|s| s.model.as_str()), Some("custom"));
    }
}
