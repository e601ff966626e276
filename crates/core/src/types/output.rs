//! Output shape of a synthesis backend.

use serde::{Deserialize, Serialize};

/// Result of an image-generation call.
///
/// Backends return either a single URL or an ordered list of URLs. A `null`
/// output is represented as `Option::<SynthesisOutput>::None` by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SynthesisOutput {
    /// A single image URL.
    Single(String),
    /// An ordered list of image URLs; the first one is the primary result.
    Many(Vec<String>),
}

impl SynthesisOutput {
    /// The primary result URL.
    ///
    /// Takes the first element of a list, otherwise the scalar itself.
    /// Returns `None` for an empty list or a blank URL.
    #[must_use]
    pub fn first_url(&self) -> Option<&str> {
        let url = match self {
            Self::Single(url) => Some(url.as_str()),
            Self::Many(urls) => urls.first().map(String::as_str),
        };
        url.filter(|u| !u.trim().is_empty())
    }
}

impl From<String> for SynthesisOutput {
    fn from(url: String) -> Self {
        Self::Single(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_of_list() {
        let output = SynthesisOutput::Many(vec![
            "https://cdn.example.com/a.png".to_string(),
            "https://cdn.example.com/b.png".to_string(),
        ]);
        assert_eq!(output.first_url(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_scalar() {
        let output = SynthesisOutput::Single("https://cdn.example.com/a.png".to_string());
        assert_eq!(output.first_url(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_empty_list_and_blank_url() {
        assert_eq!(SynthesisOutput::Many(Vec::new()).first_url(), None);
        assert_eq!(SynthesisOutput::Single("  ".to_string()).first_url(), None);
    }

    #[test]
    fn test_deserialize_shapes() {
        let single: Option<SynthesisOutput> =
            serde_json::from_str("\"https://x.test/out.png\"").unwrap();
        assert_eq!(single.unwrap().first_url(), Some("https://x.test/out.png"));

        let many: Option<SynthesisOutput> =
            serde_json::from_str("[\"https://x.test/1.png\",\"https://x.test/2.png\"]").unwrap();
        assert_eq!(many.unwrap().first_url(), Some("https://x.test/1.png"));

        let null: Option<SynthesisOutput> = serde_json::from_str("null").unwrap();
        assert!(null.is_none());
    }
}
