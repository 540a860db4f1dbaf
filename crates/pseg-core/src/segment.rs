//! Request and response shapes of the `/segment` endpoint.

use serde::{Deserialize, Serialize};

/// Body of `POST /segment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRequest {
    /// Language code understood by pragmatic_segmenter (e.g. `"en"`).
    pub lang: String,
    /// Texts to split into sentences. The response array preserves this
    /// order, one entry per input text.
    pub texts: Vec<String>,
    /// Also split on whitespace runs (the server's "white segmenter").
    pub use_white_segmenter: bool,
}

impl SegmentRequest {
    /// Builds a request with the white segmenter enabled, the mode the
    /// server is normally driven in.
    pub fn new(lang: impl Into<String>, texts: Vec<String>) -> Self {
        Self {
            lang: lang.into(),
            texts,
            use_white_segmenter: true,
        }
    }

    #[must_use]
    pub const fn with_white_segmenter(mut self, enabled: bool) -> Self {
        self.use_white_segmenter = enabled;
        self
    }
}

/// One element of the response array: the segmentation of the input text at
/// the same index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segmentation {
    /// Extracted sentences, in order of appearance.
    pub segments: Vec<String>,
    /// Segmentation mask over the original text, as produced by the server.
    pub mask: String,
}

/// URL of the segment endpoint on the given server.
pub fn segment_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}/segment")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_server_field_names() {
        let request = SegmentRequest::new("en", vec!["Hello.".to_string()]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["lang"], "en");
        assert_eq!(json["texts"][0], "Hello.");
        assert_eq!(json["use_white_segmenter"], true);
    }

    #[test]
    fn white_segmenter_defaults_on_and_can_be_disabled() {
        let request = SegmentRequest::new("en", vec![]);
        assert!(request.use_white_segmenter);

        let request = request.with_white_segmenter(false);
        assert!(!request.use_white_segmenter);
    }

    #[test]
    fn response_parses_from_server_body() {
        let body = r#"[{"segments": ["Hello.", "My name is John."], "mask": "0000001111111111111111"}]"#;
        let parsed: Vec<Segmentation> = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].segments.len(), 2);
        assert_eq!(parsed[0].segments[0], "Hello.");
        assert!(!parsed[0].mask.is_empty());
    }

    #[test]
    fn segment_url_targets_the_segment_route() {
        assert_eq!(segment_url("127.0.0.1", 5000), "http://127.0.0.1:5000/segment");
        assert_eq!(segment_url("0.0.0.0", 9292), "http://0.0.0.0:9292/segment");
    }
}
