//! Text formats for stored encodings and line-ending normalization.

use crate::error::FormatError;
use clap::ValueEnum;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;

/// Text format of a stored encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// JSON (default)
    #[default]
    Json,
    /// YAML
    #[value(alias = "yml")]
    Yaml,
}

impl Format {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Infer the format from a file extension. Unknown extensions are JSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_str)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    /// Serialize a value to text with `\n` line endings and a trailing newline.
    pub(crate) fn encode<T>(&self, value: &T, pretty: bool) -> Result<String, FormatError>
    where
        T: Serialize + ?Sized,
    {
        let mut text = match self {
            Format::Json if pretty => serde_json::to_string_pretty(value)?,
            Format::Json => serde_json::to_string(value)?,
            // YAML is block-formatted either way
            Format::Yaml => serde_yaml::to_string(value)?,
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    /// Deserialize normalized text.
    pub(crate) fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, FormatError> {
        let text = normalize_text(text);
        match self {
            Format::Json => Ok(serde_json::from_str(&text)?),
            Format::Yaml => Ok(serde_yaml::from_str(&text)?),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize stored text so encodings from any platform decode identically.
///
/// - Strips a leading UTF-8 byte-order mark
/// - Converts `\r\n` and lone `\r` to `\n`
///
/// Borrows when the input needs no changes.
pub fn normalize_text(text: &str) -> Cow<'_, str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        version: String,
        note: String,
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Format::from_str("JSON"), Some(Format::Json));
        assert_eq!(Format::from_str("yml"), Some(Format::Yaml));
        assert_eq!(Format::from_str("toml"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Format::from_path(Path::new("a/config.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("config.YML")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new(".state-x.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("config")), Format::Json);
    }

    #[test]
    fn test_normalize_borrows_clean_text() {
        assert!(matches!(normalize_text("{\n}\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_text("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(normalize_text("\u{feff}{}\r\n"), "{}\n");
    }

    #[test]
    fn test_encode_uses_lf_and_trailing_newline() {
        let sample = Sample {
            version: "1".to_string(),
            note: "x".to_string(),
        };
        for format in [Format::Json, Format::Yaml] {
            let text = format.encode(&sample, true).unwrap();
            assert!(text.ends_with('\n'));
            assert!(!text.contains('\r'));
        }
        let compact = Format::Json.encode(&sample, false).unwrap();
        assert_eq!(compact, "{\"version\":\"1\",\"note\":\"x\"}\n");
    }

    #[test]
    fn test_yaml_crlf_decodes_like_lf() {
        let lf = "version: '1'\nnote: |\n  line one\n  line two\n";
        let crlf = lf.replace('\n', "\r\n");
        let a: Sample = Format::Yaml.decode(lf).unwrap();
        let b: Sample = Format::Yaml.decode(&crlf).unwrap();
        assert_eq!(a, b);
        assert_eq!(b.note, "line one\nline two\n");
    }
}
