//! Decides whether a scanned payload is a plausible 3D model reference.
//!
//! Rules are applied in order and the first match wins:
//!
//! 1. the payload must be an absolute URL with an allowed scheme,
//! 2. a path ending in a known model extension is accepted as-is,
//! 3. a `model` / `modelUrl` query parameter holding such a URL is accepted
//!    and replaces the outer URL,
//! 4. anything else is rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ValidationError};
use crate::format::ModelFormat;

/// Query parameters that may carry the actual model URL.
pub const MODEL_QUERY_KEYS: [&str; 2] = ["model", "modelUrl"];

static EMBEDDED_URL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"https?://\S+").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceOrigin {
    /// The payload URL itself names the asset.
    Direct,
    /// The asset URL was taken from a query parameter of the payload.
    QueryParameter,
}

/// A payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedReference {
    /// Normalized URI of the asset.
    pub uri:    String,
    pub format: ModelFormat,
    pub origin: ReferenceOrigin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorOptions {
    /// Only accept `https` references.
    pub require_https:    bool,
    /// Look for an `http(s)://` token inside free text before validating.
    pub extract_embedded: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceValidator {
    options: ValidatorOptions,
}

impl ReferenceValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Validator for deployments that only trust `https` sources.
    pub fn strict() -> Self {
        Self::new(ValidatorOptions {
            require_https: true,
            ..ValidatorOptions::default()
        })
    }

    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    pub fn validate(&self, text: &str) -> Result<ValidatedReference> {
        let candidate = if self.options.extract_embedded {
            extract_url(text)
        } else {
            text.trim()
        };

        let url = Url::parse(candidate)
            .map_err(|e| ValidationError::invalid(format!("not an absolute URL ({e})")))?;
        self.check_scheme(&url)?;

        if let Some(format) = ModelFormat::from_path(url.path()) {
            return Ok(ValidatedReference {
                uri: url.to_string(),
                format,
                origin: ReferenceOrigin::Direct,
            });
        }

        if let Some((uri, format)) = self.model_parameter(&url) {
            return Ok(ValidatedReference {
                uri,
                format,
                origin: ReferenceOrigin::QueryParameter,
            });
        }

        Err(ValidationError::invalid(
            "URL does not point to a .glb, .gltf, .obj or .fbx model",
        ))
    }

    fn scheme_allowed(&self, scheme: &str) -> bool {
        if self.options.require_https {
            scheme == "https"
        } else {
            matches!(scheme, "https" | "http" | "file")
        }
    }

    fn check_scheme(&self, url: &Url) -> Result<()> {
        if self.scheme_allowed(url.scheme()) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedUrlScheme {
                scheme: url.scheme().to_string(),
            })
        }
    }

    /// The first `model`/`modelUrl` value that is itself a direct reference.
    fn model_parameter(&self, url: &Url) -> Option<(String, ModelFormat)> {
        url.query_pairs()
            .filter(|(key, _)| MODEL_QUERY_KEYS.contains(&key.as_ref()))
            .find_map(|(_, value)| {
                let inner = Url::parse(value.trim()).ok()?;
                if !self.scheme_allowed(inner.scheme()) {
                    return None;
                }
                let format = ModelFormat::from_path(inner.path())?;
                Some((inner.to_string(), format))
            })
    }
}

/// Validate with the default (non-strict) rules.
pub fn validate(text: &str) -> Result<ValidatedReference> {
    ReferenceValidator::default().validate(text)
}

fn extract_url(text: &str) -> &str {
    let text = text.trim();
    if text.starts_with("http://") || text.starts_with("https://") {
        return text;
    }
    EMBEDDED_URL
        .as_ref()
        .and_then(|re| re.find(text))
        .map_or(text, |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_direct_extension() {
        let r = validate("https://example.com/model.glb").unwrap();
        assert_eq!(r.uri, "https://example.com/model.glb");
        assert_eq!(r.format, ModelFormat::Glb);
        assert_eq!(r.origin, ReferenceOrigin::Direct);

        let r = validate("  https://cdn.example.com/a/b/Skull.FBX?v=2  ").unwrap();
        assert_eq!(r.format, ModelFormat::Fbx);
        assert_eq!(r.uri, "https://cdn.example.com/a/b/Skull.FBX?v=2");
    }

    #[test]
    fn test_query_parameter_replaces_outer_url() {
        let r = validate(
            "https://viewer.example.com/open?modelUrl=https%3A%2F%2Fcdn.example.com%2Flarynx.gltf",
        )
        .unwrap();
        assert_eq!(r.uri, "https://cdn.example.com/larynx.gltf");
        assert_eq!(r.format, ModelFormat::Gltf);
        assert_eq!(r.origin, ReferenceOrigin::QueryParameter);

        let r = validate("https://viewer.example.com/?model=https://cdn.example.com/heart.obj")
            .unwrap();
        assert_eq!(r.uri, "https://cdn.example.com/heart.obj");
    }

    #[test]
    fn test_direct_extension_wins_over_parameter() {
        let r = validate("https://example.com/a.glb?model=https://other.example.com/b.obj").unwrap();
        assert_eq!(r.uri, "https://example.com/a.glb?model=https://other.example.com/b.obj");
        assert_eq!(r.origin, ReferenceOrigin::Direct);
    }

    #[test]
    fn test_parameter_without_model_value_is_rejected() {
        let err = validate("https://example.com/view?model=12345").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidQrFormat { .. }));
    }

    #[test]
    fn test_rejects_non_model_page() {
        let err = validate("https://example.com/page.html").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidQrFormat { .. }));
    }

    #[test]
    fn test_rejects_relative_and_garbage() {
        for text in ["", "model.glb", "/models/a.glb", "hello world", "https://"] {
            let err = validate(text).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidQrFormat { .. }),
                "{text:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        let err = validate("ftp://example.com/model.glb").unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedUrlScheme {
                scheme: "ftp".into()
            }
        );
    }

    #[test]
    fn test_strict_requires_https() {
        let strict = ReferenceValidator::strict();
        assert!(strict.validate("https://example.com/m.glb").is_ok());
        assert!(matches!(
            strict.validate("http://example.com/m.glb"),
            Err(ValidationError::UnsupportedUrlScheme { .. })
        ));
        assert!(matches!(
            strict.validate("file:///sdcard/models/m.glb"),
            Err(ValidationError::UnsupportedUrlScheme { .. })
        ));
        assert!(validate("file:///sdcard/models/m.glb").is_ok());
    }

    #[test]
    fn test_extract_embedded_url() {
        let validator = ReferenceValidator::new(ValidatorOptions {
            extract_embedded: true,
            ..ValidatorOptions::default()
        });
        let r = validator
            .validate("Scan me: https://example.com/pelvis.glb for the pelvis")
            .unwrap();
        assert_eq!(r.uri, "https://example.com/pelvis.glb");

        // off by default
        assert!(validate("Scan me: https://example.com/pelvis.glb").is_err());
    }
}
