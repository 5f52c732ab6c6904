//! Request parameter validation.
//!
//! # Design
//! - Validation is pure: no IO, no clock, only the immutable policy and the request parts.
//! - A read-style request must target `/`; any other path yields [`Validation::NoRoute`].
//! - Unknown country codes and malformed patterns are dropped silently rather than rejected.
//! - Defaults (country, extension) are applied later by the pipeline, never here.

use std::sync::Arc;

use plateserve_config::RecognitionPolicy;
use regex::Regex;
use url::{Url, form_urlencoded};

use crate::error::{PipelineError, PipelineResult};

const PARAM_IMAGE_URL: &str = "image_url";
const PARAM_COUNTRY_CODE: &str = "country_code";
const PARAM_PATTERN: &str = "pattern";
const PATTERN_SHAPE: &str = "^[A-Za-z0-9_]{2,3}$";

/// How the request delivers its image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestStyle {
    /// Image referenced by url (`GET`).
    Read,
    /// Image carried in the request body (`POST`).
    Write,
    /// Any other method; never routed.
    Other,
}

impl RequestStyle {
    /// Classify an HTTP method name.
    #[must_use]
    pub fn from_method(method: &str) -> Self {
        match method {
            "GET" => Self::Read,
            "POST" => Self::Write,
            _ => Self::Other,
        }
    }
}

/// Raw query parameters relevant to recognition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestParams {
    /// Location of a remote image.
    pub image_url: Option<String>,
    /// Requested country code.
    pub country_code: Option<String>,
    /// Requested plate pattern.
    pub pattern: Option<String>,
}

impl RequestParams {
    /// Decode a form-urlencoded query string. The first occurrence of a key wins and
    /// unrelated keys are ignored.
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                PARAM_IMAGE_URL => &mut params.image_url,
                PARAM_COUNTRY_CODE => &mut params.country_code,
                PARAM_PATTERN => &mut params.pattern,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Where the image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote resource fetched over HTTP(S).
    Remote {
        /// Location as supplied by the caller.
        url: String,
    },
    /// Bytes of the request body.
    Upload,
}

/// Validated, immutable view of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    source: ImageSource,
    file_extension: Option<String>,
    country_code: Option<String>,
    pattern: Option<String>,
}

impl RequestDescriptor {
    /// Image source.
    #[must_use]
    pub const fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Lower-cased extension derived from the remote location, when present.
    #[must_use]
    pub fn file_extension(&self) -> Option<&str> {
        self.file_extension.as_deref()
    }

    /// Country code that passed the allow-list.
    #[must_use]
    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    /// Pattern that passed the shape check.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}

/// Outcome of routing plus validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    /// The request targets the recognition endpoint and its parameters are usable.
    Matched(RequestDescriptor),
    /// Nothing is served at this method and path.
    NoRoute,
}

/// Validates requests against the shared recognition policy.
#[derive(Clone, Debug)]
pub struct RequestValidator {
    policy: Arc<RecognitionPolicy>,
    pattern_shape: Regex,
}

impl RequestValidator {
    /// Build a validator over `policy`.
    ///
    /// # Errors
    ///
    /// Returns an error when the pattern matcher cannot be compiled.
    pub fn new(policy: Arc<RecognitionPolicy>) -> PipelineResult<Self> {
        let pattern_shape =
            Regex::new(PATTERN_SHAPE).map_err(|source| PipelineError::ValidatorSetup {
                pattern: PATTERN_SHAPE,
                source,
            })?;
        Ok(Self {
            policy,
            pattern_shape,
        })
    }

    /// Policy the validator checks against.
    #[must_use]
    pub fn policy(&self) -> &RecognitionPolicy {
        &self.policy
    }

    /// Route and validate one request.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingParameter`] when a read-style request carries no
    /// image location and [`PipelineError::UnsupportedType`] when that location names an
    /// unsupported image type.
    pub fn validate(
        &self,
        style: RequestStyle,
        path: &str,
        params: &RequestParams,
    ) -> PipelineResult<Validation> {
        let (source, file_extension) = match style {
            RequestStyle::Other => return Ok(Validation::NoRoute),
            RequestStyle::Read if path != "/" => return Ok(Validation::NoRoute),
            RequestStyle::Read => {
                let url = params
                    .image_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .ok_or(PipelineError::MissingParameter {
                        name: PARAM_IMAGE_URL,
                    })?;
                let extension = extension_of(url);
                if let Some(extension) = &extension
                    && !self.policy.supports_type(extension)
                {
                    return Err(PipelineError::UnsupportedType {
                        extension: extension.clone(),
                    });
                }
                (
                    ImageSource::Remote {
                        url: url.to_string(),
                    },
                    extension,
                )
            }
            RequestStyle::Write => (ImageSource::Upload, None),
        };

        let country_code = params
            .country_code
            .as_deref()
            .filter(|code| self.policy.accepts_country(code))
            .map(str::to_string);
        let pattern = params
            .pattern
            .as_deref()
            .filter(|pattern| self.pattern_shape.is_match(pattern))
            .map(str::to_string);

        Ok(Validation::Matched(RequestDescriptor {
            source,
            file_extension,
            country_code,
            pattern,
        }))
    }
}

/// Lower-cased extension of the last path segment, ignoring query and fragment.
///
/// Returns `None` when the segment has no extension or the extension contains anything
/// other than ASCII word characters.
fn extension_of(location: &str) -> Option<String> {
    let path = Url::parse(location).map_or_else(
        |_| {
            location
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string()
        },
        |url| url.path().to_string(),
    );
    let segment = path.rsplit('/').next().unwrap_or_default();
    let (_, extension) = segment.rsplit_once('.')?;
    let is_word = !extension.is_empty()
        && extension
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    is_word.then(|| extension.to_ascii_lowercase())
}
