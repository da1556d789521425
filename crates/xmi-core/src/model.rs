//! Request-scoped types flowing through the conversion pipeline.
//!
//! [`ConversionRequest`] is the raw intake decoded from the HTTP form;
//! [`RequestOptions::from_request`] is the validation gate that turns it into a
//! typed plan before any side effect happens.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConversionError, ConversionResult};

const MISSING_INPUT: &str = "Provide irJson, or language=java with inputZip/repoUrl";
const MISSING_SOURCE: &str = "Provide inputZip or repoUrl";
const INVALID_RESULT_FORMAT: &str = "resultFormat must be 'xmi' or 'ir'";

/// Kind of input handed to the extraction tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Java source tree (archive or clone).
    Source,
    /// Pre-computed IR document.
    Ir,
}

impl InputMode {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Ir => "ir",
        }
    }
}

impl Display for InputMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifact format returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// XMI document (default).
    #[default]
    Xmi,
    /// IR JSON snapshot.
    Ir,
}

impl OutputFormat {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xmi => "xmi",
            Self::Ir => "ir",
        }
    }

    /// Parse the optional `resultFormat` field; absent or blank selects XMI.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::BadRequest`] for any other literal.
    pub fn from_field(value: Option<&str>) -> ConversionResult<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::Xmi),
            Some(other) => other.parse(),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "xmi" => Ok(Self::Xmi),
            "ir" => Ok(Self::Ir),
            _ => Err(ConversionError::bad_request(INVALID_RESULT_FORMAT)),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source languages the extraction tool understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    /// Java source.
    Java,
}

impl FromStr for SourceLanguage {
    type Err = ConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("java") {
            Ok(Self::Java)
        } else {
            Err(ConversionError::bad_request(MISSING_INPUT))
        }
    }
}

/// Where the source tree for a source-mode conversion comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Remote repository cloned with history depth 1.
    RepositoryUrl(String),
    /// Uploaded zip archive bytes.
    Archive(Vec<u8>),
}

impl SourceOrigin {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RepositoryUrl(_) => "repository-url",
            Self::Archive(_) => "archive",
        }
    }
}

impl fmt::Debug for SourceOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::RepositoryUrl(url) => f.debug_tuple("RepositoryUrl").field(url).finish(),
            Self::Archive(bytes) => write!(f, "Archive({} bytes)", bytes.len()),
        }
    }
}

/// Validated input for one conversion.
#[derive(Clone, PartialEq, Eq)]
pub enum ConversionInput {
    /// IR payload written verbatim into the workspace.
    Ir {
        /// Raw IR document bytes.
        payload: Vec<u8>,
    },
    /// Source tree to extract a model from.
    Source {
        /// Declared source language.
        language: SourceLanguage,
        /// Archive or repository origin.
        origin: SourceOrigin,
    },
}

impl ConversionInput {
    /// Input mode implied by this input.
    #[must_use]
    pub const fn mode(&self) -> InputMode {
        match self {
            Self::Ir { .. } => InputMode::Ir,
            Self::Source { .. } => InputMode::Source,
        }
    }
}

impl fmt::Debug for ConversionInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ir { payload } => write!(f, "Ir({} bytes)", payload.len()),
            Self::Source { language, origin } => f
                .debug_struct("Source")
                .field("language", language)
                .field("origin", origin)
                .finish(),
        }
    }
}

/// Pass-through extraction flags forwarded to the tool.
///
/// Values are forwarded as-is; blank values are treated as absent when the
/// command is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Model name (`--name`).
    pub name: Option<String>,
    /// Association policy (`--associations`).
    pub associations: Option<String>,
    /// Dependency policy (`--deps`).
    pub deps: Option<String>,
    /// Nested type handling (`--nested-types`).
    pub nested_types: Option<String>,
    /// Accessor inclusion (`--include-accessors`).
    pub include_accessors: Option<String>,
    /// Constructor inclusion (`--include-constructors`).
    pub include_constructors: Option<String>,
    /// Unresolved-reference failure policy (`--fail-on-unresolved`).
    pub fail_on_unresolved: Option<String>,
    /// Stereotype suppression; only `true` (any case) emits `--no-stereotypes`.
    pub no_stereotypes: Option<String>,
    /// Exclusion patterns, one `--exclude` pair each, in order.
    pub exclude: Vec<String>,
}

/// Raw conversion request as decoded from the multipart form.
#[derive(Debug, Clone, Default)]
pub struct ConversionRequest {
    /// `inputZip` file bytes.
    pub input_zip: Option<Vec<u8>>,
    /// `irFile` file bytes.
    pub ir_file: Option<Vec<u8>>,
    /// `irJson` text field.
    pub ir_json: Option<String>,
    /// `language` text field.
    pub language: Option<String>,
    /// `resultFormat` text field.
    pub result_format: Option<String>,
    /// `repoUrl` text field.
    pub repo_url: Option<String>,
    /// Pass-through extraction flags.
    pub extraction: ExtractionOptions,
}

/// Validated options fully describing one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Input payload and its mode.
    pub input: ConversionInput,
    /// Requested artifact format.
    pub output: OutputFormat,
    /// Pass-through extraction flags.
    pub extraction: ExtractionOptions,
}

impl RequestOptions {
    /// Validate a raw request.
    ///
    /// Checks run in a fixed order: result format, IR payload (file before text
    /// field), declared language, then repository URL before archive.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::BadRequest`] when the request is unusable.
    pub fn from_request(request: ConversionRequest) -> ConversionResult<Self> {
        let ConversionRequest {
            input_zip,
            ir_file,
            ir_json,
            language,
            result_format,
            repo_url,
            extraction,
        } = request;

        let output = OutputFormat::from_field(result_format.as_deref())?;

        let ir_payload = ir_file.filter(|bytes| !bytes.is_empty()).or_else(|| {
            ir_json
                .filter(|text| !text.trim().is_empty())
                .map(String::into_bytes)
        });
        if let Some(payload) = ir_payload {
            return Ok(Self {
                input: ConversionInput::Ir { payload },
                output,
                extraction,
            });
        }

        let language = language
            .as_deref()
            .ok_or_else(|| ConversionError::bad_request(MISSING_INPUT))?
            .parse::<SourceLanguage>()?;

        let origin = if let Some(url) = repo_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
        {
            SourceOrigin::RepositoryUrl(url)
        } else if let Some(archive) = input_zip.filter(|bytes| !bytes.is_empty()) {
            SourceOrigin::Archive(archive)
        } else {
            return Err(ConversionError::bad_request(MISSING_SOURCE));
        };

        Ok(Self {
            input: ConversionInput::Source { language, origin },
            output,
            extraction,
        })
    }

    /// Input mode of this request.
    #[must_use]
    pub const fn input_mode(&self) -> InputMode {
        self.input.mode()
    }
}

/// Captured outcome of one external process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code; `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall-clock time between spawn and exit.
    pub elapsed: Duration,
}

/// Document produced for the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Format of `body`.
    pub format: OutputFormat,
    /// Document bytes, exactly as read from the workspace.
    pub body: Vec<u8>,
}

impl Artifact {
    /// File name used when the artifact is served as an attachment.
    pub const IR_ATTACHMENT_NAME: &'static str = "model.ir.json";

    /// MIME type of the artifact body.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self.format {
            OutputFormat::Xmi => "application/xml",
            OutputFormat::Ir => "application/json",
        }
    }

    /// Attachment file name; `None` means the body is served inline.
    #[must_use]
    pub const fn attachment_name(&self) -> Option<&'static str> {
        match self.format {
            OutputFormat::Xmi => None,
            OutputFormat::Ir => Some(Self::IR_ATTACHMENT_NAME),
        }
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("format", &self.format)
            .field("bytes", &self.body.len())
            .finish()
    }
}
