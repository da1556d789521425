//! Translation of validated request options into a tool invocation.
//!
//! Everything here is pure: the same tool, options and layout always produce
//! the same argument vector.

use std::ffi::{OsStr, OsString};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use crate::model::{ConversionInput, ExtractionOptions, OutputFormat, RequestOptions};

/// Resolved extraction tool: a launcher and the jar it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Launcher program, usually `java`.
    pub launcher: PathBuf,
    /// Path of the resolved CLI jar.
    pub jar: PathBuf,
}

/// Workspace paths the tool reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    /// Working directory for the tool process.
    pub root: PathBuf,
    /// IR payload supplied by the caller (`--ir`).
    pub ir_input: PathBuf,
    /// Extracted or cloned source tree (`--source`).
    pub source_dir: PathBuf,
    /// XMI output (`--output`).
    pub xmi_output: PathBuf,
    /// IR snapshot output (`--write-ir`).
    pub ir_output: PathBuf,
}

/// Fully determined process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Program to execute.
    pub program: PathBuf,
    /// Ordered arguments.
    pub args: Vec<OsString>,
    /// Working directory, inherited when `None`.
    pub current_dir: Option<PathBuf>,
}

impl CommandInvocation {
    /// Start an invocation of `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, value: impl AsRef<OsStr>) -> Self {
        self.args.push(value.as_ref().to_os_string());
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program name suitable for messages.
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Arguments rendered lossily as UTF-8.
    #[must_use]
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn push(&mut self, value: impl AsRef<OsStr>) {
        self.args.push(value.as_ref().to_os_string());
    }

    fn push_opt(&mut self, flag: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            self.push(flag);
            self.push(value);
        }
    }
}

impl Display for CommandInvocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Build the tool invocation for one request.
///
/// Pass-through flags come first, then exclusions, then the mode block:
/// `--ir <ir> --output <xmi>` for IR input, or
/// `--source <dir> --output <xmi> [--write-ir <ir>]` for source input.
#[must_use]
pub fn build_command(
    tool: &ToolCommand,
    options: &RequestOptions,
    layout: &ArtifactLayout,
) -> CommandInvocation {
    let mut invocation = CommandInvocation::new(&tool.launcher)
        .arg("-jar")
        .arg(&tool.jar)
        .current_dir(&layout.root);

    push_extraction_flags(&mut invocation, &options.extraction);

    match &options.input {
        ConversionInput::Ir { .. } => {
            invocation.push("--ir");
            invocation.push(&layout.ir_input);
            push_output(&mut invocation, &layout.xmi_output);
        }
        ConversionInput::Source { .. } => {
            invocation.push("--source");
            invocation.push(&layout.source_dir);
            push_output(&mut invocation, &layout.xmi_output);
            if options.output == OutputFormat::Ir {
                invocation.push("--write-ir");
                invocation.push(&layout.ir_output);
            }
        }
    }

    invocation
}

fn push_extraction_flags(invocation: &mut CommandInvocation, extraction: &ExtractionOptions) {
    invocation.push_opt("--name", extraction.name.as_deref());
    invocation.push_opt("--associations", extraction.associations.as_deref());
    invocation.push_opt("--deps", extraction.deps.as_deref());
    invocation.push_opt("--nested-types", extraction.nested_types.as_deref());
    invocation.push_opt(
        "--include-accessors",
        extraction.include_accessors.as_deref(),
    );
    invocation.push_opt(
        "--include-constructors",
        extraction.include_constructors.as_deref(),
    );
    invocation.push_opt(
        "--fail-on-unresolved",
        extraction.fail_on_unresolved.as_deref(),
    );
    if extraction
        .no_stereotypes
        .as_deref()
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    {
        invocation.push("--no-stereotypes");
    }
    for pattern in &extraction.exclude {
        invocation.push("--exclude");
        invocation.push(pattern);
    }
}

fn push_output(invocation: &mut CommandInvocation, xmi_output: &Path) {
    invocation.push("--output");
    invocation.push(xmi_output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceLanguage, SourceOrigin};

    fn tool() -> ToolCommand {
        ToolCommand {
            launcher: PathBuf::from("java"),
            jar: PathBuf::from("/deps/java-to-xmi/target/java-to-xmi.jar"),
        }
    }

    fn layout() -> ArtifactLayout {
        let root = PathBuf::from("/tmp/xmi-abc");
        ArtifactLayout {
            ir_input: root.join("model.ir.json"),
            source_dir: root.join("source"),
            xmi_output: root.join("out/model.xmi"),
            ir_output: root.join("out/model.ir.json"),
            root,
        }
    }

    fn source_options(output: OutputFormat) -> RequestOptions {
        RequestOptions {
            input: ConversionInput::Source {
                language: SourceLanguage::Java,
                origin: SourceOrigin::Archive(b"PK".to_vec()),
            },
            output,
            extraction: ExtractionOptions::default(),
        }
    }

    fn ir_options(output: OutputFormat) -> RequestOptions {
        RequestOptions {
            input: ConversionInput::Ir {
                payload: b"{}".to_vec(),
            },
            output,
            extraction: ExtractionOptions::default(),
        }
    }

    #[test]
    fn ir_mode_emits_ir_and_output_only() {
        let invocation = build_command(&tool(), &ir_options(OutputFormat::Xmi), &layout());
        assert_eq!(invocation.program, PathBuf::from("java"));
        assert_eq!(
            invocation.args_lossy(),
            vec![
                "-jar",
                "/deps/java-to-xmi/target/java-to-xmi.jar",
                "--ir",
                "/tmp/xmi-abc/model.ir.json",
                "--output",
                "/tmp/xmi-abc/out/model.xmi",
            ]
        );
        assert_eq!(invocation.current_dir, Some(PathBuf::from("/tmp/xmi-abc")));

        let ir_out = build_command(&tool(), &ir_options(OutputFormat::Ir), &layout());
        assert!(!ir_out.args_lossy().contains(&"--write-ir".to_string()));
    }

    #[test]
    fn source_mode_adds_write_ir_only_when_ir_requested() {
        let xmi = build_command(&tool(), &source_options(OutputFormat::Xmi), &layout());
        assert_eq!(
            xmi.args_lossy()[2..],
            [
                "--source",
                "/tmp/xmi-abc/source",
                "--output",
                "/tmp/xmi-abc/out/model.xmi",
            ]
        );

        let ir = build_command(&tool(), &source_options(OutputFormat::Ir), &layout());
        assert_eq!(
            ir.args_lossy()[2..],
            [
                "--source",
                "/tmp/xmi-abc/source",
                "--output",
                "/tmp/xmi-abc/out/model.xmi",
                "--write-ir",
                "/tmp/xmi-abc/out/model.ir.json",
            ]
        );
    }

    #[test]
    fn scalar_flags_are_emitted_in_fixed_order_and_blank_values_skipped() {
        let mut options = source_options(OutputFormat::Xmi);
        options.extraction = ExtractionOptions {
            name: Some("Shop".to_string()),
            associations: Some("jpa".to_string()),
            deps: Some(String::new()),
            nested_types: Some("uml".to_string()),
            include_accessors: None,
            include_constructors: Some("false".to_string()),
            fail_on_unresolved: Some("true".to_string()),
            no_stereotypes: None,
            exclude: Vec::new(),
        };
        let args = build_command(&tool(), &options, &layout()).args_lossy();
        assert_eq!(
            args[2..12],
            [
                "--name",
                "Shop",
                "--associations",
                "jpa",
                "--nested-types",
                "uml",
                "--include-constructors",
                "false",
                "--fail-on-unresolved",
                "true",
            ]
        );
        assert!(!args.contains(&"--deps".to_string()));
        assert!(!args.contains(&"--include-accessors".to_string()));
    }

    #[test]
    fn no_stereotypes_is_a_bare_flag_for_true_in_any_case() {
        for (value, expected) in [
            (Some("TRUE"), true),
            (Some("true"), true),
            (Some("yes"), false),
            (Some("false"), false),
            (None, false),
        ] {
            let mut options = ir_options(OutputFormat::Xmi);
            options.extraction.no_stereotypes = value.map(str::to_string);
            let args = build_command(&tool(), &options, &layout()).args_lossy();
            assert_eq!(
                args.contains(&"--no-stereotypes".to_string()),
                expected,
                "value {value:?}"
            );
            if expected {
                assert_eq!(args[2], "--no-stereotypes");
                assert_eq!(args[3], "--ir");
            }
        }
    }

    #[test]
    fn excludes_repeat_in_input_order_before_mode_block() {
        let mut options = source_options(OutputFormat::Xmi);
        options.extraction.exclude = vec!["a/**".to_string(), "b/**".to_string()];
        let args = build_command(&tool(), &options, &layout()).args_lossy();
        assert_eq!(
            args[2..7],
            ["--exclude", "a/**", "--exclude", "b/**", "--source"]
        );
    }

    #[test]
    fn display_renders_full_command_line() {
        let invocation = CommandInvocation::new("git")
            .arg("clone")
            .arg("--depth")
            .arg("1");
        assert_eq!(invocation.to_string(), "git clone --depth 1");
        assert_eq!(invocation.program_name(), "git");
        assert_eq!(invocation.current_dir, None);
    }
}
