use std::{error::Error, fmt};

use miette::Diagnostic;
use prost_reflect::DescriptorError;

use super::source_tree::SourceTree;

/// An error that may occur while importing a `.proto` file into a [`Registry`][super::Registry].
///
/// Only the error encountered by a single import attempt is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportError {
    file: String,
    line: Option<usize>,
    message: String,
}

impl ImportError {
    pub(super) fn from_protox(requested: &str, err: &protox::Error, sources: &SourceTree) -> Self {
        let message = err.to_string();
        let location = err
            .labels()
            .and_then(|mut labels| labels.next())
            .map(|label| *label.inner());

        let (file, line) = match (location, err.source_code()) {
            (Some(span), Some(source)) => match source.read_span(&span, 0, 0) {
                Ok(contents) => (
                    contents.name().map(ToOwned::to_owned),
                    Some(contents.line() + 1),
                ),
                Err(_) => (None, None),
            },
            (Some(span), None) => (
                None,
                sources
                    .read_source(requested)
                    .map(|source| line_of_offset(&source, span.offset())),
            ),
            (None, _) => (None, None),
        };

        ImportError {
            file: file.unwrap_or_else(|| requested.to_owned()),
            line,
            message,
        }
    }

    pub(super) const DESCRIPTOR_SET_FILE: &'static str = "<file descriptor set>";

    pub(super) fn from_decode(err: prost::DecodeError) -> Self {
        ImportError {
            file: Self::DESCRIPTOR_SET_FILE.to_owned(),
            line: None,
            message: err.to_string(),
        }
    }

    pub(super) fn not_found(requested: &str) -> Self {
        ImportError {
            file: requested.to_owned(),
            line: None,
            message: "file not found".to_owned(),
        }
    }

    pub(super) fn from_descriptor(requested: &str, err: &DescriptorError) -> Self {
        ImportError {
            file: err.file().unwrap_or(requested).to_owned(),
            line: err.line(),
            message: err.to_string(),
        }
    }

    /// The file in which the error occurred.
    ///
    /// This is the requested file unless the error is located in one of its imports.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The 1-based line number at which the error occurred, if known.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// A description of the error, without location information.
    pub fn message(&self) -> &str {
        &self.message
    }
}

fn line_of_offset(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.file, line, self.message),
            None => write!(f, "{}: {}", self.file, self.message),
        }
    }
}

impl Error for ImportError {}
