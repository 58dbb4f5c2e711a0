// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use std::fmt;
use std::io;
use std::ops::Range;
use termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct Diag {
    pub inner: Diagnostic<()>,
}

impl From<Diagnostic<()>> for Diag {
    fn from(d: Diagnostic<()>) -> Self {
        Self { inner: d }
    }
}

impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner.message)
    }
}

/// A malformed statement in a policy source file
#[derive(Error, Clone, Debug)]
#[error("{diagnostic}")]
pub struct ParseError {
    pub diagnostic: Diag,
    pub file: SimpleFile<String, String>,
}

impl ParseError {
    pub fn new(
        msg: &str,
        file: &SimpleFile<String, String>,
        range: Range<usize>,
        help: &str,
    ) -> Self {
        let diagnostic = Diagnostic::error()
            .with_message(msg)
            .with_labels(vec![Label::primary((), range).with_message(help)]);
        ParseError {
            diagnostic: diagnostic.into(),
            file: file.clone(),
        }
    }

    pub fn print_diagnostic(&self, color: ColorChoice) {
        let writer = StandardStream::stderr(color);
        let config = term::Config::default();
        // Ignores print errors.
        let _ = term::emit(
            &mut writer.lock(),
            &config,
            &self.file,
            &self.diagnostic.inner,
        );
    }
}

#[derive(Error, Debug)]
pub enum LoadErrorItem {
    #[error("Parsing error: {0}")]
    Parse(#[from] ParseError),
    #[error("I/O error: {0}")]
    IO(#[from] io::Error),
}

/// Accumulated failures from loading a policy
///
/// Parsing continues past the first malformed statement so that a single run
/// reports everything wrong with the file.
#[derive(Error, Debug)]
pub struct LoadErrors {
    errors: Vec<LoadErrorItem>,
}

impl LoadErrors {
    pub fn new() -> Self {
        LoadErrors { errors: Vec::new() }
    }

    pub fn add_error<T>(&mut self, error: T)
    where
        T: Into<LoadErrorItem>,
    {
        self.errors.push(error.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn append(&mut self, mut other: LoadErrors) {
        self.errors.append(&mut other.errors);
    }

    pub fn into_result<T>(self, ok: T) -> Result<T, LoadErrors> {
        if self.is_empty() {
            Ok(ok)
        } else {
            Err(self)
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

impl From<LoadErrorItem> for LoadErrors {
    fn from(error: LoadErrorItem) -> Self {
        LoadErrors {
            errors: vec![error],
        }
    }
}

impl From<ParseError> for LoadErrors {
    fn from(error: ParseError) -> Self {
        LoadErrors::from(LoadErrorItem::from(error))
    }
}

impl From<io::Error> for LoadErrors {
    fn from(error: io::Error) -> Self {
        LoadErrors::from(LoadErrorItem::from(error))
    }
}

impl IntoIterator for LoadErrors {
    type Item = LoadErrorItem;
    type IntoIter = std::vec::IntoIter<LoadErrorItem>;
    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for LoadErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let num_errors = self.errors.len();
        let s = match num_errors {
            0 => return writeln!(f, "no error"),
            1 => "",
            _ => "s",
        };
        writeln!(f, "{} error{}:", num_errors, s)?;
        for e in self.errors.iter() {
            writeln!(f, "{}", e)?
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_and_fail() {
        let file = SimpleFile::new("policy.conf".to_string(), "bad statement".to_string());
        let mut errors = LoadErrors::new();
        assert!(errors.is_empty());
        errors.add_error(ParseError::new("Invalid statement", &file, 0..3, "here"));
        errors.add_error(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert_eq!(errors.error_count(), 2);
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn empty_is_ok() {
        assert_eq!(LoadErrors::new().into_result(42).unwrap(), 42);
    }
}
