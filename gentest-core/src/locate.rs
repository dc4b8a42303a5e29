//! Target function location
//!
//! A run targets exactly one top-level function or method. It is picked
//! either by a byte offset into the primary file or by a marker: the full
//! doc comment text of one declaration somewhere in the package.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GentestError, Result};
use crate::language::{FunctionDecl, GoPackage, GoSource};

/// How the target is identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Byte offset into the primary file
    Offset(usize),
    /// Doc comment text of the target declaration
    Comment(String),
}

/// Which span of a declaration an offset must fall into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The declared name
    #[default]
    Name,
    /// The body, braces included
    Body,
}

/// A resolved location: an offset within one file of the package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub file_index: usize,
    pub offset: usize,
}

/// Turn a marker into the offset of the one declaration documented by it.
pub fn resolve_marker(package: &GoPackage, marker: &str, mode: MatchMode) -> Result<Target> {
    let wanted = format!("{}\n", marker.trim_end_matches(['\n', '\r']));

    let mut matches = Vec::new();
    for (file_index, file) in package.files().iter().enumerate() {
        for decl in file.functions(file_index) {
            if decl.doc.as_deref() != Some(wanted.as_str()) {
                continue;
            }
            let offset = match (mode, decl.body_span) {
                (MatchMode::Body, Some(body)) => body.start,
                _ => decl.name_span.start,
            };
            matches.push(Target { file_index, offset });
        }
    }

    match matches.as_slice() {
        [] => Err(GentestError::CommentNotFound {
            comment: marker.to_string(),
        }),
        [target] => {
            debug!(marker, file = target.file_index, offset = target.offset, "resolved marker");
            Ok(*target)
        }
        many => Err(GentestError::AmbiguousComment {
            comment: marker.to_string(),
            count: many.len(),
        }),
    }
}

/// Find the declaration of `file` whose name (or body) span contains `offset`.
///
/// Both span ends are inclusive.
pub fn find_target<'f>(
    file: &'f GoSource,
    file_index: usize,
    offset: usize,
    mode: MatchMode,
) -> Result<FunctionDecl<'f>> {
    file.functions(file_index)
        .into_iter()
        .find(|decl| match mode {
            MatchMode::Name => decl.name_span.contains_offset(offset),
            MatchMode::Body => decl.body_span.is_some_and(|body| body.contains_offset(offset)),
        })
        .ok_or(GentestError::NotFound { offset })
}

/// Resolve `locator` to exactly one declaration of `package`.
pub fn locate<'p>(package: &'p GoPackage, locator: &Locator, mode: MatchMode) -> Result<FunctionDecl<'p>> {
    let target = match locator {
        Locator::Offset(offset) => Target {
            file_index: 0,
            offset: *offset,
        },
        Locator::Comment(marker) => resolve_marker(package, marker, mode)?,
    };
    let file = package.file(target.file_index).ok_or(GentestError::NotFound {
        offset: target.offset,
    })?;
    let decl = find_target(file, target.file_index, target.offset, mode)?;
    debug!(
        function = %decl.name,
        file = %file.path(),
        line = decl.span.line,
        "located target function"
    );
    Ok(decl)
}
