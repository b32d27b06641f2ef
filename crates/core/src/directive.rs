// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Line-level rewriting of ntp configuration files.
//!
//! A *directive line* is a line whose trimmed text starts with one of a fixed
//! list of keywords (`server`, `tos`, `pool`). Everything else (comments,
//! `restrict` rules, blank lines) is passed through untouched.

use std::io::{self, BufRead};

#[cfg(test)]
#[path = "directive_tests.rs"]
mod tests;

/// Directive matcher and rewriter for one keyword list and provenance tag.
///
/// Lines are handled as raw bytes so files with non-UTF-8 comments pass
/// through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Directives<'a> {
    keywords: &'a [String],
    tag: &'a str,
}

impl<'a> Directives<'a> {
    pub fn new(keywords: &'a [String], tag: &'a str) -> Self {
        Directives { keywords, tag }
    }

    /// The first keyword the trimmed line starts with, if any.
    pub fn keyword_of(&self, line: &[u8]) -> Option<&'a str> {
        let trimmed = line.trim_ascii();
        self.keywords.iter().map(String::as_str).find(|k| trimmed.starts_with(k.as_bytes()))
    }

    pub fn is_directive(&self, line: &[u8]) -> bool {
        self.keyword_of(line).is_some()
    }

    /// Comments out every directive line and tags it.
    ///
    /// Directive lines become `#<trimmed line> <tag>`; other lines are kept
    /// verbatim. Every output line ends with `\n`.
    pub fn disable<R: BufRead>(&self, reader: R) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        for line in lines(reader) {
            let line = line?;
            if self.is_directive(&line) {
                out.push(b'#');
                out.extend_from_slice(&self.tagged(&line));
            } else {
                out.extend_from_slice(&line);
            }
            out.push(b'\n');
        }
        Ok(out)
    }

    /// Collects every directive line, trimmed and tagged, in file order.
    ///
    /// Repeated directives are all kept.
    pub fn extract<R: BufRead>(&self, reader: R) -> io::Result<Vec<Vec<u8>>> {
        let mut found = Vec::new();
        for line in lines(reader) {
            let line = line?;
            if self.is_directive(&line) {
                found.push(self.tagged(&line));
            }
        }
        Ok(found)
    }

    fn tagged(&self, line: &[u8]) -> Vec<u8> {
        let mut out = line.trim_ascii().to_vec();
        out.push(b' ');
        out.extend_from_slice(self.tag.as_bytes());
        out
    }
}

/// Lines split on `\n` with a trailing `\r` removed.
pub fn lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<Vec<u8>>> {
    reader.split(b'\n').map(|line| {
        line.map(|mut line| {
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
    })
}
