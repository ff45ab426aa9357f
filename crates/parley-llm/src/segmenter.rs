//! Thinking/answer segmentation of raw model output
//!
//! Reasoning models emit their chain of thought inline, wrapped in one of a few
//! tag conventions. This module pulls those sections out so the caller can show
//! them collapsed and render the remaining answer on its own.

use serde::{Deserialize, Serialize};

/// An opening/closing marker pair. Enclosed content may span lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter {
    pub open: &'static str,
    pub close: &'static str,
}

/// Recognized thinking conventions, applied in this order
pub const THINKING_DELIMITERS: &[Delimiter] = &[
    Delimiter {
        open: "<think>",
        close: "</think>",
    },
    // Some models close with a stray question mark
    Delimiter {
        open: "<think>",
        close: "</think?>",
    },
    Delimiter {
        open: "*thinks*",
        close: "*/thinks*",
    },
    Delimiter {
        open: "<thinking>",
        close: "</thinking>",
    },
];

/// Raw reply split into thinking segments and the user-facing answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedResponse {
    pub thinking: Vec<String>,
    pub main: String,
}

impl SegmentedResponse {
    pub fn has_thinking(&self) -> bool {
        !self.thinking.is_empty()
    }

    /// The answer, or `None` when every character was thinking
    pub fn main_content(&self) -> Option<&str> {
        if self.main.is_empty() {
            None
        } else {
            Some(&self.main)
        }
    }
}

/// One occurrence of a delimiter pair within a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BracketedMatch<'a> {
    /// Full match including both markers
    span: &'a str,
    /// Text between the markers
    inner: &'a str,
}

/// Split `raw` into thinking segments and main content.
///
/// Each delimiter pair is scanned over the original text. Every match adds its
/// trimmed inner text to `thinking` and has its full span removed from a working
/// copy, which is trimmed after each removal. A span already removed by an
/// earlier pattern is left alone. Unterminated openers never match.
pub fn segment(raw: &str) -> SegmentedResponse {
    let mut thinking = Vec::new();
    let mut main = raw.to_string();

    for delimiter in THINKING_DELIMITERS {
        for found in find_bracketed(raw, delimiter) {
            thinking.push(found.inner.trim().to_string());
            main = main.replace(found.span, "").trim().to_string();
        }
    }

    SegmentedResponse {
        thinking,
        main: main.trim().to_string(),
    }
}

/// All non-overlapping matches of `delimiter`, left to right, each closing at
/// the nearest closing marker after its opener.
fn find_bracketed<'a>(text: &'a str, delimiter: &Delimiter) -> Vec<BracketedMatch<'a>> {
    let mut matches = Vec::new();
    let mut cursor = 0;

    while let Some(open_offset) = text[cursor..].find(delimiter.open) {
        let start = cursor + open_offset;
        let inner_start = start + delimiter.open.len();

        // No closer after this opener means none after any later opener either
        let Some(close_offset) = text[inner_start..].find(delimiter.close) else {
            break;
        };
        let inner_end = inner_start + close_offset;
        let end = inner_end + delimiter.close.len();

        matches.push(BracketedMatch {
            span: &text[start..end],
            inner: &text[inner_start..inner_end],
        });
        cursor = end;
    }

    matches
}
