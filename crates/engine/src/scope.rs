// Retrace - Recorded Trace Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Indentation-derived scope analysis.
//!
//! Every source line is classified once, when a session starts, into a
//! [`ScopeInfo`]: how far it is indented, whether it opens a new block, and
//! what kind of block that is. The classification is a keyword heuristic for
//! whitespace-delimited block syntax; other languages can plug in their own
//! [`LineClassifier`] without touching the stepping engine.

use serde::{Deserialize, Serialize};

/// Keywords that open a function-like scope
const FUNCTION_KEYWORDS: &[&str] = &["def", "class"];

/// Keywords that open a control-flow scope
const CONTROL_KEYWORDS: &[&str] =
    &["if", "elif", "else", "for", "while", "try", "except", "finally", "with", "match", "case"];

/// Default number of columns a tab advances the indentation by
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Classification of the scope a line opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    /// Plain statement, or a line that does not open a scope
    #[default]
    Module,
    /// Function or class definition
    Function,
    /// Any other block: conditionals, loops, exception handling, context managers
    Control,
}

impl std::fmt::Display for ScopeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module => write!(f, "module"),
            Self::Function => write!(f, "function"),
            Self::Control => write!(f, "control"),
        }
    }
}

/// Per-line scope metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeInfo {
    /// Indentation width in columns
    pub indent: usize,
    /// Kind of scope this line opens (`Module` when it opens none)
    pub scope_type: ScopeType,
    /// Whether this line opens a new block
    pub is_scope_start: bool,
}

/// Capability for turning a single source line into scope metadata.
pub trait LineClassifier {
    /// Classify one line of source text
    fn classify(&self, line: &str) -> ScopeInfo;
}

/// Classifier for indentation-delimited languages.
///
/// Spaces count one column and tabs count `tab_width` columns. Blank and
/// comment-only lines are reported at indent 0 so they never look like an
/// unindent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentClassifier {
    /// Columns per tab character
    pub tab_width: usize,
}

impl Default for IndentClassifier {
    fn default() -> Self {
        Self { tab_width: DEFAULT_TAB_WIDTH }
    }
}

impl IndentClassifier {
    /// Create a classifier with a custom tab width
    pub fn new(tab_width: usize) -> Self {
        Self { tab_width }
    }

    /// Leading whitespace width of a line
    pub fn indentation(&self, line: &str) -> usize {
        line.chars()
            .map_while(|c| match c {
                ' ' => Some(1),
                '\t' => Some(self.tab_width),
                _ => None,
            })
            .sum()
    }
}

impl LineClassifier for IndentClassifier {
    fn classify(&self, line: &str) -> ScopeInfo {
        let code = strip_comment(line).trim();
        if code.is_empty() {
            return ScopeInfo::default();
        }

        let indent = self.indentation(line);
        if !code.ends_with(':') {
            return ScopeInfo { indent, ..Default::default() };
        }

        let keyword = leading_keyword(code);
        let scope_type = if FUNCTION_KEYWORDS.contains(&keyword) {
            ScopeType::Function
        } else if CONTROL_KEYWORDS.contains(&keyword) {
            ScopeType::Control
        } else {
            return ScopeInfo { indent, ..Default::default() };
        };

        ScopeInfo { indent, scope_type, is_scope_start: true }
    }
}

/// First word of a statement, ending at whitespace or `:`.
///
/// A keyword glued to a parenthesis (`if(x):`) is not recognized.
fn leading_keyword(code: &str) -> &str {
    let end = code.find(|c: char| c.is_whitespace() || c == ':').unwrap_or(code.len());
    &code[..end]
}

/// Drop a trailing `#` comment, ignoring `#` inside string literals
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, '#') => return &line[..i],
            _ => {}
        }
    }

    line
}

/// Scope metadata for every line of a source, addressed by 1-based line number.
///
/// Immutable once built; a new source means a new map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeMap {
    lines: Vec<ScopeInfo>,
}

impl ScopeMap {
    /// Classify every line of `source` with `classifier`
    pub fn build<S: AsRef<str>>(source: &[S], classifier: &dyn LineClassifier) -> Self {
        Self { lines: source.iter().map(|line| classifier.classify(line.as_ref())).collect() }
    }

    /// Scope info for a 1-based line number, if it exists
    pub fn get(&self, line: usize) -> Option<&ScopeInfo> {
        line.checked_sub(1).and_then(|i| self.lines.get(i))
    }

    /// Scope info for a line, falling back to a module-level default for unknown lines
    pub fn info(&self, line: usize) -> ScopeInfo {
        self.get(line).copied().unwrap_or_default()
    }

    /// Number of classified lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the source had no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate `(line_number, info)` pairs in source order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ScopeInfo)> {
        self.lines.iter().enumerate().map(|(i, info)| (i + 1, info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> ScopeInfo {
        IndentClassifier::default().classify(line)
    }

    #[test]
    fn test_indentation_counts_tabs_as_four() {
        let classifier = IndentClassifier::default();
        assert_eq!(classifier.indentation("x = 1"), 0);
        assert_eq!(classifier.indentation("    x = 1"), 4);
        assert_eq!(classifier.indentation("\tx = 1"), 4);
        assert_eq!(classifier.indentation("\t  x = 1"), 6);
        assert_eq!(IndentClassifier::new(8).indentation("\tx"), 8);
    }

    #[test]
    fn test_function_and_class_definitions() {
        let info = classify("def f(a, b):");
        assert_eq!(info.scope_type, ScopeType::Function);
        assert!(info.is_scope_start);
        assert_eq!(info.indent, 0);

        let info = classify("    class Node:");
        assert_eq!(info.scope_type, ScopeType::Function);
        assert_eq!(info.indent, 4);
    }

    #[test]
    fn test_control_keywords() {
        for line in [
            "if x > 1:",
            "elif y:",
            "else:",
            "for i in range(3):",
            "while True:",
            "try:",
            "except ValueError as e:",
            "except:",
            "finally:",
            "with open(p) as f:",
            "match cmd:",
            "case 1:",
        ] {
            let info = classify(line);
            assert_eq!(info.scope_type, ScopeType::Control, "{line}");
            assert!(info.is_scope_start, "{line}");
        }
    }

    #[test]
    fn test_non_scope_lines() {
        for line in ["x = f()", "return 1", "print('if x:')", "lambda_map = {1: 2}", "definitely:"] {
            let info = classify(line);
            assert_eq!(info.scope_type, ScopeType::Module, "{line}");
            assert!(!info.is_scope_start, "{line}");
        }
    }

    #[test]
    fn test_keyword_must_be_followed_by_space_or_colon() {
        for line in ["if(x):", "while(True):", "for(i) in xs:", "elif(y):"] {
            let info = classify(line);
            assert_eq!(info.scope_type, ScopeType::Module, "{line}");
            assert!(!info.is_scope_start, "{line}");
        }

        assert!(classify("if (x):").is_scope_start);
        assert!(classify("else:").is_scope_start);
        assert!(classify("except:").is_scope_start);
    }

    #[test]
    fn test_blank_and_comment_lines_are_flat() {
        assert_eq!(classify(""), ScopeInfo::default());
        assert_eq!(classify("        "), ScopeInfo::default());
        assert_eq!(classify("    # def f():"), ScopeInfo::default());
    }

    #[test]
    fn test_trailing_comment_is_ignored() {
        let info = classify("    if ready:  # wait for it");
        assert!(info.is_scope_start);
        assert_eq!(info.scope_type, ScopeType::Control);
        assert_eq!(info.indent, 4);

        // A hash inside a string is not a comment
        let info = classify("x = '#'");
        assert!(!info.is_scope_start);
        assert_eq!(info.indent, 0);
    }

    #[test]
    fn test_scope_map_is_one_based() {
        let source = ["def f():", "    return 1", "x = f()", "print(x)"];
        let map = ScopeMap::build(&source, &IndentClassifier::default());

        assert_eq!(map.len(), 4);
        assert!(map.get(0).is_none());
        assert_eq!(map.get(1).unwrap().scope_type, ScopeType::Function);
        assert_eq!(map.get(2).unwrap().indent, 4);
        assert!(map.get(5).is_none());
        assert_eq!(map.info(99), ScopeInfo::default());
        assert_eq!(map.iter().map(|(line, _)| line).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }
}
