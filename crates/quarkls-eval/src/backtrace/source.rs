//! Source excerpts rendered for anonymous function frames.

use std::fmt;

use serde::Serialize;

/// Leading lines of a function's source, de-indented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceExcerpt {
    /// Rendered lines with the common indentation removed.
    pub lines: Vec<String>,
    /// Number of source lines beyond the limit that were not rendered.
    pub elided_lines: usize,
}

impl SourceExcerpt {
    /// Takes up to `limit` lines of `source` and strips their shared indentation.
    #[must_use]
    pub fn from_source(source: &str, limit: usize) -> Self {
        let total = source.lines().count();
        let kept: Vec<&str> = source.lines().take(limit).collect();
        let indent = kept
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| leading_whitespace(line))
            .min()
            .unwrap_or(0);

        let lines = kept
            .iter()
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    line.chars().skip(indent).collect::<String>().trim_end().to_owned()
                }
            })
            .collect();

        Self {
            lines,
            elided_lines: total.saturating_sub(limit),
        }
    }
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|ch| ch.is_whitespace()).count()
}

impl fmt::Display for SourceExcerpt {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "┌──")?;
        for line in &self.lines {
            if line.is_empty() {
                writeln!(formatter, "│")?;
            } else {
                writeln!(formatter, "│ {line}")?;
            }
        }
        match self.elided_lines {
            0 => write!(formatter, "└──"),
            1 => write!(formatter, "└── (1 more line)"),
            count => write!(formatter, "└── ({count} more lines)"),
        }
    }
}
