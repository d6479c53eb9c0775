use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;

use crate::error::{ProcessError, ProcessResult};

const VALUE_PATTERN: &str = r"[-+]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?";

struct AtomPattern<'a> {
    atom: &'a str,
    prefix: String,
    line: Regex,
}

impl<'a> AtomPattern<'a> {
    fn new(atom: &'a str) -> ProcessResult<Self> {
        let line = Regex::new(&format!(
            r"^{}: ([0-9]+) ({VALUE_PATTERN})\s*$",
            regex::escape(atom)
        ))?;
        Ok(Self {
            atom,
            prefix: format!("{atom}: "),
            line,
        })
    }

    fn malformed(&self, line_number: usize, line: &str) -> ProcessError {
        ProcessError::MalformedLine {
            atom: self.atom.to_string(),
            line_number,
            line: line.to_string(),
        }
    }
}

/// Parses every `"<atom>: <index> <value>"` line of `text`.
///
/// Lines that do not start with `"<atom>: "` belong to other output and are
/// skipped. Indices must count up from 0 without gaps. A log without any
/// matching line is an error.
pub fn parse_atom_scores(text: &str, atom: &str) -> ProcessResult<Vec<f64>> {
    let pattern = AtomPattern::new(atom)?;
    let mut scores = Vec::new();
    let mut counter: u64 = 0;

    for (offset, line) in text.lines().enumerate() {
        if !line.starts_with(&pattern.prefix) {
            continue;
        }
        let line_number = offset + 1;
        let captures = pattern
            .line
            .captures(line)
            .ok_or_else(|| pattern.malformed(line_number, line))?;
        let index: u64 = captures[1]
            .parse()
            .map_err(|_| pattern.malformed(line_number, line))?;
        if index != counter {
            return Err(ProcessError::IndexOutOfOrder {
                atom: atom.to_string(),
                line_number,
                expected: counter,
                found: index,
            });
        }
        let value: f64 = captures[2]
            .parse()
            .map_err(|_| pattern.malformed(line_number, line))?;
        scores.push(value);
        counter += 1;
    }

    if scores.is_empty() {
        return Err(ProcessError::NoScores {
            atom: atom.to_string(),
        });
    }
    Ok(scores)
}

/// Parses several atoms from one log; all of them must cover the same frames.
pub fn parse_atoms<S: AsRef<str>>(
    text: &str,
    atoms: &[S],
) -> ProcessResult<BTreeMap<String, Vec<f64>>> {
    let mut parsed = BTreeMap::new();
    let mut expected: Option<usize> = None;
    for atom in atoms {
        let atom = atom.as_ref();
        let scores = parse_atom_scores(text, atom)?;
        match expected {
            None => expected = Some(scores.len()),
            Some(expected) if expected != scores.len() => {
                return Err(ProcessError::FrameCountMismatch {
                    atom: atom.to_string(),
                    expected,
                    actual: scores.len(),
                });
            }
            Some(_) => {}
        }
        parsed.insert(atom.to_string(), scores);
    }
    Ok(parsed)
}

pub async fn read_score_log<S: AsRef<str>>(
    path: &Path,
    atoms: &[S],
) -> ProcessResult<BTreeMap<String, Vec<f64>>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProcessError::io(path, source))?;
    parse_atoms(&text, atoms)
}
