//! Hierarchy segmentation
//!
//! Hierarchy tokens arrive either with explicit separators (`01.02`, `01/02`)
//! or as packed fixed-width codes (`0102`). Packed codes are split after a
//! segment length is inferred from the whole token set, or forced by config.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Characters that separate explicit path components.
pub const SEPARATORS: [char; 4] = ['.', '/', '\\', '-'];

/// Candidate segment lengths tried during inference.
pub const SEGMENT_LENGTHS: std::ops::RangeInclusive<usize> = 2..=6;

/// Canonical separator of normalized paths.
pub const PATH_SEPARATOR: char = '.';

const SHARED_PREFIX_WEIGHT: f64 = 10.0;

/// Where the segment length of a build came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentSource {
    /// Supplied by configuration, scoring skipped.
    Forced,
    /// Chosen by [`infer_segment_length`].
    Inferred,
    /// Tokens left as they are.
    Unsegmented,
}

/// Segment length decision for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segmentation {
    pub length: Option<usize>,
    pub source: SegmentSource,
}

impl Segmentation {
    /// Decide the segment length for a token set.
    pub fn resolve<'a, I>(tokens: I, forced: Option<usize>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        if let Some(length) = forced.filter(|len| *len > 0) {
            return Self {
                length: Some(length),
                source: SegmentSource::Forced,
            };
        }
        match infer_segment_length(tokens) {
            Some(length) => Self {
                length: Some(length),
                source: SegmentSource::Inferred,
            },
            None => Self {
                length: None,
                source: SegmentSource::Unsegmented,
            },
        }
    }

    /// Normalize a raw token and split it into segments when it is packed.
    pub fn apply(&self, raw: &str) -> Option<String> {
        let normalized = normalize_path(raw)?;
        match self.length {
            Some(length) if !normalized.contains(PATH_SEPARATOR) => {
                Some(segment_path(&normalized, length))
            }
            _ => Some(normalized),
        }
    }
}

pub fn has_separator(token: &str) -> bool {
    token.contains(SEPARATORS)
}

/// Rewrite a raw token into dot-separated form.
///
/// Runs of separators collapse into one dot, leading and trailing dots are
/// trimmed. Returns `None` when nothing is left.
pub fn normalize_path(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if SEPARATORS.contains(&ch) {
            if !out.is_empty() && !out.ends_with(PATH_SEPARATOR) {
                out.push(PATH_SEPARATOR);
            }
        } else {
            out.push(ch);
        }
    }
    while out.ends_with(PATH_SEPARATOR) {
        out.pop();
    }
    (!out.is_empty()).then_some(out)
}

/// Components of a normalized path.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Number of components in a normalized path.
pub fn path_depth(path: &str) -> usize {
    split_path(path).len()
}

/// Path of the enclosing folder, when the path has at least two components.
pub fn parent_path(path: &str) -> Option<String> {
    let parts = split_path(path);
    if parts.len() < 2 {
        return None;
    }
    Some(parts[..parts.len() - 1].join(&PATH_SEPARATOR.to_string()))
}

/// Chunk a packed token into fixed-width segments.
pub fn segment_path(token: &str, length: usize) -> String {
    if length == 0 {
        return token.to_string();
    }
    let chars: Vec<char> = token.chars().collect();
    chars
        .chunks(length)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(&PATH_SEPARATOR.to_string())
}

/// Infer the fixed segment width of packed hierarchy tokens.
///
/// For each candidate length `s`, every token with `floor(len / s) >= 2`
/// contributes its parent prefix (all but the last segment) and its depth.
/// Score is `10 * shared_prefixes + average_depth`, where a shared prefix is a
/// parent prefix seen on at least two tokens. Only lengths with a shared prefix
/// qualify; ties pick the smaller length. Returns `None` when the token set is
/// empty, already carries separators, or no length qualifies.
pub fn infer_segment_length<'a, I>(tokens: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let clean: Vec<Vec<char>> = tokens
        .into_iter()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token.chars().collect())
        .collect();
    if clean.is_empty() || clean.iter().any(|chars| chars.iter().any(|c| SEPARATORS.contains(c))) {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for length in SEGMENT_LENGTHS {
        let mut parent_counts: HashMap<&[char], usize> = HashMap::new();
        let mut depth_sum = 0usize;
        let mut depth_count = 0usize;
        for chars in &clean {
            let depth = chars.len() / length;
            if depth >= 2 {
                depth_sum += depth;
                depth_count += 1;
                *parent_counts
                    .entry(&chars[..(depth - 1) * length])
                    .or_default() += 1;
            }
        }
        let shared = parent_counts.values().filter(|count| **count >= 2).count();
        if shared == 0 {
            continue;
        }
        let average_depth = depth_sum as f64 / depth_count as f64;
        let score = shared as f64 * SHARED_PREFIX_WEIGHT + average_depth;
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((length, score));
        }
    }
    best.map(|(length, _)| length)
}
