//! Multi-hop routes and their textual encoding.
//!
//! A [`Path`] is an ordered list of hop traversals. Its only persisted form is
//! the token string produced by [`Path::encode`]: `<id>` for a forward step,
//! `<inverse-id>` for an inverse one.
//!
//! ```
//! use dcabot::domain::path::Path;
//!
//! let path = Path::decode("<3><inverse-2>").unwrap();
//! assert_eq!(path.len(), 2);
//! assert_eq!(path.encode(), "<3><inverse-2>");
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::hop::Direction;
use super::id::HopId;

const INVERSE_PREFIX: &str = "inverse-";

/// One traversal of a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathStep {
    pub hop: HopId,
    pub direction: Direction,
}

impl PathStep {
    #[must_use]
    pub const fn forward(hop: HopId) -> Self {
        Self {
            hop,
            direction: Direction::Forward,
        }
    }

    #[must_use]
    pub const fn inverse(hop: HopId) -> Self {
        Self {
            hop,
            direction: Direction::Inverse,
        }
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        let direction = match self.direction {
            Direction::Forward => Direction::Inverse,
            Direction::Inverse => Direction::Forward,
        };
        Self {
            hop: self.hop,
            direction,
        }
    }

    fn encode_into(self, out: &mut String) {
        out.push('<');
        if self.direction == Direction::Inverse {
            out.push_str(INVERSE_PREFIX);
        }
        out.push_str(&self.hop.to_string());
        out.push('>');
    }
}

/// A non-empty route that never reuses a hop.
///
/// Ordering is lexicographic on the step sequence, so a path sorts before
/// its own extensions and paths through lower hop ids sort first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    /// Build a path from its steps.
    ///
    /// # Errors
    /// Returns [`DomainError::EmptyPath`] for no steps and
    /// [`DomainError::DuplicateHopInPath`] when a hop repeats.
    pub fn new(steps: Vec<PathStep>) -> Result<Self, DomainError> {
        if steps.is_empty() {
            return Err(DomainError::EmptyPath);
        }
        let mut seen = HashSet::with_capacity(steps.len());
        for step in &steps {
            if !seen.insert(step.hop) {
                return Err(DomainError::DuplicateHopInPath { id: step.hop });
            }
        }
        Ok(Self { steps })
    }

    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Number of hops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; kept for the `len`/`is_empty` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn uses(&self, hop: HopId) -> bool {
        self.steps.iter().any(|s| s.hop == hop)
    }

    /// The same route walked backwards.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            steps: self.steps.iter().rev().map(|s| s.flipped()).collect(),
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.steps.len() * 6);
        for step in &self.steps {
            step.encode_into(&mut out);
        }
        out
    }

    /// Parse the token form produced by [`encode`](Self::encode).
    ///
    /// # Errors
    /// Rejects empty input, anything that is not a run of `<id>` or
    /// `<inverse-id>` tokens with canonical decimal ids, and repeated hops.
    pub fn decode(input: &str) -> Result<Self, DomainError> {
        let malformed = |reason| DomainError::MalformedPath {
            input: input.to_string(),
            reason,
        };

        if input.is_empty() {
            return Err(DomainError::EmptyPath);
        }
        let inner = input
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(|| malformed("expected <...> tokens"))?;

        let steps = inner
            .split("><")
            .map(|token| {
                let (direction, digits) = match token.strip_prefix(INVERSE_PREFIX) {
                    Some(rest) => (Direction::Inverse, rest),
                    None => (Direction::Forward, token),
                };
                parse_hop_id(digits)
                    .map(|hop| PathStep { hop, direction })
                    .ok_or_else(|| malformed("hop ids must be canonical decimal numbers"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(steps)
    }
}

fn parse_hop_id(digits: &str) -> Option<HopId> {
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !(digits.len() > 1 && digits.starts_with('0'));
    if !canonical {
        return None;
    }
    digits.parse::<u32>().ok().map(HopId::new)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
