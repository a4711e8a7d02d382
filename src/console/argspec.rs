//! Declarative argument signatures (`ss?s`, `s?i`, ...).
//!
//! Each marker is `s` (string) or `i` (integer); a `?` in front of a marker
//! makes that position optional. Once a position is optional every later one
//! must be too, which is checked when the spec is parsed.

use std::fmt;

use crate::error::{ConsoleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Integer,
}

impl ArgType {
    fn marker(self) -> char {
        match self {
            ArgType::String => 's',
            ArgType::Integer => 'i',
        }
    }

    /// Types are mutually exclusive: a bare numeral never satisfies a string slot.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            ArgType::Integer => is_integer(value),
            ArgType::String => !is_integer(value),
        }
    }
}

/// Whole-string base-10 integer with an optional sign.
pub fn is_integer(value: &str) -> bool {
    let digits = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSlot {
    pub kind: ArgType,
    pub optional: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgSpec {
    slots: Vec<ArgSlot>,
}

impl ArgSpec {
    /// A spec that accepts no arguments at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the compact form.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |reason: String| ConsoleError::InvalidArgSpec {
            spec: spec.to_string(),
            reason,
        };

        let mut slots = Vec::new();
        let mut pending_optional = false;
        let mut seen_optional = false;
        for c in spec.chars() {
            let kind = match c {
                '?' if pending_optional => return Err(invalid("repeated '?'".into())),
                '?' => {
                    pending_optional = true;
                    continue;
                }
                's' => ArgType::String,
                'i' => ArgType::Integer,
                c if c.is_whitespace() => continue,
                other => return Err(invalid(format!("unknown marker '{other}'"))),
            };
            if seen_optional && !pending_optional {
                return Err(invalid(format!(
                    "required argument at position {} follows an optional one",
                    slots.len() + 1
                )));
            }
            seen_optional |= pending_optional;
            slots.push(ArgSlot {
                kind,
                optional: pending_optional,
            });
            pending_optional = false;
        }
        if pending_optional {
            return Err(invalid("'?' without a following marker".into()));
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[ArgSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of leading required positions.
    pub fn required(&self) -> usize {
        self.slots.iter().take_while(|s| !s.optional).count()
    }

    /// Check parsed arguments against the spec.
    ///
    /// Rejects surplus arguments, missing required ones and any argument of
    /// the wrong type; everything else is accepted.
    pub fn validate<S: AsRef<str>>(&self, args: &[S]) -> bool {
        if args.len() > self.slots.len() || args.len() < self.required() {
            return false;
        }
        self.slots
            .iter()
            .zip(args)
            .all(|(slot, arg)| slot.kind.accepts(arg.as_ref()))
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            if slot.optional {
                f.write_str("?")?;
            }
            write!(f, "{}", slot.kind.marker())?;
        }
        Ok(())
    }
}
