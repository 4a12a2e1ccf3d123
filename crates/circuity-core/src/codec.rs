//! Metadata entry codec
//!
//! A node's metadata maps composite keys to destination addresses.
//!
//! Canonical key: `direction_label_weight[_count]`, e.g. `up_a_0.5` or
//! `forward_x_2_17`. The label is exactly one character and may itself be
//! `_`, so the key is parsed positionally rather than by splitting.
//!
//! Legacy key: `label_weight[_count]`, e.g. `a_0.12_7`. Legacy entries carry
//! no direction and decode as `forward` steps. Their third field was
//! historically a float, so a non-integer value is accepted and dropped.
//!
//! The value is the destination address, stored verbatim. Legacy values may
//! instead carry an inline `count,probability,address` prefix.

use crate::edge::{Direction, Edge};
use crate::error::{Error, Result};

const SEPARATOR: char = '_';

/// Decoded key fields
#[derive(Debug, Clone, PartialEq)]
struct KeyParts {
    direction: Direction,
    label: char,
    weight: f64,
    count: Option<u64>,
}

/// Decode one metadata entry into an edge
///
/// The canonical schema is tried first; the legacy schema is the fallback.
pub fn decode(key: &str, value: &str) -> Result<Edge> {
    let (parts, (inline_count, destination)) = match parse_canonical(key) {
        Ok(parts) => (parts, (None, value)),
        Err(canonical) => {
            let parts = parse_legacy(key).map_err(|_| Error::malformed(key, canonical))?;
            (parts, split_value(value))
        }
    };

    if destination.is_empty() {
        return Err(Error::malformed(key, "empty destination address"));
    }

    Ok(Edge {
        direction: parts.direction,
        label: parts.label,
        weight: parts.weight,
        count: parts.count.or(inline_count),
        destination: destination.to_string(),
    })
}

/// Encode an edge as a canonical `(key, value)` entry
pub fn encode(edge: &Edge) -> (String, String) {
    (encode_key(edge), edge.destination.clone())
}

pub(crate) fn encode_key(edge: &Edge) -> String {
    let mut key = format!("{}_{}_{}", edge.direction, edge.label, edge.weight);
    if let Some(count) = edge.count {
        key.push(SEPARATOR);
        key.push_str(&count.to_string());
    }
    key
}

fn parse_canonical(key: &str) -> std::result::Result<KeyParts, String> {
    let (direction, rest) = key
        .split_once(SEPARATOR)
        .ok_or_else(|| "missing '_' separator".to_string())?;
    let direction: Direction = direction.parse()?;
    let (label, rest) = split_label(rest)?;
    let (weight, extra) = split_numbers(rest)?;

    let count = match extra {
        Some(raw) => Some(
            raw.parse::<u64>()
                .map_err(|_| format!("invalid count '{}'", raw))?,
        ),
        None => None,
    };

    Ok(KeyParts {
        direction,
        label,
        weight,
        count,
    })
}

fn parse_legacy(key: &str) -> std::result::Result<KeyParts, String> {
    let (label, rest) = split_label(key)?;
    let (weight, extra) = split_numbers(rest)?;

    let count = match extra {
        Some(raw) => match raw.parse::<u64>() {
            Ok(count) => Some(count),
            Err(_) => {
                parse_number(raw)?;
                None
            }
        },
        None => None,
    };

    Ok(KeyParts {
        direction: Direction::Forward,
        label,
        weight,
        count,
    })
}

/// Split `<label>_<rest>` where label is one character
fn split_label(s: &str) -> std::result::Result<(char, &str), String> {
    let mut chars = s.chars();
    let label = chars.next().ok_or_else(|| "missing label".to_string())?;
    let rest = chars
        .as_str()
        .strip_prefix(SEPARATOR)
        .ok_or_else(|| "label must be a single character".to_string())?;
    Ok((label, rest))
}

/// Split `weight[_extra]`
fn split_numbers(s: &str) -> std::result::Result<(f64, Option<&str>), String> {
    let mut fields = s.split(SEPARATOR);
    let weight = parse_number(fields.next().unwrap_or_default())?;
    let extra = fields.next();
    if fields.next().is_some() {
        return Err("too many fields".to_string());
    }
    Ok((weight, extra))
}

fn parse_number(raw: &str) -> std::result::Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("invalid number '{}'", raw))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("weight must be finite and non-negative, got '{}'", raw));
    }
    // Fold -0.0 into 0.0 so identical weights compare equal bitwise
    Ok(if value == 0.0 { 0.0 } else { value })
}

/// Strip an inline `count,probability,` prefix from a value
fn split_value(value: &str) -> (Option<u64>, &str) {
    let mut parts = value.splitn(3, ',');
    if let (Some(count), Some(probability), Some(address)) =
        (parts.next(), parts.next(), parts.next())
    {
        if let (Ok(count), Ok(_)) = (
            count.trim().parse::<u64>(),
            probability.trim().parse::<f64>(),
        ) {
            return (Some(count), address.trim());
        }
    }
    (None, value)
}
