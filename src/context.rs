// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("invalid {kind} \"{value}\"")]
pub struct InvalidSecurityItem {
    kind: &'static str,
    value: String,
}

impl InvalidSecurityItem {
    fn new(kind: &'static str, value: &str) -> Self {
        InvalidSecurityItem {
            kind,
            value: value.to_string(),
        }
    }
}

/// An MLS level: a sensitivity with an optional set of categories
///
/// Category tokens are opaque.  A compacted range such as "c0.c3" stays a
/// single token because the textual policy gives no category ordinals to
/// expand it with.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level {
    pub sensitivity: String,
    pub categories: BTreeSet<String>,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.categories.is_empty() {
            write!(f, "{}", self.sensitivity)
        } else {
            write!(
                f,
                "{}:{}",
                self.sensitivity,
                self.categories
                    .iter()
                    .cloned()
                    .collect::<Vec<String>>()
                    .join(",")
            )
        }
    }
}

impl FromStr for Level {
    type Err = InvalidSecurityItem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ':');
        let sensitivity = match parts.next() {
            Some(sens) if !sens.is_empty() && !sens.contains(char::is_whitespace) => sens,
            _ => return Err(InvalidSecurityItem::new("level", s)),
        };
        let mut categories = BTreeSet::new();
        if let Some(cats) = parts.next() {
            for c in cats.split(',') {
                if c.is_empty() || c.contains(char::is_whitespace) {
                    return Err(InvalidSecurityItem::new("level", s));
                }
                categories.insert(c.to_string());
            }
        }
        Ok(Level {
            sensitivity: sensitivity.to_string(),
            categories,
        })
    }
}

/// An MLS range: a low and high level
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MlsRange {
    pub low: Level,
    pub high: Level,
}

impl fmt::Display for MlsRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{} - {}", self.low, self.high)
        }
    }
}

impl FromStr for MlsRange {
    type Err = InvalidSecurityItem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accepts both the spaced statement form "s0 - s15" and the compact
        // context form "s0-s15".
        let (low, high) = match s.find(" - ") {
            Some(i) => (&s[..i], Some(&s[i + 3..])),
            None => match s.find('-') {
                Some(i) => (&s[..i], Some(&s[i + 1..])),
                None => (s, None),
            },
        };
        let low: Level = low.parse()?;
        let high = match high {
            Some(h) => h.parse()?,
            None => low.clone(),
        };
        Ok(MlsRange { low, high })
    }
}

/// A security context.  The MLS range is absent on non-MLS policies.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Context {
    pub user: String,
    pub role: String,
    pub type_: String,
    pub range: Option<MlsRange>,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.range {
            Some(r) => write!(f, "{}:{}:{}:{}", self.user, self.role, self.type_, r),
            None => write!(f, "{}:{}:{}", self.user, self.role, self.type_),
        }
    }
}

impl FromStr for Context {
    type Err = InvalidSecurityItem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        let user = parts.next().unwrap_or_default();
        let role = parts.next().unwrap_or_default();
        let type_ = parts.next().unwrap_or_default();
        if user.is_empty() || role.is_empty() || type_.is_empty() {
            return Err(InvalidSecurityItem::new("context", s));
        }
        let range = match parts.next() {
            Some(r) => Some(
                r.parse::<MlsRange>()
                    .map_err(|_| InvalidSecurityItem::new("context", s))?,
            ),
            None => None,
        };
        Ok(Context {
            user: user.to_string(),
            role: role.to_string(),
            type_: type_.to_string(),
            range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_display_and_parse() {
        let level: Level = "s0".parse().unwrap();
        assert_eq!(level.to_string(), "s0");
        let level: Level = "s1:c0,c4".parse().unwrap();
        assert_eq!(level.sensitivity, "s1");
        assert_eq!(level.categories.len(), 2);
        assert_eq!(level.to_string(), "s1:c0,c4");

        assert!("".parse::<Level>().is_err());
        assert!("s0:".parse::<Level>().is_err());
        assert!("s0:c0,".parse::<Level>().is_err());
    }

    #[test]
    fn compact_category_token_is_opaque() {
        let level: Level = "s0:c0.c255".parse().unwrap();
        assert_eq!(level.categories.len(), 1);
        assert_eq!(level.to_string(), "s0:c0.c255");
    }

    #[test]
    fn range_forms() {
        let range: MlsRange = "s0".parse().unwrap();
        assert_eq!(range.low, range.high);
        assert_eq!(range.to_string(), "s0");

        let spaced: MlsRange = "s0 - s15:c0.c1023".parse().unwrap();
        let compact: MlsRange = "s0-s15:c0.c1023".parse().unwrap();
        assert_eq!(spaced, compact);
        assert_eq!(spaced.to_string(), "s0 - s15:c0.c1023");
    }

    #[test]
    fn context_roundtrip() {
        let ctx: Context = "system_u:object_r:bin_t".parse().unwrap();
        assert_eq!(ctx.range, None);
        assert_eq!(ctx.to_string(), "system_u:object_r:bin_t");

        let ctx: Context = "system_u:object_r:bin_t:s0-s15".parse().unwrap();
        assert_eq!(ctx.to_string(), "system_u:object_r:bin_t:s0 - s15");

        assert!("system_u:object_r".parse::<Context>().is_err());
        assert!("a:b:c:not a level".parse::<Context>().is_err());
    }

    #[test]
    fn context_ordering_is_total() {
        let a: Context = "a:r:t:s0".parse().unwrap();
        let b: Context = "b:r:t:s0".parse().unwrap();
        let c: Context = "b:r:t:s1".parse().unwrap();
        assert!(a < b && b < c);
    }
}
