//! Dataset version numbering and lifecycle enums.
//!
//! Version numbers are `major.minor.patch` strings. Patch and minor
//! roll over at 10, so successive bumps walk `1.0.1 … 1.0.9, 1.1.0,
//! 1.1.1 …` and eventually `1.9.9 → 2.0.0`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A version component rolls over into the next one at this value.
const COMPONENT_ROLLOVER: u32 = 10;

// ---------------------------------------------------------------------------
// VersionNumber
// ---------------------------------------------------------------------------

/// A `major.minor.patch` dataset version number.
///
/// Ordering is the numeric (major, minor, patch) triple compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// The number assigned to the first version of a group.
pub const FIRST_VERSION: VersionNumber = VersionNumber {
    major: 1,
    minor: 0,
    patch: 1,
};

impl VersionNumber {
    /// The next version number: patch + 1, rolling patch and minor over
    /// at 10.
    pub fn bumped(self) -> Self {
        let mut next = self;
        next.patch += 1;
        if next.patch == COMPONENT_ROLLOVER {
            next.patch = 0;
            next.minor += 1;
            if next.minor == COMPONENT_ROLLOVER {
                next.minor = 0;
                next.major += 1;
            }
        }
        next
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut component = |name: &str| -> Result<u32, CoreError> {
            parts
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| {
                    CoreError::Validation(format!("malformed version number {s:?}: bad {name}"))
                })
        };
        let major = component("major")?;
        let minor = component("minor")?;
        let patch = component("patch")?;
        if parts.next().is_some() {
            return Err(CoreError::Validation(format!(
                "malformed version number {s:?}: too many components"
            )));
        }
        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

/// The version number following the highest one in `existing`, or
/// [`FIRST_VERSION`] for an empty group.
pub fn next_version_number<'a, I>(existing: I) -> Result<VersionNumber, CoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut max: Option<VersionNumber> = None;
    for raw in existing {
        let parsed: VersionNumber = raw.parse()?;
        if max.map_or(true, |m| parsed > m) {
            max = Some(parsed);
        }
    }
    Ok(max.map_or(FIRST_VERSION, VersionNumber::bumped))
}

// ---------------------------------------------------------------------------
// Lifecycle enums
// ---------------------------------------------------------------------------

/// How a version's membership was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationMode {
    /// The allocator assigned tasks to buckets.
    Random,
    /// The caller fixed the per-bucket task lists.
    Manual,
}

impl CreationMode {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Random => 1,
            Self::Manual => 2,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Random),
            2 => Some(Self::Manual),
            _ => None,
        }
    }
}

/// What kind of change produced a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    /// The group's initial version.
    Start,
    /// Produced by a label-set change.
    Label,
    /// Produced by an augmentation-settings change.
    Augmentation,
    /// Produced by a membership or re-balance edit.
    Edit,
}

impl VersionType {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Start => 0,
            Self::Label => 1,
            Self::Augmentation => 2,
            Self::Edit => 4,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::Start),
            1 => Some(Self::Label),
            2 => Some(Self::Augmentation),
            4 => Some(Self::Edit),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> VersionNumber {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display_round_trip() {
        for s in ["1.0.1", "2.9.0", "10.3.7"] {
            assert_eq!(v(s).to_string(), s);
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("1.0".parse::<VersionNumber>().is_err());
        assert!("1.0.1.2".parse::<VersionNumber>().is_err());
        assert!("a.b.c".parse::<VersionNumber>().is_err());
        assert!("".parse::<VersionNumber>().is_err());
    }

    #[test]
    fn bump_increments_patch() {
        assert_eq!(v("1.0.1").bumped(), v("1.0.2"));
    }

    #[test]
    fn bump_rolls_patch_into_minor() {
        assert_eq!(v("1.0.9").bumped(), v("1.1.0"));
    }

    #[test]
    fn bump_rolls_minor_into_major() {
        assert_eq!(v("1.9.9").bumped(), v("2.0.0"));
    }

    #[test]
    fn ordering_is_numeric_triple() {
        assert!(v("1.0.9") < v("1.1.0"));
        assert!(v("1.9.9") < v("2.0.0"));
        assert!(v("1.2.3") > v("1.2.2"));
    }

    #[test]
    fn next_number_for_empty_group_is_first() {
        assert_eq!(next_version_number([]).unwrap(), FIRST_VERSION);
    }

    #[test]
    fn next_number_bumps_the_maximum() {
        // Scenario D: patch rollover into minor.
        let next = next_version_number(["1.0.1", "1.0.9"]).unwrap();
        assert_eq!(next, v("1.1.0"));
    }

    #[test]
    fn next_number_ignores_listing_order() {
        let next = next_version_number(["1.0.3", "1.0.1", "1.0.2"]).unwrap();
        assert_eq!(next, v("1.0.4"));
    }

    #[test]
    fn next_number_surfaces_malformed_input() {
        assert!(next_version_number(["1.0.1", "junk"]).is_err());
    }

    #[test]
    fn mode_and_type_wire_values_round_trip() {
        for mode in [CreationMode::Random, CreationMode::Manual] {
            assert_eq!(CreationMode::from_i16(mode.as_i16()), Some(mode));
        }
        for vt in [
            VersionType::Start,
            VersionType::Label,
            VersionType::Augmentation,
            VersionType::Edit,
        ] {
            assert_eq!(VersionType::from_i16(vt.as_i16()), Some(vt));
        }
        assert_eq!(VersionType::from_i16(3), None);
    }
}
