//! Fluid kind allow-list.

use crate::error::FluidError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of liquid the plant knows how to carry.
///
/// Adding a kind means adding a variant here; nothing else keys on the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FluidKind {
    Water,
    Chlorine,
}

impl FluidKind {
    pub const ALL: [FluidKind; 2] = [FluidKind::Water, FluidKind::Chlorine];

    pub fn key(&self) -> &'static str {
        match self {
            FluidKind::Water => "water",
            FluidKind::Chlorine => "chlorine",
        }
    }
}

impl fmt::Display for FluidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FluidKind {
    type Err = FluidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FluidKind::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FluidError::InvalidFluid { kind: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_kinds() {
        assert_eq!("water".parse::<FluidKind>().unwrap(), FluidKind::Water);
        assert_eq!(" Chlorine ".parse::<FluidKind>().unwrap(), FluidKind::Chlorine);
    }

    #[test]
    fn parse_rejects_unknown_and_empty() {
        assert!(matches!(
            "oil".parse::<FluidKind>(),
            Err(FluidError::InvalidFluid { .. })
        ));
        assert!("".parse::<FluidKind>().is_err());
    }

    #[test]
    fn keys_round_trip() {
        for kind in FluidKind::ALL {
            assert_eq!(kind.key().parse::<FluidKind>().unwrap(), kind);
        }
    }
}
