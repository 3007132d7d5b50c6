//! VHDL standard revisions

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::ModelError;

/// The closed set of VHDL standard revision years accepted by
/// `SetVHDLVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VhdlVersion {
    Vhdl1987,
    Vhdl1993,
    Vhdl2002,
    #[default]
    Vhdl2008,
    Vhdl2019,
}

impl VhdlVersion {
    /// Map a revision year to its enum value.
    pub fn from_year(year: u16) -> Result<Self, ModelError> {
        match year {
            1987 => Ok(Self::Vhdl1987),
            1993 => Ok(Self::Vhdl1993),
            2002 => Ok(Self::Vhdl2002),
            2008 => Ok(Self::Vhdl2008),
            2019 => Ok(Self::Vhdl2019),
            _ => Err(ModelError::UnsupportedVhdlVersion(year)),
        }
    }

    /// The revision year, e.g. `2008`.
    pub fn year(self) -> u16 {
        match self {
            Self::Vhdl1987 => 1987,
            Self::Vhdl1993 => 1993,
            Self::Vhdl2002 => 2002,
            Self::Vhdl2008 => 2008,
            Self::Vhdl2019 => 2019,
        }
    }
}

impl fmt::Display for VhdlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.year())
    }
}

impl Serialize for VhdlVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.year())
    }
}
