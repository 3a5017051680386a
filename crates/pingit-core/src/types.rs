use derive_more::{AddAssign, Display};

/// Port newtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Display)]
pub struct Port(pub u16);

/// `ICMP` echo identifier newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct Identifier(pub u16);

/// `ICMP` echo sequence number newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct Sequence(pub u16);

/// The number of a saved batch of results, starting from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, AddAssign, Display)]
pub struct SessionNumber(pub u64);

impl Default for SessionNumber {
    fn default() -> Self {
        Self(1)
    }
}

impl Identifier {
    /// Derive an identifier from a process id, keeping the low 16 bits.
    #[must_use]
    pub const fn from_pid(pid: u32) -> Self {
        Self((pid & 0xFFFF) as u16)
    }
}
