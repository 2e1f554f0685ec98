use std::fmt;

/// Number of presence bits carried by one flag word. Bit 0 is reserved for continuation.
pub const PRESENCE_BITS: u8 = 15;

/// One 16-bit property flag word, as it appears (big-endian) on the wire.
///
/// Bit 0 is the continuation bit: when set, another flag word follows this one. Bits 15 down to
/// 1 mark presence of up to 15 properties, most significant bit first.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FlagWord(u16);

impl FlagWord {
    /// A word with only the continuation bit set. Used to prime a fresh cursor so that its first
    /// presence query triggers a flag word read.
    pub const PRIMED: FlagWord = FlagWord(1);

    pub fn new(raw: u16) -> FlagWord {
        FlagWord(raw)
    }

    pub fn raw(&self) -> u16 {
        self.0
    }

    pub fn has_continuation(&self) -> bool {
        self.0 & 1 != 0
    }

    /// Check presence of the `n`-th property within this word's block, counting from 0. `n`
    /// must be less than [`PRESENCE_BITS`].
    pub fn is_present(&self, n: u8) -> bool {
        debug_assert!(n < PRESENCE_BITS);
        self.0 & (1 << (15 - n)) != 0
    }
}

impl From<u16> for FlagWord {
    fn from(raw: u16) -> Self {
        FlagWord(raw)
    }
}

impl fmt::Debug for FlagWord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FlagWord({:#018b})", self.0)
    }
}
