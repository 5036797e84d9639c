use strum::EnumIter;

/// The eight 32-bit general purpose registers, in ModR/M encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(u8)]
pub enum Register {
    /// Accumulator
    Eax = 0,
    /// Counter
    Ecx = 1,
    /// Data
    Edx = 2,
    /// Base
    Ebx = 3,
    /// Stack pointer; as a memory base it forces a SIB byte
    Esp = 4,
    /// Base pointer; as a memory base without displacement it forces `disp8 = 0`
    Ebp = 5,
    /// Source index
    Esi = 6,
    /// Destination index
    Edi = 7,
}

impl Register {
    /// The register's 3-bit encoding
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Resolve a 3-bit encoding to its register
    #[must_use]
    pub fn from_index(index: u8) -> Option<Register> {
        match index {
            0 => Some(Register::Eax),
            1 => Some(Register::Ecx),
            2 => Some(Register::Edx),
            3 => Some(Register::Ebx),
            4 => Some(Register::Esp),
            5 => Some(Register::Ebp),
            6 => Some(Register::Esi),
            7 => Some(Register::Edi),
            _ => None,
        }
    }

    /// The register's assembly name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Register::Eax => "eax",
            Register::Ecx => "ecx",
            Register::Edx => "edx",
            Register::Ebx => "ebx",
            Register::Esp => "esp",
            Register::Ebp => "ebp",
            Register::Esi => "esi",
            Register::Edi => "edi",
        }
    }
}

/// The scale factor of a SIB-encoded index register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Scale {
    /// index * 1
    #[default]
    One = 0,
    /// index * 2
    Two = 1,
    /// index * 4
    Four = 2,
    /// index * 8
    Eight = 3,
}

impl Scale {
    /// The 2-bit SIB encoding of this scale
    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Resolve a 2-bit SIB encoding to its scale
    #[must_use]
    pub fn from_bits(bits: u8) -> Option<Scale> {
        match bits {
            0 => Some(Scale::One),
            1 => Some(Scale::Two),
            2 => Some(Scale::Four),
            3 => Some(Scale::Eight),
            _ => None,
        }
    }

    /// The multiplication factor
    #[must_use]
    pub fn factor(self) -> u8 {
        1 << self.bits()
    }
}
