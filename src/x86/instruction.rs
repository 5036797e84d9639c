use crate::x86::{
    opcode::{select_opcode, Mnemonic, OpCode},
    register::{Register, Scale},
};
use crate::Result;

/// Whether an operand is a register/immediate or a sized memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// A plain register or immediate value
    Normal,
    /// An 8-bit memory reference
    BytePointer,
    /// A 16-bit memory reference
    WordPointer,
    /// A 32-bit memory reference
    DwordPointer,
    /// A 64-bit memory reference
    QwordPointer,
}

impl OperandType {
    /// True if the operand addresses memory
    #[must_use]
    pub fn is_pointer(&self) -> bool {
        !matches!(self, OperandType::Normal)
    }

    /// The operand's byte width, `None` for [`OperandType::Normal`]
    #[must_use]
    pub fn width(&self) -> Option<u8> {
        match self {
            OperandType::Normal => None,
            OperandType::BytePointer => Some(1),
            OperandType::WordPointer => Some(2),
            OperandType::DwordPointer => Some(4),
            OperandType::QwordPointer => Some(8),
        }
    }

    /// The size keyword used by the formatter
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            OperandType::Normal => "",
            OperandType::BytePointer => "byte",
            OperandType::WordPointer => "word",
            OperandType::DwordPointer => "dword",
            OperandType::QwordPointer => "qword",
        }
    }

    /// The pointer type of a memory operand of `width` bytes
    #[must_use]
    pub fn from_width(width: u8) -> OperandType {
        match width {
            1 => OperandType::BytePointer,
            2 => OperandType::WordPointer,
            8 => OperandType::QwordPointer,
            _ => OperandType::DwordPointer,
        }
    }
}

/// One instruction operand.
///
/// A `Normal` operand is either a register (`register` set) or an immediate
/// (`value` set). A pointer operand addresses memory through an optional base
/// `register`, an optional scaled `index`, and an optional displacement in
/// `correction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    /// Register/immediate vs sized memory reference
    pub operand_type: OperandType,
    /// The register, or the memory operand's base register
    pub register: Option<Register>,
    /// Scaled index register of a memory operand
    pub index: Option<(Register, Scale)>,
    /// Immediate value
    pub value: Option<u32>,
    /// Displacement of a memory operand
    pub correction: Option<i32>,
}

impl Operand {
    /// A plain register operand
    #[must_use]
    pub fn reg(register: Register) -> Operand {
        Operand {
            operand_type: OperandType::Normal,
            register: Some(register),
            index: None,
            value: None,
            correction: None,
        }
    }

    /// An immediate operand
    #[must_use]
    pub fn imm(value: u32) -> Operand {
        Operand {
            operand_type: OperandType::Normal,
            register: None,
            index: None,
            value: Some(value),
            correction: None,
        }
    }

    /// A memory operand `[base]`
    #[must_use]
    pub fn mem(operand_type: OperandType, base: Register) -> Operand {
        Operand {
            operand_type,
            register: Some(base),
            index: None,
            value: None,
            correction: None,
        }
    }

    /// A memory operand `[base+disp]`
    #[must_use]
    pub fn mem_disp(operand_type: OperandType, base: Register, correction: i32) -> Operand {
        Operand {
            operand_type,
            register: Some(base),
            index: None,
            value: None,
            correction: Some(correction),
        }
    }

    /// A memory operand `[base+index*scale+disp]`
    #[must_use]
    pub fn mem_index(
        operand_type: OperandType,
        base: Option<Register>,
        index: Register,
        scale: Scale,
        correction: Option<i32>,
    ) -> Operand {
        Operand {
            operand_type,
            register: base,
            index: Some((index, scale)),
            value: None,
            correction,
        }
    }

    /// An absolute memory operand `[disp32]`
    #[must_use]
    pub fn mem_absolute(operand_type: OperandType, address: u32) -> Operand {
        Operand {
            operand_type,
            register: None,
            index: None,
            value: None,
            correction: Some(address as i32),
        }
    }

    /// True if this is a plain register operand
    #[must_use]
    pub fn is_register(&self) -> bool {
        self.operand_type == OperandType::Normal && self.register.is_some()
    }

    /// True if this is an immediate operand
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        self.operand_type == OperandType::Normal && self.register.is_none() && self.value.is_some()
    }

    /// True if this is a memory operand
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.operand_type.is_pointer()
    }
}

/// One decoded or constructed x86 instruction.
///
/// The opcode reference pins the exact encoding, so an instruction decoded from
/// bytes re-encodes to the same bytes even where the catalogue holds several
/// encodings of the same operation.
///
/// # Examples
///
/// ```rust
/// use pescope::x86::{Instruction, Mnemonic, Operand, Register};
///
/// let instruction = Instruction::new(
///     Mnemonic::Add,
///     Some(Operand::reg(Register::Eax)),
///     Some(Operand::reg(Register::Ecx)),
///     None,
/// )?;
/// assert_eq!(instruction.mnemonic, Mnemonic::Add);
/// # Ok::<(), pescope::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    /// The catalogue record this instruction encodes with
    pub opcode: &'static OpCode,
    /// The operation
    pub mnemonic: Mnemonic,
    /// First operand
    pub operand1: Option<Operand>,
    /// Second operand
    pub operand2: Option<Operand>,
    /// Third operand
    pub operand3: Option<Operand>,
}

impl Instruction {
    /// Build an instruction, selecting the canonical opcode for the operand
    /// shapes from the catalogue.
    ///
    /// ## Arguments
    /// * 'mnemonic' - The operation
    /// * 'operand1' / 'operand2' / 'operand3' - The operands, in intel order
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidEncoding`] if the catalogue holds no
    /// encoding for the mnemonic with these operand shapes
    pub fn new(
        mnemonic: Mnemonic,
        operand1: Option<Operand>,
        operand2: Option<Operand>,
        operand3: Option<Operand>,
    ) -> Result<Instruction> {
        let opcode = select_opcode(mnemonic, operand1.as_ref(), operand2.as_ref(), operand3.as_ref())?;

        Ok(Instruction {
            opcode,
            mnemonic,
            operand1,
            operand2,
            operand3,
        })
    }

    /// Build an instruction from a specific catalogue record
    #[must_use]
    pub fn with_opcode(
        opcode: &'static OpCode,
        operand1: Option<Operand>,
        operand2: Option<Operand>,
        operand3: Option<Operand>,
    ) -> Instruction {
        Instruction {
            opcode,
            mnemonic: opcode.mnemonic,
            operand1,
            operand2,
            operand3,
        }
    }
}
