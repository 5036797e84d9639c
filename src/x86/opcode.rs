//! The closed opcode catalogue and canonical opcode selection.

use crate::x86::instruction::Operand;
use crate::Result;

/// The operations covered by the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    /// Integer addition
    Add,
    /// Bitwise or
    Or,
    /// Bitwise and
    And,
    /// Integer subtraction
    Sub,
    /// Bitwise exclusive or
    Xor,
    /// Compare (subtract, discard result)
    Cmp,
    /// Logical compare (and, discard result)
    Test,
    /// Move
    Mov,
    /// Move with zero extension
    Movzx,
    /// Move with sign extension
    Movsx,
    /// Load effective address
    Lea,
    /// Signed multiply
    Imul,
    /// Push onto the stack
    Push,
    /// Pop from the stack
    Pop,
    /// Increment
    Inc,
    /// Decrement
    Dec,
    /// Near call
    Call,
    /// Near jump
    Jmp,
    /// Jump if equal
    Je,
    /// Jump if not equal
    Jne,
    /// Near return
    Ret,
    /// No operation
    Nop,
    /// Breakpoint
    Int3,
}

impl Mnemonic {
    /// The assembly name of this operation
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Mnemonic::Add => "add",
            Mnemonic::Or => "or",
            Mnemonic::And => "and",
            Mnemonic::Sub => "sub",
            Mnemonic::Xor => "xor",
            Mnemonic::Cmp => "cmp",
            Mnemonic::Test => "test",
            Mnemonic::Mov => "mov",
            Mnemonic::Movzx => "movzx",
            Mnemonic::Movsx => "movsx",
            Mnemonic::Lea => "lea",
            Mnemonic::Imul => "imul",
            Mnemonic::Push => "push",
            Mnemonic::Pop => "pop",
            Mnemonic::Inc => "inc",
            Mnemonic::Dec => "dec",
            Mnemonic::Call => "call",
            Mnemonic::Jmp => "jmp",
            Mnemonic::Je => "je",
            Mnemonic::Jne => "jne",
            Mnemonic::Ret => "ret",
            Mnemonic::Nop => "nop",
            Mnemonic::Int3 => "int3",
        }
    }
}

/// How an opcode encodes its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingKind {
    /// One ModR/M byte carrying two operands. `flipped` selects the direction:
    /// flipped means operand1 lives in the `reg` field, operand2 in `rm`
    ModRm {
        /// True for the `reg, r/m` direction
        flipped: bool,
    },
    /// One ModR/M byte whose `reg` field is the opcode extension; operand1 is
    /// the `r/m` operand, operand2 the immediate
    ModRmExt {
        /// The /digit opcode extension
        ext: u8,
    },
    /// The register is added to the last opcode byte
    PlusReg,
    /// A single immediate operand
    Imm,
    /// A single branch displacement operand
    Relative,
    /// No operands
    Plain,
}

/// Width and signedness of an opcode's trailing immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmediateKind {
    /// No immediate
    None,
    /// One unsigned byte
    Byte,
    /// One sign-extended byte
    ByteSigned,
    /// Two bytes
    Word,
    /// Four bytes
    Dword,
}

impl ImmediateKind {
    /// Amount of immediate bytes
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            ImmediateKind::None => 0,
            ImmediateKind::Byte | ImmediateKind::ByteSigned => 1,
            ImmediateKind::Word => 2,
            ImmediateKind::Dword => 4,
        }
    }
}

/// One record of the closed opcode catalogue.
#[derive(Debug, PartialEq, Eq)]
pub struct OpCode {
    /// The opcode bytes, 1 to 3
    pub bytes: &'static [u8],
    /// The operation
    pub mnemonic: Mnemonic,
    /// How operands are encoded
    pub encoding: EncodingKind,
    /// Width in bytes of the `r/m` (or sole) operand
    pub operand_size: u8,
    /// True if the 0x66 operand-size prefix is part of this encoding
    pub operand_size_prefix: bool,
    /// The trailing immediate, if any
    pub immediate: ImmediateKind,
}

impl OpCode {
    /// True if this opcode carries a ModR/M byte
    #[must_use]
    pub fn has_modrm(&self) -> bool {
        matches!(
            self.encoding,
            EncodingKind::ModRm { .. } | EncodingKind::ModRmExt { .. }
        )
    }
}

macro_rules! opcode {
    ($bytes:expr, $mnemonic:ident, $encoding:expr, $size:expr, $prefix:expr, $imm:ident) => {
        OpCode {
            bytes: $bytes,
            mnemonic: Mnemonic::$mnemonic,
            encoding: $encoding,
            operand_size: $size,
            operand_size_prefix: $prefix,
            immediate: ImmediateKind::$imm,
        }
    };
}

use EncodingKind::{Imm, ModRm, ModRmExt, Plain, PlusReg, Relative};

/// The catalogue. Order matters for canonical selection: within one mnemonic,
/// earlier entries win when several match the same operand shapes.
pub static OPCODES: &[OpCode] = &[
    // ALU, r/m32 <- r32 and r32 <- r/m32
    opcode!(&[0x01], Add, ModRm { flipped: false }, 4, false, None),
    opcode!(&[0x03], Add, ModRm { flipped: true }, 4, false, None),
    opcode!(&[0x09], Or, ModRm { flipped: false }, 4, false, None),
    opcode!(&[0x0B], Or, ModRm { flipped: true }, 4, false, None),
    opcode!(&[0x21], And, ModRm { flipped: false }, 4, false, None),
    opcode!(&[0x23], And, ModRm { flipped: true }, 4, false, None),
    opcode!(&[0x29], Sub, ModRm { flipped: false }, 4, false, None),
    opcode!(&[0x2B], Sub, ModRm { flipped: true }, 4, false, None),
    opcode!(&[0x31], Xor, ModRm { flipped: false }, 4, false, None),
    opcode!(&[0x33], Xor, ModRm { flipped: true }, 4, false, None),
    opcode!(&[0x39], Cmp, ModRm { flipped: false }, 4, false, None),
    opcode!(&[0x3B], Cmp, ModRm { flipped: true }, 4, false, None),
    opcode!(&[0x85], Test, ModRm { flipped: false }, 4, false, None),
    // ALU groups, r/m <- imm
    opcode!(&[0x83], Add, ModRmExt { ext: 0 }, 4, false, ByteSigned),
    opcode!(&[0x81], Add, ModRmExt { ext: 0 }, 4, false, Dword),
    opcode!(&[0x80], Add, ModRmExt { ext: 0 }, 1, false, Byte),
    opcode!(&[0x83], Or, ModRmExt { ext: 1 }, 4, false, ByteSigned),
    opcode!(&[0x81], Or, ModRmExt { ext: 1 }, 4, false, Dword),
    opcode!(&[0x80], Or, ModRmExt { ext: 1 }, 1, false, Byte),
    opcode!(&[0x83], And, ModRmExt { ext: 4 }, 4, false, ByteSigned),
    opcode!(&[0x81], And, ModRmExt { ext: 4 }, 4, false, Dword),
    opcode!(&[0x80], And, ModRmExt { ext: 4 }, 1, false, Byte),
    opcode!(&[0x83], Sub, ModRmExt { ext: 5 }, 4, false, ByteSigned),
    opcode!(&[0x81], Sub, ModRmExt { ext: 5 }, 4, false, Dword),
    opcode!(&[0x80], Sub, ModRmExt { ext: 5 }, 1, false, Byte),
    opcode!(&[0x83], Xor, ModRmExt { ext: 6 }, 4, false, ByteSigned),
    opcode!(&[0x81], Xor, ModRmExt { ext: 6 }, 4, false, Dword),
    opcode!(&[0x80], Xor, ModRmExt { ext: 6 }, 1, false, Byte),
    opcode!(&[0x83], Cmp, ModRmExt { ext: 7 }, 4, false, ByteSigned),
    opcode!(&[0x81], Cmp, ModRmExt { ext: 7 }, 4, false, Dword),
    opcode!(&[0x80], Cmp, ModRmExt { ext: 7 }, 1, false, Byte),
    // mov
    opcode!(&[0x89], Mov, ModRm { flipped: false }, 4, false, None),
    opcode!(&[0x8B], Mov, ModRm { flipped: true }, 4, false, None),
    opcode!(&[0xB8], Mov, PlusReg, 4, false, Dword),
    opcode!(&[0xC7], Mov, ModRmExt { ext: 0 }, 4, false, Dword),
    opcode!(&[0xC7], Mov, ModRmExt { ext: 0 }, 2, true, Word),
    opcode!(&[0xC6], Mov, ModRmExt { ext: 0 }, 1, false, Byte),
    // widening moves
    opcode!(&[0x0F, 0xB6], Movzx, ModRm { flipped: true }, 1, false, None),
    opcode!(&[0x0F, 0xB7], Movzx, ModRm { flipped: true }, 2, false, None),
    opcode!(&[0x0F, 0xBE], Movsx, ModRm { flipped: true }, 1, false, None),
    opcode!(&[0x0F, 0xBF], Movsx, ModRm { flipped: true }, 2, false, None),
    // lea
    opcode!(&[0x8D], Lea, ModRm { flipped: true }, 4, false, None),
    // imul r32, r/m32, imm
    opcode!(&[0x6B], Imul, ModRm { flipped: true }, 4, false, ByteSigned),
    opcode!(&[0x69], Imul, ModRm { flipped: true }, 4, false, Dword),
    // stack and counters
    opcode!(&[0x50], Push, PlusReg, 4, false, None),
    opcode!(&[0x58], Pop, PlusReg, 4, false, None),
    opcode!(&[0x6A], Push, Imm, 4, false, ByteSigned),
    opcode!(&[0x68], Push, Imm, 4, false, Dword),
    opcode!(&[0x40], Inc, PlusReg, 4, false, None),
    opcode!(&[0x48], Dec, PlusReg, 4, false, None),
    // control flow
    opcode!(&[0xE8], Call, Relative, 4, false, Dword),
    opcode!(&[0xEB], Jmp, Relative, 4, false, ByteSigned),
    opcode!(&[0xE9], Jmp, Relative, 4, false, Dword),
    opcode!(&[0x0F, 0x84], Je, Relative, 4, false, Dword),
    opcode!(&[0x0F, 0x85], Jne, Relative, 4, false, Dword),
    opcode!(&[0xC3], Ret, Plain, 4, false, None),
    opcode!(&[0x90], Nop, Plain, 4, false, None),
    opcode!(&[0xCC], Int3, Plain, 4, false, None),
];

fn fits_i8(value: u32) -> bool {
    let signed = value as i32;
    (-128..=127).contains(&signed)
}

/// True if `operand` can stand in the `r/m` slot of `opcode`
fn matches_rm(opcode: &OpCode, operand: &Operand) -> bool {
    if operand.is_memory() {
        return operand.operand_type.width() == Some(opcode.operand_size);
    }

    // Registers in the r/m slot are 32-bit in this catalogue
    operand.is_register() && opcode.operand_size == 4
}

fn matches_shape(
    opcode: &OpCode,
    operand1: Option<&Operand>,
    operand2: Option<&Operand>,
    operand3: Option<&Operand>,
) -> bool {
    match opcode.encoding {
        EncodingKind::Plain => operand1.is_none() && operand2.is_none() && operand3.is_none(),
        EncodingKind::PlusReg => {
            let Some(op1) = operand1 else { return false };
            if !op1.is_register() || operand3.is_some() {
                return false;
            }

            match opcode.immediate {
                ImmediateKind::None => operand2.is_none(),
                _ => operand2.is_some_and(Operand::is_immediate),
            }
        }
        EncodingKind::Imm | EncodingKind::Relative => {
            operand1.is_some_and(Operand::is_immediate)
                && operand2.is_none()
                && operand3.is_none()
        }
        EncodingKind::ModRm { flipped: false } => {
            let (Some(op1), Some(op2)) = (operand1, operand2) else {
                return false;
            };

            operand3.is_none() && op2.is_register() && matches_rm(opcode, op1)
        }
        EncodingKind::ModRm { flipped: true } => {
            let (Some(op1), Some(op2)) = (operand1, operand2) else {
                return false;
            };

            if !op1.is_register() {
                return false;
            }

            // lea and the widening moves require a memory source
            let rm_must_be_memory =
                opcode.mnemonic == Mnemonic::Lea || opcode.operand_size != 4;
            if rm_must_be_memory && !op2.is_memory() {
                return false;
            }

            let third_ok = match opcode.immediate {
                ImmediateKind::None => operand3.is_none(),
                _ => operand3.is_some_and(Operand::is_immediate),
            };

            third_ok && matches_rm(opcode, op2)
        }
        EncodingKind::ModRmExt { .. } => {
            let (Some(op1), Some(op2)) = (operand1, operand2) else {
                return false;
            };

            operand3.is_none() && op2.is_immediate() && matches_rm(opcode, op1)
        }
    }
}

/// The immediate this instruction shape would emit, used for width preference
fn immediate_value(
    opcode: &OpCode,
    operand1: Option<&Operand>,
    operand2: Option<&Operand>,
    operand3: Option<&Operand>,
) -> Option<u32> {
    match opcode.encoding {
        EncodingKind::Imm | EncodingKind::Relative => operand1.and_then(|op| op.value),
        EncodingKind::PlusReg | EncodingKind::ModRmExt { .. } => operand2.and_then(|op| op.value),
        EncodingKind::ModRm { .. } => operand3.and_then(|op| op.value),
        EncodingKind::Plain => None,
    }
}

/// Select the canonical catalogue record for a mnemonic and operand shapes.
///
/// Among matching records, a sign-extended byte immediate wins when the value
/// fits, otherwise catalogue order decides.
///
/// # Errors
/// Returns [`crate::Error::InvalidEncoding`] if nothing in the catalogue
/// encodes this combination
pub fn select_opcode(
    mnemonic: Mnemonic,
    operand1: Option<&Operand>,
    operand2: Option<&Operand>,
    operand3: Option<&Operand>,
) -> Result<&'static OpCode> {
    let mut fallback: Option<&'static OpCode> = None;

    for opcode in OPCODES {
        if opcode.mnemonic != mnemonic
            || !matches_shape(opcode, operand1, operand2, operand3)
        {
            continue;
        }

        match opcode.immediate {
            ImmediateKind::ByteSigned => {
                let value = immediate_value(opcode, operand1, operand2, operand3).unwrap_or(0);
                if fits_i8(value) {
                    return Ok(opcode);
                }
            }
            _ => {
                if fallback.is_none() {
                    fallback = Some(opcode);
                }
            }
        }
    }

    fallback.ok_or_else(|| {
        invalid_encoding_error!(
            "No encoding of '{}' accepts the given operands",
            mnemonic.name()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x86::{instruction::OperandType, Register};

    #[test]
    fn selects_mr_form_for_memory_destination() {
        let mem = Operand::mem(OperandType::DwordPointer, Register::Eax);
        let reg = Operand::reg(Register::Ecx);

        let opcode = select_opcode(Mnemonic::Add, Some(&mem), Some(&reg), None).unwrap();
        assert_eq!(opcode.bytes, &[0x01]);
    }

    #[test]
    fn selects_rm_form_for_memory_source() {
        let reg = Operand::reg(Register::Ecx);
        let mem = Operand::mem(OperandType::DwordPointer, Register::Eax);

        let opcode = select_opcode(Mnemonic::Add, Some(&reg), Some(&mem), None).unwrap();
        assert_eq!(opcode.bytes, &[0x03]);
    }

    #[test]
    fn register_pair_prefers_mr_form() {
        let a = Operand::reg(Register::Eax);
        let b = Operand::reg(Register::Ebx);

        let opcode = select_opcode(Mnemonic::Mov, Some(&a), Some(&b), None).unwrap();
        assert_eq!(opcode.bytes, &[0x89]);
    }

    #[test]
    fn immediate_width_preference() {
        let reg = Operand::reg(Register::Eax);

        let small = Operand::imm(0x10);
        let opcode = select_opcode(Mnemonic::Add, Some(&reg), Some(&small), None).unwrap();
        assert_eq!(opcode.bytes, &[0x83]);

        let large = Operand::imm(0x1337);
        let opcode = select_opcode(Mnemonic::Add, Some(&reg), Some(&large), None).unwrap();
        assert_eq!(opcode.bytes, &[0x81]);

        // -1 fits a sign-extended byte
        let negative = Operand::imm(0xFFFF_FFFF);
        let opcode = select_opcode(Mnemonic::Add, Some(&reg), Some(&negative), None).unwrap();
        assert_eq!(opcode.bytes, &[0x83]);
    }

    #[test]
    fn byte_pointer_selects_byte_group() {
        let mem = Operand::mem(OperandType::BytePointer, Register::Eax);
        let imm = Operand::imm(0xFF);

        let opcode = select_opcode(Mnemonic::Add, Some(&mem), Some(&imm), None).unwrap();
        assert_eq!(opcode.bytes, &[0x80]);
        assert_eq!(opcode.operand_size, 1);
    }

    #[test]
    fn word_mov_uses_prefixed_encoding() {
        let mem = Operand::mem(OperandType::WordPointer, Register::Ebx);
        let imm = Operand::imm(0x1234);

        let opcode = select_opcode(Mnemonic::Mov, Some(&mem), Some(&imm), None).unwrap();
        assert_eq!(opcode.bytes, &[0xC7]);
        assert!(opcode.operand_size_prefix);
        assert_eq!(opcode.immediate, ImmediateKind::Word);
    }

    #[test]
    fn mov_reg_imm_uses_plus_reg() {
        let reg = Operand::reg(Register::Edi);
        let imm = Operand::imm(0xCAFE_BABE);

        let opcode = select_opcode(Mnemonic::Mov, Some(&reg), Some(&imm), None).unwrap();
        assert_eq!(opcode.bytes, &[0xB8]);
        assert_eq!(opcode.encoding, EncodingKind::PlusReg);
    }

    #[test]
    fn no_encoding_for_impossible_shapes() {
        // Byte memory paired with a 32-bit register has no encoding here
        let mem = Operand::mem(OperandType::BytePointer, Register::Eax);
        let reg = Operand::reg(Register::Ecx);
        assert!(select_opcode(Mnemonic::Add, Some(&mem), Some(&reg), None).is_err());

        // Two memory operands never encode
        let mem2 = Operand::mem(OperandType::DwordPointer, Register::Ebx);
        assert!(select_opcode(Mnemonic::Mov, Some(&mem), Some(&mem2), None).is_err());
    }
}
