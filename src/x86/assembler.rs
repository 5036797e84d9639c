//! Instruction encoding: prefixes, opcode bytes, ModR/M, SIB, displacement, immediate.

use crate::{
    x86::{
        instruction::{Instruction, Operand},
        opcode::{EncodingKind, ImmediateKind},
        register::Register,
    },
    Result, Writer,
};

/// Encodes instructions into a writer.
///
/// Emission order per instruction: legacy prefixes, opcode bytes, ModR/M byte
/// when the encoding demands one, SIB byte when the addressing form requires
/// it, displacement, immediate. The ModR/M selection rules:
///
/// - A register operand in the `r/m` slot encodes `mod = 11`.
/// - A pointer operand with no displacement and a base outside ESP/EBP
///   encodes `mod = 00`.
/// - EBP as base with no displacement forces `mod = 01` with `disp8 = 0`,
///   because `mod = 00, rm = 101` means absolute `disp32`.
/// - ESP as base (or any scaled index) forces a SIB byte.
/// - A displacement fitting a signed byte encodes `mod = 01`, otherwise
///   `mod = 10` with four displacement bytes.
///
/// # Examples
///
/// ```rust
/// use pescope::x86::{Assembler, Instruction, Mnemonic, Operand, OperandType, Register};
/// use pescope::Writer;
///
/// let instruction = Instruction::new(
///     Mnemonic::Add,
///     Some(Operand::mem(OperandType::DwordPointer, Register::Esp)),
///     Some(Operand::reg(Register::Eax)),
///     None,
/// )?;
///
/// let mut writer = Writer::new();
/// Assembler::new(&mut writer).emit(&instruction)?;
/// assert_eq!(writer.into_bytes(), vec![0x01, 0x04, 0x24]);
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct Assembler<'a> {
    writer: &'a mut Writer,
}

impl<'a> Assembler<'a> {
    /// Create an assembler emitting into `writer`
    pub fn new(writer: &'a mut Writer) -> Self {
        Assembler { writer }
    }

    /// Encode one instruction
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidEncoding`] if the operands do not fit the
    /// instruction's opcode record
    pub fn emit(&mut self, instruction: &Instruction) -> Result<()> {
        let opcode = instruction.opcode;

        if opcode.operand_size_prefix {
            self.writer.write_le::<u8>(0x66);
        }

        match opcode.encoding {
            EncodingKind::Plain => {
                self.write_opcode_bytes(opcode.bytes, 0);
            }
            EncodingKind::PlusReg => {
                let register = instruction
                    .operand1
                    .as_ref()
                    .and_then(|op| op.register)
                    .ok_or_else(|| {
                        invalid_encoding_error!("'{}' requires a register operand", opcode.mnemonic.name())
                    })?;

                self.write_opcode_bytes(opcode.bytes, register.index());
                self.write_immediate(opcode.immediate, instruction.operand2.as_ref())?;
            }
            EncodingKind::Imm | EncodingKind::Relative => {
                self.write_opcode_bytes(opcode.bytes, 0);
                self.write_immediate(opcode.immediate, instruction.operand1.as_ref())?;
            }
            EncodingKind::ModRm { flipped } => {
                let (Some(op1), Some(op2)) = (&instruction.operand1, &instruction.operand2) else {
                    return Err(invalid_encoding_error!(
                        "'{}' requires two operands",
                        opcode.mnemonic.name()
                    ));
                };

                let (reg_operand, rm_operand) = if flipped { (op1, op2) } else { (op2, op1) };
                let reg_field = reg_operand.register.ok_or_else(|| {
                    invalid_encoding_error!("'{}' requires a register operand", opcode.mnemonic.name())
                })?;

                self.write_opcode_bytes(opcode.bytes, 0);
                self.write_modrm(reg_field.index(), rm_operand)?;
                self.write_immediate(opcode.immediate, instruction.operand3.as_ref())?;
            }
            EncodingKind::ModRmExt { ext } => {
                let Some(op1) = &instruction.operand1 else {
                    return Err(invalid_encoding_error!(
                        "'{}' requires an r/m operand",
                        opcode.mnemonic.name()
                    ));
                };

                self.write_opcode_bytes(opcode.bytes, 0);
                self.write_modrm(ext, op1)?;
                self.write_immediate(opcode.immediate, instruction.operand2.as_ref())?;
            }
        }

        Ok(())
    }

    fn write_opcode_bytes(&mut self, bytes: &[u8], plus: u8) {
        if bytes.len() > 1 {
            self.writer.write_bytes(&bytes[..bytes.len() - 1]);
        }
        self.writer.write_le::<u8>(bytes[bytes.len() - 1] + plus);
    }

    fn write_immediate(&mut self, kind: ImmediateKind, operand: Option<&Operand>) -> Result<()> {
        if kind == ImmediateKind::None {
            return Ok(());
        }

        let value = operand.and_then(|op| op.value).ok_or_else(|| {
            invalid_encoding_error!("Missing immediate operand")
        })?;

        match kind {
            ImmediateKind::None => {}
            ImmediateKind::Byte => {
                if value > 0xFF {
                    return Err(invalid_encoding_error!(
                        "Immediate {:#x} does not fit one byte",
                        value
                    ));
                }
                self.writer.write_le::<u8>(value as u8);
            }
            ImmediateKind::ByteSigned => {
                let signed = value as i32;
                if !(-128..=127).contains(&signed) {
                    return Err(invalid_encoding_error!(
                        "Immediate {:#x} does not fit a sign-extended byte",
                        value
                    ));
                }
                self.writer.write_le::<i8>(signed as i8);
            }
            ImmediateKind::Word => {
                if value > 0xFFFF {
                    return Err(invalid_encoding_error!(
                        "Immediate {:#x} does not fit two bytes",
                        value
                    ));
                }
                self.writer.write_le::<u16>(value as u16);
            }
            ImmediateKind::Dword => self.writer.write_le::<u32>(value),
        }

        Ok(())
    }

    fn write_modrm(&mut self, reg_field: u8, rm: &Operand) -> Result<()> {
        // Register operand: mod = 11
        if rm.is_register() {
            let register = rm.register.expect("is_register checked");
            self.writer
                .write_le::<u8>(0xC0 | (reg_field << 3) | register.index());
            return Ok(());
        }

        if !rm.is_memory() {
            return Err(invalid_encoding_error!(
                "Operand is neither a register nor a memory reference"
            ));
        }

        if let Some((index, _)) = rm.index {
            if index == Register::Esp {
                return Err(invalid_encoding_error!("ESP cannot be a scaled index"));
            }
        }

        // Absolute address: mod = 00, rm = 101, disp32
        if rm.register.is_none() && rm.index.is_none() {
            self.writer.write_le::<u8>((reg_field << 3) | 0b101);
            self.writer
                .write_le::<u32>(rm.correction.unwrap_or(0) as u32);
            return Ok(());
        }

        let needs_sib = rm.index.is_some() || rm.register == Some(Register::Esp);

        // Index without base forces SIB with base = 101 and a disp32
        let index_only = rm.register.is_none();

        let (modbits, disp) = if index_only {
            (0b00_u8, DispEncoding::Dword(rm.correction.unwrap_or(0)))
        } else {
            match rm.correction {
                None | Some(0) if rm.register == Some(Register::Ebp) => {
                    // [ebp] has no mod=00 form
                    (0b01, DispEncoding::Byte(0))
                }
                None => (0b00, DispEncoding::None),
                Some(value) if (-128..=127).contains(&value) => {
                    (0b01, DispEncoding::Byte(value as i8))
                }
                Some(value) => (0b10, DispEncoding::Dword(value)),
            }
        };

        let rm_field = if needs_sib {
            0b100
        } else {
            rm.register.expect("base present without SIB").index()
        };

        self.writer
            .write_le::<u8>((modbits << 6) | (reg_field << 3) | rm_field);

        if needs_sib {
            let (index_field, scale_field) = match rm.index {
                Some((index, scale)) => (index.index(), scale.bits()),
                None => (0b100, 0),
            };
            let base_field = match rm.register {
                Some(base) => base.index(),
                None => 0b101,
            };

            self.writer
                .write_le::<u8>((scale_field << 6) | (index_field << 3) | base_field);
        }

        match disp {
            DispEncoding::None => {}
            DispEncoding::Byte(value) => self.writer.write_le::<i8>(value),
            DispEncoding::Dword(value) => self.writer.write_le::<i32>(value),
        }

        Ok(())
    }
}

enum DispEncoding {
    None,
    Byte(i8),
    Dword(i32),
}

/// Encode one instruction into a fresh byte vector
///
/// # Errors
/// See [`Assembler::emit`]
pub fn encode(instruction: &Instruction) -> Result<Vec<u8>> {
    let mut writer = Writer::new();
    Assembler::new(&mut writer).emit(instruction)?;
    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x86::{
        instruction::OperandType,
        opcode::Mnemonic,
        register::{Register, Scale},
    };

    fn encode_new(
        mnemonic: Mnemonic,
        op1: Option<Operand>,
        op2: Option<Operand>,
        op3: Option<Operand>,
    ) -> Vec<u8> {
        let instruction = Instruction::new(mnemonic, op1, op2, op3).unwrap();
        encode(&instruction).unwrap()
    }

    #[test]
    fn register_to_register() {
        let bytes = encode_new(
            Mnemonic::Add,
            Some(Operand::reg(Register::Eax)),
            Some(Operand::reg(Register::Ecx)),
            None,
        );
        // add eax, ecx: 01 /r with mod=11, reg=ecx, rm=eax
        assert_eq!(bytes, vec![0x01, 0xC8]);
    }

    #[test]
    fn esp_base_forces_sib() {
        let bytes = encode_new(
            Mnemonic::Add,
            Some(Operand::mem(OperandType::DwordPointer, Register::Esp)),
            Some(Operand::reg(Register::Eax)),
            None,
        );
        assert_eq!(bytes, vec![0x01, 0x04, 0x24]);
    }

    #[test]
    fn ebp_base_forces_disp8() {
        let bytes = encode_new(
            Mnemonic::Mov,
            Some(Operand::reg(Register::Eax)),
            Some(Operand::mem(OperandType::DwordPointer, Register::Ebp)),
            None,
        );
        // mov eax, [ebp]: 8B /r, mod=01, disp8=0
        assert_eq!(bytes, vec![0x8B, 0x45, 0x00]);
    }

    #[test]
    fn scaled_index_with_disp32() {
        let bytes = encode_new(
            Mnemonic::Add,
            Some(Operand::mem_index(
                OperandType::DwordPointer,
                Some(Register::Eax),
                Register::Ebp,
                Scale::One,
                Some(0x1337),
            )),
            Some(Operand::reg(Register::Ecx)),
            None,
        );
        assert_eq!(bytes, vec![0x01, 0x8C, 0x28, 0x37, 0x13, 0x00, 0x00]);
    }

    #[test]
    fn disp8_memory() {
        let bytes = encode_new(
            Mnemonic::Add,
            Some(Operand::mem_disp(
                OperandType::DwordPointer,
                Register::Ebx,
                -0x10,
            )),
            Some(Operand::reg(Register::Edx)),
            None,
        );
        // mod=01, reg=edx(010), rm=ebx(011), disp8 = -0x10
        assert_eq!(bytes, vec![0x01, 0x53, 0xF0]);
    }

    #[test]
    fn absolute_memory() {
        let bytes = encode_new(
            Mnemonic::Mov,
            Some(Operand::reg(Register::Eax)),
            Some(Operand::mem_absolute(OperandType::DwordPointer, 0x403000)),
            None,
        );
        // mov eax, [0x403000]: 8B 05 disp32
        assert_eq!(bytes, vec![0x8B, 0x05, 0x00, 0x30, 0x40, 0x00]);
    }

    #[test]
    fn immediate_forms() {
        // add eax, 0x10 -> 83 /0 imm8
        let bytes = encode_new(
            Mnemonic::Add,
            Some(Operand::reg(Register::Eax)),
            Some(Operand::imm(0x10)),
            None,
        );
        assert_eq!(bytes, vec![0x83, 0xC0, 0x10]);

        // add eax, 0x1337 -> 81 /0 imm32
        let bytes = encode_new(
            Mnemonic::Add,
            Some(Operand::reg(Register::Eax)),
            Some(Operand::imm(0x1337)),
            None,
        );
        assert_eq!(bytes, vec![0x81, 0xC0, 0x37, 0x13, 0x00, 0x00]);

        // mov edi, 0xCAFEBABE -> B8+7 imm32
        let bytes = encode_new(
            Mnemonic::Mov,
            Some(Operand::reg(Register::Edi)),
            Some(Operand::imm(0xCAFE_BABE)),
            None,
        );
        assert_eq!(bytes, vec![0xBF, 0xBE, 0xBA, 0xFE, 0xCA]);
    }

    #[test]
    fn word_pointer_gets_prefix() {
        // mov word [ebx], 0x1234 -> 66 C7 /0 imm16
        let bytes = encode_new(
            Mnemonic::Mov,
            Some(Operand::mem(OperandType::WordPointer, Register::Ebx)),
            Some(Operand::imm(0x1234)),
            None,
        );
        assert_eq!(bytes, vec![0x66, 0xC7, 0x03, 0x34, 0x12]);
    }

    #[test]
    fn byte_pointer_group() {
        // cmp byte [esi], 0x61 -> 80 /7 imm8
        let bytes = encode_new(
            Mnemonic::Cmp,
            Some(Operand::mem(OperandType::BytePointer, Register::Esi)),
            Some(Operand::imm(0x61)),
            None,
        );
        assert_eq!(bytes, vec![0x80, 0x3E, 0x61]);
    }

    #[test]
    fn two_byte_opcodes() {
        // movzx eax, byte [ecx] -> 0F B6 /r
        let bytes = encode_new(
            Mnemonic::Movzx,
            Some(Operand::reg(Register::Eax)),
            Some(Operand::mem(OperandType::BytePointer, Register::Ecx)),
            None,
        );
        assert_eq!(bytes, vec![0x0F, 0xB6, 0x01]);
    }

    #[test]
    fn three_operand_imul() {
        // imul eax, [ebx], 0x1000 -> 69 /r imm32
        let bytes = encode_new(
            Mnemonic::Imul,
            Some(Operand::reg(Register::Eax)),
            Some(Operand::mem(OperandType::DwordPointer, Register::Ebx)),
            Some(Operand::imm(0x1000)),
        );
        assert_eq!(bytes, vec![0x69, 0x03, 0x00, 0x10, 0x00, 0x00]);
    }

    #[test]
    fn plain_and_stack_forms() {
        assert_eq!(encode_new(Mnemonic::Ret, None, None, None), vec![0xC3]);
        assert_eq!(
            encode_new(Mnemonic::Push, Some(Operand::reg(Register::Esi)), None, None),
            vec![0x56]
        );
        assert_eq!(
            encode_new(Mnemonic::Pop, Some(Operand::reg(Register::Esi)), None, None),
            vec![0x5E]
        );
        assert_eq!(
            encode_new(Mnemonic::Inc, Some(Operand::reg(Register::Eax)), None, None),
            vec![0x40]
        );
        assert_eq!(
            encode_new(Mnemonic::Call, Some(Operand::imm(0x100)), None, None),
            vec![0xE8, 0x00, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn esp_index_is_rejected() {
        let instruction = Instruction::new(
            Mnemonic::Add,
            Some(Operand::mem_index(
                OperandType::DwordPointer,
                Some(Register::Eax),
                Register::Esp,
                Scale::One,
                None,
            )),
            Some(Operand::reg(Register::Ecx)),
            None,
        )
        .unwrap();

        assert!(matches!(
            encode(&instruction),
            Err(crate::Error::InvalidEncoding { .. })
        ));
    }
}
