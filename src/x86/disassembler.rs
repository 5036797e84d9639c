//! Instruction decoding: the exact inverse of the assembler.

use crate::{
    x86::{
        instruction::{Instruction, Operand, OperandType},
        opcode::{EncodingKind, ImmediateKind, OpCode, OPCODES},
        register::{Register, Scale},
    },
    Parser, Result,
};

/// Decodes instructions from a byte stream.
///
/// The decoder reads the opcode, fetches its catalogue record, then consumes
/// ModR/M, SIB, displacement, and immediate exactly as the record demands.
/// Operands come out canonical: SIB forms are resolved into base plus scaled
/// index, displacements into their signed value. An instruction remembers the
/// record it decoded from, so re-encoding reproduces the input bytes.
///
/// # Examples
///
/// ```rust
/// use pescope::x86::{Disassembler, Mnemonic};
/// use pescope::Parser;
///
/// let mut parser = Parser::new(&[0x01, 0x04, 0x24]); // add [esp], eax
/// let instruction = Disassembler::decode(&mut parser)?;
/// assert_eq!(instruction.mnemonic, Mnemonic::Add);
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct Disassembler;

impl Disassembler {
    /// Decode one instruction at the parser's current position
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidEncoding`] for opcode bytes outside the
    /// catalogue and [`crate::Error::OutOfBounds`] for truncated streams
    pub fn decode(parser: &mut Parser) -> Result<Instruction> {
        let mut prefixed = false;
        let mut first = parser.read_le::<u8>()?;
        if first == 0x66 {
            prefixed = true;
            first = parser.read_le::<u8>()?;
        }

        let opcode = Self::lookup(parser, prefixed, first)?;

        match opcode.encoding {
            EncodingKind::Plain => Ok(Instruction::with_opcode(opcode, None, None, None)),
            EncodingKind::PlusReg => {
                let register = Register::from_index(first - opcode.bytes[0])
                    .expect("lookup bounds the register index");
                let operand2 = Self::read_immediate(parser, opcode.immediate)?;

                Ok(Instruction::with_opcode(
                    opcode,
                    Some(Operand::reg(register)),
                    operand2,
                    None,
                ))
            }
            EncodingKind::Imm | EncodingKind::Relative => {
                let operand1 = Self::read_immediate(parser, opcode.immediate)?;
                Ok(Instruction::with_opcode(opcode, operand1, None, None))
            }
            EncodingKind::ModRm { flipped } => {
                let (reg_field, rm_operand) = Self::read_modrm(parser, opcode)?;
                let reg_operand = Operand::reg(
                    Register::from_index(reg_field).expect("3-bit field"),
                );

                let (operand1, operand2) = if flipped {
                    (reg_operand, rm_operand)
                } else {
                    (rm_operand, reg_operand)
                };
                let operand3 = Self::read_immediate(parser, opcode.immediate)?;

                Ok(Instruction::with_opcode(
                    opcode,
                    Some(operand1),
                    Some(operand2),
                    operand3,
                ))
            }
            EncodingKind::ModRmExt { ext } => {
                let (reg_field, rm_operand) = Self::read_modrm(parser, opcode)?;
                debug_assert_eq!(reg_field, ext);

                let operand2 = Self::read_immediate(parser, opcode.immediate)?;

                Ok(Instruction::with_opcode(
                    opcode,
                    Some(rm_operand),
                    operand2,
                    None,
                ))
            }
        }
    }

    /// Decode a sequence of instructions until the stream is exhausted
    ///
    /// # Errors
    /// See [`Disassembler::decode`]
    pub fn decode_stream(parser: &mut Parser) -> Result<Vec<Instruction>> {
        let mut instructions = Vec::new();
        while parser.has_more_data() {
            instructions.push(Self::decode(parser)?);
        }
        Ok(instructions)
    }

    fn lookup(parser: &mut Parser, prefixed: bool, first: u8) -> Result<&'static OpCode> {
        // Two-byte opcodes all start with 0x0F
        let bytes: [u8; 2] = if first == 0x0F {
            [first, parser.read_le::<u8>()?]
        } else {
            [first, 0]
        };
        let opcode_len = if first == 0x0F { 2 } else { 1 };

        // Group opcodes need the ModR/M reg field to disambiguate
        let mut ext: Option<u8> = None;

        for opcode in OPCODES {
            if opcode.operand_size_prefix != prefixed || opcode.bytes.len() != opcode_len {
                continue;
            }

            let matches = match opcode.encoding {
                EncodingKind::PlusReg => {
                    opcode_len == 1
                        && first >= opcode.bytes[0]
                        && first - opcode.bytes[0] < 8
                }
                _ => opcode.bytes == &bytes[..opcode_len],
            };
            if !matches {
                continue;
            }

            if let EncodingKind::ModRmExt { ext: wanted } = opcode.encoding {
                let seen = match ext {
                    Some(value) => value,
                    None => {
                        let value = (parser.peek_byte()? >> 3) & 0b111;
                        ext = Some(value);
                        value
                    }
                };

                if seen != wanted {
                    continue;
                }
            }

            return Ok(opcode);
        }

        Err(invalid_encoding_error!(
            "Unknown opcode {:02X?}",
            &bytes[..opcode_len]
        ))
    }

    fn read_immediate(parser: &mut Parser, kind: ImmediateKind) -> Result<Option<Operand>> {
        let value = match kind {
            ImmediateKind::None => return Ok(None),
            ImmediateKind::Byte => u32::from(parser.read_le::<u8>()?),
            ImmediateKind::ByteSigned => parser.read_le::<i8>()? as i32 as u32,
            ImmediateKind::Word => u32::from(parser.read_le::<u16>()?),
            ImmediateKind::Dword => parser.read_le::<u32>()?,
        };

        Ok(Some(Operand::imm(value)))
    }

    fn read_modrm(parser: &mut Parser, opcode: &'static OpCode) -> Result<(u8, Operand)> {
        let modrm = parser.read_le::<u8>()?;
        let modbits = modrm >> 6;
        let reg_field = (modrm >> 3) & 0b111;
        let rm_field = modrm & 0b111;

        if modbits == 0b11 {
            // Register operand; only 32-bit registers are representable
            if opcode.operand_size != 4 {
                return Err(invalid_encoding_error!(
                    "Sub-dword register operands are not representable"
                ));
            }

            let register = Register::from_index(rm_field).expect("3-bit field");
            return Ok((reg_field, Operand::reg(register)));
        }

        let pointer = OperandType::from_width(opcode.operand_size);

        // Absolute disp32, no base
        if modbits == 0b00 && rm_field == 0b101 {
            let address = parser.read_le::<u32>()?;
            return Ok((reg_field, Operand::mem_absolute(pointer, address)));
        }

        let (base, index) = if rm_field == 0b100 {
            let sib = parser.read_le::<u8>()?;
            let scale = Scale::from_bits(sib >> 6).expect("2-bit field");
            let index_field = (sib >> 3) & 0b111;
            let base_field = sib & 0b111;

            let index = if index_field == 0b100 {
                None
            } else {
                Some((
                    Register::from_index(index_field).expect("3-bit field"),
                    scale,
                ))
            };

            let base = if base_field == 0b101 && modbits == 0b00 {
                None
            } else {
                Some(Register::from_index(base_field).expect("3-bit field"))
            };

            (base, index)
        } else {
            (Some(Register::from_index(rm_field).expect("3-bit field")), None)
        };

        let correction = match modbits {
            0b00 => {
                if base.is_none() {
                    // SIB with base = 101: disp32 follows
                    Some(parser.read_le::<i32>()?)
                } else {
                    None
                }
            }
            0b01 => {
                let disp = i32::from(parser.read_le::<i8>()?);
                // [ebp] is canonically encoded as mod=01 disp8=0
                if disp == 0 && base == Some(Register::Ebp) && index.is_none() {
                    None
                } else {
                    Some(disp)
                }
            }
            _ => Some(parser.read_le::<i32>()?),
        };

        let operand = Operand {
            operand_type: pointer,
            register: base,
            index,
            value: None,
            correction,
        };

        Ok((reg_field, operand))
    }
}
