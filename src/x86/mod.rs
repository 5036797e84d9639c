//! x86 instruction encoding and decoding for rewriting tooling.
//!
//! This module implements a small 32-bit x86 codec around a closed opcode
//! catalogue: an [`Assembler`] emitting prefixes, opcode bytes, ModR/M, SIB,
//! displacement and immediate in order; a [`Disassembler`] performing the
//! exact inverse; and a FASM-dialect [`Formatter`].
//!
//! # Key Components
//!
//! - [`Instruction`] / [`Operand`] - The operand model, including scaled-index
//!   memory forms
//! - [`OpCode`] / [`OPCODES`] - The closed catalogue
//! - [`Assembler`] / [`Disassembler`] - Bidirectional, round-trip safe codec
//! - [`Formatter`] - Assembly text output
//!
//! # Round-trip guarantees
//!
//! Decoding remembers the exact catalogue record, so `encode(decode(bytes))`
//! reproduces canonical byte streams; `decode(encode(instruction))` yields the
//! instruction back for every encodable instruction.
//!
//! # Examples
//!
//! ```rust
//! use pescope::x86::{Assembler, Disassembler, Formatter, Instruction, Mnemonic, Operand, Register};
//! use pescope::{Parser, Writer};
//!
//! let instruction = Instruction::new(
//!     Mnemonic::Mov,
//!     Some(Operand::reg(Register::Eax)),
//!     Some(Operand::imm(0x42)),
//!     None,
//! )?;
//!
//! let mut writer = Writer::new();
//! Assembler::new(&mut writer).emit(&instruction)?;
//! let bytes = writer.into_bytes();
//!
//! let decoded = Disassembler::decode(&mut Parser::new(&bytes))?;
//! assert_eq!(Formatter::format(&decoded), "mov eax, 0x42");
//! # Ok::<(), pescope::Error>(())
//! ```

mod assembler;
mod disassembler;
mod formatter;
mod instruction;
mod opcode;
mod register;

pub use assembler::{encode, Assembler};
pub use disassembler::Disassembler;
pub use formatter::Formatter;
pub use instruction::{Instruction, Operand, OperandType};
pub use opcode::{EncodingKind, ImmediateKind, Mnemonic, OpCode, OPCODES};
pub use register::{Register, Scale};
