//! FASM-dialect instruction formatting.

use std::fmt::Write as _;

use crate::x86::instruction::{Instruction, Operand};

/// Formats instructions in FASM dialect: intel operand order, memory operands
/// as `dword [reg+index*scale+disp]`, immediates in hex.
///
/// # Examples
///
/// ```rust
/// use pescope::x86::{Formatter, Instruction, Mnemonic, Operand, OperandType, Register};
///
/// let instruction = Instruction::new(
///     Mnemonic::Add,
///     Some(Operand::mem_disp(OperandType::DwordPointer, Register::Eax, 0x1337)),
///     Some(Operand::reg(Register::Ecx)),
///     None,
/// )?;
/// assert_eq!(Formatter::format(&instruction), "add dword [eax+0x1337], ecx");
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct Formatter;

impl Formatter {
    /// Render one instruction as its assembly text
    #[must_use]
    pub fn format(instruction: &Instruction) -> String {
        let mut out = String::from(instruction.mnemonic.name());

        let operands = [
            &instruction.operand1,
            &instruction.operand2,
            &instruction.operand3,
        ];

        let mut first = true;
        for operand in operands.into_iter().flatten() {
            if first {
                out.push(' ');
                first = false;
            } else {
                out.push_str(", ");
            }
            Self::format_operand(&mut out, operand);
        }

        out
    }

    fn format_operand(out: &mut String, operand: &Operand) {
        if !operand.is_memory() {
            if let Some(register) = operand.register {
                out.push_str(register.name());
            } else if let Some(value) = operand.value {
                let _ = write!(out, "0x{value:x}");
            }
            return;
        }

        let _ = write!(out, "{} [", operand.operand_type.keyword());

        let mut need_plus = false;
        if let Some(base) = operand.register {
            out.push_str(base.name());
            need_plus = true;
        }

        if let Some((index, scale)) = operand.index {
            if need_plus {
                out.push('+');
            }
            out.push_str(index.name());
            if scale.factor() > 1 {
                let _ = write!(out, "*{}", scale.factor());
            }
            need_plus = true;
        }

        match operand.correction {
            Some(value) if value < 0 => {
                let _ = write!(out, "-0x{:x}", value.unsigned_abs());
            }
            Some(value) if value > 0 || !need_plus => {
                if need_plus {
                    out.push('+');
                }
                let _ = write!(out, "0x{value:x}");
            }
            _ => {}
        }

        out.push(']');
    }
}
