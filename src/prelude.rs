//! Convenient re-exports of the most commonly used types.

pub use crate::{
    metadata::{
        tables::{CodedIndex, CodedIndexType, TableId, TableRow},
        token::Token,
        NetDirectory,
    },
    pe::{
        DataDirectory, DataDirectoryType, Section, SectionFlags, SectionHeader,
    },
    segment::{BufferSegment, CompositeSegment, OffsetParams, PatchedSegment, Segment},
    x86::{
        Assembler, Disassembler, Formatter, Instruction, Mnemonic, Operand, OperandType, Register,
    },
    BufferPool, Error, MappingMode, Parser, PeImage, Result, Writer,
};
