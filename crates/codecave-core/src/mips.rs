//! MIPS `jal` call-target decoding.

use crate::error::{Error, Result};

const JAL_OPCODE: u32 = 0b000011;

/// Decode the absolute target of a MIPS `jal` instruction.
///
/// `opcode` is the instruction's 4 little-endian bytes and `instr_addr` the
/// memory address the instruction lives at. The low 26 bits of the opcode
/// are a word count; shifted to a byte offset they combine with the upper 4
/// bits of the delay-slot address (`instr_addr + 4`, the MIPS current-segment
/// rule) to form the full 32-bit target.
///
/// Anything that is not a `jal` yields [`Error::NotAJalInstruction`]. That is
/// the expected outcome on arbitrary instructions; callers skip symbol
/// extraction rather than treating it as a failure.
pub fn jal_target(opcode: [u8; 4], instr_addr: u32) -> Result<u32> {
    let word = u32::from_le_bytes(opcode);
    if word >> 26 != JAL_OPCODE {
        return Err(Error::NotAJalInstruction(word));
    }

    let byte_offset = (word & 0x03FF_FFFF) << 2;
    let segment = instr_addr.wrapping_add(4) & 0xF000_0000;
    Ok(segment | byte_offset)
}
