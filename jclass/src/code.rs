//! Structural check of a `Code` attribute's instruction stream: one walk
//! over the bytes, honoring every variable-length shape, that must land
//! exactly on the end of the array. Runs once at decode time; the
//! interpreter relies on it and never re-validates shapes.

use crate::errors::class_format_check::{FormatCause, FormatError};

pub const WIDE: u8 = 0xC4;
pub const TABLESWITCH: u8 = 0xAA;
pub const LOOKUPSWITCH: u8 = 0xAB;

/// Immediate-operand byte count for fixed-shape opcodes. `None` for values
/// outside the instruction set (the three variable-shape opcodes are handled
/// by the walker before consulting this table).
pub fn fixed_operands(op: u8) -> Option<usize> {
    Some(match op {
        // nop, aconst_null .. dconst_1
        0x00..=0x0F => 0,
        // bipush
        0x10 => 1,
        // sipush
        0x11 => 2,
        // ldc
        0x12 => 1,
        // ldc_w, ldc2_w
        0x13 | 0x14 => 2,
        // iload .. aload
        0x15..=0x19 => 1,
        // iload_0 .. aload_3, array loads
        0x1A..=0x35 => 0,
        // istore .. astore
        0x36..=0x3A => 1,
        // istore_0 .. astore_3, array stores, stack ops, arithmetic,
        // shifts, bitwise
        0x3B..=0x83 => 0,
        // iinc
        0x84 => 2,
        // conversions, comparisons
        0x85..=0x98 => 0,
        // ifeq .. if_acmpne, goto, jsr
        0x99..=0xA8 => 2,
        // ret
        0xA9 => 1,
        // ireturn .. return
        0xAC..=0xB1 => 0,
        // getstatic, putstatic, getfield, putfield
        0xB2..=0xB5 => 2,
        // invokevirtual, invokespecial, invokestatic
        0xB6..=0xB8 => 2,
        // invokeinterface, invokedynamic
        0xB9 | 0xBA => 4,
        // new
        0xBB => 2,
        // newarray
        0xBC => 1,
        // anewarray
        0xBD => 2,
        // arraylength, athrow
        0xBE | 0xBF => 0,
        // checkcast, instanceof
        0xC0 | 0xC1 => 2,
        // monitorenter, monitorexit
        0xC2 | 0xC3 => 0,
        // multianewarray
        0xC5 => 3,
        // ifnull, ifnonnull
        0xC6 | 0xC7 => 2,
        // goto_w, jsr_w
        0xC8 | 0xC9 => 4,
        _ => return None,
    })
}

fn bad(pc: usize, opcode: u8, msg: &str) -> FormatError {
    FormatError::new(FormatCause::BadCode { pc, opcode }, msg)
}

fn skip(code: &[u8], pc: &mut usize, count: usize, at: usize, op: u8) -> Result<(), FormatError> {
    if code.len() - *pc < count {
        return Err(bad(at, op, "instruction runs past the end of the code"));
    }
    *pc += count;
    Ok(())
}

fn read_i32(code: &[u8], pc: &mut usize, at: usize, op: u8) -> Result<i32, FormatError> {
    if code.len() - *pc < 4 {
        return Err(bad(at, op, "instruction runs past the end of the code"));
    }
    let v = i32::from_be_bytes([code[*pc], code[*pc + 1], code[*pc + 2], code[*pc + 3]]);
    *pc += 4;
    Ok(v)
}

/// Walk the instruction stream once; succeed only if the walk finishes
/// exactly at `code.len()`.
pub fn check_code(code: &[u8]) -> Result<(), FormatError> {
    let mut pc = 0usize;
    while pc < code.len() {
        let at = pc;
        let op = code[pc];
        pc += 1;
        match op {
            TABLESWITCH => {
                let pad = (4 - pc % 4) % 4;
                skip(code, &mut pc, pad, at, op)?;
                let _default = read_i32(code, &mut pc, at, op)?;
                let low = read_i32(code, &mut pc, at, op)?;
                let high = read_i32(code, &mut pc, at, op)?;
                if low > high {
                    return Err(bad(at, op, "tableswitch with low above high"));
                }
                let entries = (high as i64 - low as i64 + 1) as usize;
                skip(code, &mut pc, entries.checked_mul(4).unwrap_or(usize::MAX), at, op)?;
            }
            LOOKUPSWITCH => {
                let pad = (4 - pc % 4) % 4;
                skip(code, &mut pc, pad, at, op)?;
                let _default = read_i32(code, &mut pc, at, op)?;
                let npairs = read_i32(code, &mut pc, at, op)?;
                if npairs < 0 {
                    return Err(bad(at, op, "lookupswitch with negative npairs"));
                }
                skip(
                    code,
                    &mut pc,
                    (npairs as usize).checked_mul(8).unwrap_or(usize::MAX),
                    at,
                    op,
                )?;
            }
            WIDE => {
                if pc >= code.len() {
                    return Err(bad(at, op, "wide at the end of the code"));
                }
                let follower = code[pc];
                pc += 1;
                match follower {
                    // iload .. aload, istore .. astore, ret: 16-bit index
                    0x15..=0x19 | 0x36..=0x3A | 0xA9 => skip(code, &mut pc, 2, at, op)?,
                    // iinc: 16-bit index and 16-bit increment
                    0x84 => skip(code, &mut pc, 4, at, op)?,
                    _ => return Err(bad(at, follower, "opcode not allowed after wide")),
                }
            }
            _ => match fixed_operands(op) {
                Some(count) => skip(code, &mut pc, count, at, op)?,
                None => return Err(bad(at, op, "not a JVM opcode")),
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_code() {
        // iconst_2, istore_1, iload_1, ireturn
        assert!(check_code(&[0x05, 0x3C, 0x1B, 0xAC]).is_ok());
    }

    #[test]
    fn truncated_immediate() {
        // bipush with no operand byte
        assert!(check_code(&[0x10]).is_err());
        // getstatic with only one index byte
        assert!(check_code(&[0xB2, 0x00]).is_err());
    }

    #[test]
    fn undefined_opcode() {
        assert!(check_code(&[0xCB, 0xB1]).is_err());
        // breakpoint is reserved and never valid in a class file
        assert!(check_code(&[0xCA]).is_err());
    }

    #[test]
    fn tableswitch_shape() {
        // tableswitch at 0: 3 pad bytes, default=8, low=0, high=1,
        // two offsets
        let mut code = vec![TABLESWITCH, 0, 0, 0];
        code.extend_from_slice(&8i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&1i32.to_be_bytes());
        code.extend_from_slice(&16i32.to_be_bytes());
        code.extend_from_slice(&20i32.to_be_bytes());
        assert!(check_code(&code).is_ok());
    }

    #[test]
    fn tableswitch_low_above_high() {
        let mut code = vec![TABLESWITCH, 0, 0, 0];
        code.extend_from_slice(&8i32.to_be_bytes());
        code.extend_from_slice(&3i32.to_be_bytes());
        code.extend_from_slice(&1i32.to_be_bytes());
        assert!(check_code(&code).is_err());
    }

    #[test]
    fn lookupswitch_negative_npairs() {
        let mut code = vec![LOOKUPSWITCH, 0, 0, 0];
        code.extend_from_slice(&8i32.to_be_bytes());
        code.extend_from_slice(&(-1i32).to_be_bytes());
        assert!(check_code(&code).is_err());
    }

    #[test]
    fn switch_padding_depends_on_offset() {
        // a nop first shifts the opcode to 1, leaving 2 pad bytes
        let mut code = vec![0x00, LOOKUPSWITCH, 0, 0];
        code.extend_from_slice(&8i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        assert!(check_code(&code).is_ok());
    }

    #[test]
    fn wide_followers() {
        // wide iload 256
        assert!(check_code(&[WIDE, 0x15, 0x01, 0x00]).is_ok());
        // wide iinc 5 by -1
        assert!(check_code(&[WIDE, 0x84, 0x00, 0x05, 0xFF, 0xFF]).is_ok());
        // wide may not prefix an arbitrary opcode
        assert!(check_code(&[WIDE, 0x10, 0x00, 0x00]).is_err());
    }

    #[test]
    fn walk_must_end_exactly() {
        // valid prefix, then a stray half instruction
        assert!(check_code(&[0x05, 0x3C, 0x11, 0x00]).is_err());
        assert!(check_code(&[]).is_ok());
    }
}
