pub mod mnemonics;

use std::io::Cursor;

use byteorder::{ReadBytesExt, BE};

use crate::errors::runtime::{RuntimeCause, RuntimeError};
use mnemonics::Mnemonic;

/// Immediate operands, decoded with the shape the opcode dictates. A `wide`
/// prefix is folded away during decoding: the instruction comes back under
/// the follower's mnemonic with 16-bit indices.
#[derive(Debug, Clone)]
pub enum Operands {
    None,
    /// Sign-extended immediate of bipush and sipush.
    Immediate(i32),
    /// Local-variable index.
    Var(u16),
    /// Constant-pool index.
    Pool(u16),
    /// Branch offset, relative to the address of the opcode.
    Branch(i32),
    Iinc {
        index: u16,
        delta: i32,
    },
    ArrayType(u8),
    InvokeInterface {
        index: u16,
        count: u8,
    },
    MultiArray {
        index: u16,
        dimensions: u8,
    },
    TableSwitch {
        default: i32,
        low: i32,
        offsets: Vec<i32>,
    },
    LookupSwitch {
        default: i32,
        pairs: Vec<(i32, i32)>,
    },
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub operands: Operands,
}

fn truncated(cursor: &Cursor<&[u8]>) -> RuntimeError {
    // Only reachable by branching into the middle of an instruction; the
    // shape of straight-line decoding was proven at load time.
    RuntimeError::new(
        RuntimeCause::BadJump(cursor.position() as usize),
        "instruction truncated",
    )
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, RuntimeError> {
    cursor.read_u8().map_err(|_| truncated(cursor))
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16, RuntimeError> {
    cursor.read_u16::<BE>().map_err(|_| truncated(cursor))
}

fn read_i32(cursor: &mut Cursor<&[u8]>) -> Result<i32, RuntimeError> {
    cursor.read_i32::<BE>().map_err(|_| truncated(cursor))
}

/// Skip to the next 4-byte boundary, counted from the start of the code.
fn align(cursor: &mut Cursor<&[u8]>) {
    let position = cursor.position();
    cursor.set_position(position + (4 - position % 4) % 4);
}

impl Instruction {
    /// Decode the instruction at `pc`. Returns the instruction and the
    /// address of the next one.
    pub fn decode(code: &[u8], pc: usize) -> Result<(Instruction, usize), RuntimeError> {
        let mut cursor = Cursor::new(code);
        cursor.set_position(pc as u64);
        let mut mnemonic = Mnemonic::from(read_u8(&mut cursor)?);
        let operands = match mnemonic {
            Mnemonic::Bipush => Operands::Immediate(read_u8(&mut cursor)? as i8 as i32),
            Mnemonic::Sipush => Operands::Immediate(read_u16(&mut cursor)? as i16 as i32),
            Mnemonic::Ldc => Operands::Pool(read_u8(&mut cursor)? as u16),
            Mnemonic::LdcW | Mnemonic::Ldc2W => Operands::Pool(read_u16(&mut cursor)?),
            Mnemonic::Iload
            | Mnemonic::Lload
            | Mnemonic::Fload
            | Mnemonic::Dload
            | Mnemonic::Aload
            | Mnemonic::Istore
            | Mnemonic::Lstore
            | Mnemonic::Fstore
            | Mnemonic::Dstore
            | Mnemonic::Astore
            | Mnemonic::Ret => Operands::Var(read_u8(&mut cursor)? as u16),
            Mnemonic::Iinc => Operands::Iinc {
                index: read_u8(&mut cursor)? as u16,
                delta: read_u8(&mut cursor)? as i8 as i32,
            },
            Mnemonic::Ifeq
            | Mnemonic::Ifne
            | Mnemonic::Iflt
            | Mnemonic::Ifge
            | Mnemonic::Ifgt
            | Mnemonic::Ifle
            | Mnemonic::IfIcmpeq
            | Mnemonic::IfIcmpne
            | Mnemonic::IfIcmplt
            | Mnemonic::IfIcmpge
            | Mnemonic::IfIcmpgt
            | Mnemonic::IfIcmple
            | Mnemonic::IfAcmpeq
            | Mnemonic::IfAcmpne
            | Mnemonic::Goto
            | Mnemonic::Jsr
            | Mnemonic::Ifnull
            | Mnemonic::Ifnonnull => Operands::Branch(read_u16(&mut cursor)? as i16 as i32),
            Mnemonic::GotoW | Mnemonic::JsrW => Operands::Branch(read_i32(&mut cursor)?),
            Mnemonic::Getstatic
            | Mnemonic::Putstatic
            | Mnemonic::Getfield
            | Mnemonic::Putfield
            | Mnemonic::Invokevirtual
            | Mnemonic::Invokespecial
            | Mnemonic::Invokestatic
            | Mnemonic::New
            | Mnemonic::Anewarray
            | Mnemonic::Checkcast
            | Mnemonic::Instanceof => Operands::Pool(read_u16(&mut cursor)?),
            Mnemonic::Invokeinterface => {
                let index = read_u16(&mut cursor)?;
                let count = read_u8(&mut cursor)?;
                let _zero = read_u8(&mut cursor)?;
                Operands::InvokeInterface { index, count }
            }
            Mnemonic::Invokedynamic => {
                let index = read_u16(&mut cursor)?;
                let _zero = read_u16(&mut cursor)?;
                Operands::Pool(index)
            }
            Mnemonic::Newarray => Operands::ArrayType(read_u8(&mut cursor)?),
            Mnemonic::Multianewarray => Operands::MultiArray {
                index: read_u16(&mut cursor)?,
                dimensions: read_u8(&mut cursor)?,
            },
            Mnemonic::Tableswitch => {
                align(&mut cursor);
                let default = read_i32(&mut cursor)?;
                let low = read_i32(&mut cursor)?;
                let high = read_i32(&mut cursor)?;
                let mut offsets = Vec::with_capacity((high as i64 - low as i64 + 1) as usize);
                for _ in low..=high {
                    offsets.push(read_i32(&mut cursor)?);
                }
                Operands::TableSwitch {
                    default,
                    low,
                    offsets,
                }
            }
            Mnemonic::Lookupswitch => {
                align(&mut cursor);
                let default = read_i32(&mut cursor)?;
                let npairs = read_i32(&mut cursor)?;
                let mut pairs = Vec::with_capacity(npairs.max(0) as usize);
                for _ in 0..npairs {
                    let key = read_i32(&mut cursor)?;
                    let offset = read_i32(&mut cursor)?;
                    pairs.push((key, offset));
                }
                Operands::LookupSwitch { default, pairs }
            }
            Mnemonic::Wide => {
                let follower = Mnemonic::from(read_u8(&mut cursor)?);
                mnemonic = follower;
                match follower {
                    Mnemonic::Iinc => Operands::Iinc {
                        index: read_u16(&mut cursor)?,
                        delta: read_u16(&mut cursor)? as i16 as i32,
                    },
                    _ => Operands::Var(read_u16(&mut cursor)?),
                }
            }
            _ => Operands::None,
        };
        Ok((Instruction { mnemonic, operands }, cursor.position() as usize))
    }
}
