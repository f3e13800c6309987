use std::error::Error;
use std::io::Cursor;

use crate::code;
use crate::constants::ConstantPool;
use crate::errors::class_decoding::{DecodeCause, DecodeError};
use crate::errors::class_format_check::{FormatCause, FormatError};
use crate::reader::{read_bytes, read_u2, read_u4};

/*
 * Every attribute starts with the same six bytes:
 *   attribute_name_index: u2   (must reference a Utf8 entry)
 *   attribute_length: u4       (length of the body, excluding these six)
 * The declared length is authoritative; a recognized attribute is parsed
 * from exactly that many bytes, and anything it does not consume is a
 * format error rather than silently skipped.
 */

#[derive(Clone, Debug)]
pub struct ExceptionTableEntry {
    /// Start of the range, inclusive, where the handler is active.
    pub start_pc: u16,
    /// End of the range, exclusive.
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Class entry of the caught type, or 0 to catch everything.
    pub catch_type: u16,
}

/// [Code attribute](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=117)
#[derive(Clone, Debug)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Clone, Debug)]
pub struct InnerClass {
    pub inner_class_info_index: u16,
    /// 0 when the class is not a member of another class.
    pub outer_class_info_index: u16,
    /// 0 when the class is anonymous.
    pub inner_name_index: u16,
    pub inner_class_access_flags: u16,
}

#[derive(Clone, Debug)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Clone, Debug)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

/// [Attributes](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A1244%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C564%2Cnull%5D)
///
/// The nine attributes this toolkit interprets; anything else is consumed by
/// its declared length and kept as `Unknown`.
#[derive(Clone, Debug)]
pub enum AttributeInfo {
    ConstantValue {
        constantvalue_index: u16,
    },
    Code(CodeAttribute),
    Exceptions {
        exception_index_table: Vec<u16>,
    },
    InnerClasses {
        classes: Vec<InnerClass>,
    },
    SourceFile {
        sourcefile_index: u16,
    },
    Synthetic,
    Deprecated,
    LineNumberTable {
        entries: Vec<LineNumberEntry>,
    },
    LocalVariableTable {
        entries: Vec<LocalVariableEntry>,
    },
    Unknown {
        name_index: u16,
    },
}

/// Linear search for the first `Code` attribute; a method's executable body.
pub fn find_code(attributes: &[AttributeInfo]) -> Option<&CodeAttribute> {
    attributes.iter().find_map(|attr| match attr {
        AttributeInfo::Code(code) => Some(code),
        _ => None,
    })
}

pub fn find_constant_value(attributes: &[AttributeInfo]) -> Option<u16> {
    attributes.iter().find_map(|attr| match attr {
        AttributeInfo::ConstantValue {
            constantvalue_index,
        } => Some(*constantvalue_index),
        _ => None,
    })
}

pub fn find_source_file(attributes: &[AttributeInfo]) -> Option<u16> {
    attributes.iter().find_map(|attr| match attr {
        AttributeInfo::SourceFile { sourcefile_index } => Some(*sourcefile_index),
        _ => None,
    })
}

pub fn find_line_numbers(attributes: &[AttributeInfo]) -> Option<&[LineNumberEntry]> {
    attributes.iter().find_map(|attr| match attr {
        AttributeInfo::LineNumberTable { entries } => Some(entries.as_slice()),
        _ => None,
    })
}

pub fn find_local_variables(attributes: &[AttributeInfo]) -> Option<&[LocalVariableEntry]> {
    attributes.iter().find_map(|attr| match attr {
        AttributeInfo::LocalVariableTable { entries } => Some(entries.as_slice()),
        _ => None,
    })
}

fn utf8_at<'a>(pool: &'a [ConstantPool], index: u16) -> Result<&'a crate::constants::Utf8, FormatError> {
    if index == 0 || index as usize >= pool.len() {
        return Err(FormatError::new(
            FormatCause::InvalidIndex(index),
            "attribute name index out of bounds",
        ));
    }
    match &pool[index as usize] {
        ConstantPool::Utf8(utf8) => Ok(utf8),
        _ => Err(FormatError::new(
            FormatCause::WrongTag {
                index,
                expected: "Utf8",
            },
            "attribute name index was not a Utf8 constant",
        )),
    }
}

fn read_exception_table(
    cursor: &mut Cursor<&[u8]>,
) -> Result<Vec<ExceptionTableEntry>, DecodeError> {
    let length = read_u2(cursor)?;
    let mut table = Vec::with_capacity(length as usize);
    for _ in 0..length {
        table.push(ExceptionTableEntry {
            start_pc: read_u2(cursor)?,
            end_pc: read_u2(cursor)?,
            handler_pc: read_u2(cursor)?,
            catch_type: read_u2(cursor)?,
        });
    }
    Ok(table)
}

fn read_code(
    pool: &[ConstantPool],
    cursor: &mut Cursor<&[u8]>,
) -> Result<CodeAttribute, Box<dyn Error>> {
    let max_stack = read_u2(cursor)?;
    let max_locals = read_u2(cursor)?;
    let code_length = read_u4(cursor)?;
    let bytes = read_bytes(cursor, code_length as usize)?;
    code::check_code(&bytes)?;
    let exception_table = read_exception_table(cursor)?;
    let attributes_count = read_u2(cursor)?;
    let attributes = read_attributes(pool, attributes_count, cursor)?;
    Ok(CodeAttribute {
        max_stack,
        max_locals,
        code: bytes,
        exception_table,
        attributes,
    })
}

/// Read `count` attributes, dispatching on the pool Utf8 the name index
/// points at. Each body is parsed from its own sub-cursor bounded by the
/// declared length.
pub fn read_attributes(
    pool: &[ConstantPool],
    count: u16,
    cursor: &mut Cursor<&[u8]>,
) -> Result<Vec<AttributeInfo>, Box<dyn Error>> {
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = read_u2(cursor)?;
        let length = read_u4(cursor)?;
        let name = std::string::String::from(utf8_at(pool, name_index)?);

        let data = *cursor.get_ref();
        let start = cursor.position() as usize;
        let end = start
            .checked_add(length as usize)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| {
                DecodeError::new(DecodeCause::Eof, "attribute body ends prematurely")
            })?;
        let mut body = Cursor::new(&data[start..end]);

        let attribute = match name.as_str() {
            "ConstantValue" => AttributeInfo::ConstantValue {
                constantvalue_index: read_u2(&mut body)?,
            },
            "Code" => AttributeInfo::Code(read_code(pool, &mut body)?),
            "Exceptions" => {
                let number = read_u2(&mut body)?;
                let mut table = Vec::with_capacity(number as usize);
                for _ in 0..number {
                    table.push(read_u2(&mut body)?);
                }
                AttributeInfo::Exceptions {
                    exception_index_table: table,
                }
            }
            "InnerClasses" => {
                let number = read_u2(&mut body)?;
                let mut classes = Vec::with_capacity(number as usize);
                for _ in 0..number {
                    classes.push(InnerClass {
                        inner_class_info_index: read_u2(&mut body)?,
                        outer_class_info_index: read_u2(&mut body)?,
                        inner_name_index: read_u2(&mut body)?,
                        inner_class_access_flags: read_u2(&mut body)?,
                    });
                }
                AttributeInfo::InnerClasses { classes }
            }
            "SourceFile" => AttributeInfo::SourceFile {
                sourcefile_index: read_u2(&mut body)?,
            },
            "Synthetic" => AttributeInfo::Synthetic,
            "Deprecated" => AttributeInfo::Deprecated,
            "LineNumberTable" => {
                let number = read_u2(&mut body)?;
                let mut entries = Vec::with_capacity(number as usize);
                for _ in 0..number {
                    entries.push(LineNumberEntry {
                        start_pc: read_u2(&mut body)?,
                        line_number: read_u2(&mut body)?,
                    });
                }
                AttributeInfo::LineNumberTable { entries }
            }
            "LocalVariableTable" => {
                let number = read_u2(&mut body)?;
                let mut entries = Vec::with_capacity(number as usize);
                for _ in 0..number {
                    entries.push(LocalVariableEntry {
                        start_pc: read_u2(&mut body)?,
                        length: read_u2(&mut body)?,
                        name_index: read_u2(&mut body)?,
                        descriptor_index: read_u2(&mut body)?,
                        index: read_u2(&mut body)?,
                    });
                }
                AttributeInfo::LocalVariableTable { entries }
            }
            _ => {
                log::debug!("skipping unknown attribute {name} ({length} bytes)");
                body.set_position(length as u64);
                AttributeInfo::Unknown { name_index }
            }
        };

        let consumed = body.position() as u32;
        if consumed != length {
            return Err(Box::new(FormatError::new(
                FormatCause::AttributeLength {
                    declared: length,
                    consumed,
                },
                &format!("attribute {name} does not fill its declared length"),
            )));
        }
        cursor.set_position(end as u64);
        attributes.push(attribute);
    }
    Ok(attributes)
}
