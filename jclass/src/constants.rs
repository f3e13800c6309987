use std::{io::Cursor, str::from_utf8};

use crate::errors::class_decoding::{DecodeCause, DecodeError};
use crate::reader::{read_bytes, read_u1, read_u2, read_u4};

/// [The Constant Pool](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A2201%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C256%2Cnull%5D)
///
/// One variant per constant tag, plus `Untagged` for the reserved slot 0 and
/// for the slot that follows a Long or Double entry.
#[derive(Clone, Debug)]
pub enum ConstantPool {
    Utf8(Utf8),
    Integer(Integer),
    Float(Float),
    Long(Long),
    Double(Double),
    Class(Class),
    String(String),
    Fieldref(Fieldref),
    Methodref(Methodref),
    InterfaceMethodref(InterfaceMethodref),
    NameAndType(NameAndType),
    MethodHandle(MethodHandle),
    MethodType(MethodType),
    InvokeDynamic(InvokeDynamic),
    Untagged,
}

impl ConstantPool {
    /// Tag name used by error messages and the disassembler.
    pub fn tag_name(&self) -> &'static str {
        match self {
            ConstantPool::Utf8(_) => "Utf8",
            ConstantPool::Integer(_) => "Integer",
            ConstantPool::Float(_) => "Float",
            ConstantPool::Long(_) => "Long",
            ConstantPool::Double(_) => "Double",
            ConstantPool::Class(_) => "Class",
            ConstantPool::String(_) => "String",
            ConstantPool::Fieldref(_) => "Fieldref",
            ConstantPool::Methodref(_) => "Methodref",
            ConstantPool::InterfaceMethodref(_) => "InterfaceMethodref",
            ConstantPool::NameAndType(_) => "NameAndType",
            ConstantPool::MethodHandle(_) => "MethodHandle",
            ConstantPool::MethodType(_) => "MethodType",
            ConstantPool::InvokeDynamic(_) => "InvokeDynamic",
            ConstantPool::Untagged => "Untagged",
        }
    }
}

#[repr(u8)]
pub enum Tags {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    Fieldref = 9,
    Methodref = 10,
    InterfaceMethodref = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    InvokeDynamic = 18,
}

#[derive(Clone)]
/// [Utf8 Constant](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A636%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C438%2Cnull%5D)
pub struct Utf8 {
    /// Number of bytes in the bytes array, not the length of the resulting
    /// string.
    pub length: u16,
    pub bytes: Vec<u8>,
}

impl Utf8 {
    pub fn read(cursor: &mut Cursor<&[u8]>) -> Result<Utf8, DecodeError> {
        let length = read_u2(cursor)?;
        let bytes = read_bytes(cursor, length as usize)?;
        Ok(Utf8 { length, bytes })
    }
}

impl From<&str> for Utf8 {
    fn from(input: &str) -> Self {
        Utf8 {
            length: input.len() as u16,
            bytes: input.as_bytes().to_vec(),
        }
    }
}

impl From<&Utf8> for std::string::String {
    fn from(value: &Utf8) -> Self {
        // Modified UTF-8 oddities (embedded NULs, surrogate encodings) fall
        // back to a lossy conversion rather than failing the whole class.
        match from_utf8(&value.bytes) {
            Ok(s) => s.into(),
            Err(_) => std::string::String::from_utf8_lossy(&value.bytes).into_owned(),
        }
    }
}

impl std::fmt::Debug for Utf8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", std::string::String::from(self))
    }
}

#[derive(Clone, Debug)]
/// Big-endian `int` constant payload.
pub struct Integer {
    pub bytes: u32,
}

impl Integer {
    pub fn value(&self) -> i32 {
        self.bytes as i32
    }
}

#[derive(Clone, Debug)]
/// IEEE 754 binary32 payload, stored as its raw bits.
pub struct Float {
    pub bytes: u32,
}

impl Float {
    pub fn value(&self) -> f32 {
        f32::from_bits(self.bytes)
    }
}

#[derive(Clone, Debug)]
/// [Long Constant](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A458%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C564%2Cnull%5D)
///
/// `((long) high_bytes << 32) + low_bytes`. Takes up two pool slots; the
/// second is recorded as `Untagged`.
pub struct Long {
    pub high_bytes: u32,
    pub low_bytes: u32,
}

impl Long {
    pub fn value(&self) -> i64 {
        (((self.high_bytes as u64) << 32) | self.low_bytes as u64) as i64
    }
}

#[derive(Clone, Debug)]
/// IEEE 754 binary64 payload split over two big-endian words, like `Long`.
pub struct Double {
    pub high_bytes: u32,
    pub low_bytes: u32,
}

impl Double {
    pub fn value(&self) -> f64 {
        f64::from_bits(((self.high_bytes as u64) << 32) | self.low_bytes as u64)
    }
}

#[derive(Clone, Debug)]
/// `name_index` must reference a Utf8 entry holding a class or interface
/// name in internal form.
pub struct Class {
    pub name_index: u16,
}

#[derive(Clone, Debug)]
/// `string_index` must reference a Utf8 entry.
pub struct String {
    pub string_index: u16,
}

#[derive(Clone, Debug)]
/// `class_index` must reference a Class entry; `name_and_type_index` a
/// NameAndType entry whose descriptor is a field descriptor.
pub struct Fieldref {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug)]
/// Like `Fieldref`, but the NameAndType descriptor must be a method
/// descriptor; an `<init>` target must return void.
pub struct Methodref {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug)]
pub struct InterfaceMethodref {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug)]
/// `name_index` and `descriptor_index` must both reference Utf8 entries; the
/// descriptor may be of either kind.
pub struct NameAndType {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// [MethodHandle kinds](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A2552%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C278%2Cnull%5D)
pub enum MethodHandleKind {
    GetField = 1,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl MethodHandleKind {
    pub fn from_u8(value: u8) -> Option<MethodHandleKind> {
        Some(match value {
            1 => MethodHandleKind::GetField,
            2 => MethodHandleKind::GetStatic,
            3 => MethodHandleKind::PutField,
            4 => MethodHandleKind::PutStatic,
            5 => MethodHandleKind::InvokeVirtual,
            6 => MethodHandleKind::InvokeStatic,
            7 => MethodHandleKind::InvokeSpecial,
            8 => MethodHandleKind::NewInvokeSpecial,
            9 => MethodHandleKind::InvokeInterface,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug)]
/// `reference_kind` decides which ref tag `reference_index` must point at;
/// checked during format checking, where the class file version also comes
/// into play for kinds 6 and 7.
pub struct MethodHandle {
    /// Raw kind byte; values outside 1..=9 are rejected by the format check.
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Clone, Debug)]
/// `descriptor_index` must reference a Utf8 entry holding a method
/// descriptor.
pub struct MethodType {
    pub descriptor_index: u16,
}

#[derive(Clone, Debug)]
pub struct InvokeDynamic {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

/// First decoding pass: read `count - 1` entries, keeping slot 0 reserved
/// and marking the slot after each Long/Double `Untagged`. Cross-reference
/// checks happen later, once the whole pool exists.
pub fn read_constant_pool(
    count: u16,
    cursor: &mut Cursor<&[u8]>,
) -> Result<Vec<ConstantPool>, DecodeError> {
    let mut pool = Vec::with_capacity(count as usize);
    if count == 0 {
        return Ok(pool);
    }
    pool.push(ConstantPool::Untagged);
    let mut i = 1;
    while i < count {
        let tag = read_u1(cursor)?;
        let entry = match tag {
            t if t == Tags::Utf8 as u8 => ConstantPool::Utf8(Utf8::read(cursor)?),
            t if t == Tags::Integer as u8 => ConstantPool::Integer(Integer {
                bytes: read_u4(cursor)?,
            }),
            t if t == Tags::Float as u8 => ConstantPool::Float(Float {
                bytes: read_u4(cursor)?,
            }),
            t if t == Tags::Long as u8 => ConstantPool::Long(Long {
                high_bytes: read_u4(cursor)?,
                low_bytes: read_u4(cursor)?,
            }),
            t if t == Tags::Double as u8 => ConstantPool::Double(Double {
                high_bytes: read_u4(cursor)?,
                low_bytes: read_u4(cursor)?,
            }),
            t if t == Tags::Class as u8 => ConstantPool::Class(Class {
                name_index: read_u2(cursor)?,
            }),
            t if t == Tags::String as u8 => ConstantPool::String(String {
                string_index: read_u2(cursor)?,
            }),
            t if t == Tags::Fieldref as u8 => ConstantPool::Fieldref(Fieldref {
                class_index: read_u2(cursor)?,
                name_and_type_index: read_u2(cursor)?,
            }),
            t if t == Tags::Methodref as u8 => ConstantPool::Methodref(Methodref {
                class_index: read_u2(cursor)?,
                name_and_type_index: read_u2(cursor)?,
            }),
            t if t == Tags::InterfaceMethodref as u8 => {
                ConstantPool::InterfaceMethodref(InterfaceMethodref {
                    class_index: read_u2(cursor)?,
                    name_and_type_index: read_u2(cursor)?,
                })
            }
            t if t == Tags::NameAndType as u8 => ConstantPool::NameAndType(NameAndType {
                name_index: read_u2(cursor)?,
                descriptor_index: read_u2(cursor)?,
            }),
            t if t == Tags::MethodHandle as u8 => ConstantPool::MethodHandle(MethodHandle {
                reference_kind: read_u1(cursor)?,
                reference_index: read_u2(cursor)?,
            }),
            t if t == Tags::MethodType as u8 => ConstantPool::MethodType(MethodType {
                descriptor_index: read_u2(cursor)?,
            }),
            t if t == Tags::InvokeDynamic as u8 => ConstantPool::InvokeDynamic(InvokeDynamic {
                bootstrap_method_attr_index: read_u2(cursor)?,
                name_and_type_index: read_u2(cursor)?,
            }),
            _ => {
                return Err(DecodeError::new(
                    DecodeCause::InvalidConstantTag(tag),
                    &format!("constant pool entry {i}"),
                ))
            }
        };
        let two_slots = matches!(entry, ConstantPool::Long(_) | ConstantPool::Double(_));
        pool.push(entry);
        i += 1;
        if two_slots {
            // 8-byte constants take up two entries; the second is unusable.
            if i < count {
                pool.push(ConstantPool::Untagged);
            }
            i += 1;
        }
    }
    Ok(pool)
}
