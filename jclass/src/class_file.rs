use std::error::Error;
use std::io::Cursor;

use crate::access_flags::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
use crate::attributes::{self, AttributeInfo, CodeAttribute};
use crate::constants::{self, ConstantPool};
use crate::descriptors;
use crate::errors::class_format_check::{FormatCause, FormatError};
use crate::reader::{read_u2, read_u4};

const MAGIC: u32 = 0xCAFEBABE;

/// [Fields](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A721%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C564%2Cnull%5D)
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub access_flags: Vec<FieldAccessFlags>,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes_count: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl FieldInfo {
    fn read(
        cursor: &mut Cursor<&[u8]>,
        constant_pool: &[ConstantPool],
    ) -> Result<FieldInfo, Box<dyn Error>> {
        let flags = read_u2(cursor)?;
        let name_index = read_u2(cursor)?;
        let descriptor_index = read_u2(cursor)?;
        let attributes_count = read_u2(cursor)?;
        let attributes = attributes::read_attributes(constant_pool, attributes_count, cursor)?;
        Ok(FieldInfo {
            access_flags: FieldAccessFlags::from_u16(flags),
            name_index,
            descriptor_index,
            attributes_count,
            attributes,
        })
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(&FieldAccessFlags::AccStatic)
    }
}

/// [Methods](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A777%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C282%2Cnull%5D)
#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub access_flags: Vec<MethodAccessFlags>,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes_count: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl MethodInfo {
    fn read(
        cursor: &mut Cursor<&[u8]>,
        constant_pool: &[ConstantPool],
    ) -> Result<MethodInfo, Box<dyn Error>> {
        let flags = read_u2(cursor)?;
        let name_index = read_u2(cursor)?;
        let descriptor_index = read_u2(cursor)?;
        let attributes_count = read_u2(cursor)?;
        let attributes = attributes::read_attributes(constant_pool, attributes_count, cursor)?;
        Ok(MethodInfo {
            access_flags: MethodAccessFlags::from_u16(flags),
            name_index,
            descriptor_index,
            attributes_count,
            attributes,
        })
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(&MethodAccessFlags::AccStatic)
    }

    pub fn is_native(&self) -> bool {
        self.access_flags.contains(&MethodAccessFlags::AccNative)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(&MethodAccessFlags::AccAbstract)
    }

    /// The method's executable body, when it has one.
    pub fn code(&self) -> Option<&CodeAttribute> {
        attributes::find_code(&self.attributes)
    }
}

/// [Class File Format](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A376%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C590%2Cnull%5D)
///
/// The in-memory mirror of one class image, in file order. All pool indices
/// are kept as read; the accessors below dereference them on demand.
#[derive(Clone, Debug)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    /// Number of pool slots plus one; the table itself is indexed
    /// 1..constant_pool_count-1 and slot 0 is reserved.
    pub constant_pool_count: u16,
    pub constant_pool: Vec<ConstantPool>,
    pub access_flags: Vec<ClassAccessFlags>,
    /// Class entry describing this class.
    pub this_class: u16,
    /// Class entry of the direct superclass, or 0 for java/lang/Object.
    pub super_class: u16,
    pub interfaces_count: u16,
    pub interfaces: Vec<u16>,
    pub field_count: u16,
    pub fields: Vec<FieldInfo>,
    pub methods_count: u16,
    pub methods: Vec<MethodInfo>,
    pub attributes_count: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    /// Decode a class image and run the full format check over it. Nothing
    /// of the partially decoded class escapes on failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<ClassFile, Box<dyn Error>> {
        let mut cursor = Cursor::new(bytes);
        let magic = read_u4(&mut cursor)?;
        if magic != MAGIC {
            return Err(Box::new(FormatError::new(
                FormatCause::IncorrectMagic(magic),
                "not a class file",
            )));
        }
        let minor_version = read_u2(&mut cursor)?;
        let major_version = read_u2(&mut cursor)?;
        let constant_pool_count = read_u2(&mut cursor)?;
        let constant_pool = constants::read_constant_pool(constant_pool_count, &mut cursor)?;
        let access_flags = ClassAccessFlags::from_u16(read_u2(&mut cursor)?);
        let this_class = read_u2(&mut cursor)?;
        let super_class = read_u2(&mut cursor)?;
        let interfaces_count = read_u2(&mut cursor)?;
        let interfaces = {
            let mut interfaces = Vec::with_capacity(interfaces_count as usize);
            for _ in 0..interfaces_count {
                interfaces.push(read_u2(&mut cursor)?);
            }
            interfaces
        };
        let field_count = read_u2(&mut cursor)?;
        let fields = {
            let mut fields = Vec::with_capacity(field_count as usize);
            for _ in 0..field_count {
                fields.push(FieldInfo::read(&mut cursor, &constant_pool)?);
            }
            fields
        };
        let methods_count = read_u2(&mut cursor)?;
        let methods = {
            let mut methods = Vec::with_capacity(methods_count as usize);
            for _ in 0..methods_count {
                methods.push(MethodInfo::read(&mut cursor, &constant_pool)?);
            }
            methods
        };
        let attributes_count = read_u2(&mut cursor)?;
        let attributes =
            attributes::read_attributes(&constant_pool, attributes_count, &mut cursor)?;
        // The class file must not be truncated or have extra bytes at the end.
        if (cursor.position() as usize) < bytes.len() {
            return Err(Box::new(FormatError::new(
                FormatCause::ExtraBytes,
                "class file has leftover bytes",
            )));
        }
        let class = ClassFile {
            magic,
            minor_version,
            major_version,
            constant_pool_count,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces_count,
            interfaces,
            field_count,
            fields,
            methods_count,
            methods,
            attributes_count,
            attributes,
        };
        check_format(&class)?;
        Ok(class)
    }

    /// Bounds-checked pool access; slot 0 is reserved and never valid here.
    pub fn constant(&self, index: u16) -> Result<&ConstantPool, FormatError> {
        if index == 0 || index as usize >= self.constant_pool.len() {
            return Err(FormatError::new(
                FormatCause::InvalidIndex(index),
                "constant pool index out of bounds",
            ));
        }
        Ok(&self.constant_pool[index as usize])
    }

    pub fn utf8(&self, index: u16) -> Result<String, FormatError> {
        match self.constant(index)? {
            ConstantPool::Utf8(utf8) => Ok(String::from(utf8)),
            _ => Err(wrong_tag(index, "Utf8")),
        }
    }

    /// Dereference a Class entry down to its name.
    pub fn class_name(&self, index: u16) -> Result<String, FormatError> {
        match self.constant(index)? {
            ConstantPool::Class(class) => self.utf8(class.name_index),
            _ => Err(wrong_tag(index, "Class")),
        }
    }

    pub fn this_class_name(&self) -> Result<String, FormatError> {
        self.class_name(self.this_class)
    }

    /// Name of the direct superclass; `None` only for java/lang/Object
    /// itself.
    pub fn super_class_name(&self) -> Result<Option<String>, FormatError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.class_name(self.super_class).map(Some)
    }

    /// Whether the superclass chain ends here: the super is
    /// java/lang/Object, or there is none at all.
    pub fn is_top_class(&self) -> bool {
        match self.super_class_name() {
            Ok(None) => true,
            Ok(Some(name)) => name == "java/lang/Object",
            Err(_) => false,
        }
    }

    /// Linear search for a method by name and descriptor.
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| {
            self.utf8(m.name_index).is_ok_and(|n| n == name)
                && self.utf8(m.descriptor_index).is_ok_and(|d| d == descriptor)
        })
    }

    /// Linear search for a field by name and descriptor.
    pub fn field(&self, name: &str, descriptor: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| {
            self.utf8(f.name_index).is_ok_and(|n| n == name)
                && self.utf8(f.descriptor_index).is_ok_and(|d| d == descriptor)
        })
    }

    pub fn integer(&self, index: u16) -> Result<i32, FormatError> {
        match self.constant(index)? {
            ConstantPool::Integer(i) => Ok(i.value()),
            _ => Err(wrong_tag(index, "Integer")),
        }
    }

    pub fn float(&self, index: u16) -> Result<f32, FormatError> {
        match self.constant(index)? {
            ConstantPool::Float(f) => Ok(f.value()),
            _ => Err(wrong_tag(index, "Float")),
        }
    }

    pub fn long(&self, index: u16) -> Result<i64, FormatError> {
        match self.constant(index)? {
            ConstantPool::Long(l) => Ok(l.value()),
            _ => Err(wrong_tag(index, "Long")),
        }
    }

    pub fn double(&self, index: u16) -> Result<f64, FormatError> {
        match self.constant(index)? {
            ConstantPool::Double(d) => Ok(d.value()),
            _ => Err(wrong_tag(index, "Double")),
        }
    }

    /// The text of a String entry.
    pub fn string(&self, index: u16) -> Result<String, FormatError> {
        match self.constant(index)? {
            ConstantPool::String(s) => self.utf8(s.string_index),
            _ => Err(wrong_tag(index, "String")),
        }
    }

    /// `(class name, member name, descriptor)` behind a Fieldref, Methodref
    /// or InterfaceMethodref entry.
    pub fn member_ref(&self, index: u16) -> Result<(String, String, String), FormatError> {
        let (class_index, nat_index) = match self.constant(index)? {
            ConstantPool::Fieldref(f) => (f.class_index, f.name_and_type_index),
            ConstantPool::Methodref(m) => (m.class_index, m.name_and_type_index),
            ConstantPool::InterfaceMethodref(im) => (im.class_index, im.name_and_type_index),
            _ => return Err(wrong_tag(index, "Fieldref, Methodref or InterfaceMethodref")),
        };
        let class_name = self.class_name(class_index)?;
        let (name, descriptor) = self.name_and_type(nat_index)?;
        Ok((class_name, name, descriptor))
    }

    pub fn name_and_type(&self, index: u16) -> Result<(String, String), FormatError> {
        match self.constant(index)? {
            ConstantPool::NameAndType(nat) => {
                Ok((self.utf8(nat.name_index)?, self.utf8(nat.descriptor_index)?))
            }
            _ => Err(wrong_tag(index, "NameAndType")),
        }
    }
}

fn wrong_tag(index: u16, expected: &'static str) -> FormatError {
    FormatError::new(
        FormatCause::WrongTag { index, expected },
        "constant pool entry has the wrong tag",
    )
}

fn expect_utf8(class: &ClassFile, index: u16) -> Result<String, FormatError> {
    class.utf8(index)
}

fn expect_class(class: &ClassFile, index: u16) -> Result<(), FormatError> {
    match class.constant(index)? {
        ConstantPool::Class(_) => Ok(()),
        _ => Err(wrong_tag(index, "Class")),
    }
}

fn expect_name_and_type(class: &ClassFile, index: u16) -> Result<(String, String), FormatError> {
    class.name_and_type(index)
}

fn check_field_descriptor(descriptor: &str) -> Result<(), FormatError> {
    if descriptors::is_field_descriptor(descriptor) {
        Ok(())
    } else {
        Err(FormatError::new(
            FormatCause::InvalidDescriptor(descriptor.into()),
            "not a field descriptor",
        ))
    }
}

fn check_method_descriptor(descriptor: &str) -> Result<(), FormatError> {
    if descriptors::is_method_descriptor(descriptor) {
        Ok(())
    } else {
        Err(FormatError::new(
            FormatCause::InvalidDescriptor(descriptor.into()),
            "not a method descriptor",
        ))
    }
}

/// Check a method-shaped ref entry: class, name-and-type, and descriptor,
/// with the `<init>`-returns-void rule.
fn check_method_ref(class: &ClassFile, class_index: u16, nat_index: u16) -> Result<(), FormatError> {
    expect_class(class, class_index)?;
    let (name, descriptor) = expect_name_and_type(class, nat_index)?;
    check_method_descriptor(&descriptor)?;
    if name == "<init>" && !descriptor.ends_with('V') {
        return Err(FormatError::new(
            FormatCause::InvalidDescriptor(descriptor),
            "<init> must return void",
        ));
    }
    Ok(())
}

/// Pool indices referenced from attributes, recursively through Code.
fn check_attributes(class: &ClassFile, attrs: &[AttributeInfo]) -> Result<(), FormatError> {
    for attr in attrs {
        match attr {
            AttributeInfo::ConstantValue {
                constantvalue_index,
            } => match class.constant(*constantvalue_index)? {
                ConstantPool::Integer(_)
                | ConstantPool::Float(_)
                | ConstantPool::Long(_)
                | ConstantPool::Double(_)
                | ConstantPool::String(_) => {}
                _ => {
                    return Err(wrong_tag(
                        *constantvalue_index,
                        "Integer, Float, Long, Double or String",
                    ))
                }
            },
            AttributeInfo::Code(code) => {
                for entry in &code.exception_table {
                    // catch_type 0 catches everything
                    if entry.catch_type != 0 {
                        expect_class(class, entry.catch_type)?;
                    }
                }
                check_attributes(class, &code.attributes)?;
            }
            AttributeInfo::Exceptions {
                exception_index_table,
            } => {
                for index in exception_index_table {
                    expect_class(class, *index)?;
                }
            }
            AttributeInfo::InnerClasses { classes } => {
                for inner in classes {
                    expect_class(class, inner.inner_class_info_index)?;
                    // 0 means not a member / anonymous
                    if inner.outer_class_info_index != 0 {
                        expect_class(class, inner.outer_class_info_index)?;
                    }
                    if inner.inner_name_index != 0 {
                        expect_utf8(class, inner.inner_name_index)?;
                    }
                }
            }
            AttributeInfo::SourceFile { sourcefile_index } => {
                expect_utf8(class, *sourcefile_index)?;
            }
            AttributeInfo::LocalVariableTable { entries } => {
                for entry in entries {
                    expect_utf8(class, entry.name_index)?;
                    let descriptor = expect_utf8(class, entry.descriptor_index)?;
                    check_field_descriptor(&descriptor)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// [Format Checking](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A2235%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C590%2Cnull%5D)
///
/// Second pass over the decoded class: every index must land on an entry of
/// the dictated tag and every referenced descriptor must parse. Runs after
/// decoding, so it can follow references in any direction.
fn check_format(class: &ClassFile) -> Result<(), FormatError> {
    expect_class(class, class.this_class)?;
    if class.super_class != 0 {
        expect_class(class, class.super_class)?;
    }
    for index in &class.interfaces {
        expect_class(class, *index)?;
    }

    for (i, constant) in class.constant_pool.iter().enumerate() {
        let i = i as u16;
        match constant {
            ConstantPool::Class(c) => {
                expect_utf8(class, c.name_index)?;
            }
            ConstantPool::String(s) => {
                expect_utf8(class, s.string_index)?;
            }
            ConstantPool::Fieldref(f) => {
                expect_class(class, f.class_index)?;
                let (_, descriptor) = expect_name_and_type(class, f.name_and_type_index)?;
                check_field_descriptor(&descriptor)?;
            }
            ConstantPool::Methodref(m) => {
                check_method_ref(class, m.class_index, m.name_and_type_index)?;
            }
            ConstantPool::InterfaceMethodref(im) => {
                expect_class(class, im.class_index)?;
                let (_, descriptor) = expect_name_and_type(class, im.name_and_type_index)?;
                check_method_descriptor(&descriptor)?;
            }
            ConstantPool::NameAndType(nat) => {
                expect_utf8(class, nat.name_index)?;
                let descriptor = expect_utf8(class, nat.descriptor_index)?;
                if !descriptors::is_descriptor(&descriptor) {
                    return Err(FormatError::new(
                        FormatCause::InvalidDescriptor(descriptor),
                        "NameAndType descriptor is neither a field nor a method descriptor",
                    ));
                }
            }
            ConstantPool::MethodHandle(mh) => {
                check_method_handle(class, i, mh)?;
            }
            ConstantPool::MethodType(mt) => {
                let descriptor = expect_utf8(class, mt.descriptor_index)?;
                check_method_descriptor(&descriptor)?;
            }
            ConstantPool::InvokeDynamic(id) => {
                let (_, descriptor) = expect_name_and_type(class, id.name_and_type_index)?;
                check_method_descriptor(&descriptor)?;
            }
            _ => {}
        }
    }

    for field in &class.fields {
        expect_utf8(class, field.name_index)?;
        let descriptor = expect_utf8(class, field.descriptor_index)?;
        check_field_descriptor(&descriptor)?;
        check_attributes(class, &field.attributes)?;
    }
    for method in &class.methods {
        expect_utf8(class, method.name_index)?;
        let descriptor = expect_utf8(class, method.descriptor_index)?;
        check_method_descriptor(&descriptor)?;
        check_attributes(class, &method.attributes)?;
    }
    check_attributes(class, &class.attributes)?;

    Ok(())
}

/// The reference kind decides which ref tag the entry must point at. Kinds
/// 6 and 7 also accept InterfaceMethodref from class file version 52 on.
fn check_method_handle(
    class: &ClassFile,
    index: u16,
    mh: &crate::constants::MethodHandle,
) -> Result<(), FormatError> {
    match mh.reference_kind {
        1..=4 => match class.constant(mh.reference_index)? {
            ConstantPool::Fieldref(_) => Ok(()),
            _ => Err(wrong_tag(mh.reference_index, "Fieldref")),
        },
        5 | 8 => match class.constant(mh.reference_index)? {
            ConstantPool::Methodref(_) => Ok(()),
            _ => Err(wrong_tag(mh.reference_index, "Methodref")),
        },
        6 | 7 => match class.constant(mh.reference_index)? {
            ConstantPool::Methodref(_) => Ok(()),
            ConstantPool::InterfaceMethodref(_) if class.major_version >= 52 => Ok(()),
            _ => Err(wrong_tag(
                mh.reference_index,
                "Methodref or InterfaceMethodref",
            )),
        },
        9 => match class.constant(mh.reference_index)? {
            ConstantPool::InterfaceMethodref(_) => Ok(()),
            _ => Err(wrong_tag(mh.reference_index, "InterfaceMethodref")),
        },
        kind => Err(FormatError::new(
            FormatCause::InvalidReferenceKind(kind),
            &format!("method handle at {index}"),
        )),
    }
}
