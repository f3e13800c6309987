use std::fmt::{self, Display};

/// [Descriptors](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A677%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C448%2Cnull%5D)
///
/// FieldType := BaseType | 'L' ClassName ';' | '[' FieldType
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Base(BaseType),
    // Object type with the class name in internal form
    Object(String),
    Array(Box<FieldType>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

/// A method descriptor: `'(' FieldType* ')'` followed by a return type,
/// where `None` stands for `V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub ret: Option<FieldType>,
}

impl FieldType {
    /// Local-variable slots a value of this type occupies; long and double
    /// take two.
    pub fn slots(&self) -> usize {
        match self {
            FieldType::Base(BaseType::Long) | FieldType::Base(BaseType::Double) => 2,
            _ => 1,
        }
    }
}

impl MethodDescriptor {
    /// Total local-variable slots taken by the parameters, not counting a
    /// receiver.
    pub fn parameter_slots(&self) -> usize {
        self.parameters.iter().map(FieldType::slots).sum()
    }
}

impl Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        };
        write!(f, "{name}")
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(b) => write!(f, "{b}"),
            FieldType::Object(name) => write!(f, "{}", name.replace('/', ".")),
            FieldType::Array(component) => write!(f, "{component}[]"),
        }
    }
}

impl Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ret {
            Some(t) => write!(f, "{t}")?,
            None => write!(f, "void")?,
        }
        write!(f, " (")?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ")")
    }
}

// An array type may have at most 255 dimensions.
const MAX_DIMENSIONS: usize = 255;

fn parse_field_type(bytes: &[u8], pos: &mut usize) -> Option<FieldType> {
    let mut dimensions = 0;
    while bytes.get(*pos) == Some(&b'[') {
        dimensions += 1;
        if dimensions > MAX_DIMENSIONS {
            return None;
        }
        *pos += 1;
    }
    let mut field = match bytes.get(*pos)? {
        b'B' => FieldType::Base(BaseType::Byte),
        b'C' => FieldType::Base(BaseType::Char),
        b'D' => FieldType::Base(BaseType::Double),
        b'F' => FieldType::Base(BaseType::Float),
        b'I' => FieldType::Base(BaseType::Int),
        b'J' => FieldType::Base(BaseType::Long),
        b'S' => FieldType::Base(BaseType::Short),
        b'Z' => FieldType::Base(BaseType::Boolean),
        b'L' => {
            *pos += 1;
            let start = *pos;
            while bytes.get(*pos).is_some_and(|c| *c != b';') {
                *pos += 1;
            }
            if *pos == start || bytes.get(*pos) != Some(&b';') {
                return None;
            }
            let name = std::str::from_utf8(&bytes[start..*pos]).ok()?;
            FieldType::Object(name.into())
        }
        _ => return None,
    };
    *pos += 1;
    for _ in 0..dimensions {
        field = FieldType::Array(Box::new(field));
    }
    Some(field)
}

/// Parse a field descriptor; the whole input must be consumed.
pub fn parse_field_descriptor(descriptor: &str) -> Option<FieldType> {
    let bytes = descriptor.as_bytes();
    let mut pos = 0;
    let field = parse_field_type(bytes, &mut pos)?;
    if pos == bytes.len() {
        Some(field)
    } else {
        None
    }
}

/// Parse a method descriptor; the whole input must be consumed and `V` is
/// only accepted as the return type.
pub fn parse_method_descriptor(descriptor: &str) -> Option<MethodDescriptor> {
    let bytes = descriptor.as_bytes();
    let mut pos = 0;
    if bytes.first() != Some(&b'(') {
        return None;
    }
    pos += 1;
    let mut parameters = vec![];
    while bytes.get(pos).is_some_and(|c| *c != b')') {
        parameters.push(parse_field_type(bytes, &mut pos)?);
    }
    if bytes.get(pos) != Some(&b')') {
        return None;
    }
    pos += 1;
    let ret = if bytes.get(pos) == Some(&b'V') {
        pos += 1;
        None
    } else {
        Some(parse_field_type(bytes, &mut pos)?)
    };
    if pos == bytes.len() {
        Some(MethodDescriptor { parameters, ret })
    } else {
        None
    }
}

pub fn is_field_descriptor(descriptor: &str) -> bool {
    parse_field_descriptor(descriptor).is_some()
}

pub fn is_method_descriptor(descriptor: &str) -> bool {
    parse_method_descriptor(descriptor).is_some()
}

/// Valid as either kind; what a NameAndType entry may reference.
pub fn is_descriptor(descriptor: &str) -> bool {
    is_field_descriptor(descriptor) || is_method_descriptor(descriptor)
}
