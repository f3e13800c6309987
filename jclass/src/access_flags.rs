use std::fmt::{self, Display};

/// [Class Access Flags](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=85)
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassAccessFlags {
    /// Declared public; may be accessed from outside its package.
    AccPublic = 0x0001,
    /// Declared final; no subclasses allowed.
    AccFinal = 0x0010,
    /// Treat superclass methods specially when invoked by the invokespecial
    /// instruction.
    AccSuper = 0x0020,
    /// Is an interface, not a class.
    AccInterface = 0x0200,
    /// Declared abstract; must not be instantiated.
    AccAbstract = 0x0400,
    /// Declared synthetic; not present in the source code.
    AccSynthetic = 0x1000,
    /// Declared as an annotation interface.
    AccAnnotation = 0x2000,
    /// Declared as an enum class.
    AccEnum = 0x4000,
}

impl ClassAccessFlags {
    const ALL: [ClassAccessFlags; 8] = [
        ClassAccessFlags::AccPublic,
        ClassAccessFlags::AccFinal,
        ClassAccessFlags::AccSuper,
        ClassAccessFlags::AccInterface,
        ClassAccessFlags::AccAbstract,
        ClassAccessFlags::AccSynthetic,
        ClassAccessFlags::AccAnnotation,
        ClassAccessFlags::AccEnum,
    ];

    pub fn from_u16(value: u16) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|flag| value & *flag as u16 != 0)
            .collect()
    }
}

impl Display for ClassAccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            ClassAccessFlags::AccPublic => "public",
            ClassAccessFlags::AccFinal => "final",
            ClassAccessFlags::AccSuper => "",
            ClassAccessFlags::AccInterface => "interface",
            ClassAccessFlags::AccAbstract => "abstract",
            ClassAccessFlags::AccSynthetic => "",
            ClassAccessFlags::AccAnnotation => "@interface",
            ClassAccessFlags::AccEnum => "enum",
        };
        write!(f, "{keyword}")
    }
}

/// [Field Access Flags](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=108)
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccessFlags {
    AccPublic = 0x0001,
    AccPrivate = 0x0002,
    AccProtected = 0x0004,
    AccStatic = 0x0008,
    AccFinal = 0x0010,
    /// Declared volatile; cannot be cached.
    AccVolatile = 0x0040,
    /// Declared transient; not written or read by a persistent object
    /// manager.
    AccTransient = 0x0080,
    AccSynthetic = 0x1000,
    AccEnum = 0x4000,
}

impl FieldAccessFlags {
    const ALL: [FieldAccessFlags; 9] = [
        FieldAccessFlags::AccPublic,
        FieldAccessFlags::AccPrivate,
        FieldAccessFlags::AccProtected,
        FieldAccessFlags::AccStatic,
        FieldAccessFlags::AccFinal,
        FieldAccessFlags::AccVolatile,
        FieldAccessFlags::AccTransient,
        FieldAccessFlags::AccSynthetic,
        FieldAccessFlags::AccEnum,
    ];

    pub fn from_u16(value: u16) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|flag| value & *flag as u16 != 0)
            .collect()
    }
}

impl Display for FieldAccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            FieldAccessFlags::AccPublic => "public",
            FieldAccessFlags::AccPrivate => "private",
            FieldAccessFlags::AccProtected => "protected",
            FieldAccessFlags::AccStatic => "static",
            FieldAccessFlags::AccFinal => "final",
            FieldAccessFlags::AccVolatile => "volatile",
            FieldAccessFlags::AccTransient => "transient",
            FieldAccessFlags::AccSynthetic => "",
            FieldAccessFlags::AccEnum => "",
        };
        write!(f, "{keyword}")
    }
}

/// [Method Access Flags](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=112)
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodAccessFlags {
    AccPublic = 0x0001,
    AccPrivate = 0x0002,
    AccProtected = 0x0004,
    AccStatic = 0x0008,
    AccFinal = 0x0010,
    /// Declared synchronized; invocation is wrapped by a monitor use.
    AccSynchronized = 0x0020,
    /// A bridge method, generated by the compiler.
    AccBridge = 0x0040,
    AccVarArgs = 0x0080,
    /// Declared native; implemented in a language other than Java.
    AccNative = 0x0100,
    AccAbstract = 0x0400,
    AccStrict = 0x0800,
    AccSynthetic = 0x1000,
}

impl MethodAccessFlags {
    const ALL: [MethodAccessFlags; 12] = [
        MethodAccessFlags::AccPublic,
        MethodAccessFlags::AccPrivate,
        MethodAccessFlags::AccProtected,
        MethodAccessFlags::AccStatic,
        MethodAccessFlags::AccFinal,
        MethodAccessFlags::AccSynchronized,
        MethodAccessFlags::AccBridge,
        MethodAccessFlags::AccVarArgs,
        MethodAccessFlags::AccNative,
        MethodAccessFlags::AccAbstract,
        MethodAccessFlags::AccStrict,
        MethodAccessFlags::AccSynthetic,
    ];

    pub fn from_u16(value: u16) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|flag| value & *flag as u16 != 0)
            .collect()
    }
}

impl Display for MethodAccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            MethodAccessFlags::AccPublic => "public",
            MethodAccessFlags::AccPrivate => "private",
            MethodAccessFlags::AccProtected => "protected",
            MethodAccessFlags::AccStatic => "static",
            MethodAccessFlags::AccFinal => "final",
            MethodAccessFlags::AccSynchronized => "synchronized",
            MethodAccessFlags::AccBridge => "",
            MethodAccessFlags::AccVarArgs => "",
            MethodAccessFlags::AccNative => "native",
            MethodAccessFlags::AccAbstract => "abstract",
            MethodAccessFlags::AccStrict => "strictfp",
            MethodAccessFlags::AccSynthetic => "",
        };
        write!(f, "{keyword}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_masks_decompose() {
        let flags = MethodAccessFlags::from_u16(0x0009);
        assert_eq!(
            flags,
            vec![MethodAccessFlags::AccPublic, MethodAccessFlags::AccStatic]
        );
        assert!(ClassAccessFlags::from_u16(0x0000).is_empty());
    }
}
