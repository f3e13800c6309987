#![allow(clippy::enum_variant_names)]

pub mod class_decoding {
    use std::error::Error;
    use std::fmt::Display;
    use std::io;

    #[derive(Debug)]
    pub enum DecodeCause {
        /// The stream ended in the middle of a structure.
        Eof,
        Io(io::Error),
        InvalidConstantTag(u8),
    }

    impl Display for DecodeCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                DecodeCause::Eof => write!(f, "UnexpectedEof"),
                DecodeCause::Io(e) => write!(f, "Io: {e}"),
                DecodeCause::InvalidConstantTag(t) => write!(f, "InvalidConstantTag: {t}"),
            }
        }
    }

    #[derive(Debug)]
    pub struct DecodeError {
        cause: DecodeCause,
        msg: String,
    }

    impl DecodeError {
        pub fn new(cause: DecodeCause, msg: &str) -> DecodeError {
            DecodeError {
                cause,
                msg: msg.into(),
            }
        }

        pub fn cause(&self) -> &DecodeCause {
            &self.cause
        }
    }

    impl From<io::Error> for DecodeError {
        fn from(e: io::Error) -> DecodeError {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                DecodeError::new(DecodeCause::Eof, "class file ends prematurely")
            } else {
                DecodeError::new(DecodeCause::Io(e), "could not read class file")
            }
        }
    }

    impl Error for DecodeError {}

    impl Display for DecodeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Decode Error: {}, {}", self.cause, self.msg)
        }
    }
}

pub mod class_format_check {
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    pub enum FormatCause {
        IncorrectMagic(u32),
        ExtraBytes,
        InvalidIndex(u16),
        WrongTag {
            index: u16,
            expected: &'static str,
        },
        InvalidDescriptor(String),
        InvalidReferenceKind(u8),
        /// A recognized attribute did not consume exactly its declared length.
        AttributeLength {
            declared: u32,
            consumed: u32,
        },
        BadCode {
            pc: usize,
            opcode: u8,
        },
    }

    impl Display for FormatCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                FormatCause::IncorrectMagic(m) => write!(f, "IncorrectMagic: {:#010X}", m),
                FormatCause::ExtraBytes => write!(f, "ExtraBytes"),
                FormatCause::InvalidIndex(index) => write!(f, "InvalidIndex: {index}"),
                FormatCause::WrongTag { index, expected } => {
                    write!(f, "WrongTag: entry {index} is not {expected}")
                }
                FormatCause::InvalidDescriptor(desc) => write!(f, "InvalidDescriptor: {desc}"),
                FormatCause::InvalidReferenceKind(kind) => {
                    write!(f, "InvalidReferenceKind: {kind}")
                }
                FormatCause::AttributeLength { declared, consumed } => {
                    write!(f, "AttributeLength: declared {declared}, consumed {consumed}")
                }
                FormatCause::BadCode { pc, opcode } => {
                    write!(f, "BadCode: opcode {opcode:#04X} at {pc}")
                }
            }
        }
    }

    #[derive(Debug)]
    pub struct FormatError {
        cause: FormatCause,
        msg: String,
    }

    impl FormatError {
        pub fn new(cause: FormatCause, msg: &str) -> FormatError {
            FormatError {
                cause,
                msg: msg.into(),
            }
        }

        pub fn cause(&self) -> &FormatCause {
            &self.cause
        }
    }

    impl Error for FormatError {}

    impl Display for FormatError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Format Error: {}, {}", self.cause, self.msg)
        }
    }
}
