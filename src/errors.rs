#![allow(clippy::enum_variant_names)]

pub mod class_linking {
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    pub enum LinkCause {
        /// No classpath entry had a file for the class.
        NotFound(String),
        /// The file decoded with an error; the message carries the decoder's
        /// diagnosis.
        BadClass(String),
        /// this_class of the decoded file disagrees with the requested name.
        NameMismatch { requested: String, found: String },
        /// The class appears in its own superclass chain.
        Circularity(String),
    }

    impl Display for LinkCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                LinkCause::NotFound(name) => write!(f, "could not find class {name}"),
                LinkCause::BadClass(name) => write!(f, "could not load class {name}"),
                LinkCause::NameMismatch { requested, found } => {
                    write!(f, "expected class {requested}, file defines {found}")
                }
                LinkCause::Circularity(name) => {
                    write!(f, "class circularity error on {name}")
                }
            }
        }
    }

    #[derive(Debug)]
    pub struct LinkError {
        cause: LinkCause,
        msg: String,
    }

    impl LinkError {
        pub fn new(cause: LinkCause, msg: &str) -> LinkError {
            LinkError {
                cause,
                msg: msg.into(),
            }
        }

        pub fn cause(&self) -> &LinkCause {
            &self.cause
        }
    }

    impl Error for LinkError {}

    impl Display for LinkError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            if self.msg.is_empty() {
                write!(f, "{}", self.cause)
            } else {
                write!(f, "{}, {}", self.cause, self.msg)
            }
        }
    }
}

pub mod runtime {
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    pub enum RuntimeCause {
        MissingMethod {
            class: String,
            name: String,
            descriptor: String,
        },
        MissingField {
            class: String,
            name: String,
            descriptor: String,
        },
        UnresolvedNative {
            class: String,
            name: String,
        },
        /// An opcode this machine refuses to execute (athrow,
        /// invokedynamic).
        Unsupported(&'static str),
        DivisionByZero,
        NullReference,
        /// Array access outside 0..length.
        IndexOutOfBounds { index: i32, length: usize },
        NegativeArraySize(i32),
        ClassCast { from: String, to: String },
        /// A branch landed outside the code array.
        BadJump(usize),
    }

    impl Display for RuntimeCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                RuntimeCause::MissingMethod {
                    class,
                    name,
                    descriptor,
                } => write!(f, "could not find method {name}{descriptor} in class {class}"),
                RuntimeCause::MissingField {
                    class,
                    name,
                    descriptor,
                } => write!(f, "could not find field {name}:{descriptor} in class {class}"),
                RuntimeCause::UnresolvedNative { class, name } => {
                    write!(f, "no native implementation for {class}.{name}")
                }
                RuntimeCause::Unsupported(what) => write!(f, "{what} is not supported"),
                RuntimeCause::DivisionByZero => write!(f, "division by zero"),
                RuntimeCause::NullReference => write!(f, "null reference"),
                RuntimeCause::IndexOutOfBounds { index, length } => {
                    write!(f, "array index {index} out of bounds for length {length}")
                }
                RuntimeCause::NegativeArraySize(size) => {
                    write!(f, "negative array size {size}")
                }
                RuntimeCause::ClassCast { from, to } => {
                    write!(f, "cannot cast {from} to {to}")
                }
                RuntimeCause::BadJump(target) => {
                    write!(f, "branch target {target} outside the method")
                }
            }
        }
    }

    #[derive(Debug)]
    pub struct RuntimeError {
        cause: RuntimeCause,
        msg: String,
    }

    impl RuntimeError {
        pub fn new(cause: RuntimeCause, msg: &str) -> RuntimeError {
            RuntimeError {
                cause,
                msg: msg.into(),
            }
        }

        pub fn cause(&self) -> &RuntimeCause {
            &self.cause
        }
    }

    impl Error for RuntimeError {}

    impl Display for RuntimeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            if self.msg.is_empty() {
                write!(f, "{}", self.cause)
            } else {
                write!(f, "{}, {}", self.cause, self.msg)
            }
        }
    }
}
