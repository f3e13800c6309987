//! The built-in native surface: a string-keyed registry mapping
//! `(class, method)` onto handlers that work directly on the current
//! frame's operand stack, plus the static objects `java/lang/System`
//! hands out. Kept deliberately tiny and fully separate from real
//! resolution.

use std::collections::HashMap;
use std::io::Write;

use crate::errors::runtime::{RuntimeCause, RuntimeError};
use crate::stack_frame::{Reference, StackFrame, StdStream, Value};

pub type NativeMethod = fn(&mut StackFrame, &str) -> Result<(), RuntimeError>;

pub struct NativeRegistry {
    classes: &'static [&'static str],
    methods: HashMap<(&'static str, &'static str), NativeMethod>,
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRegistry {
    pub fn new() -> NativeRegistry {
        let mut methods: HashMap<(&'static str, &'static str), NativeMethod> = HashMap::new();
        methods.insert(("java/io/PrintStream", "println"), nat_println);
        methods.insert(("java/io/PrintStream", "print"), nat_print);
        // Object's constructor does nothing; shimming it here lets <init>
        // chains terminate without java/lang/Object on the classpath.
        methods.insert(("java/lang/Object", "<init>"), nat_object_init);
        NativeRegistry {
            classes: &["java/lang/System", "java/io/PrintStream", "java/lang/Object"],
            methods,
        }
    }

    /// Whether symbolic references to `class_name` short-circuit into this
    /// table instead of the class loader.
    pub fn is_native_class(&self, class_name: &str) -> bool {
        self.classes.contains(&class_name)
    }

    /// The well-known static objects: `System.out`, `System.err`,
    /// `System.in`.
    pub fn static_object(&self, class_name: &str, name: &str, descriptor: &str) -> Option<Value> {
        if class_name != "java/lang/System" {
            return None;
        }
        let stream = match (name, descriptor) {
            ("out", "Ljava/io/PrintStream;") => StdStream::Out,
            ("err", "Ljava/io/PrintStream;") => StdStream::Err,
            ("in", "Ljava/io/InputStream;") => StdStream::In,
            _ => return None,
        };
        Some(Value::Reference(Reference::Stream(stream)))
    }

    /// Dispatch a native method call; arguments are popped off the frame's
    /// operand stack and a result, if any, is pushed back.
    pub fn call(
        &self,
        frame: &mut StackFrame,
        class_name: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<(), RuntimeError> {
        match self.methods.get(&(class_name, name)) {
            Some(method) => method(frame, descriptor),
            None => Err(RuntimeError::new(
                RuntimeCause::UnresolvedNative {
                    class: class_name.into(),
                    name: name.into(),
                },
                descriptor,
            )),
        }
    }
}

fn unresolved(class: &str, name: &str, descriptor: &str) -> RuntimeError {
    RuntimeError::new(
        RuntimeCause::UnresolvedNative {
            class: class.into(),
            name: name.into(),
        },
        descriptor,
    )
}

/// Render the single argument of a print/println descriptor.
fn print_argument(frame: &mut StackFrame, descriptor: &str) -> Option<String> {
    Some(match descriptor {
        "()V" => String::new(),
        "(Ljava/lang/String;)V" => match frame.pop_reference() {
            Reference::Str(s) => s.to_string(),
            Reference::Null => "null".into(),
            other => format!("{other:?}"),
        },
        "(C)V" => char::from_u32(frame.pop_int() as u32)
            .map(String::from)
            .unwrap_or_default(),
        "(Z)V" => if frame.pop_int() != 0 { "true" } else { "false" }.into(),
        "(B)V" | "(S)V" | "(I)V" => frame.pop_int().to_string(),
        "(J)V" => frame.pop_long().to_string(),
        "(F)V" => frame.pop_float().to_string(),
        "(D)V" => frame.pop_double().to_string(),
        _ => return None,
    })
}

fn write_to_stream(frame: &mut StackFrame, text: &str, newline: bool) -> Result<(), RuntimeError> {
    match frame.pop_reference() {
        Reference::Stream(StdStream::Out) => {
            if newline {
                println!("{text}");
            } else {
                print!("{text}");
                std::io::stdout().flush().ok();
            }
            Ok(())
        }
        Reference::Stream(StdStream::Err) => {
            if newline {
                eprintln!("{text}");
            } else {
                eprint!("{text}");
            }
            Ok(())
        }
        _ => Err(unresolved("java/io/PrintStream", "println", "")),
    }
}

fn nat_println(frame: &mut StackFrame, descriptor: &str) -> Result<(), RuntimeError> {
    let Some(text) = print_argument(frame, descriptor) else {
        return Err(unresolved("java/io/PrintStream", "println", descriptor));
    };
    write_to_stream(frame, &text, true)
}

fn nat_print(frame: &mut StackFrame, descriptor: &str) -> Result<(), RuntimeError> {
    let Some(text) = print_argument(frame, descriptor) else {
        return Err(unresolved("java/io/PrintStream", "print", descriptor));
    };
    write_to_stream(frame, &text, false)
}

fn nat_object_init(frame: &mut StackFrame, _descriptor: &str) -> Result<(), RuntimeError> {
    frame.pop();
    Ok(())
}
