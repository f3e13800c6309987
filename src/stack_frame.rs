use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use jclass::attributes::CodeAttribute;

use crate::loader::LoadedClass;

/// A single local-variable or operand-stack slot.
///
/// Category 2 values (long, double) take two local slots, with the upper
/// slot left `Reserved`, but exactly one operand-stack slot; the stack
/// instructions (`dup*`, `pop2`) consult [`Value::category`] instead of
/// counting slots.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Reference(Reference),
    /// Successor of a jsr instruction, consumed by ret.
    ReturnAddress(u16),
    /// Uninitialized local slot, or the unusable upper half of a long or
    /// double.
    Reserved,
}

impl Value {
    pub fn category(&self) -> usize {
        match self {
            Value::Long(_) | Value::Double(_) => 2,
            _ => 1,
        }
    }
}

/// What an `a`-typed slot can hold.
#[derive(Clone, Debug)]
pub enum Reference {
    Null,
    /// An interned string constant.
    Str(Rc<str>),
    Array(Rc<RefCell<ArrayObject>>),
    Instance(Rc<InstanceObject>),
    /// One of the host streams the native surface hands out.
    Stream(StdStream),
}

impl Reference {
    /// Identity comparison, what if_acmpeq observes.
    pub fn same(&self, other: &Reference) -> bool {
        match (self, other) {
            (Reference::Null, Reference::Null) => true,
            (Reference::Str(a), Reference::Str(b)) => Rc::ptr_eq(a, b),
            (Reference::Array(a), Reference::Array(b)) => Rc::ptr_eq(a, b),
            (Reference::Instance(a), Reference::Instance(b)) => Rc::ptr_eq(a, b),
            (Reference::Stream(a), Reference::Stream(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Reference::Null)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StdStream {
    Out,
    Err,
    In,
}

/// Element type of an array object, from the `atype` byte of newarray or
/// the component class of anewarray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
    Reference,
}

impl ElementKind {
    /// [Array type codes](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=594)
    pub fn from_atype(atype: u8) -> Option<ElementKind> {
        Some(match atype {
            4 => ElementKind::Boolean,
            5 => ElementKind::Char,
            6 => ElementKind::Float,
            7 => ElementKind::Double,
            8 => ElementKind::Byte,
            9 => ElementKind::Short,
            10 => ElementKind::Int,
            11 => ElementKind::Long,
            _ => return None,
        })
    }

    /// The zero value newly allocated slots start with.
    pub fn zero(&self) -> Value {
        match self {
            ElementKind::Float => Value::Float(0.0),
            ElementKind::Double => Value::Double(0.0),
            ElementKind::Long => Value::Long(0),
            ElementKind::Reference => Value::Reference(Reference::Null),
            _ => Value::Int(0),
        }
    }
}

/// A zero-initialized contiguous buffer typed by its element kind.
#[derive(Debug)]
pub struct ArrayObject {
    pub element: ElementKind,
    pub values: Vec<Value>,
}

impl ArrayObject {
    pub fn new(element: ElementKind, length: usize) -> ArrayObject {
        ArrayObject {
            element,
            values: vec![element.zero(); length],
        }
    }
}

/// An instance created by `new`; fields live in a name-and-descriptor keyed
/// map and spring into existence with their default values.
#[derive(Debug)]
pub struct InstanceObject {
    pub class_name: String,
    pub fields: RefCell<HashMap<(String, String), Value>>,
}

impl InstanceObject {
    pub fn new(class_name: &str) -> InstanceObject {
        InstanceObject {
            class_name: class_name.into(),
            fields: RefCell::new(HashMap::new()),
        }
    }
}

/// One activation record: locals sized max_locals, an operand stack bounded
/// by max_stack, the pc, and shares of the method's code and declaring
/// class.
///
/// [Frames](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A45%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C250%2Cnull%5D)
#[derive(Debug)]
pub struct StackFrame {
    pub pc: usize,
    pub code: Rc<CodeAttribute>,
    pub class: Rc<LoadedClass>,
    pub locals: Vec<Value>,
    pub stack: Vec<Value>,
}

impl StackFrame {
    pub fn new(code: Rc<CodeAttribute>, class: Rc<LoadedClass>) -> StackFrame {
        let locals = vec![Value::Reserved; code.max_locals as usize];
        let stack = Vec::with_capacity(code.max_stack as usize);
        StackFrame {
            pc: 0,
            code,
            class,
            locals,
            stack,
        }
    }

    // Stack discipline is guaranteed by the caller (the class has passed the
    // structural check and the handlers are written to the instruction set);
    // violations are bugs, so these helpers panic rather than propagate.

    pub fn push(&mut self, value: Value) {
        debug_assert!(self.stack.len() < self.code.max_stack as usize);
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Value {
        self.stack.pop().expect("operand stack underflow")
    }

    pub fn pop_int(&mut self) -> i32 {
        match self.pop() {
            Value::Int(i) => i,
            v => panic!("expected int on the operand stack, found {v:?}"),
        }
    }

    pub fn pop_long(&mut self) -> i64 {
        match self.pop() {
            Value::Long(l) => l,
            v => panic!("expected long on the operand stack, found {v:?}"),
        }
    }

    pub fn pop_float(&mut self) -> f32 {
        match self.pop() {
            Value::Float(f) => f,
            v => panic!("expected float on the operand stack, found {v:?}"),
        }
    }

    pub fn pop_double(&mut self) -> f64 {
        match self.pop() {
            Value::Double(d) => d,
            v => panic!("expected double on the operand stack, found {v:?}"),
        }
    }

    pub fn pop_reference(&mut self) -> Reference {
        match self.pop() {
            Value::Reference(r) => r,
            v => panic!("expected reference on the operand stack, found {v:?}"),
        }
    }

    pub fn load(&self, index: usize) -> Value {
        self.locals[index].clone()
    }

    /// Store into a local slot; a category 2 value also reserves the slot
    /// above it.
    pub fn store(&mut self, index: usize, value: Value) {
        let two_slots = value.category() == 2;
        self.locals[index] = value;
        if two_slots {
            self.locals[index + 1] = Value::Reserved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_of_values() {
        assert_eq!(Value::Int(1).category(), 1);
        assert_eq!(Value::Long(1).category(), 2);
        assert_eq!(Value::Double(1.0).category(), 2);
        assert_eq!(Value::Reference(Reference::Null).category(), 1);
    }

    #[test]
    fn array_zero_values() {
        let ints = ArrayObject::new(ElementKind::Int, 3);
        assert!(matches!(ints.values[0], Value::Int(0)));
        let refs = ArrayObject::new(ElementKind::Reference, 2);
        assert!(matches!(
            refs.values[1],
            Value::Reference(Reference::Null)
        ));
    }

    #[test]
    fn reference_identity() {
        let a: Rc<str> = Rc::from("x");
        let r1 = Reference::Str(a.clone());
        let r2 = Reference::Str(a);
        let r3 = Reference::Str(Rc::from("x"));
        assert!(r1.same(&r2));
        assert!(!r1.same(&r3));
        assert!(Reference::Null.same(&Reference::Null));
        assert!(!Reference::Null.same(&r1));
    }
}
