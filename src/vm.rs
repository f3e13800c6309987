use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use log::{debug, trace};

use jclass::attributes::{self, CodeAttribute};
use jclass::constants::ConstantPool;
use jclass::descriptors;

use crate::errors::runtime::{RuntimeCause, RuntimeError};
use crate::loader::{ClassLoader, LoadedClass};
use crate::native::NativeRegistry;
use crate::ops::mnemonics::Mnemonic;
use crate::ops::{Instruction, Operands};
use crate::stack_frame::{
    ArrayObject, ElementKind, InstanceObject, Reference, StackFrame, Value,
};

/// The interpreter: a class loader, the native surface, and the stack of
/// frames the dispatch loop runs on. Execution is single threaded; frames
/// are pushed on invocation and popped when the invoked method returns.
pub struct VirtualMachine {
    pub loader: ClassLoader,
    natives: NativeRegistry,
    frames: Vec<StackFrame>,
}

/// Zero value for a field of the given descriptor.
fn default_value(descriptor: &str) -> Value {
    match descriptor.as_bytes().first() {
        Some(b'J') => Value::Long(0),
        Some(b'F') => Value::Float(0.0),
        Some(b'D') => Value::Double(0.0),
        Some(b'L') | Some(b'[') => Value::Reference(Reference::Null),
        _ => Value::Int(0),
    }
}

/// Decode a loadable pool entry into a value. Entries outside the loadable
/// kinds resolve to the zero placeholder.
fn resolve_constant(class: &LoadedClass, index: u16) -> Result<Value, Box<dyn Error>> {
    Ok(match class.class.constant(index)? {
        ConstantPool::Integer(i) => Value::Int(i.value()),
        ConstantPool::Float(f) => Value::Float(f.value()),
        ConstantPool::Long(l) => Value::Long(l.value()),
        ConstantPool::Double(d) => Value::Double(d.value()),
        ConstantPool::String(s) => {
            let text = class.class.utf8(s.string_index)?;
            Value::Reference(Reference::Str(Rc::from(text.as_str())))
        }
        _ => Value::Int(0),
    })
}

fn expect_pool(operands: &Operands) -> u16 {
    match operands {
        Operands::Pool(index) => *index,
        _ => unreachable!("decoder always pairs this opcode with a pool index"),
    }
}

fn expect_var(operands: &Operands) -> usize {
    match operands {
        Operands::Var(index) => *index as usize,
        _ => unreachable!("decoder always pairs this opcode with a local index"),
    }
}

fn expect_branch(operands: &Operands) -> i32 {
    match operands {
        Operands::Branch(offset) => *offset,
        _ => unreachable!("decoder always pairs this opcode with a branch offset"),
    }
}

/// Relocate the pc, relative to the address of the branching opcode.
fn branch(frame: &mut StackFrame, at: usize, offset: i32) -> Result<(), RuntimeError> {
    let target = at as i64 + offset as i64;
    if target < 0 || target as usize > frame.code.code.len() {
        return Err(RuntimeError::new(RuntimeCause::BadJump(target as usize), ""));
    }
    frame.pc = target as usize;
    Ok(())
}

fn missing_method(class: &str, name: &str, descriptor: &str, msg: &str) -> RuntimeError {
    RuntimeError::new(
        RuntimeCause::MissingMethod {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        },
        msg,
    )
}

fn missing_field(class: &str, name: &str, descriptor: &str) -> RuntimeError {
    RuntimeError::new(
        RuntimeCause::MissingField {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        },
        "",
    )
}

/// Store invocation arguments into a fresh frame's locals, doubling slots
/// under category 2 values.
fn frame_with_arguments(
    code: Rc<CodeAttribute>,
    class: Rc<LoadedClass>,
    args: Vec<Value>,
) -> StackFrame {
    let mut frame = StackFrame::new(code, class);
    let mut slot = 0;
    for value in args {
        let category = value.category();
        frame.store(slot, value);
        slot += category;
    }
    frame
}

impl VirtualMachine {
    pub fn new(loader: ClassLoader) -> VirtualMachine {
        VirtualMachine {
            loader,
            natives: NativeRegistry::new(),
            frames: Vec::new(),
        }
    }

    /// Load, initialize and run `main([Ljava/lang/String;)V` of the named
    /// class.
    pub fn run_main(&mut self, class_name: &str) -> Result<(), Box<dyn Error>> {
        let class = self.loader.load(class_name)?;
        self.initialize_class(&class)?;
        let descriptor = "([Ljava/lang/String;)V";
        let main = class
            .find_method("main", descriptor)
            .ok_or_else(|| missing_method(class_name, "main", descriptor, ""))?;
        if !main.is_static() {
            return Err(Box::new(missing_method(
                class_name,
                "main",
                descriptor,
                "main is not static",
            )));
        }
        // command line arguments are not materialized; main receives an
        // empty array
        let args = Value::Reference(Reference::Array(Rc::new(RefCell::new(ArrayObject::new(
            ElementKind::Reference,
            0,
        )))));
        self.invoke(class, "main", descriptor, vec![args])?;
        Ok(())
    }

    /// Run `<clinit>` exactly once per class, superclasses first, after
    /// seeding static fields with their ConstantValue or default values.
    pub fn initialize_class(&mut self, class: &Rc<LoadedClass>) -> Result<(), Box<dyn Error>> {
        if class.mark_initialized() {
            return Ok(());
        }
        if let Some(super_name) = class
            .super_name
            .clone()
            .filter(|s| s != "java/lang/Object")
        {
            let superclass = self.loader.load(&super_name)?;
            self.initialize_class(&superclass)?;
        }
        {
            let mut statics = class.statics.borrow_mut();
            for field in &class.class.fields {
                if !field.is_static() {
                    continue;
                }
                let name = class.class.utf8(field.name_index)?;
                let descriptor = class.class.utf8(field.descriptor_index)?;
                let value = match attributes::find_constant_value(&field.attributes) {
                    Some(index) => resolve_constant(class, index)?,
                    None => default_value(&descriptor),
                };
                statics.insert((name, descriptor), value);
            }
        }
        if class.find_method("<clinit>", "()V").is_some() {
            debug!("running <clinit> of {}", class.name);
            self.invoke(class.clone(), "<clinit>", "()V", vec![])?;
        }
        Ok(())
    }

    /// Invoke a method declared directly on `class` and run the machine
    /// until it returns. Arguments land in the locals of the new frame.
    pub fn invoke(
        &mut self,
        class: Rc<LoadedClass>,
        name: &str,
        descriptor: &str,
        args: Vec<Value>,
    ) -> Result<Option<Value>, Box<dyn Error>> {
        let method = class
            .find_method(name, descriptor)
            .ok_or_else(|| missing_method(&class.name, name, descriptor, ""))?;
        if method.is_native() {
            return Err(Box::new(RuntimeError::new(
                RuntimeCause::UnresolvedNative {
                    class: class.name.clone(),
                    name: name.into(),
                },
                "",
            )));
        }
        let code = method
            .code
            .clone()
            .ok_or_else(|| missing_method(&class.name, name, descriptor, "method has no code"))?;
        let base = self.frames.len();
        self.frames
            .push(frame_with_arguments(code, class.clone(), args));
        let result = self.run(base);
        if result.is_err() {
            // fatal: release whatever the failed invocation left behind
            self.frames.truncate(base);
        }
        result
    }

    /// Find a method by walking from `start` up the superclass chain.
    fn find_method_in_chain(
        &mut self,
        start: Rc<LoadedClass>,
        name: &str,
        descriptor: &str,
    ) -> Result<(Rc<LoadedClass>, usize), Box<dyn Error>> {
        let start_name = start.name.clone();
        let mut current = start;
        loop {
            if let Some(i) = current
                .methods
                .iter()
                .position(|m| m.name == name && m.descriptor == descriptor)
            {
                return Ok((current, i));
            }
            current = match current
                .super_name
                .clone()
                .filter(|s| s != "java/lang/Object")
            {
                Some(super_name) => self.loader.load(&super_name)?,
                None => {
                    return Err(Box::new(missing_method(&start_name, name, descriptor, "")))
                }
            };
        }
    }

    /// Find the class declaring a field, walking the superclass chain.
    /// Superinterfaces are not searched.
    fn find_field_in_chain(
        &mut self,
        class_name: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<Rc<LoadedClass>, Box<dyn Error>> {
        let mut current = self.loader.load(class_name)?;
        loop {
            if current.class.field(name, descriptor).is_some() {
                return Ok(current);
            }
            current = match current
                .super_name
                .clone()
                .filter(|s| s != "java/lang/Object")
            {
                Some(super_name) => self.loader.load(&super_name)?,
                None => return Err(Box::new(missing_field(class_name, name, descriptor))),
            };
        }
    }

    /// Superclass-chain walk for checkcast and instanceof; interfaces a
    /// class declares count as well.
    fn is_instance_of(
        &mut self,
        reference: &Reference,
        class_name: &str,
    ) -> Result<bool, Box<dyn Error>> {
        if reference.is_null() {
            return Ok(false);
        }
        if class_name == "java/lang/Object" {
            return Ok(true);
        }
        match reference {
            Reference::Str(_) => Ok(class_name == "java/lang/String"),
            Reference::Stream(_) => Ok(class_name == "java/io/PrintStream"),
            Reference::Array(_) => Ok(false),
            Reference::Instance(instance) => {
                let mut current = self.loader.load(&instance.class_name)?;
                loop {
                    if current.name == class_name {
                        return Ok(true);
                    }
                    for index in &current.class.interfaces {
                        if current.class.class_name(*index)? == class_name {
                            return Ok(true);
                        }
                    }
                    current = match current
                        .super_name
                        .clone()
                        .filter(|s| s != "java/lang/Object")
                    {
                        Some(super_name) => self.loader.load(&super_name)?,
                        None => return Ok(false),
                    };
                }
            }
            Reference::Null => Ok(false),
        }
    }

    /// The dispatch loop. Runs the top frame instruction by instruction;
    /// invocations push a frame and continue there, returns pop one and
    /// hand the result down. Exits when the frame at `base` returns.
    fn run(&mut self, base: usize) -> Result<Option<Value>, Box<dyn Error>> {
        'frames: loop {
            let mut frame = self
                .frames
                .pop()
                .expect("dispatch loop without a frame");
            loop {
                if frame.pc >= frame.code.code.len() {
                    // fell off the end of the method: implicit void return
                    if self.frames.len() > base {
                        continue 'frames;
                    }
                    return Ok(None);
                }
                let at = frame.pc;
                let (instruction, next_pc) = Instruction::decode(&frame.code.code, at)?;
                frame.pc = next_pc;
                trace!("{} {:4}: {}", frame.class.name, at, instruction.mnemonic.name());
                let Instruction { mnemonic, operands } = instruction;
                match mnemonic {
                    Mnemonic::Nop => {}

                    // constants
                    Mnemonic::AconstNull => frame.push(Value::Reference(Reference::Null)),
                    Mnemonic::IconstM1 => frame.push(Value::Int(-1)),
                    Mnemonic::Iconst0 => frame.push(Value::Int(0)),
                    Mnemonic::Iconst1 => frame.push(Value::Int(1)),
                    Mnemonic::Iconst2 => frame.push(Value::Int(2)),
                    Mnemonic::Iconst3 => frame.push(Value::Int(3)),
                    Mnemonic::Iconst4 => frame.push(Value::Int(4)),
                    Mnemonic::Iconst5 => frame.push(Value::Int(5)),
                    Mnemonic::Lconst0 => frame.push(Value::Long(0)),
                    Mnemonic::Lconst1 => frame.push(Value::Long(1)),
                    Mnemonic::Fconst0 => frame.push(Value::Float(0.0)),
                    Mnemonic::Fconst1 => frame.push(Value::Float(1.0)),
                    Mnemonic::Fconst2 => frame.push(Value::Float(2.0)),
                    Mnemonic::Dconst0 => frame.push(Value::Double(0.0)),
                    Mnemonic::Dconst1 => frame.push(Value::Double(1.0)),
                    Mnemonic::Bipush | Mnemonic::Sipush => {
                        if let Operands::Immediate(value) = operands {
                            frame.push(Value::Int(value));
                        }
                    }
                    Mnemonic::Ldc | Mnemonic::LdcW | Mnemonic::Ldc2W => {
                        let index = expect_pool(&operands);
                        frame.push(resolve_constant(&frame.class, index)?);
                    }

                    // loads; the slot is typed by the bytecode, the copy is
                    // not
                    Mnemonic::Iload
                    | Mnemonic::Lload
                    | Mnemonic::Fload
                    | Mnemonic::Dload
                    | Mnemonic::Aload => {
                        let slot = expect_var(&operands);
                        frame.push(frame.load(slot));
                    }
                    Mnemonic::Iload0
                    | Mnemonic::Lload0
                    | Mnemonic::Fload0
                    | Mnemonic::Dload0
                    | Mnemonic::Aload0 => frame.push(frame.load(0)),
                    Mnemonic::Iload1
                    | Mnemonic::Lload1
                    | Mnemonic::Fload1
                    | Mnemonic::Dload1
                    | Mnemonic::Aload1 => frame.push(frame.load(1)),
                    Mnemonic::Iload2
                    | Mnemonic::Lload2
                    | Mnemonic::Fload2
                    | Mnemonic::Dload2
                    | Mnemonic::Aload2 => frame.push(frame.load(2)),
                    Mnemonic::Iload3
                    | Mnemonic::Lload3
                    | Mnemonic::Fload3
                    | Mnemonic::Dload3
                    | Mnemonic::Aload3 => frame.push(frame.load(3)),

                    // stores
                    Mnemonic::Istore
                    | Mnemonic::Lstore
                    | Mnemonic::Fstore
                    | Mnemonic::Dstore
                    | Mnemonic::Astore => {
                        let slot = expect_var(&operands);
                        let value = frame.pop();
                        frame.store(slot, value);
                    }
                    Mnemonic::Istore0
                    | Mnemonic::Lstore0
                    | Mnemonic::Fstore0
                    | Mnemonic::Dstore0
                    | Mnemonic::Astore0 => {
                        let value = frame.pop();
                        frame.store(0, value);
                    }
                    Mnemonic::Istore1
                    | Mnemonic::Lstore1
                    | Mnemonic::Fstore1
                    | Mnemonic::Dstore1
                    | Mnemonic::Astore1 => {
                        let value = frame.pop();
                        frame.store(1, value);
                    }
                    Mnemonic::Istore2
                    | Mnemonic::Lstore2
                    | Mnemonic::Fstore2
                    | Mnemonic::Dstore2
                    | Mnemonic::Astore2 => {
                        let value = frame.pop();
                        frame.store(2, value);
                    }
                    Mnemonic::Istore3
                    | Mnemonic::Lstore3
                    | Mnemonic::Fstore3
                    | Mnemonic::Dstore3
                    | Mnemonic::Astore3 => {
                        let value = frame.pop();
                        frame.store(3, value);
                    }

                    // array loads and stores
                    Mnemonic::Iaload
                    | Mnemonic::Laload
                    | Mnemonic::Faload
                    | Mnemonic::Daload
                    | Mnemonic::Aaload
                    | Mnemonic::Baload
                    | Mnemonic::Caload
                    | Mnemonic::Saload => {
                        let index = frame.pop_int();
                        let array = self.array_at(&mut frame)?;
                        let array = array.borrow();
                        let value = array
                            .values
                            .get(index.max(0) as usize)
                            .filter(|_| index >= 0)
                            .cloned()
                            .ok_or_else(|| {
                                RuntimeError::new(
                                    RuntimeCause::IndexOutOfBounds {
                                        index,
                                        length: array.values.len(),
                                    },
                                    "",
                                )
                            })?;
                        drop(array);
                        frame.push(value);
                    }
                    Mnemonic::Iastore
                    | Mnemonic::Lastore
                    | Mnemonic::Fastore
                    | Mnemonic::Dastore
                    | Mnemonic::Aastore
                    | Mnemonic::Bastore
                    | Mnemonic::Castore
                    | Mnemonic::Sastore => {
                        let value = frame.pop();
                        let index = frame.pop_int();
                        let array = self.array_at(&mut frame)?;
                        let mut array = array.borrow_mut();
                        let length = array.values.len();
                        if index < 0 || index as usize >= length {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::IndexOutOfBounds { index, length },
                                "",
                            )));
                        }
                        // narrow int values to the element width on store
                        let value = match (array.element, value) {
                            (ElementKind::Byte | ElementKind::Boolean, Value::Int(v)) => {
                                Value::Int(v as i8 as i32)
                            }
                            (ElementKind::Char, Value::Int(v)) => Value::Int(v as u16 as i32),
                            (ElementKind::Short, Value::Int(v)) => Value::Int(v as i16 as i32),
                            (_, v) => v,
                        };
                        array.values[index as usize] = value;
                    }
                    Mnemonic::Arraylength => {
                        let array = self.array_at(&mut frame)?;
                        let length = array.borrow().values.len();
                        frame.push(Value::Int(length as i32));
                    }

                    // operand stack management, by category
                    Mnemonic::Pop => {
                        frame.pop();
                    }
                    Mnemonic::Pop2 => {
                        if frame.pop().category() == 1 {
                            frame.pop();
                        }
                    }
                    Mnemonic::Dup => {
                        let v = frame.pop();
                        frame.push(v.clone());
                        frame.push(v);
                    }
                    Mnemonic::DupX1 => {
                        let v1 = frame.pop();
                        let v2 = frame.pop();
                        frame.push(v1.clone());
                        frame.push(v2);
                        frame.push(v1);
                    }
                    Mnemonic::DupX2 => {
                        let v1 = frame.pop();
                        let v2 = frame.pop();
                        if v2.category() == 2 {
                            frame.push(v1.clone());
                            frame.push(v2);
                            frame.push(v1);
                        } else {
                            let v3 = frame.pop();
                            frame.push(v1.clone());
                            frame.push(v3);
                            frame.push(v2);
                            frame.push(v1);
                        }
                    }
                    Mnemonic::Dup2 => {
                        let v1 = frame.pop();
                        if v1.category() == 2 {
                            frame.push(v1.clone());
                            frame.push(v1);
                        } else {
                            let v2 = frame.pop();
                            frame.push(v2.clone());
                            frame.push(v1.clone());
                            frame.push(v2);
                            frame.push(v1);
                        }
                    }
                    Mnemonic::Dup2X1 => {
                        let v1 = frame.pop();
                        if v1.category() == 2 {
                            let v2 = frame.pop();
                            frame.push(v1.clone());
                            frame.push(v2);
                            frame.push(v1);
                        } else {
                            let v2 = frame.pop();
                            let v3 = frame.pop();
                            frame.push(v2.clone());
                            frame.push(v1.clone());
                            frame.push(v3);
                            frame.push(v2);
                            frame.push(v1);
                        }
                    }
                    Mnemonic::Dup2X2 => {
                        let v1 = frame.pop();
                        if v1.category() == 2 {
                            let v2 = frame.pop();
                            if v2.category() == 2 {
                                frame.push(v1.clone());
                                frame.push(v2);
                                frame.push(v1);
                            } else {
                                let v3 = frame.pop();
                                frame.push(v1.clone());
                                frame.push(v3);
                                frame.push(v2);
                                frame.push(v1);
                            }
                        } else {
                            let v2 = frame.pop();
                            let v3 = frame.pop();
                            if v3.category() == 2 {
                                frame.push(v2.clone());
                                frame.push(v1.clone());
                                frame.push(v3);
                                frame.push(v2);
                                frame.push(v1);
                            } else {
                                let v4 = frame.pop();
                                frame.push(v2.clone());
                                frame.push(v1.clone());
                                frame.push(v4);
                                frame.push(v3);
                                frame.push(v2);
                                frame.push(v1);
                            }
                        }
                    }
                    Mnemonic::Swap => {
                        let v1 = frame.pop();
                        let v2 = frame.pop();
                        frame.push(v1);
                        frame.push(v2);
                    }

                    // arithmetic
                    Mnemonic::Iadd => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        frame.push(Value::Int(a.wrapping_add(b)));
                    }
                    Mnemonic::Ladd => {
                        let b = frame.pop_long();
                        let a = frame.pop_long();
                        frame.push(Value::Long(a.wrapping_add(b)));
                    }
                    Mnemonic::Fadd => {
                        let b = frame.pop_float();
                        let a = frame.pop_float();
                        frame.push(Value::Float(a + b));
                    }
                    Mnemonic::Dadd => {
                        let b = frame.pop_double();
                        let a = frame.pop_double();
                        frame.push(Value::Double(a + b));
                    }
                    Mnemonic::Isub => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        frame.push(Value::Int(a.wrapping_sub(b)));
                    }
                    Mnemonic::Lsub => {
                        let b = frame.pop_long();
                        let a = frame.pop_long();
                        frame.push(Value::Long(a.wrapping_sub(b)));
                    }
                    Mnemonic::Fsub => {
                        let b = frame.pop_float();
                        let a = frame.pop_float();
                        frame.push(Value::Float(a - b));
                    }
                    Mnemonic::Dsub => {
                        let b = frame.pop_double();
                        let a = frame.pop_double();
                        frame.push(Value::Double(a - b));
                    }
                    Mnemonic::Imul => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        frame.push(Value::Int(a.wrapping_mul(b)));
                    }
                    Mnemonic::Lmul => {
                        let b = frame.pop_long();
                        let a = frame.pop_long();
                        frame.push(Value::Long(a.wrapping_mul(b)));
                    }
                    Mnemonic::Fmul => {
                        let b = frame.pop_float();
                        let a = frame.pop_float();
                        frame.push(Value::Float(a * b));
                    }
                    Mnemonic::Dmul => {
                        let b = frame.pop_double();
                        let a = frame.pop_double();
                        frame.push(Value::Double(a * b));
                    }
                    Mnemonic::Idiv => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        if b == 0 {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::DivisionByZero,
                                "idiv",
                            )));
                        }
                        frame.push(Value::Int(a.wrapping_div(b)));
                    }
                    Mnemonic::Ldiv => {
                        let b = frame.pop_long();
                        let a = frame.pop_long();
                        if b == 0 {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::DivisionByZero,
                                "ldiv",
                            )));
                        }
                        frame.push(Value::Long(a.wrapping_div(b)));
                    }
                    Mnemonic::Fdiv => {
                        let b = frame.pop_float();
                        let a = frame.pop_float();
                        frame.push(Value::Float(a / b));
                    }
                    Mnemonic::Ddiv => {
                        let b = frame.pop_double();
                        let a = frame.pop_double();
                        frame.push(Value::Double(a / b));
                    }
                    Mnemonic::Irem => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        if b == 0 {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::DivisionByZero,
                                "irem",
                            )));
                        }
                        frame.push(Value::Int(a.wrapping_rem(b)));
                    }
                    Mnemonic::Lrem => {
                        let b = frame.pop_long();
                        let a = frame.pop_long();
                        if b == 0 {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::DivisionByZero,
                                "lrem",
                            )));
                        }
                        frame.push(Value::Long(a.wrapping_rem(b)));
                    }
                    Mnemonic::Frem => {
                        let b = frame.pop_float();
                        let a = frame.pop_float();
                        frame.push(Value::Float(a % b));
                    }
                    Mnemonic::Drem => {
                        let b = frame.pop_double();
                        let a = frame.pop_double();
                        frame.push(Value::Double(a % b));
                    }
                    Mnemonic::Ineg => {
                        let a = frame.pop_int();
                        frame.push(Value::Int(a.wrapping_neg()));
                    }
                    Mnemonic::Lneg => {
                        let a = frame.pop_long();
                        frame.push(Value::Long(a.wrapping_neg()));
                    }
                    Mnemonic::Fneg => {
                        let a = frame.pop_float();
                        frame.push(Value::Float(-a));
                    }
                    Mnemonic::Dneg => {
                        let a = frame.pop_double();
                        frame.push(Value::Double(-a));
                    }

                    // shifts and bitwise; shift distances use the low bits
                    // only
                    Mnemonic::Ishl => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        frame.push(Value::Int(a.wrapping_shl(b as u32 & 0x1F)));
                    }
                    Mnemonic::Lshl => {
                        let b = frame.pop_int();
                        let a = frame.pop_long();
                        frame.push(Value::Long(a.wrapping_shl(b as u32 & 0x3F)));
                    }
                    Mnemonic::Ishr => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        frame.push(Value::Int(a.wrapping_shr(b as u32 & 0x1F)));
                    }
                    Mnemonic::Lshr => {
                        let b = frame.pop_int();
                        let a = frame.pop_long();
                        frame.push(Value::Long(a.wrapping_shr(b as u32 & 0x3F)));
                    }
                    Mnemonic::Iushr => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        frame.push(Value::Int(
                            ((a as u32).wrapping_shr(b as u32 & 0x1F)) as i32,
                        ));
                    }
                    Mnemonic::Lushr => {
                        let b = frame.pop_int();
                        let a = frame.pop_long();
                        frame.push(Value::Long(
                            ((a as u64).wrapping_shr(b as u32 & 0x3F)) as i64,
                        ));
                    }
                    Mnemonic::Iand => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        frame.push(Value::Int(a & b));
                    }
                    Mnemonic::Land => {
                        let b = frame.pop_long();
                        let a = frame.pop_long();
                        frame.push(Value::Long(a & b));
                    }
                    Mnemonic::Ior => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        frame.push(Value::Int(a | b));
                    }
                    Mnemonic::Lor => {
                        let b = frame.pop_long();
                        let a = frame.pop_long();
                        frame.push(Value::Long(a | b));
                    }
                    Mnemonic::Ixor => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        frame.push(Value::Int(a ^ b));
                    }
                    Mnemonic::Lxor => {
                        let b = frame.pop_long();
                        let a = frame.pop_long();
                        frame.push(Value::Long(a ^ b));
                    }
                    Mnemonic::Iinc => {
                        if let Operands::Iinc { index, delta } = operands {
                            if let Value::Int(v) = frame.load(index as usize) {
                                frame.store(index as usize, Value::Int(v.wrapping_add(delta)));
                            }
                        }
                    }

                    // conversions; float to int saturates, NaN goes to zero
                    Mnemonic::I2l => {
                        let v = frame.pop_int();
                        frame.push(Value::Long(v as i64));
                    }
                    Mnemonic::I2f => {
                        let v = frame.pop_int();
                        frame.push(Value::Float(v as f32));
                    }
                    Mnemonic::I2d => {
                        let v = frame.pop_int();
                        frame.push(Value::Double(v as f64));
                    }
                    Mnemonic::L2i => {
                        let v = frame.pop_long();
                        frame.push(Value::Int(v as i32));
                    }
                    Mnemonic::L2f => {
                        let v = frame.pop_long();
                        frame.push(Value::Float(v as f32));
                    }
                    Mnemonic::L2d => {
                        let v = frame.pop_long();
                        frame.push(Value::Double(v as f64));
                    }
                    Mnemonic::F2i => {
                        let v = frame.pop_float();
                        frame.push(Value::Int(v as i32));
                    }
                    Mnemonic::F2l => {
                        let v = frame.pop_float();
                        frame.push(Value::Long(v as i64));
                    }
                    Mnemonic::F2d => {
                        let v = frame.pop_float();
                        frame.push(Value::Double(v as f64));
                    }
                    Mnemonic::D2i => {
                        let v = frame.pop_double();
                        frame.push(Value::Int(v as i32));
                    }
                    Mnemonic::D2l => {
                        let v = frame.pop_double();
                        frame.push(Value::Long(v as i64));
                    }
                    Mnemonic::D2f => {
                        let v = frame.pop_double();
                        frame.push(Value::Float(v as f32));
                    }
                    Mnemonic::I2b => {
                        let v = frame.pop_int();
                        frame.push(Value::Int(v as i8 as i32));
                    }
                    Mnemonic::I2c => {
                        let v = frame.pop_int();
                        frame.push(Value::Int(v as u16 as i32));
                    }
                    Mnemonic::I2s => {
                        let v = frame.pop_int();
                        frame.push(Value::Int(v as i16 as i32));
                    }

                    // comparisons
                    Mnemonic::Lcmp => {
                        let b = frame.pop_long();
                        let a = frame.pop_long();
                        frame.push(Value::Int(match a.cmp(&b) {
                            std::cmp::Ordering::Less => -1,
                            std::cmp::Ordering::Equal => 0,
                            std::cmp::Ordering::Greater => 1,
                        }));
                    }
                    Mnemonic::Fcmpl | Mnemonic::Fcmpg => {
                        let b = frame.pop_float();
                        let a = frame.pop_float();
                        let result = match a.partial_cmp(&b) {
                            Some(std::cmp::Ordering::Less) => -1,
                            Some(std::cmp::Ordering::Equal) => 0,
                            Some(std::cmp::Ordering::Greater) => 1,
                            None => {
                                if mnemonic == Mnemonic::Fcmpg {
                                    1
                                } else {
                                    -1
                                }
                            }
                        };
                        frame.push(Value::Int(result));
                    }
                    Mnemonic::Dcmpl | Mnemonic::Dcmpg => {
                        let b = frame.pop_double();
                        let a = frame.pop_double();
                        let result = match a.partial_cmp(&b) {
                            Some(std::cmp::Ordering::Less) => -1,
                            Some(std::cmp::Ordering::Equal) => 0,
                            Some(std::cmp::Ordering::Greater) => 1,
                            None => {
                                if mnemonic == Mnemonic::Dcmpg {
                                    1
                                } else {
                                    -1
                                }
                            }
                        };
                        frame.push(Value::Int(result));
                    }

                    // branches
                    Mnemonic::Ifeq
                    | Mnemonic::Ifne
                    | Mnemonic::Iflt
                    | Mnemonic::Ifge
                    | Mnemonic::Ifgt
                    | Mnemonic::Ifle => {
                        let v = frame.pop_int();
                        let taken = match mnemonic {
                            Mnemonic::Ifeq => v == 0,
                            Mnemonic::Ifne => v != 0,
                            Mnemonic::Iflt => v < 0,
                            Mnemonic::Ifge => v >= 0,
                            Mnemonic::Ifgt => v > 0,
                            _ => v <= 0,
                        };
                        if taken {
                            branch(&mut frame, at, expect_branch(&operands))?;
                        }
                    }
                    Mnemonic::IfIcmpeq
                    | Mnemonic::IfIcmpne
                    | Mnemonic::IfIcmplt
                    | Mnemonic::IfIcmpge
                    | Mnemonic::IfIcmpgt
                    | Mnemonic::IfIcmple => {
                        let b = frame.pop_int();
                        let a = frame.pop_int();
                        let taken = match mnemonic {
                            Mnemonic::IfIcmpeq => a == b,
                            Mnemonic::IfIcmpne => a != b,
                            Mnemonic::IfIcmplt => a < b,
                            Mnemonic::IfIcmpge => a >= b,
                            Mnemonic::IfIcmpgt => a > b,
                            _ => a <= b,
                        };
                        if taken {
                            branch(&mut frame, at, expect_branch(&operands))?;
                        }
                    }
                    Mnemonic::IfAcmpeq | Mnemonic::IfAcmpne => {
                        let b = frame.pop_reference();
                        let a = frame.pop_reference();
                        let same = a.same(&b);
                        if same == (mnemonic == Mnemonic::IfAcmpeq) {
                            branch(&mut frame, at, expect_branch(&operands))?;
                        }
                    }
                    Mnemonic::Ifnull | Mnemonic::Ifnonnull => {
                        let v = frame.pop_reference();
                        if v.is_null() == (mnemonic == Mnemonic::Ifnull) {
                            branch(&mut frame, at, expect_branch(&operands))?;
                        }
                    }
                    Mnemonic::Goto | Mnemonic::GotoW => {
                        branch(&mut frame, at, expect_branch(&operands))?;
                    }
                    Mnemonic::Jsr | Mnemonic::JsrW => {
                        frame.push(Value::ReturnAddress(next_pc as u16));
                        branch(&mut frame, at, expect_branch(&operands))?;
                    }
                    Mnemonic::Ret => {
                        let slot = expect_var(&operands);
                        match frame.load(slot) {
                            Value::ReturnAddress(address) => frame.pc = address as usize,
                            v => panic!("ret on a non-address local {v:?}"),
                        }
                    }
                    Mnemonic::Tableswitch => {
                        if let Operands::TableSwitch {
                            default,
                            low,
                            offsets,
                        } = operands
                        {
                            let v = frame.pop_int();
                            let offset = if v < low || (v as i64) > low as i64 + offsets.len() as i64 - 1
                            {
                                default
                            } else {
                                offsets[(v - low) as usize]
                            };
                            branch(&mut frame, at, offset)?;
                        }
                    }
                    Mnemonic::Lookupswitch => {
                        if let Operands::LookupSwitch { default, pairs } = operands {
                            let v = frame.pop_int();
                            let offset = pairs
                                .iter()
                                .find(|(key, _)| *key == v)
                                .map(|(_, offset)| *offset)
                                .unwrap_or(default);
                            branch(&mut frame, at, offset)?;
                        }
                    }

                    // method exit
                    Mnemonic::Return
                    | Mnemonic::Ireturn
                    | Mnemonic::Lreturn
                    | Mnemonic::Freturn
                    | Mnemonic::Dreturn
                    | Mnemonic::Areturn => {
                        let result = if mnemonic == Mnemonic::Return {
                            None
                        } else {
                            Some(frame.pop())
                        };
                        if self.frames.len() > base {
                            let caller = self
                                .frames
                                .last_mut()
                                .expect("caller frame disappeared");
                            if let Some(value) = result {
                                caller.push(value);
                            }
                            continue 'frames;
                        }
                        return Ok(result);
                    }

                    // fields
                    Mnemonic::Getstatic => {
                        let index = expect_pool(&operands);
                        let (class_name, name, descriptor) = frame.class.class.member_ref(index)?;
                        if self.natives.is_native_class(&class_name) {
                            let value = self
                                .natives
                                .static_object(&class_name, &name, &descriptor)
                                .ok_or_else(|| missing_field(&class_name, &name, &descriptor))?;
                            frame.push(value);
                        } else {
                            let declaring =
                                self.find_field_in_chain(&class_name, &name, &descriptor)?;
                            self.initialize_class(&declaring)?;
                            let value = declaring
                                .statics
                                .borrow()
                                .get(&(name.clone(), descriptor.clone()))
                                .cloned()
                                .unwrap_or_else(|| default_value(&descriptor));
                            frame.push(value);
                        }
                    }
                    Mnemonic::Putstatic => {
                        let index = expect_pool(&operands);
                        let (class_name, name, descriptor) = frame.class.class.member_ref(index)?;
                        let declaring = self.find_field_in_chain(&class_name, &name, &descriptor)?;
                        self.initialize_class(&declaring)?;
                        let value = frame.pop();
                        declaring
                            .statics
                            .borrow_mut()
                            .insert((name, descriptor), value);
                    }
                    Mnemonic::Getfield => {
                        let index = expect_pool(&operands);
                        let (_, name, descriptor) = frame.class.class.member_ref(index)?;
                        match frame.pop_reference() {
                            Reference::Instance(instance) => {
                                let value = instance
                                    .fields
                                    .borrow()
                                    .get(&(name.clone(), descriptor.clone()))
                                    .cloned()
                                    .unwrap_or_else(|| default_value(&descriptor));
                                frame.push(value);
                            }
                            Reference::Null => {
                                return Err(Box::new(RuntimeError::new(
                                    RuntimeCause::NullReference,
                                    &format!("getfield {name}"),
                                )))
                            }
                            other => panic!("getfield on {other:?}"),
                        }
                    }
                    Mnemonic::Putfield => {
                        let index = expect_pool(&operands);
                        let (_, name, descriptor) = frame.class.class.member_ref(index)?;
                        let value = frame.pop();
                        match frame.pop_reference() {
                            Reference::Instance(instance) => {
                                instance
                                    .fields
                                    .borrow_mut()
                                    .insert((name, descriptor), value);
                            }
                            Reference::Null => {
                                return Err(Box::new(RuntimeError::new(
                                    RuntimeCause::NullReference,
                                    &format!("putfield {name}"),
                                )))
                            }
                            other => panic!("putfield on {other:?}"),
                        }
                    }

                    // allocation
                    Mnemonic::New => {
                        let index = expect_pool(&operands);
                        let class_name = frame.class.class.class_name(index)?;
                        let class = self.loader.load(&class_name)?;
                        self.initialize_class(&class)?;
                        frame.push(Value::Reference(Reference::Instance(Rc::new(
                            InstanceObject::new(&class_name),
                        ))));
                    }
                    Mnemonic::Newarray => {
                        let Operands::ArrayType(atype) = operands else {
                            unreachable!("newarray always decodes an atype byte");
                        };
                        let element = ElementKind::from_atype(atype).ok_or_else(|| {
                            RuntimeError::new(
                                RuntimeCause::Unsupported("newarray type"),
                                &format!("atype {atype}"),
                            )
                        })?;
                        let count = frame.pop_int();
                        if count < 0 {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::NegativeArraySize(count),
                                "",
                            )));
                        }
                        frame.push(Value::Reference(Reference::Array(Rc::new(RefCell::new(
                            ArrayObject::new(element, count as usize),
                        )))));
                    }
                    Mnemonic::Anewarray => {
                        // the component class was validated at decode time;
                        // elements are plain references here
                        let _ = expect_pool(&operands);
                        let count = frame.pop_int();
                        if count < 0 {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::NegativeArraySize(count),
                                "",
                            )));
                        }
                        frame.push(Value::Reference(Reference::Array(Rc::new(RefCell::new(
                            ArrayObject::new(ElementKind::Reference, count as usize),
                        )))));
                    }
                    Mnemonic::Multianewarray => {
                        let Operands::MultiArray { index, dimensions } = operands else {
                            unreachable!("multianewarray always decodes index and dimensions");
                        };
                        if dimensions == 0 {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::Unsupported("multianewarray dimensions"),
                                "dimensions must be at least one",
                            )));
                        }
                        let descriptor = frame.class.class.class_name(index)?;
                        let mut counts = vec![0i32; dimensions as usize];
                        for slot in counts.iter_mut().rev() {
                            *slot = frame.pop_int();
                        }
                        let array = new_multi_array(&counts, &descriptor)?;
                        frame.push(Value::Reference(array));
                    }

                    // invocation; native classes short-circuit into the
                    // native surface
                    Mnemonic::Invokevirtual
                    | Mnemonic::Invokespecial
                    | Mnemonic::Invokestatic
                    | Mnemonic::Invokeinterface => {
                        let index = match &operands {
                            Operands::Pool(index) => *index,
                            Operands::InvokeInterface { index, .. } => *index,
                            _ => unreachable!("invoke always carries a pool index"),
                        };
                        let (class_name, name, descriptor) = frame.class.class.member_ref(index)?;
                        if self.natives.is_native_class(&class_name) {
                            self.natives.call(&mut frame, &class_name, &name, &descriptor)?;
                            continue;
                        }
                        let signature = descriptors::parse_method_descriptor(&descriptor)
                            .ok_or_else(|| {
                                missing_method(&class_name, &name, &descriptor, "not a method ref")
                            })?;
                        let has_receiver = mnemonic != Mnemonic::Invokestatic;
                        let arg_count = signature.parameters.len() + has_receiver as usize;

                        // invokeinterface dispatches on the receiver's own
                        // class; the other three resolve on the named class
                        let resolve_from = if mnemonic == Mnemonic::Invokeinterface {
                            match &frame.stack[frame.stack.len() - arg_count] {
                                Value::Reference(Reference::Instance(instance)) => {
                                    instance.class_name.clone()
                                }
                                Value::Reference(Reference::Null) => {
                                    return Err(Box::new(RuntimeError::new(
                                        RuntimeCause::NullReference,
                                        &format!("invokeinterface {name}"),
                                    )))
                                }
                                _ => class_name.clone(),
                            }
                        } else {
                            class_name.clone()
                        };
                        let target = self.loader.load(&resolve_from)?;
                        if mnemonic == Mnemonic::Invokestatic {
                            self.initialize_class(&target)?;
                        }
                        let (declaring, method_index) =
                            self.find_method_in_chain(target, &name, &descriptor)?;
                        let method = &declaring.methods[method_index];
                        if method.is_native() {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::UnresolvedNative {
                                    class: declaring.name.clone(),
                                    name: name.clone(),
                                },
                                "",
                            )));
                        }
                        let code = method.code.clone().ok_or_else(|| {
                            missing_method(&declaring.name, &name, &descriptor, "method is abstract")
                        })?;
                        let mut args = Vec::with_capacity(arg_count);
                        for _ in 0..arg_count {
                            args.push(frame.pop());
                        }
                        args.reverse();
                        let callee = frame_with_arguments(code, declaring.clone(), args);
                        self.frames.push(frame);
                        self.frames.push(callee);
                        continue 'frames;
                    }
                    Mnemonic::Invokedynamic => {
                        return Err(Box::new(RuntimeError::new(
                            RuntimeCause::Unsupported("invokedynamic"),
                            "",
                        )))
                    }

                    // type tests
                    Mnemonic::Checkcast => {
                        let index = expect_pool(&operands);
                        let class_name = frame.class.class.class_name(index)?;
                        let reference = frame.pop_reference();
                        if !reference.is_null() && !self.is_instance_of(&reference, &class_name)? {
                            return Err(Box::new(RuntimeError::new(
                                RuntimeCause::ClassCast {
                                    from: format!("{reference:?}"),
                                    to: class_name,
                                },
                                "",
                            )));
                        }
                        frame.push(Value::Reference(reference));
                    }
                    Mnemonic::Instanceof => {
                        let index = expect_pool(&operands);
                        let class_name = frame.class.class.class_name(index)?;
                        let reference = frame.pop_reference();
                        let is = self.is_instance_of(&reference, &class_name)?;
                        frame.push(Value::Int(is as i32));
                    }

                    // no monitors on a single-threaded machine
                    Mnemonic::Monitorenter | Mnemonic::Monitorexit => {
                        frame.pop_reference();
                    }

                    Mnemonic::Athrow => {
                        return Err(Box::new(RuntimeError::new(
                            RuntimeCause::Unsupported("athrow"),
                            "exception objects are not implemented",
                        )))
                    }

                    Mnemonic::Wide => {
                        unreachable!("wide is folded into its follower during decoding")
                    }
                    Mnemonic::Unknown(opcode) => {
                        return Err(Box::new(RuntimeError::new(
                            RuntimeCause::BadJump(at),
                            &format!("undefined opcode {opcode:#04X}"),
                        )))
                    }
                }
            }
        }
    }

    /// Pop an array reference off the operand stack.
    fn array_at(
        &mut self,
        frame: &mut StackFrame,
    ) -> Result<Rc<RefCell<ArrayObject>>, RuntimeError> {
        match frame.pop_reference() {
            Reference::Array(array) => Ok(array),
            Reference::Null => Err(RuntimeError::new(RuntimeCause::NullReference, "array access")),
            other => panic!("array instruction on {other:?}"),
        }
    }
}

/// Allocate a rectangular array of arrays, outermost dimension first. The
/// innermost level is typed by the element of the array descriptor.
fn new_multi_array(counts: &[i32], descriptor: &str) -> Result<Reference, RuntimeError> {
    let (&count, rest) = counts
        .split_first()
        .expect("multianewarray with zero dimensions");
    if count < 0 {
        return Err(RuntimeError::new(
            RuntimeCause::NegativeArraySize(count),
            "",
        ));
    }
    let array = if rest.is_empty() {
        let element = match descriptor.trim_start_matches('[').as_bytes().first() {
            Some(b'Z') => ElementKind::Boolean,
            Some(b'C') => ElementKind::Char,
            Some(b'F') => ElementKind::Float,
            Some(b'D') => ElementKind::Double,
            Some(b'B') => ElementKind::Byte,
            Some(b'S') => ElementKind::Short,
            Some(b'I') => ElementKind::Int,
            Some(b'J') => ElementKind::Long,
            _ => ElementKind::Reference,
        };
        ArrayObject::new(element, count as usize)
    } else {
        let mut outer = ArrayObject::new(ElementKind::Reference, count as usize);
        for slot in outer.values.iter_mut() {
            *slot = Value::Reference(new_multi_array(rest, descriptor)?);
        }
        outer
    };
    Ok(Reference::Array(Rc::new(RefCell::new(array))))
}
