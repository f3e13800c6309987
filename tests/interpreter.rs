mod common;

use common::{attribute, member, Image};
use jclass::class_file::ClassFile;
use rjvm::errors::runtime::{RuntimeCause, RuntimeError};
use rjvm::loader::{ClassLoader, LoadedClass};
use rjvm::stack_frame::Value;
use rjvm::vm::VirtualMachine;

fn vm_with(images: &[Image]) -> VirtualMachine {
    let mut loader = ClassLoader::new(".");
    for image in images {
        let class = ClassFile::from_bytes(&image.build()).expect("test image must decode");
        loader.register(LoadedClass::link(class).expect("test image must link"));
    }
    VirtualMachine::new(loader)
}

fn run_static(
    vm: &mut VirtualMachine,
    class: &str,
    name: &str,
    descriptor: &str,
    args: Vec<Value>,
) -> Option<Value> {
    let class = vm.loader.get(class).expect("class not registered");
    vm.invoke(class, name, descriptor, args).expect("invocation failed")
}

#[test]
fn integer_arithmetic() {
    let mut image = Image::new("Math");
    // iload_0, iload_1, iadd, ireturn
    image.static_method("add", "(II)I", 2, 2, &[0x1A, 0x1B, 0x60, 0xAC]);
    let mut vm = vm_with(&[image]);
    let result = run_static(
        &mut vm,
        "Math",
        "add",
        "(II)I",
        vec![Value::Int(40), Value::Int(2)],
    );
    assert!(matches!(result, Some(Value::Int(42))));
}

#[test]
fn longs_take_two_local_slots() {
    let mut image = Image::new("Math");
    // lload_0, lload_0, ladd, lreturn; the argument sits in slots 0 and 1
    image.static_method("twice", "(J)J", 4, 2, &[0x1E, 0x1E, 0x61, 0xAD]);
    let mut vm = vm_with(&[image]);
    let result = run_static(
        &mut vm,
        "Math",
        "twice",
        "(J)J",
        vec![Value::Long(1 << 33)],
    );
    assert!(matches!(result, Some(Value::Long(v)) if v == 1 << 34));
}

#[test]
fn loops_and_branches() {
    let mut image = Image::new("Loops");
    // sum of 0..n with if_icmpge and a backwards goto
    let code = [
        0x03, 0x3C, // iconst_0, istore_1 (acc)
        0x03, 0x3D, // iconst_0, istore_2 (i)
        0x1C, 0x1A, // iload_2, iload_0
        0xA2, 0x00, 0x0D, // if_icmpge +13 -> 19
        0x1B, 0x1C, 0x60, 0x3C, // acc += i
        0x84, 0x02, 0x01, // iinc 2, 1
        0xA7, 0xFF, 0xF4, // goto -12 -> 4
        0x1B, 0xAC, // iload_1, ireturn
    ];
    image.static_method("sum", "(I)I", 2, 3, &code);
    let mut vm = vm_with(&[image]);
    let result = run_static(&mut vm, "Loops", "sum", "(I)I", vec![Value::Int(5)]);
    assert!(matches!(result, Some(Value::Int(10))));
}

#[test]
fn tableswitch_picks_the_right_arm() {
    let mut image = Image::new("Switch");
    let mut code = vec![0x1A, 0xAA, 0, 0]; // iload_0, tableswitch, 2 pad bytes
    code.extend_from_slice(&29i32.to_be_bytes()); // default -> 30
    code.extend_from_slice(&0i32.to_be_bytes()); // low
    code.extend_from_slice(&1i32.to_be_bytes()); // high
    code.extend_from_slice(&23i32.to_be_bytes()); // 0 -> 24
    code.extend_from_slice(&26i32.to_be_bytes()); // 1 -> 27
    code.extend_from_slice(&[0x10, 10, 0xAC]); // bipush 10, ireturn
    code.extend_from_slice(&[0x10, 20, 0xAC]); // bipush 20, ireturn
    code.extend_from_slice(&[0x02, 0xAC]); // iconst_m1, ireturn
    image.static_method("pick", "(I)I", 1, 1, &code);
    let mut vm = vm_with(&[image]);
    for (input, expected) in [(0, 10), (1, 20), (7, -1), (-3, -1)] {
        let result = run_static(&mut vm, "Switch", "pick", "(I)I", vec![Value::Int(input)]);
        assert!(
            matches!(result, Some(Value::Int(v)) if v == expected),
            "pick({input})"
        );
    }
}

#[test]
fn dup2_duplicates_one_category_2_value() {
    let mut image = Image::new("Stack");
    // lload_0, dup2, ladd, lreturn
    image.static_method("double", "(J)J", 4, 2, &[0x1E, 0x5C, 0x61, 0xAD]);
    let mut vm = vm_with(&[image]);
    let result = run_static(
        &mut vm,
        "Stack",
        "double",
        "(J)J",
        vec![Value::Long(21)],
    );
    assert!(matches!(result, Some(Value::Long(42))));
}

#[test]
fn pop2_removes_two_category_1_values() {
    let mut image = Image::new("Stack");
    // iconst_1, iconst_2, pop2, iload_0, ireturn
    image.static_method("id", "(I)I", 3, 1, &[0x04, 0x05, 0x58, 0x1A, 0xAC]);
    let mut vm = vm_with(&[image]);
    let result = run_static(&mut vm, "Stack", "id", "(I)I", vec![Value::Int(9)]);
    assert!(matches!(result, Some(Value::Int(9))));
}

#[test]
fn arrays_store_and_load() {
    let mut image = Image::new("Arrays");
    // iconst_3, newarray int, dup, iconst_0, bipush 7, iastore,
    // iconst_0, iaload, ireturn
    image.static_method(
        "first",
        "()I",
        4,
        0,
        &[0x06, 0xBC, 0x0A, 0x59, 0x03, 0x10, 0x07, 0x4F, 0x03, 0x2E, 0xAC],
    );
    let mut vm = vm_with(&[image]);
    let result = run_static(&mut vm, "Arrays", "first", "()I", vec![]);
    assert!(matches!(result, Some(Value::Int(7))));
}

#[test]
fn static_calls_push_and_pop_frames() {
    let mut image = Image::new("Calls");
    let helper_name = image.pool.utf8("helper");
    let helper_descriptor = image.pool.utf8("()I");
    let nat = image.pool.name_and_type(helper_name, helper_descriptor);
    let helper_ref = image.pool.methodref(image.this_class, nat);
    let outer = [
        0xB8,
        (helper_ref >> 8) as u8,
        helper_ref as u8, // invokestatic helper
        0x04,
        0x60, // iconst_1, iadd
        0xAC, // ireturn
    ];
    image.static_method("outer", "()I", 2, 0, &outer);
    image.static_method("helper", "()I", 1, 0, &[0x10, 41, 0xAC]); // bipush 41
    let mut vm = vm_with(&[image]);
    let result = run_static(&mut vm, "Calls", "outer", "()I", vec![]);
    assert!(matches!(result, Some(Value::Int(42))));
    // the frame stack is balanced again: a second call still works
    let again = run_static(&mut vm, "Calls", "outer", "()I", vec![]);
    assert!(matches!(again, Some(Value::Int(42))));
}

#[test]
fn clinit_runs_exactly_once() {
    let mut image = Image::new("Init");
    image.static_field("count", "I");
    let count_name = image.pool.utf8("count");
    let count_descriptor = image.pool.utf8("I");
    let nat = image.pool.name_and_type(count_name, count_descriptor);
    let count_ref = image.pool.fieldref(image.this_class, nat);
    let hi = (count_ref >> 8) as u8;
    let lo = count_ref as u8;
    // count = count + 1
    let clinit = [0xB2, hi, lo, 0x04, 0x60, 0xB3, hi, lo, 0xB1];
    image.static_method("<clinit>", "()V", 2, 0, &clinit);
    let mut vm = vm_with(&[image]);
    let class = vm.loader.get("Init").unwrap();
    vm.initialize_class(&class).unwrap();
    vm.initialize_class(&class).unwrap();
    let statics = class.statics.borrow();
    let value = statics.get(&("count".to_string(), "I".to_string())).unwrap();
    assert!(matches!(value, Value::Int(1)));
}

#[test]
fn constant_value_seeds_static_fields() {
    let mut image = Image::new("Seeded");
    let name_index = image.pool.utf8("answer");
    let descriptor_index = image.pool.utf8("I");
    let cv_name = image.pool.utf8("ConstantValue");
    let value_index = image.pool.integer(42);
    let cv = attribute(cv_name, &value_index.to_be_bytes());
    image
        .fields
        .push(member(0x0008, name_index, descriptor_index, &[cv]));
    let mut vm = vm_with(&[image]);
    let class = vm.loader.get("Seeded").unwrap();
    vm.initialize_class(&class).unwrap();
    let statics = class.statics.borrow();
    let value = statics
        .get(&("answer".to_string(), "I".to_string()))
        .unwrap();
    assert!(matches!(value, Value::Int(42)));
}

#[test]
fn hello_world_runs_to_completion() {
    let mut image = Image::new("Hello");
    let text = image.pool.utf8("hello");
    let string_index = image.pool.string(text);
    let system_name = image.pool.utf8("java/lang/System");
    let system = image.pool.class(system_name);
    let out_name = image.pool.utf8("out");
    let out_descriptor = image.pool.utf8("Ljava/io/PrintStream;");
    let out_nat = image.pool.name_and_type(out_name, out_descriptor);
    let out_ref = image.pool.fieldref(system, out_nat);
    let stream_name = image.pool.utf8("java/io/PrintStream");
    let stream = image.pool.class(stream_name);
    let println_name = image.pool.utf8("println");
    let println_descriptor = image.pool.utf8("(Ljava/lang/String;)V");
    let println_nat = image.pool.name_and_type(println_name, println_descriptor);
    let println_ref = image.pool.methodref(stream, println_nat);
    let code = [
        0xB2,
        (out_ref >> 8) as u8,
        out_ref as u8, // getstatic System.out
        0x12,
        string_index as u8, // ldc "hello"
        0xB6,
        (println_ref >> 8) as u8,
        println_ref as u8, // invokevirtual println
        0xB1,              // return
    ];
    image.static_method("main", "([Ljava/lang/String;)V", 2, 1, &code);
    let mut vm = vm_with(&[image]);
    vm.run_main("Hello").expect("hello world must run");
}

#[test]
fn division_by_zero_is_fatal() {
    let mut image = Image::new("Math");
    image.static_method("div", "(II)I", 2, 2, &[0x1A, 0x1B, 0x6C, 0xAC]);
    let mut vm = vm_with(&[image]);
    let class = vm.loader.get("Math").unwrap();
    let err = vm
        .invoke(class, "div", "(II)I", vec![Value::Int(1), Value::Int(0)])
        .unwrap_err();
    let runtime = err
        .downcast_ref::<RuntimeError>()
        .expect("expected a runtime error");
    assert!(matches!(runtime.cause(), RuntimeCause::DivisionByZero));
}

#[test]
fn missing_method_is_reported() {
    let image = Image::new("Empty");
    let mut vm = vm_with(&[image]);
    let class = vm.loader.get("Empty").unwrap();
    let err = vm.invoke(class, "nope", "()V", vec![]).unwrap_err();
    let runtime = err
        .downcast_ref::<RuntimeError>()
        .expect("expected a runtime error");
    assert!(matches!(
        runtime.cause(),
        RuntimeCause::MissingMethod { name, .. } if name == "nope"
    ));
}
