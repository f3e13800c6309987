mod common;

use common::{attribute, code_body, member, minimal_image};
use jclass::class_file::ClassFile;
use jclass::errors::class_decoding::{DecodeCause, DecodeError};
use jclass::errors::class_format_check::{FormatCause, FormatError};

fn format_cause(err: &Box<dyn std::error::Error>) -> &FormatCause {
    err.downcast_ref::<FormatError>()
        .expect("expected a format error")
        .cause()
}

fn decode_cause(err: &Box<dyn std::error::Error>) -> &DecodeCause {
    err.downcast_ref::<DecodeError>()
        .expect("expected a decode error")
        .cause()
}

#[test]
fn minimal_class_decodes() {
    let image = minimal_image("Example").build();
    let class = ClassFile::from_bytes(&image).unwrap();
    assert_eq!(class.this_class_name().unwrap(), "Example");
    assert_eq!(
        class.super_class_name().unwrap().as_deref(),
        Some("java/lang/Object")
    );
    assert!(class.is_top_class());
}

#[test]
fn wrong_magic_is_rejected() {
    let mut image = minimal_image("Example").build();
    image[0] = 0x00;
    image[1] = 0x00;
    image[2] = 0x00;
    image[3] = 0x00;
    let err = ClassFile::from_bytes(&image).unwrap_err();
    assert!(matches!(format_cause(&err), FormatCause::IncorrectMagic(0)));
}

#[test]
fn truncated_pool_is_eof() {
    // header promises ten pool entries; the stream ends after five
    let mut image = 0xCAFEBABEu32.to_be_bytes().to_vec();
    image.extend_from_slice(&0u16.to_be_bytes());
    image.extend_from_slice(&55u16.to_be_bytes());
    image.extend_from_slice(&10u16.to_be_bytes());
    for i in 0..5i32 {
        image.push(3); // Integer
        image.extend_from_slice(&i.to_be_bytes());
    }
    let err = ClassFile::from_bytes(&image).unwrap_err();
    assert!(matches!(decode_cause(&err), DecodeCause::Eof));
}

#[test]
fn trailing_garbage_is_rejected() {
    let mut image = minimal_image("Example").build();
    image.push(0x42);
    let err = ClassFile::from_bytes(&image).unwrap_err();
    assert!(matches!(format_cause(&err), FormatCause::ExtraBytes));
}

#[test]
fn missing_return_type_is_a_bad_descriptor() {
    let mut image = minimal_image("Example");
    let name = image.pool.utf8("run");
    let descriptor = image.pool.utf8("(I)");
    image.pool.name_and_type(name, descriptor);
    let err = ClassFile::from_bytes(&image.build()).unwrap_err();
    assert!(matches!(
        format_cause(&err),
        FormatCause::InvalidDescriptor(d) if d == "(I)"
    ));
}

#[test]
fn long_reserves_the_following_slot() {
    let mut image = minimal_image("Example");
    let long_index = image.pool.long(1 << 40);
    let after = image.pool.integer(7);
    assert_eq!(after, long_index + 2);
    let class = ClassFile::from_bytes(&image.build()).unwrap();
    assert_eq!(class.long(long_index).unwrap(), 1 << 40);
    assert_eq!(class.integer(after).unwrap(), 7);
    // the hidden second slot never satisfies a typed access
    let err = class.long(long_index + 1).unwrap_err();
    assert!(matches!(err.cause(), FormatCause::WrongTag { .. }));
}

#[test]
fn reference_into_a_long_shadow_slot_is_rejected() {
    let mut image = minimal_image("Example");
    let long_index = image.pool.long(99);
    // Class entry whose name points into the reserved slot
    image.pool.class(long_index + 1);
    let err = ClassFile::from_bytes(&image.build()).unwrap_err();
    assert!(matches!(
        format_cause(&err),
        FormatCause::WrongTag { expected: "Utf8", .. }
    ));
}

#[test]
fn pool_index_out_of_bounds() {
    let mut image = minimal_image("Example");
    image.pool.class(500);
    let err = ClassFile::from_bytes(&image.build()).unwrap_err();
    assert!(matches!(format_cause(&err), FormatCause::InvalidIndex(500)));
}

#[test]
fn method_handle_kind_constraints() {
    // kind 9 must point at an InterfaceMethodref, not a Methodref
    let mut image = minimal_image("Example");
    let name = image.pool.utf8("run");
    let descriptor = image.pool.utf8("()V");
    let nat = image.pool.name_and_type(name, descriptor);
    let methodref = image.pool.methodref(image.this_class, nat);
    image.pool.method_handle(9, methodref);
    let err = ClassFile::from_bytes(&image.build()).unwrap_err();
    assert!(matches!(
        format_cause(&err),
        FormatCause::WrongTag { expected: "InterfaceMethodref", .. }
    ));

    // kind 0 does not exist
    let mut image = minimal_image("Example");
    let name = image.pool.utf8("value");
    let descriptor = image.pool.utf8("I");
    let nat = image.pool.name_and_type(name, descriptor);
    let fieldref = image.pool.fieldref(image.this_class, nat);
    image.pool.method_handle(0, fieldref);
    let err = ClassFile::from_bytes(&image.build()).unwrap_err();
    assert!(matches!(
        format_cause(&err),
        FormatCause::InvalidReferenceKind(0)
    ));

    // kind 2 (getStatic) on a Fieldref is fine
    let mut image = minimal_image("Example");
    let name = image.pool.utf8("value");
    let descriptor = image.pool.utf8("I");
    let nat = image.pool.name_and_type(name, descriptor);
    let fieldref = image.pool.fieldref(image.this_class, nat);
    image.pool.method_handle(2, fieldref);
    assert!(ClassFile::from_bytes(&image.build()).is_ok());
}

#[test]
fn invoke_static_on_interface_is_version_gated() {
    // major version in common::Image::build is 55, so InterfaceMethodref
    // is allowed behind kind 6
    let mut image = minimal_image("Example");
    let name = image.pool.utf8("run");
    let descriptor = image.pool.utf8("()V");
    let nat = image.pool.name_and_type(name, descriptor);
    let imref = image.pool.interface_methodref(image.this_class, nat);
    image.pool.method_handle(6, imref);
    assert!(ClassFile::from_bytes(&image.build()).is_ok());

    let mut image = minimal_image("Example");
    let name = image.pool.utf8("run");
    let descriptor = image.pool.utf8("()V");
    let nat = image.pool.name_and_type(name, descriptor);
    let imref = image.pool.interface_methodref(image.this_class, nat);
    image.pool.method_handle(6, imref);
    let mut bytes = image.build();
    // rewrite major_version to 51
    bytes[6] = 0;
    bytes[7] = 51;
    let err = ClassFile::from_bytes(&bytes).unwrap_err();
    assert!(matches!(format_cause(&err), FormatCause::WrongTag { .. }));
}

#[test]
fn code_with_bad_tableswitch_shape() {
    let mut image = minimal_image("Example");
    let method_name = image.pool.utf8("pick");
    let method_descriptor = image.pool.utf8("(I)I");
    let code_name = image.pool.utf8("Code");
    // tableswitch with low=3, high=1
    let mut code = vec![0x1A]; // iload_0
    code.push(0xAA);
    code.extend_from_slice(&[0, 0]); // padding to offset 4
    code.extend_from_slice(&8i32.to_be_bytes());
    code.extend_from_slice(&3i32.to_be_bytes());
    code.extend_from_slice(&1i32.to_be_bytes());
    let code_attr = attribute(code_name, &code_body(1, 2, &code));
    image
        .methods
        .push(member(0x0008, method_name, method_descriptor, &[code_attr]));
    let err = ClassFile::from_bytes(&image.build()).unwrap_err();
    assert!(matches!(format_cause(&err), FormatCause::BadCode { .. }));
}

#[test]
fn recognized_attribute_must_fill_its_length() {
    let mut image = minimal_image("Example");
    let source_file = image.pool.utf8("SourceFile");
    let file_name = image.pool.utf8("Example.java");
    // SourceFile's body is exactly two bytes; declare three
    let mut body = file_name.to_be_bytes().to_vec();
    body.push(0);
    image.attributes.push(attribute(source_file, &body));
    let err = ClassFile::from_bytes(&image.build()).unwrap_err();
    assert!(matches!(
        format_cause(&err),
        FormatCause::AttributeLength {
            declared: 3,
            consumed: 2
        }
    ));
}

#[test]
fn unknown_attributes_are_skipped_by_length() {
    let mut image = minimal_image("Example");
    let custom = image.pool.utf8("com.example.Custom");
    image
        .attributes
        .push(attribute(custom, &[0xDE, 0xAD, 0xBE, 0xEF]));
    let class = ClassFile::from_bytes(&image.build()).unwrap();
    assert_eq!(class.attributes.len(), 1);
}

#[test]
fn members_are_found_by_name_and_descriptor() {
    let mut image = minimal_image("Example");
    let field_name = image.pool.utf8("counter");
    let field_descriptor = image.pool.utf8("J");
    image
        .fields
        .push(member(0x0008, field_name, field_descriptor, &[]));
    let method_name = image.pool.utf8("main");
    let method_descriptor = image.pool.utf8("([Ljava/lang/String;)V");
    let code_name = image.pool.utf8("Code");
    let code_attr = attribute(code_name, &code_body(0, 1, &[0xB1]));
    image
        .methods
        .push(member(0x0009, method_name, method_descriptor, &[code_attr]));

    let class = ClassFile::from_bytes(&image.build()).unwrap();
    assert!(class.field("counter", "J").is_some());
    assert!(class.field("counter", "I").is_none());
    let main = class.method("main", "([Ljava/lang/String;)V").unwrap();
    assert!(main.is_static());
    assert_eq!(main.code().unwrap().code, vec![0xB1]);
}

#[test]
fn string_and_member_ref_accessors() {
    let mut image = minimal_image("Example");
    let text = image.pool.utf8("hello");
    let string = image.pool.string(text);
    let field_name = image.pool.utf8("out");
    let field_descriptor = image.pool.utf8("Ljava/io/PrintStream;");
    let nat = image.pool.name_and_type(field_name, field_descriptor);
    let system_name = image.pool.utf8("java/lang/System");
    let system = image.pool.class(system_name);
    let fieldref = image.pool.fieldref(system, nat);

    let class = ClassFile::from_bytes(&image.build()).unwrap();
    assert_eq!(class.string(string).unwrap(), "hello");
    let (class_name, name, descriptor) = class.member_ref(fieldref).unwrap();
    assert_eq!(class_name, "java/lang/System");
    assert_eq!(name, "out");
    assert_eq!(descriptor, "Ljava/io/PrintStream;");
}

#[test]
fn init_must_return_void() {
    let mut image = minimal_image("Example");
    let name = image.pool.utf8("<init>");
    let descriptor = image.pool.utf8("()I");
    let nat = image.pool.name_and_type(name, descriptor);
    image.pool.methodref(image.this_class, nat);
    let err = ClassFile::from_bytes(&image.build()).unwrap_err();
    assert!(matches!(
        format_cause(&err),
        FormatCause::InvalidDescriptor(_)
    ));
}
