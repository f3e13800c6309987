mod common;

use std::fs;
use std::rc::Rc;

use common::Image;
use rjvm::errors::class_linking::{LinkCause, LinkError};
use rjvm::loader::ClassLoader;

fn link_cause(err: &LinkError) -> &LinkCause {
    err.cause()
}

#[test]
fn missing_class() {
    let dir = tempfile::tempdir().unwrap();
    let mut loader = ClassLoader::new(dir.path().to_str().unwrap());
    let err = loader.load("Nope").unwrap_err();
    assert!(matches!(link_cause(&err), LinkCause::NotFound(name) if name == "Nope"));
}

#[test]
fn load_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Solo.class"), Image::new("Solo").build()).unwrap();
    let mut loader = ClassLoader::new(dir.path().to_str().unwrap());
    let first = loader.load("Solo").unwrap();
    let second = loader.load("Solo").unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn superclasses_load_with_the_class() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Child.class"),
        Image::extending("Child", "Parent").build(),
    )
    .unwrap();
    fs::write(
        dir.path().join("Parent.class"),
        Image::new("Parent").build(),
    )
    .unwrap();
    let mut loader = ClassLoader::new(dir.path().to_str().unwrap());
    let child = loader.load("Child").unwrap();
    assert_eq!(child.super_name.as_deref(), Some("Parent"));
    let parent = loader.get("Parent").expect("superclass was not loaded");
    assert!(Rc::ptr_eq(&parent, &loader.superclass(&child).unwrap()));
}

#[test]
fn first_classpath_entry_wins() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let mut in_first = Image::new("Dup");
    in_first.static_method("which", "()I", 1, 0, &[0x04, 0xAC]); // iconst_1
    fs::write(first.path().join("Dup.class"), in_first.build()).unwrap();
    let mut in_second = Image::new("Dup");
    in_second.static_method("which", "()I", 1, 0, &[0x05, 0xAC]); // iconst_2
    fs::write(second.path().join("Dup.class"), in_second.build()).unwrap();

    let classpath = format!(
        "{}:{}",
        first.path().to_str().unwrap(),
        second.path().to_str().unwrap()
    );
    let mut loader = ClassLoader::new(&classpath);
    let class = loader.load("Dup").unwrap();
    let code = class.find_method("which", "()I").unwrap().code.as_ref().unwrap();
    assert_eq!(code.code[0], 0x04);
}

#[test]
fn file_defining_another_class_is_a_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Left.class"), Image::new("Right").build()).unwrap();
    let mut loader = ClassLoader::new(dir.path().to_str().unwrap());
    let err = loader.load("Left").unwrap_err();
    assert!(matches!(
        link_cause(&err),
        LinkCause::NameMismatch { requested, found }
            if requested == "Left" && found == "Right"
    ));
}

#[test]
fn corrupt_file_is_a_bad_class() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Broken.class"), [0u8; 16]).unwrap();
    let mut loader = ClassLoader::new(dir.path().to_str().unwrap());
    let err = loader.load("Broken").unwrap_err();
    assert!(matches!(link_cause(&err), LinkCause::BadClass(_)));
}

#[test]
fn superclass_cycle_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("A.class"),
        Image::extending("A", "B").build(),
    )
    .unwrap();
    fs::write(
        dir.path().join("B.class"),
        Image::extending("B", "A").build(),
    )
    .unwrap();
    let mut loader = ClassLoader::new(dir.path().to_str().unwrap());
    let err = loader.load("A").unwrap_err();
    assert!(matches!(link_cause(&err), LinkCause::Circularity(_)));
    // the failed load must not leave partial classes behind
    assert!(loader.get("A").is_none());
    assert!(loader.get("B").is_none());
}

#[test]
fn missing_superclass_unlinks_the_class() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Orphan.class"),
        Image::extending("Orphan", "Gone").build(),
    )
    .unwrap();
    let mut loader = ClassLoader::new(dir.path().to_str().unwrap());
    let err = loader.load("Orphan").unwrap_err();
    assert!(matches!(link_cause(&err), LinkCause::NotFound(name) if name == "Gone"));
    assert!(loader.get("Orphan").is_none());
}
