use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use log::{debug, trace};

use jclass::access_flags::MethodAccessFlags;
use jclass::attributes::CodeAttribute;
use jclass::class_file::ClassFile;

use crate::errors::class_linking::{LinkCause, LinkError};
use crate::stack_frame::Value;

/// A method made ready for invocation: name and descriptor pulled out of
/// the pool once, the body shared so frames can hold it without borrowing
/// the class.
#[derive(Debug)]
pub struct LinkedMethod {
    pub name: String,
    pub descriptor: String,
    pub access_flags: Vec<MethodAccessFlags>,
    pub code: Option<Rc<CodeAttribute>>,
}

impl LinkedMethod {
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(&MethodAccessFlags::AccStatic)
    }

    pub fn is_native(&self) -> bool {
        self.access_flags.contains(&MethodAccessFlags::AccNative)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(&MethodAccessFlags::AccAbstract)
    }
}

/// A decoded class extended with what linking adds: its resolved name, the
/// superclass as a weak by-name link, per-class static storage and the
/// once-only initialization flag.
#[derive(Debug)]
pub struct LoadedClass {
    pub name: String,
    pub class: ClassFile,
    /// `None` only for java/lang/Object itself; traversal goes through the
    /// loader registry, never through owned pointers, so class graphs can
    /// never form ownership cycles.
    pub super_name: Option<String>,
    pub methods: Vec<LinkedMethod>,
    initialized: Cell<bool>,
    pub statics: RefCell<HashMap<(String, String), Value>>,
}

impl LoadedClass {
    pub fn link(class: ClassFile) -> Result<Rc<LoadedClass>, Box<dyn Error>> {
        let name = class.this_class_name()?;
        let super_name = class.super_class_name()?;
        let mut methods = Vec::with_capacity(class.methods.len());
        for method in &class.methods {
            methods.push(LinkedMethod {
                name: class.utf8(method.name_index)?,
                descriptor: class.utf8(method.descriptor_index)?,
                access_flags: method.access_flags.clone(),
                code: method.code().cloned().map(Rc::new),
            });
        }
        Ok(Rc::new(LoadedClass {
            name,
            class,
            super_name,
            methods,
            initialized: Cell::new(false),
            statics: RefCell::new(HashMap::new()),
        }))
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&LinkedMethod> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Set the flag, returning whether it was already set.
    pub fn mark_initialized(&self) -> bool {
        self.initialized.replace(true)
    }
}

/// Name-indexed registry of loaded classes over an ordered search path.
/// Classes are loaded on demand, cached forever, and chained to their
/// superclasses as they arrive.
pub struct ClassLoader {
    classpath: Vec<PathBuf>,
    registry: HashMap<String, Rc<LoadedClass>>,
}

impl ClassLoader {
    /// `classpath` uses the platform separator (`:` on Unix, `;` on
    /// Windows).
    pub fn new(classpath: &str) -> ClassLoader {
        ClassLoader {
            classpath: env::split_paths(classpath).collect(),
            registry: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Rc<LoadedClass>> {
        self.registry.get(name).cloned()
    }

    /// Insert a class that did not come from the search path; tests and the
    /// machine use this for classes built in memory.
    pub fn register(&mut self, class: Rc<LoadedClass>) {
        self.registry.insert(class.name.clone(), class);
    }

    /// The direct superclass, looked up through the registry.
    pub fn superclass(&self, class: &LoadedClass) -> Option<Rc<LoadedClass>> {
        class
            .super_name
            .as_ref()
            .and_then(|name| self.get(name))
    }

    /// Load `name`, its superclasses and so on, returning the cached class
    /// on repeat calls. A failure anywhere in the chain unlinks the classes
    /// inserted on the way.
    pub fn load(&mut self, name: &str) -> Result<Rc<LoadedClass>, LinkError> {
        if let Some(class) = self.registry.get(name) {
            trace!("registry hit for {name}");
            return Ok(class.clone());
        }
        let file = format!("{name}.class");
        let mut bytes = None;
        for dir in &self.classpath {
            let path = dir.join(&file);
            if let Ok(data) = fs::read(&path) {
                debug!("reading {}", path.display());
                bytes = Some(data);
                break;
            }
        }
        let bytes = bytes.ok_or_else(|| LinkError::new(LinkCause::NotFound(name.into()), ""))?;
        let class = ClassFile::from_bytes(&bytes)
            .and_then(LoadedClass::link)
            .map_err(|e| LinkError::new(LinkCause::BadClass(name.into()), &e.to_string()))?;
        if class.name != name {
            return Err(LinkError::new(
                LinkCause::NameMismatch {
                    requested: name.into(),
                    found: class.name.clone(),
                },
                "",
            ));
        }
        self.registry.insert(name.to_string(), class.clone());
        if let Some(super_name) = class
            .super_name
            .clone()
            .filter(|s| s != "java/lang/Object")
        {
            if let Err(e) = self.load(&super_name) {
                self.registry.remove(name);
                return Err(e);
            }
            // walk the freshly completed chain; this class reappearing in
            // it means the file set is cyclic
            let mut ancestor = Some(super_name);
            while let Some(a) = ancestor {
                if a == name {
                    self.registry.remove(name);
                    return Err(LinkError::new(LinkCause::Circularity(name.into()), ""));
                }
                ancestor = self
                    .get(&a)
                    .and_then(|c| c.super_name.clone())
                    .filter(|s| s != "java/lang/Object");
            }
        }
        debug!("loaded class {name}");
        Ok(class)
    }
}
