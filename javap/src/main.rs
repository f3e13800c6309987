use std::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jclass::access_flags::{FieldAccessFlags, MethodAccessFlags};
use jclass::attributes::{self, CodeAttribute};
use jclass::class_file::{ClassFile, MethodInfo};
use jclass::constants::ConstantPool;
use jclass::descriptors;
use rjvm::ops::{Instruction, Operands};

/// Disassemble class files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(value_name = "CLASSFILE", required = true)]
    class_files: Vec<PathBuf>,

    /// Disassemble the code
    #[arg(short = 'c', long)]
    code: bool,

    /// Print line number and local variable tables
    #[arg(short = 'l', long)]
    line: bool,

    /// Show private members as well
    #[arg(short = 'p', long)]
    private: bool,

    /// Print internal type signatures
    #[arg(short = 's', long)]
    signatures: bool,

    /// Print everything (implies -c -l -s)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let mut args = Args::parse();
    if args.verbose {
        args.code = true;
        args.line = true;
        args.signatures = true;
    }
    let mut exitval = ExitCode::SUCCESS;
    for path in &args.class_files {
        match disassemble(path, &args) {
            Ok(listing) => print!("{listing}"),
            Err(e) => {
                // one bad file does not stop the rest
                eprintln!("javap: {}: {e}", path.display());
                exitval = ExitCode::FAILURE;
            }
        }
    }
    exitval
}

fn java_name(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Field type for display; falls back to the raw descriptor.
fn pretty_type(descriptor: &str) -> String {
    match descriptors::parse_field_descriptor(descriptor) {
        Some(field) => field.to_string(),
        None => descriptor.into(),
    }
}

fn disassemble(path: &PathBuf, args: &Args) -> Result<String, Box<dyn Error>> {
    let bytes = fs::read(path)?;
    let class = ClassFile::from_bytes(&bytes)?;
    let mut out = String::new();

    if let Some(index) = attributes::find_source_file(&class.attributes) {
        writeln!(out, "Compiled from \"{}\"", class.utf8(index)?)?;
    }
    if args.verbose {
        writeln!(
            out,
            "class file version {}.{}",
            class.major_version, class.minor_version
        )?;
        write_constant_pool(&mut out, &class)?;
    }

    let keywords: Vec<String> = class
        .access_flags
        .iter()
        .map(|flag| flag.to_string())
        .filter(|keyword| !keyword.is_empty())
        .collect();
    let name = java_name(&class.this_class_name()?);
    write!(out, "{}", keywords.join(" "))?;
    if !keywords.iter().any(|k| k.contains("interface")) {
        if keywords.is_empty() {
            write!(out, "class {name}")?;
        } else {
            write!(out, " class {name}")?;
        }
    } else {
        write!(out, " {name}")?;
    }
    match class.super_class_name()? {
        Some(super_name) if super_name != "java/lang/Object" => {
            write!(out, " extends {}", java_name(&super_name))?;
        }
        _ => {}
    }
    let interfaces: Vec<String> = class
        .interfaces
        .iter()
        .map(|i| class.class_name(*i).map(|n| java_name(&n)))
        .collect::<Result<_, _>>()?;
    if !interfaces.is_empty() {
        write!(out, " implements {}", interfaces.join(", "))?;
    }
    writeln!(out, " {{")?;

    for field in &class.fields {
        if field.access_flags.contains(&FieldAccessFlags::AccPrivate) && !args.private {
            continue;
        }
        let flags: Vec<String> = field
            .access_flags
            .iter()
            .map(|f| f.to_string())
            .filter(|k| !k.is_empty())
            .collect();
        let descriptor = class.utf8(field.descriptor_index)?;
        write!(out, "  ")?;
        if !flags.is_empty() {
            write!(out, "{} ", flags.join(" "))?;
        }
        writeln!(
            out,
            "{} {};",
            pretty_type(&descriptor),
            class.utf8(field.name_index)?
        )?;
        if args.signatures {
            writeln!(out, "    descriptor: {descriptor}")?;
        }
    }

    for method in &class.methods {
        if method.access_flags.contains(&MethodAccessFlags::AccPrivate) && !args.private {
            continue;
        }
        write_method(&mut out, &class, method, args)?;
    }
    writeln!(out, "}}")?;
    Ok(out)
}

fn write_constant_pool(out: &mut String, class: &ClassFile) -> Result<(), Box<dyn Error>> {
    writeln!(out, "Constant pool:")?;
    for (i, constant) in class.constant_pool.iter().enumerate() {
        if i == 0 {
            continue;
        }
        let summary = match constant {
            ConstantPool::Untagged => continue,
            ConstantPool::Utf8(utf8) => format!("{:?}", String::from(utf8)),
            ConstantPool::Integer(v) => v.value().to_string(),
            ConstantPool::Float(v) => format!("{}f", v.value()),
            ConstantPool::Long(v) => format!("{}l", v.value()),
            ConstantPool::Double(v) => format!("{}d", v.value()),
            ConstantPool::Class(c) => format!("#{}", c.name_index),
            ConstantPool::String(s) => format!("#{}", s.string_index),
            ConstantPool::Fieldref(f) => {
                format!("#{}.#{}", f.class_index, f.name_and_type_index)
            }
            ConstantPool::Methodref(m) => {
                format!("#{}.#{}", m.class_index, m.name_and_type_index)
            }
            ConstantPool::InterfaceMethodref(im) => {
                format!("#{}.#{}", im.class_index, im.name_and_type_index)
            }
            ConstantPool::NameAndType(nat) => {
                format!("#{}:#{}", nat.name_index, nat.descriptor_index)
            }
            ConstantPool::MethodHandle(mh) => {
                format!("{}:#{}", mh.reference_kind, mh.reference_index)
            }
            ConstantPool::MethodType(mt) => format!("#{}", mt.descriptor_index),
            ConstantPool::InvokeDynamic(id) => {
                format!("#{}:#{}", id.bootstrap_method_attr_index, id.name_and_type_index)
            }
        };
        writeln!(out, "  #{i:<4} {:<18} {summary}", constant.tag_name())?;
    }
    Ok(())
}

fn write_method(
    out: &mut String,
    class: &ClassFile,
    method: &MethodInfo,
    args: &Args,
) -> Result<(), Box<dyn Error>> {
    let name = class.utf8(method.name_index)?;
    let descriptor = class.utf8(method.descriptor_index)?;
    let flags: Vec<String> = method
        .access_flags
        .iter()
        .map(|f| f.to_string())
        .filter(|k| !k.is_empty())
        .collect();
    write!(out, "  ")?;
    if !flags.is_empty() {
        write!(out, "{} ", flags.join(" "))?;
    }
    match descriptors::parse_method_descriptor(&descriptor) {
        Some(signature) => {
            let parameters: Vec<String> =
                signature.parameters.iter().map(|p| p.to_string()).collect();
            let ret = signature
                .ret
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "void".into());
            match name.as_str() {
                "<init>" => {
                    let class_name = java_name(&class.this_class_name()?);
                    writeln!(out, "{class_name}({});", parameters.join(", "))?;
                }
                "<clinit>" => writeln!(out, "static {{}};")?,
                _ => writeln!(out, "{ret} {name}({});", parameters.join(", "))?,
            }
        }
        None => writeln!(out, "{name}{descriptor};")?,
    }
    if args.signatures {
        writeln!(out, "    descriptor: {descriptor}")?;
    }
    if let Some(code) = method.code() {
        if args.code {
            write_code(out, class, code)?;
        }
        if args.line {
            write_tables(out, class, code)?;
        }
    }
    Ok(())
}

fn write_code(out: &mut String, class: &ClassFile, code: &CodeAttribute) -> Result<(), Box<dyn Error>> {
    writeln!(out, "    Code:")?;
    writeln!(
        out,
        "      stack={}, locals={}",
        code.max_stack, code.max_locals
    )?;
    let mut pc = 0;
    while pc < code.code.len() {
        let (instruction, next_pc) = Instruction::decode(&code.code, pc)?;
        write!(out, "      {pc:4}: {}", instruction.mnemonic.name())?;
        match &instruction.operands {
            Operands::None => {}
            Operands::Immediate(value) => write!(out, " {value}")?,
            Operands::Var(index) => write!(out, " {index}")?,
            Operands::Pool(index) => {
                write!(out, " #{index}")?;
                if let Some(comment) = pool_comment(class, *index) {
                    write!(out, " // {comment}")?;
                }
            }
            Operands::Branch(offset) => write!(out, " {}", pc as i64 + *offset as i64)?,
            Operands::Iinc { index, delta } => write!(out, " {index}, {delta}")?,
            Operands::ArrayType(atype) => write!(out, " {}", atype_name(*atype))?,
            Operands::InvokeInterface { index, count } => {
                write!(out, " #{index}, {count}")?;
                if let Some(comment) = pool_comment(class, *index) {
                    write!(out, " // {comment}")?;
                }
            }
            Operands::MultiArray { index, dimensions } => {
                write!(out, " #{index}, {dimensions}")?;
                if let Some(comment) = pool_comment(class, *index) {
                    write!(out, " // {comment}")?;
                }
            }
            Operands::TableSwitch {
                default,
                low,
                offsets,
            } => {
                writeln!(out, " {{")?;
                for (i, offset) in offsets.iter().enumerate() {
                    writeln!(
                        out,
                        "        {:>10}: {}",
                        *low as i64 + i as i64,
                        pc as i64 + *offset as i64
                    )?;
                }
                writeln!(out, "        {:>10}: {}", "default", pc as i64 + *default as i64)?;
                write!(out, "      }}")?;
            }
            Operands::LookupSwitch { default, pairs } => {
                writeln!(out, " {{")?;
                for (key, offset) in pairs {
                    writeln!(out, "        {key:>10}: {}", pc as i64 + *offset as i64)?;
                }
                writeln!(out, "        {:>10}: {}", "default", pc as i64 + *default as i64)?;
                write!(out, "      }}")?;
            }
        }
        writeln!(out)?;
        pc = next_pc;
    }
    if !code.exception_table.is_empty() {
        writeln!(out, "      Exception table:")?;
        writeln!(out, "         from    to  target type")?;
        for entry in &code.exception_table {
            let caught = if entry.catch_type == 0 {
                "any".into()
            } else {
                java_name(&class.class_name(entry.catch_type)?)
            };
            writeln!(
                out,
                "        {:5} {:5} {:5}   {}",
                entry.start_pc, entry.end_pc, entry.handler_pc, caught
            )?;
        }
    }
    Ok(())
}

fn write_tables(
    out: &mut String,
    class: &ClassFile,
    code: &CodeAttribute,
) -> Result<(), Box<dyn Error>> {
    if let Some(entries) = attributes::find_line_numbers(&code.attributes) {
        writeln!(out, "    LineNumberTable:")?;
        for entry in entries {
            writeln!(out, "      line {}: {}", entry.line_number, entry.start_pc)?;
        }
    }
    if let Some(entries) = attributes::find_local_variables(&code.attributes) {
        writeln!(out, "    LocalVariableTable:")?;
        writeln!(out, "      Start  Length  Slot  Name   Signature")?;
        for entry in entries {
            writeln!(
                out,
                "      {:5} {:7} {:5}  {:<6} {}",
                entry.start_pc,
                entry.length,
                entry.index,
                class.utf8(entry.name_index)?,
                class.utf8(entry.descriptor_index)?
            )?;
        }
    }
    Ok(())
}

fn atype_name(atype: u8) -> &'static str {
    match atype {
        4 => "boolean",
        5 => "char",
        6 => "float",
        7 => "double",
        8 => "byte",
        9 => "short",
        10 => "int",
        11 => "long",
        _ => "?",
    }
}

/// The javap-style trailing comment resolving a pool operand.
fn pool_comment(class: &ClassFile, index: u16) -> Option<String> {
    let constant = class.constant(index).ok()?;
    Some(match constant {
        ConstantPool::String(s) => format!("String {}", class.utf8(s.string_index).ok()?),
        ConstantPool::Class(_) => format!("class {}", class.class_name(index).ok()?),
        ConstantPool::Integer(v) => format!("int {}", v.value()),
        ConstantPool::Float(v) => format!("float {}f", v.value()),
        ConstantPool::Long(v) => format!("long {}l", v.value()),
        ConstantPool::Double(v) => format!("double {}d", v.value()),
        ConstantPool::Fieldref(_) => {
            let (class_name, name, descriptor) = class.member_ref(index).ok()?;
            format!("Field {class_name}.{name}:{descriptor}")
        }
        ConstantPool::Methodref(_) => {
            let (class_name, name, descriptor) = class.member_ref(index).ok()?;
            format!("Method {class_name}.{name}:{descriptor}")
        }
        ConstantPool::InterfaceMethodref(_) => {
            let (class_name, name, descriptor) = class.member_ref(index).ok()?;
            format!("InterfaceMethod {class_name}.{name}:{descriptor}")
        }
        _ => return None,
    })
}
