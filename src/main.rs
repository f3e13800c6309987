use std::env;
use std::process::ExitCode;

use rjvm::loader::ClassLoader;
use rjvm::vm::VirtualMachine;

fn usage() -> ExitCode {
    eprintln!("usage: rjvm [-cp classpath] class");
    ExitCode::FAILURE
}

/// Launch a class: load it and its superclasses off the classpath, run
/// static initialization, then `main([Ljava/lang/String;)V`.
fn main() -> ExitCode {
    pretty_env_logger::init();

    // -cp beats the CLASSPATH environment variable beats "."
    let mut classpath = env::var("CLASSPATH").ok();
    let mut class_name = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-cp" => match args.next() {
                Some(path) => classpath = Some(path),
                None => return usage(),
            },
            _ if arg.starts_with('-') => return usage(),
            _ => {
                class_name = Some(arg);
                break;
            }
        }
    }
    let Some(class_name) = class_name else {
        return usage();
    };
    let classpath = classpath.unwrap_or_else(|| ".".into());

    let loader = ClassLoader::new(&classpath);
    let mut vm = VirtualMachine::new(loader);
    match vm.run_main(&class_name) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rjvm: {e}");
            ExitCode::FAILURE
        }
    }
}
