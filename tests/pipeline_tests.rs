use std::fs;
use std::path::PathBuf;

use dust::driver::{compile_file, compile_source, CompileOptions, FileCompiler, MAIN_NAME};
use dust::ir::InstKind;
use dust::parser::Parser;
use dust::source::TokenBuffer;
use dust::DustError;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dust-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn compiler_for(src: &str) -> FileCompiler {
    let mut parser = Parser::new(TokenBuffer::from_source(src).unwrap());
    let mut compiler = FileCompiler::new("test", CompileOptions::default());
    compiler.compile_items(&mut parser).unwrap();
    compiler
}

#[test]
fn main_calls_statements_in_order() {
    let mut compiler = compiler_for("fn f(x: num) { return x; } f(1); prints(\"two\"); f(3);");
    compiler.synthesize_main().unwrap();
    assert!(compiler.report().synthesized_main);
    assert_eq!(compiler.report().statements, 3);

    let main = compiler.unit().get_function(MAIN_NAME).unwrap();
    let callees: Vec<&str> = main.blocks[0]
        .insts
        .iter()
        .filter_map(|&id| match &main.inst(id).kind {
            InstKind::Call { callee, .. } => Some(callee.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(callees, vec!["__anon_expr.0", "__anon_expr.1", "__anon_expr.2"]);
}

#[test]
fn user_main_is_not_replaced() {
    let mut compiler = compiler_for("fn main() { return 7; } printd(1);");
    compiler.synthesize_main().unwrap();
    assert!(!compiler.report().synthesized_main);
    assert!(!compiler.unit().get_function(MAIN_NAME).unwrap().is_declaration());
}

#[test]
fn files_without_statements_get_no_main() {
    let (_, report) = compile_source("lib", "fn sq(x: num) { return x * x; }", CompileOptions::default()).unwrap();
    assert!(!report.synthesized_main);
    assert_eq!(report.functions, 1);
}

#[test]
fn recoverable_errors_are_collected() {
    let (bytes, report) = compile_source("errs", "fn f() { return 1; } f(2); ) g(); f();", CompileOptions::default()).unwrap();
    assert_eq!(report.errors.len(), 3, "{:?}", report.errors);
    assert_eq!(report.statements, 1);
    assert_eq!(&bytes[0..4], b"\0asm");
}

#[test]
fn fatal_errors_stop_compilation() {
    let err = compile_source("bad", "fn f(x num) { }", CompileOptions::default()).unwrap_err();
    assert!(matches!(err, DustError::Parse(_)));
    assert!(err.is_fatal());

    let err = compile_source("bad", "1 # 2;", CompileOptions::default()).unwrap_err();
    assert!(matches!(err, DustError::Lex(_)));
}

#[test]
fn compile_file_writes_object_and_wat() {
    let dir = scratch_dir("compile-file");
    let input = dir.join("prog.dust");
    fs::write(&input, "fn add(a: num, b: num) { return a + b; }\nprintd(add(1, 2));\n").unwrap();
    let output = dir.join("out").join("prog.o");

    let options = CompileOptions { emit_wat: true, ..CompileOptions::default() };
    let report = compile_file(&input, &output, options).unwrap();

    assert_eq!(report.object.as_deref(), Some(output.as_path()));
    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[0..4], b"\0asm");

    let wat_path = report.wat.unwrap();
    assert_eq!(wat_path, dir.join("out").join("prog.o.wat"));
    assert!(fs::read_to_string(wat_path).unwrap().contains("(export \"add\""));

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn missing_input_is_an_io_error() {
    let err = compile_file("/nonexistent/dust/input", "unused.o", CompileOptions::default()).unwrap_err();
    assert!(matches!(err, DustError::Io(_)));
}
