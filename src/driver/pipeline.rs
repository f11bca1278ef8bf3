//! File-mode compilation
//!
//! Every top-level construct of a file is lowered into one compilation unit.
//! Bare statements become functions `__anon_expr.0`, `__anon_expr.1`, ... and a
//! synthesized `main` calls them in source order before returning 0. The
//! finished unit is verified and emitted once, at the end.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::ast::Item;
use crate::backend::{emit_object, Target};
use crate::error::DustError;
use crate::ir::{
    verify_function, Builder, DefinitionRegistry, Function, LowerError, LoweringContext, LoweringOptions, Module,
    Value, ANON_EXPR_NAME,
};
use crate::parser::Parser;
use crate::source::{TokenBuffer, TokenSource};
use crate::types::Type;

use super::conversion::wasm_to_wat;
use super::io::{read_source, write_object_file, write_wat_file};

/// Entry point synthesized for files with top-level statements.
pub const MAIN_NAME: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub optimize: bool,
    /// Print every lowered construct to stderr.
    pub print_ir: bool,
    /// Also write the module in text form next to the object.
    pub emit_wat: bool,
    pub target: Target,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { optimize: true, print_ir: false, emit_wat: false, target: Target::default() }
    }
}

/// What happened while compiling a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileReport {
    pub functions: usize,
    pub externs: usize,
    pub statements: usize,
    /// Messages of the recoverable errors that were skipped.
    pub errors: Vec<String>,
    /// Whether `main` was synthesized.
    pub synthesized_main: bool,
    pub object: Option<PathBuf>,
    pub wat: Option<PathBuf>,
}

/// Accumulates a whole file into one compilation unit.
pub struct FileCompiler {
    registry: DefinitionRegistry,
    unit: Module,
    options: CompileOptions,
    anon_functions: Vec<(String, Type)>,
    report: FileReport,
}

impl FileCompiler {
    pub fn new(name: impl Into<String>, options: CompileOptions) -> Self {
        FileCompiler {
            registry: DefinitionRegistry::new(),
            unit: Module::new(name),
            options,
            anon_functions: Vec::new(),
            report: FileReport::default(),
        }
    }

    pub fn unit(&self) -> &Module {
        &self.unit
    }

    pub fn report(&self) -> &FileReport {
        &self.report
    }

    /// Parse and lower every item of `source`.
    ///
    /// Fatal parse errors stop compilation; everything else is recorded in the
    /// report and the next construct is tried.
    pub fn compile_items<S: TokenSource>(&mut self, parser: &mut Parser<S>) -> Result<(), DustError> {
        loop {
            match parser.parse_top_level_item() {
                Ok(Some(item)) => {
                    if let Err(err) = self.lower_item(&item) {
                        self.record_error(&err);
                    }
                }
                Ok(None) => return Ok(()),
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => {
                    self.record_error(&err.into());
                    parser.skip_token()?;
                }
            }
        }
    }

    fn lower_item(&mut self, item: &Item) -> Result<(), DustError> {
        let options = LoweringOptions { optimize: self.options.optimize, ..LoweringOptions::default() };
        let mut ctx = LoweringContext::new(&mut self.unit, &mut self.registry, options);
        let lowered = match item {
            Item::Function(function) => {
                let lowered = ctx.lower_function(function)?;
                self.report.functions += 1;
                lowered
            }
            Item::Extern(proto) => {
                let lowered = ctx.lower_prototype(proto)?;
                self.report.externs += 1;
                lowered
            }
            Item::Stmt(stmt) => {
                let name = format!("{ANON_EXPR_NAME}.{}", self.anon_functions.len());
                let lowered = ctx.lower_anonymous(stmt, &name)?;
                self.anon_functions.push((name, lowered.ret));
                self.report.statements += 1;
                lowered
            }
        };
        if self.options.print_ir {
            eprintln!("{lowered}");
        }
        Ok(())
    }

    fn record_error(&mut self, err: &DustError) {
        warn!(error = %err, "construct skipped");
        self.report.errors.push(err.to_string());
    }

    /// Add `main` calling every top-level statement in order. Skipped when the
    /// file has no statements or defines `main` itself.
    pub fn synthesize_main(&mut self) -> Result<(), DustError> {
        if self.anon_functions.is_empty() {
            return Ok(());
        }
        if self.unit.get_function(MAIN_NAME).is_some() {
            warn!("file defines '{MAIN_NAME}', top-level statements are not called");
            return Ok(());
        }

        let mut builder = Builder::new(Function::declaration(MAIN_NAME, Vec::new(), Type::Num));
        let entry = builder.append_block("entry");
        builder.position_at_end(entry);
        for (name, ret) in &self.anon_functions {
            builder.build_call(name, Vec::new(), *ret);
        }
        builder.build_ret(Some(Value::Num(0.0)));

        let main = builder.finish();
        verify_function(&main, &self.unit).map_err(LowerError::from)?;
        self.unit.install_function(main);
        self.report.synthesized_main = true;
        Ok(())
    }

    /// Finish the unit and emit it for the configured target.
    pub fn finish(mut self) -> Result<(Vec<u8>, FileReport), DustError> {
        self.synthesize_main()?;
        let bytes = emit_object(&self.unit, &self.options.target)?;
        Ok((bytes, self.report))
    }
}

/// Compile source text into an object.
pub fn compile_source(name: &str, source: &str, options: CompileOptions) -> Result<(Vec<u8>, FileReport), DustError> {
    let mut parser = Parser::new(TokenBuffer::from_source(source)?);
    let mut compiler = FileCompiler::new(name, options);
    compiler.compile_items(&mut parser)?;
    compiler.finish()
}

/// Compile the file at `input` and write the object to `output`.
pub fn compile_file(input: impl AsRef<Path>, output: impl AsRef<Path>, options: CompileOptions) -> Result<FileReport, DustError> {
    let input = input.as_ref();
    let emit_wat = options.emit_wat;
    let source = read_source(input)?;
    let name = input.file_stem().and_then(|s| s.to_str()).unwrap_or("module");
    info!(input = %input.display(), "compiling");

    let (bytes, mut report) = compile_source(name, &source, options)?;
    for message in &report.errors {
        eprintln!("Error: {message}");
    }

    let object = write_object_file(output, &bytes)?;
    debug!(path = %object.display(), bytes = bytes.len(), "object written");
    if emit_wat {
        report.wat = Some(write_wat_file(&object, &wasm_to_wat(&bytes)?)?);
    }
    report.object = Some(object);
    Ok(report)
}
