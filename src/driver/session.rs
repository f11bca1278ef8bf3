//! Interactive session
//!
//! The session cycles between two states for every top-level construct:
//! `Reading` asks the parser for the next item, `Executing` lowers it into a
//! fresh compilation unit and hands that unit to the execution engine. A bare
//! statement is run immediately through its anonymous wrapper, whose module is
//! unloaded again right after the call.

use std::io::{self, Write};

use tracing::{debug, debug_span};

use crate::ast::Item;
use crate::error::DustError;
use crate::ir::{DefinitionRegistry, LoweringContext, LoweringOptions, Module, ANON_EXPR_NAME};
use crate::jit::{ExecutionEngine, Host, RtValue, StdHost};
use crate::parser::{ParseError, Parser};
use crate::source::TokenSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Run the optimization pipeline on every lowered function.
    pub optimize: bool,
    /// Print the IR of every construct that lowered successfully.
    pub echo_ir: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions { optimize: true, echo_ir: true }
    }
}

/// An error that ends the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("fatal: {0}")]
    Fatal(#[source] ParseError),
    #[error("failed to write session output: {0}")]
    Output(#[from] io::Error),
}

/// What happened during a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub functions: usize,
    pub externs: usize,
    pub expressions: usize,
    /// Recoverable errors that were reported and skipped.
    pub errors: usize,
    /// Results of evaluated expressions, in order. Void results are not recorded.
    pub values: Vec<RtValue>,
}

enum State {
    Reading,
    Executing(Item),
}

pub struct Session<S, H = StdHost, W = io::Stderr> {
    parser: Parser<S>,
    engine: ExecutionEngine<H>,
    registry: DefinitionRegistry,
    unit: Module,
    units_started: usize,
    options: SessionOptions,
    out: W,
    report: SessionReport,
}

impl<S: TokenSource> Session<S> {
    /// Session that runs intrinsics against the process streams and echoes to stderr.
    pub fn new(source: S, options: SessionOptions) -> Self {
        Session::with_parts(source, StdHost::new(), io::stderr(), options)
    }
}

impl<S: TokenSource, H: Host, W: Write> Session<S, H, W> {
    pub fn with_parts(source: S, host: H, out: W, options: SessionOptions) -> Self {
        Session {
            parser: Parser::new(source),
            engine: ExecutionEngine::with_host(host),
            registry: DefinitionRegistry::new(),
            unit: Module::new("unit0"),
            units_started: 0,
            options,
            out,
            report: SessionReport::default(),
        }
    }

    pub fn engine(&self) -> &ExecutionEngine<H> {
        &self.engine
    }

    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    /// Run until the token source is exhausted.
    pub fn run(&mut self) -> Result<SessionReport, SessionError> {
        let mut state = State::Reading;
        loop {
            state = match state {
                State::Reading => match self.parser.parse_top_level_item() {
                    Ok(Some(item)) => State::Executing(item),
                    Ok(None) => return Ok(self.report.clone()),
                    Err(err) if err.is_fatal() => return Err(SessionError::Fatal(err)),
                    Err(err) => {
                        self.report_error(&err.into())?;
                        // Skip the offending token so the next read makes progress.
                        self.parser.skip_token().map_err(SessionError::Fatal)?;
                        State::Reading
                    }
                },
                State::Executing(item) => {
                    if let Err(err) = self.execute(item) {
                        self.report_error(&err)?;
                    }
                    self.start_unit();
                    State::Reading
                }
            };
        }
    }

    fn execute(&mut self, item: Item) -> Result<(), DustError> {
        let ir = self.lower(&item)?;
        if self.options.echo_ir {
            let header = match item {
                Item::Function(_) => "Read function definition:",
                Item::Extern(_) => "Read extern:",
                Item::Stmt(_) => "Read top-level expression:",
            };
            writeln!(self.out, "{header}\n{ir}")?;
        }

        match item {
            Item::Function(function) => {
                let tracker = self.engine.add_module(std::mem::take(&mut self.unit))?;
                debug!(function = %function.proto.name, tracker = tracker.id(), "function loaded");
                self.report.functions += 1;
            }
            // Nothing to load: the prototype lives on in the registry.
            Item::Extern(_) => self.report.externs += 1,
            Item::Stmt(_) => {
                let _span = debug_span!("evaluate").entered();
                let tracker = self.engine.add_module(std::mem::take(&mut self.unit))?;
                let result = self.engine.call(ANON_EXPR_NAME, &[]);
                // Unload before looking at the result so a failed call leaves nothing behind.
                self.engine.remove(tracker)?;
                let value = result?;
                if value != RtValue::Void {
                    writeln!(self.out, "Evaluated to {value}")?;
                    self.report.values.push(value);
                }
                self.report.expressions += 1;
            }
        }
        Ok(())
    }

    /// Lower `item` into the current unit and render what was produced.
    fn lower(&mut self, item: &Item) -> Result<String, DustError> {
        let options = LoweringOptions { optimize: self.options.optimize, ..LoweringOptions::default() };
        let mut ctx = LoweringContext::new(&mut self.unit, &mut self.registry, options);
        let lowered = match item {
            Item::Function(function) => ctx.lower_function(function)?,
            Item::Extern(proto) => ctx.lower_prototype(proto)?,
            Item::Stmt(stmt) => ctx.lower_anonymous(stmt, ANON_EXPR_NAME)?,
        };
        Ok(lowered.to_string())
    }

    /// Begin a fresh compilation unit. Registry entries and loaded code persist.
    fn start_unit(&mut self) {
        self.units_started += 1;
        self.unit = Module::new(format!("unit{}", self.units_started));
    }

    fn report_error(&mut self, err: &DustError) -> Result<(), SessionError> {
        self.report.errors += 1;
        debug!(error = %err, "construct skipped");
        writeln!(self.out, "Error: {err}")?;
        Ok(())
    }
}
