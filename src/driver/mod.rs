//! Compilation driver and orchestration
//!
//! - **Session**: the interactive read / lower / execute loop
//! - **Pipeline**: whole-file compilation into one object
//! - **I/O**: reading sources and writing artifacts
//! - **Conversion**: format transformations (WASM → WAT)
//!
//! The driver sits above the parser, lowering, engine and backend, and owns
//! the external concerns (streams, files) that don't belong in any of them.

pub mod conversion;
pub mod io;
pub mod pipeline;
pub mod session;

pub use conversion::wasm_to_wat;
pub use io::{read_source, write_object_file, write_wat_file, DEFAULT_OUTPUT};
pub use pipeline::{compile_file, compile_source, CompileOptions, FileCompiler, FileReport, MAIN_NAME};
pub use session::{Session, SessionError, SessionOptions, SessionReport};
