//! The outside world as seen by running code. Intrinsics only talk to a
//! [`Host`], so tests can capture output and script input.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::types::find_intrinsic;

use super::engine::ExecError;
use super::value::RtValue;

pub trait Host {
    /// Write text to the program's diagnostic stream.
    fn write(&mut self, text: &str);

    /// Read one number from the program's input. `None` at end of input or
    /// when the next token is not a number.
    fn read_number(&mut self) -> Option<f64>;
}

/// Evaluate intrinsic `name` against `host`. `Ok(None)` when `name` is not an intrinsic.
pub(crate) fn call_intrinsic<H: Host + ?Sized>(
    host: &mut H,
    name: &str,
    args: &[RtValue],
) -> Result<Option<RtValue>, ExecError> {
    let Some(intrinsic) = find_intrinsic(name) else {
        return Ok(None);
    };
    if args.len() != intrinsic.params.len() {
        return Err(ExecError::BadArguments { function: name.to_string() });
    }
    let num_arg = || args.first().and_then(RtValue::as_num).ok_or_else(|| ExecError::BadArguments { function: name.to_string() });

    let result = match intrinsic.name {
        "putchard" => {
            let code = num_arg()? as u32;
            let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
            host.write(ch.encode_utf8(&mut [0; 4]));
            0.0
        }
        "printd" => {
            host.write(&format!("{:.6}\n", num_arg()?));
            0.0
        }
        "prints" => {
            let text = args.first().and_then(RtValue::as_str).ok_or_else(|| ExecError::BadArguments {
                function: name.to_string(),
            })?;
            host.write(&format!("{text}\n"));
            0.0
        }
        "scand" => host.read_number().unwrap_or(0.0),
        _ => return Ok(None),
    };
    Ok(Some(RtValue::Num(result)))
}

/// Process streams: output to stderr, input from stdin.
#[derive(Debug, Default)]
pub struct StdHost {
    pending: VecDeque<String>,
}

impl StdHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for StdHost {
    fn write(&mut self, text: &str) {
        let mut stderr = io::stderr().lock();
        let _ = stderr.write_all(text.as_bytes());
        let _ = stderr.flush();
    }

    fn read_number(&mut self) -> Option<f64> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).ok()? == 0 {
                return None;
            }
            self.pending.extend(line.split_whitespace().map(str::to_string));
        }
        self.pending.pop_front()?.parse().ok()
    }
}

/// In-memory host: collects output and serves numbers from a queue.
#[derive(Debug, Default, Clone)]
pub struct BufferHost {
    pub output: String,
    pub input: VecDeque<f64>,
}

impl BufferHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: impl IntoIterator<Item = f64>) -> Self {
        BufferHost { output: String::new(), input: input.into_iter().collect() }
    }
}

impl Host for BufferHost {
    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn read_number(&mut self) -> Option<f64> {
        self.input.pop_front()
    }
}
