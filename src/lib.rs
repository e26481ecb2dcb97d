use std::{error, fmt::Display, path::PathBuf};

use clap::Parser;

pub mod calibrator;
pub mod debug_info;
pub mod machine;

pub use calibrator::{CalibrationConfig, Calibrator};
pub use debug_info::{read_debug_info, DebugInfo};
pub use machine::{run, Computer, Instruction, Program, RegisterName, Registers, RunOutcome, Word};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    NoRegisterLine(RegisterName),
    NoProgram,
    InvalidRegisterText(String),
    InvalidRegisterValue(String),
    InvalidProgramText(String),
    InvalidCode(String),
    OddProgramLength(usize),
    InvalidOpcode(u8),
    InvalidOperand(u8),
    NonTerminating(usize),
    DigitCountTooLarge(usize),
    SearchExhausted(usize),
    NoSolutionFound,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoRegisterLine(name) => write!(
                f,
                "Can't find line for register {} in debug information.",
                name
            ),
            Error::NoProgram => write!(f, "Can't find line for program in debug information."),
            Error::InvalidRegisterText(s) => write!(f, "Invalid text({}) for register.", s),
            Error::InvalidRegisterValue(s) => write!(
                f,
                "Invalid text({}) for register value, expected an integer in 0..2^{}.",
                s,
                Word::BITS
            ),
            Error::InvalidProgramText(s) => write!(f, "Invalid text({}) for program.", s),
            Error::InvalidCode(s) => write!(f, "Invalid text({}) for code.", s),
            Error::OddProgramLength(n) => write!(
                f,
                "Program has odd length({}), every opcode needs an operand.",
                n
            ),
            Error::InvalidOpcode(n) => write!(f, "Invalid operation code({}).", n),
            Error::InvalidOperand(n) => write!(f, "Invalid operand({}).", n),
            Error::NonTerminating(limit) => write!(
                f,
                "Program didn't halt within {} executed instructions.",
                limit
            ),
            Error::DigitCountTooLarge(n) => write!(
                f,
                "Register A can't hold {} octal digits, at most {} are supported.",
                n,
                calibrator::MAX_DIGIT_COUNT
            ),
            Error::SearchExhausted(limit) => write!(
                f,
                "Search for register A gave up after {} expansions.",
                limit
            ),
            Error::NoSolutionFound => write!(
                f,
                "No value of register A makes the program output itself."
            ),
        }
    }
}

impl error::Error for Error {}

#[derive(Debug, Parser)]
pub struct CLIArgs {
    pub input_path: PathBuf,
}

pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
    // A second install (e.g. from tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
