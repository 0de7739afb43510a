use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SimulatorError {
    // Program text errors
    ParseError { line: usize, reason: String },
    InvalidRegister(String),
    InvalidInstruction(String),
    InvalidBranchTarget(i32),

    // Memory errors
    MemoryOutOfBounds(i64),
    MemoryMisaligned(i64),

    // System errors
    IoError(std::io::Error),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::ParseError { line, reason } => {
                write!(f, "Parse error on line {}: {}", line, reason)
            },
            SimulatorError::InvalidRegister(token) => {
                write!(f, "Invalid register: {}", token)
            },
            SimulatorError::InvalidInstruction(token) => {
                write!(f, "Invalid instruction: {}", token)
            },
            SimulatorError::InvalidBranchTarget(target) => {
                write!(f, "Invalid branch target: {}", target)
            },
            SimulatorError::MemoryOutOfBounds(addr) => {
                write!(f, "Memory access out of bounds: address {}", addr)
            },
            SimulatorError::MemoryMisaligned(addr) => {
                write!(f, "Misaligned memory access: address {}", addr)
            },
            SimulatorError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for SimulatorError {}

impl From<std::io::Error> for SimulatorError {
    fn from(error: std::io::Error) -> Self {
        SimulatorError::IoError(error)
    }
}
