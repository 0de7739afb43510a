// Copyright (c) 2024 The tomasulo-rust contributors
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// parser.rs
//
// This file contains the program text parser. Recognized forms:
//
//   ADD/SUB/MUL/DIV  Rd, Rs, Rt
//   LW/SW            Rt, offset(Rs)
//   BEQ              Rs, Rt, target
//
// Whitespace and commas separate tokens; `;` separates statements on one
// line; blank lines are ignored. Register names R0..R31 and F0..F31 share
// one 32-entry namespace (the prefix is cosmetic).

use crate::errors::SimulatorError;
use crate::simulator::instruction::{Instruction, Operation};
use crate::simulator::registers::NUM_REGISTERS;

/// Parse a whole program. Errors carry the 1-based source line number.
pub fn parse_program(text: &str) -> Result<Vec<Instruction>, SimulatorError> {
    let mut program = Vec::new();
    for (line_number, line) in text.lines().enumerate() {
        for statement in line.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            let op = parse_statement(statement).map_err(|error| SimulatorError::ParseError {
                line: line_number + 1,
                reason: error.to_string(),
            })?;
            program.push(Instruction {
                index: program.len(),
                op,
            });
        }
    }
    Ok(program)
}

fn parse_statement(statement: &str) -> Result<Operation, SimulatorError> {
    let normalized = statement.to_uppercase().replace(',', " ");
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(SimulatorError::InvalidInstruction(statement.to_string()));
    }
    match tokens[0] {
        "ADD" | "SUB" | "MUL" | "DIV" => {
            expect_operands(&tokens, 3)?;
            let rd = parse_register(tokens[1])?;
            let rs = parse_register(tokens[2])?;
            let rt = parse_register(tokens[3])?;
            Ok(match tokens[0] {
                "ADD" => Operation::Add { rd, rs, rt },
                "SUB" => Operation::Sub { rd, rs, rt },
                "MUL" => Operation::Mul { rd, rs, rt },
                _ => Operation::Div { rd, rs, rt },
            })
        },
        "LW" | "SW" => {
            expect_operands(&tokens, 2)?;
            let rt = parse_register(tokens[1])?;
            let (offset, base) = parse_memory_operand(tokens[2])?;
            if tokens[0] == "LW" {
                Ok(Operation::Lw { rt, base, offset })
            } else {
                Ok(Operation::Sw { rt, base, offset })
            }
        },
        "BEQ" => {
            expect_operands(&tokens, 3)?;
            let rs = parse_register(tokens[1])?;
            let rt = parse_register(tokens[2])?;
            let target: i32 = tokens[3]
                .parse()
                .map_err(|_| SimulatorError::InvalidInstruction(statement.to_string()))?;
            if target < 0 {
                return Err(SimulatorError::InvalidBranchTarget(target));
            }
            Ok(Operation::Beq { rs, rt, target })
        },
        _ => Err(SimulatorError::InvalidInstruction(tokens[0].to_string())),
    }
}

fn expect_operands(tokens: &[&str], operands: usize) -> Result<(), SimulatorError> {
    if tokens.len() != operands + 1 {
        return Err(SimulatorError::InvalidInstruction(format!(
            "{} expects {} operands, found {}",
            tokens[0],
            operands,
            tokens.len() - 1
        )));
    }
    Ok(())
}

/// `R0..R31` or `F0..F31`, both mapping to the same register file.
fn parse_register(token: &str) -> Result<usize, SimulatorError> {
    let number = token
        .strip_prefix('R')
        .or_else(|| token.strip_prefix('F'))
        .ok_or_else(|| SimulatorError::InvalidRegister(token.to_string()))?;
    let register: usize = number
        .parse()
        .map_err(|_| SimulatorError::InvalidRegister(token.to_string()))?;
    if register >= NUM_REGISTERS {
        return Err(SimulatorError::InvalidRegister(token.to_string()));
    }
    Ok(register)
}

/// `offset(Rs)` with a signed decimal byte offset.
fn parse_memory_operand(token: &str) -> Result<(i32, usize), SimulatorError> {
    let open = token
        .find('(')
        .ok_or_else(|| SimulatorError::InvalidInstruction(token.to_string()))?;
    if !token.ends_with(')') {
        return Err(SimulatorError::InvalidInstruction(token.to_string()));
    }
    let offset: i32 = token[..open]
        .parse()
        .map_err(|_| SimulatorError::InvalidInstruction(token.to_string()))?;
    let base = parse_register(&token[open + 1..token.len() - 1])?;
    Ok((offset, base))
}
