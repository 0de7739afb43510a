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

// main.rs
//
// This file contains the command-line interface for the pipeline
// simulator. `run` executes a program to completion and prints the final
// state; `trace` prints the pipeline view every cycle.

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;
use tomasulo_rust::simulator::config::{BranchTargetConvention, SimulatorConfig};
use tomasulo_rust::simulator::simulator::{Simulator, SimulatorState};
use tomasulo_rust::simulator::visualization::{OutputFormat, PipelineVisualization};
use tomasulo_rust::utils::trace::TraceLog;

const DEFAULT_PROGRAM: &str = include_str!("../demos/default.asm");

// Loop bound and step for the built-in demo program
const DEFAULT_DATA: [(i64, i32); 2] = [(0, 2), (4, 1)];

#[derive(Parser)]
#[command(name = "tomasulo_rust")]
#[command(about = "A cycle-accurate Tomasulo pipeline simulator written in Rust")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program to completion
    Run {
        /// Input assembly file (defaults to the built-in demo program)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Memory size in words
        #[arg(short, long, default_value = "1024")]
        memory_size: usize,

        /// Maximum cycles to simulate
        #[arg(long, default_value = "10000")]
        max_cycles: usize,

        /// Log level (error, warn, info, debug)
        #[arg(short, long, default_value = "warn")]
        log_level: String,

        /// Output trace file for the final state dump
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Branch target convention: "word" or "index"
        #[arg(long, default_value = "word")]
        branch_target: String,

        /// Preload a memory word before running, e.g. --poke 0=42
        #[arg(long, value_name = "ADDR=VALUE")]
        poke: Vec<String>,
    },
    /// Run a program and print the pipeline state every cycle
    Trace {
        /// Input assembly file (defaults to the built-in demo program)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Memory size in words
        #[arg(short, long, default_value = "1024")]
        memory_size: usize,

        /// Maximum cycles to simulate
        #[arg(long, default_value = "200")]
        max_cycles: usize,

        /// Log level (error, warn, info, debug)
        #[arg(short, long, default_value = "warn")]
        log_level: String,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Branch target convention: "word" or "index"
        #[arg(long, default_value = "word")]
        branch_target: String,

        /// Preload a memory word before running, e.g. --poke 0=42
        #[arg(long, value_name = "ADDR=VALUE")]
        poke: Vec<String>,
    },
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        // Unknown levels fall back to the default
        _ => LevelFilter::Warn,
    }
}

fn parse_branch_target(convention: &str) -> BranchTargetConvention {
    match convention.to_lowercase().as_str() {
        "index" => BranchTargetConvention::InstructionIndex,
        _ => BranchTargetConvention::WordAddress,
    }
}

fn parse_poke(spec: &str) -> Result<(i64, i32), String> {
    let (addr, value) = spec
        .split_once('=')
        .ok_or_else(|| format!("invalid poke '{}', expected ADDR=VALUE", spec))?;
    let addr = addr
        .trim()
        .parse()
        .map_err(|_| format!("invalid poke address '{}'", addr))?;
    let value = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid poke value '{}'", value))?;
    Ok((addr, value))
}

fn build_simulator(
    input: &Option<PathBuf>,
    memory_size: usize,
    max_cycles: usize,
    branch_target: &str,
    pokes: &[String],
) -> Result<Simulator, Box<dyn std::error::Error>> {
    let config = SimulatorConfig::new()
        .with_memory_words(memory_size)
        .with_max_cycles(max_cycles)
        .with_branch_target_convention(parse_branch_target(branch_target));
    let mut simulator = Simulator::new(config);

    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_PROGRAM.to_string(),
    };
    simulator.load_program(&text)?;

    if input.is_none() && pokes.is_empty() {
        for (address, value) in DEFAULT_DATA {
            simulator.memory.write_word(address, value)?;
        }
    }
    for spec in pokes {
        let (address, value) = parse_poke(spec)?;
        simulator.memory.write_word(address, value)?;
    }
    Ok(simulator)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            input,
            memory_size,
            max_cycles,
            log_level,
            output,
            branch_target,
            poke,
        } => {
            env_logger::Builder::from_default_env()
                .filter_level(parse_log_level(&log_level))
                .init();
            println!("Running pipeline simulator");

            let mut simulator =
                build_simulator(&input, memory_size, max_cycles, &branch_target, &poke)?;
            let state = simulator.run_to_halt();

            if let Some(error) = &simulator.error {
                println!("{} {}", "simulation failed:".red(), error);
            } else if state == SimulatorState::Running {
                println!(
                    "{}",
                    format!("cycle cap of {} reached before halt", max_cycles).yellow()
                );
            } else {
                println!("{}", "simulation halted".green());
            }

            println!("\n{}", simulator.metrics());

            println!("\nRegisters (non-zero):");
            for (reg, value) in simulator.registers.data.iter().enumerate() {
                if *value != 0 {
                    println!("  R{:<2} = {}", reg, value);
                }
            }
            println!("Memory (non-zero words):");
            for (index, word) in simulator.memory.words.iter().enumerate() {
                if *word != 0 {
                    println!("  [{}] = {}", index * 4, word);
                }
            }

            if let Some(path) = output {
                let mut trace = TraceLog::create(path.as_path())?;
                trace.record(simulator.cycle, "Starting tomasulo_rust state dump")?;
                trace.section("final pipeline state")?;
                trace.block(&simulator.dump_state())?;
                trace.section("metrics")?;
                trace.block(&simulator.metrics().to_string())?;
            }
        },
        Commands::Trace {
            input,
            memory_size,
            max_cycles,
            log_level,
            format,
            branch_target,
            poke,
        } => {
            env_logger::Builder::from_default_env()
                .filter_level(parse_log_level(&log_level))
                .init();

            let mut simulator =
                build_simulator(&input, memory_size, max_cycles, &branch_target, &poke)?;
            let mut visualization = PipelineVisualization::new();
            visualization.output_format = match format.to_lowercase().as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Text,
            };
            // Colors would corrupt piped/JSON output
            if visualization.output_format == OutputFormat::Json {
                visualization.colorize_output = false;
            }

            loop {
                let state = simulator.tick();
                println!("{}", visualization.visualize(&simulator.snapshot()));
                if state == SimulatorState::Halted || simulator.cycle >= max_cycles {
                    break;
                }
            }
            println!("{}", simulator.metrics());
        },
    }
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {}", "error:".red(), error);
        std::process::exit(1);
    }
}
