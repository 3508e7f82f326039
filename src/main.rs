//! wasmlet command line
//!
//! Decodes a module, runs its start function (or the function named with
//! `--invoke`) with the integer arguments given on the command line and
//! prints the values left on the operand stack.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wasmlet::parser::instruction::{Instruction, InstructionIterator};
use wasmlet::runtime::{ExecutionError, Interpreter};
use wasmlet::Module;

/// Bytes shown per line of a memory dump
const DUMP_WIDTH: usize = 16;

/// Run a WebAssembly module's start function
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the .wasm module
    wasm_file: PathBuf,

    /// i32 arguments passed to the entry function
    #[arg(allow_negative_numbers = true)]
    args: Vec<i32>,

    /// Run this function index instead of the start function
    #[arg(long, value_name = "INDEX")]
    invoke: Option<u32>,

    /// After execution, print the first BYTES bytes of linear memory
    #[arg(long, value_name = "BYTES", num_args = 0..=1, default_missing_value = "256")]
    dump_memory: Option<usize>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// List every function's instructions instead of running
    #[arg(long, conflicts_with_all = ["invoke", "dump_memory"])]
    disassemble: bool,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Report {
    function: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<TrapReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<String>,
}

#[derive(Serialize)]
struct TrapReport {
    message: String,
    function: u32,
    offset: usize,
    opcode: Option<u8>,
    depth: usize,
}

impl From<&ExecutionError> for TrapReport {
    fn from(e: &ExecutionError) -> Self {
        TrapReport {
            message: e.kind.to_string(),
            function: e.context.function,
            offset: e.context.offset,
            opcode: e.context.opcode,
            depth: e.context.depth,
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    initialize_tracing(args.verbose);

    let module = load_module(&args.wasm_file)?;

    if args.disassemble {
        disassemble(&module);
        return Ok(ExitCode::SUCCESS);
    }

    run(module, &args)
}

/// Log to stderr, filtered by RUST_LOG when it is set
fn initialize_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_module(path: &Path) -> Result<Module> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), len = bytes.len(), "module loaded");
    wasmlet::parse(&bytes).with_context(|| format!("failed to decode {}", path.display()))
}

fn run(mut module: Module, args: &Args) -> Result<ExitCode> {
    let function = match args.invoke {
        Some(index) => index,
        None => module.start.context("module has no start function; use --invoke")?,
    };

    let mut interpreter = Interpreter::new(&mut module);
    let outcome = interpreter.invoke(function, &args.args);
    info!(function, steps = interpreter.steps(), "run complete");
    let memory = args.dump_memory.map(|len| {
        let data = interpreter.memory().data();
        data[..len.min(data.len())].to_vec()
    });

    if args.json {
        let report = Report {
            function,
            results: outcome.as_ref().ok().cloned(),
            error: outcome.as_ref().err().map(TrapReport::from),
            memory: memory.as_deref().map(hex::encode),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(if outcome.is_ok() { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    if let Some(memory) = &memory {
        print_memory(memory);
    }

    match outcome {
        Ok(results) => {
            let rendered: Vec<String> = results.iter().map(i32::to_string).collect();
            println!("{}", rendered.join(" "));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("trap: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_memory(memory: &[u8]) {
    for (line, chunk) in memory.chunks(DUMP_WIDTH).enumerate() {
        println!("{:08x}  {}", line * DUMP_WIDTH, hex::encode(chunk));
    }
}

fn disassemble(module: &Module) {
    for (index, function) in module.functions.iter().enumerate() {
        let ty = &module.types[function.type_index as usize];
        let marker = if module.start == Some(index as u32) { " (start)" } else { "" };
        println!("func {index}: {ty}, {} local(s){marker}", function.local_count);

        let mut depth = 1usize;
        for item in InstructionIterator::new(&function.body) {
            match item {
                Ok((offset, instruction)) => {
                    if matches!(instruction, Instruction::End | Instruction::Else) {
                        depth = depth.saturating_sub(1);
                    }
                    println!("  {:06x}: {}{}", function.body_offset + offset, "  ".repeat(depth), instruction);
                    if instruction.is_block_start() || matches!(instruction, Instruction::Else) {
                        depth += 1;
                    }
                }
                Err(e) => {
                    println!("  error: {e}");
                    break;
                }
            }
        }
    }
}
