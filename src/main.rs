use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use log::{LevelFilter, info};
use simple_logger::SimpleLogger;

use rust_gb_isa::{Catalog, Decoder, Engine, EngineConfig, Error, Result};

#[derive(Parser, Debug)]
#[command(name = "gbisa")]
#[command(about = "LR35902 instruction-set simulator", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Opcode description (JSON) to use instead of the built-in table.
    #[arg(long, value_name = "PATH", global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program until HALT and print the final CPU state.
    Run {
        /// Raw program bytes, loaded at the configured address.
        program: PathBuf,

        /// Engine configuration (JSON).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Stop with an error after this many instructions.
        #[arg(long)]
        max_steps: Option<u64>,

        /// Log every executed instruction.
        #[arg(long, action = ArgAction::SetTrue)]
        trace: bool,

        /// Print the final state as JSON.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Print a disassembly listing of a program.
    Disasm {
        program: PathBuf,
    },
    /// Print the opcode catalog as JSON.
    Catalog,
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => {
            let data = fs::read_to_string(path)?;
            let catalog = Catalog::from_json(&data)?;
            info!(
                "loaded {} opcodes from {} ({} holes)",
                catalog.len(),
                path.display(),
                catalog.holes().count()
            );
            Ok(catalog)
        }
        None => Ok(Catalog::builtin()),
    }
}

fn run(
    catalog: Catalog,
    program: &Path,
    config: Option<&Path>,
    max_steps: Option<u64>,
    trace: bool,
    json: bool,
) -> Result<()> {
    let mut config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if max_steps.is_some() {
        config.max_steps = max_steps;
    }
    config.trace |= trace;

    let bytes = fs::read(program)?;
    let mut engine = Engine::from_program(Arc::new(catalog), &bytes, config);
    let outcome = engine.run();

    let snapshot = engine.snapshot();
    if json {
        let text = serde_json::to_string_pretty(&snapshot).map_err(Error::Output)?;
        println!("{}", text);
    } else {
        println!("{}", snapshot);
    }

    let summary = outcome?;
    info!(
        "halted at {:04X}: {} instructions, {} cycles",
        summary.pc, summary.instructions, summary.cycles
    );
    Ok(())
}

fn disasm(catalog: Catalog, program: &Path) -> Result<()> {
    let bytes = fs::read(program)?;
    for item in Decoder::new(&catalog).stream(&bytes) {
        let (position, instruction) = item?;
        let raw = &bytes[position..position + instruction.length() as usize];
        let hex: Vec<String> = raw.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{:06x}: {:<9} {}", position, hex.join(" "), instruction);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("logger init failed: {}", e);
    }

    let result = load_catalog(cli.catalog.as_deref()).and_then(|catalog| match cli.command {
        Command::Run {
            program,
            config,
            max_steps,
            trace,
            json,
        } => run(catalog, &program, config.as_deref(), max_steps, trace, json),
        Command::Disasm { program } => disasm(catalog, &program),
        Command::Catalog => {
            println!("{}", catalog.to_json()?);
            Ok(())
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
