//! bcpu - block assembly checker and runner
//! Command-line interface for parsing and executing bcpu programs

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bcpu_core::config;
use bcpu_core::cpu::MAX_BIT_WIDTH;
use bcpu_core::trace::write_jsonl;
use bcpu_core::{Cpu, CpuConfig, ParseError, Program, parse_source};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bcpu")]
#[command(version)]
#[command(about = "Check and run block-structured assembly on a fixed-width virtual CPU", long_about = None)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a source file and report its blocks
    Check {
        /// Assembly source file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the parsed program back as assembly
        #[arg(short, long)]
        listing: bool,
    },

    /// Parse, load and run a source file
    Run {
        /// Assembly source file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Maximum number of steps
        #[arg(short, long, env = "BCPU_MAX_STEPS")]
        steps: Option<usize>,

        /// Register width in bits
        #[arg(
            short = 'w',
            long,
            env = "BCPU_BIT_WIDTH",
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_BIT_WIDTH))
        )]
        bit_width: Option<u32>,

        /// Wrap to the start of a block instead of failing past its end
        /// (`--autoloop` or `--autoloop=false`)
        #[arg(
            short,
            long,
            env = "BCPU_AUTOLOOP",
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true",
            value_parser = clap::builder::BoolishValueParser::new()
        )]
        autoloop: Option<bool>,

        /// Print every executed step
        #[arg(short, long)]
        trace: bool,

        /// Machine-readable output (JSON lines)
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check { input, listing } => check_command(&input, listing),
        Commands::Run {
            input,
            steps,
            bit_width,
            autoloop,
            trace,
            json,
        } => {
            let options = RunOptions {
                steps: steps.unwrap_or(*config::MAX_STEPS),
                config: CpuConfig::default()
                    .with_bit_width(bit_width.unwrap_or(*config::BIT_WIDTH))
                    .with_autoloop(autoloop.unwrap_or(*config::AUTOLOOP)),
                trace,
                json,
            };
            run_command(&input, &options)
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOADING
// ═══════════════════════════════════════════════════════════════════════════════

/// Reads and parses `path`, echoing the offending source line on failure
fn load_program(path: &Path) -> Result<Program> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    tracing::debug!("read {} line(s) from {}", source.lines().count(), path.display());
    parse_source(&source).map_err(|e| {
        print_excerpt(path, &source, &e);
        anyhow::Error::new(e).context(format!("Failed to parse {}", path.display()))
    })
}

fn print_excerpt(path: &Path, source: &str, err: &ParseError) {
    let Some(line) = err.line else { return };
    let Some(text) = source.lines().nth(line) else { return };
    eprintln!("{} {}:{}", "  -->".blue().bold(), path.display(), line + 1);
    eprintln!("{} {}", format!("{:>5} |", line + 1).blue().bold(), text);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHECK
// ═══════════════════════════════════════════════════════════════════════════════

fn check_command(input: &Path, listing: bool) -> Result<()> {
    println!(
        "{} {}",
        "  Checking".green().bold(),
        input.display().to_string().cyan()
    );

    let program = load_program(input)?;

    for id in program.block_ids() {
        let len = program.block(id.as_str()).map_or(0, <[_]>::len);
        println!("    {:<16} {} instruction(s)", id.to_string().yellow(), len);
    }

    let histogram: Vec<String> = program
        .opcode_histogram()
        .into_iter()
        .map(|(opcode, count)| format!("{} {}", opcode, count))
        .collect();
    if !histogram.is_empty() {
        println!("    {:<16} {}", "opcodes".dimmed(), histogram.join(", "));
    }

    if listing {
        println!();
        print!("{}", program);
        println!();
    }

    println!(
        "{} {} block(s), {} instruction(s), no errors found",
        "  Finished".green().bold(),
        program.block_ids().len(),
        program.instruction_count()
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUN
// ═══════════════════════════════════════════════════════════════════════════════

struct RunOptions {
    steps: usize,
    config: CpuConfig,
    trace: bool,
    json: bool,
}

fn run_command(input: &Path, options: &RunOptions) -> Result<()> {
    let program = load_program(input)?;
    let mut cpu = Cpu::new(options.config).context("Failed to create CPU")?;
    cpu.load(program);

    if !options.json {
        println!(
            "{} {} (W={}, autoloop {}, up to {} steps)",
            "   Running".green().bold(),
            input.display().to_string().cyan(),
            cpu.bit_width(),
            if cpu.config().autoloop { "on" } else { "off" },
            options.steps
        );
    }

    let outcome = cpu.run(options.steps);

    if options.json {
        print_json(&cpu, options, outcome.as_ref().ok().map(|s| s.steps))?;
    } else {
        print_human(&cpu, options);
    }

    let summary = outcome.with_context(|| format!("Execution failed at {}", cpu.cursor()))?;
    if !options.json {
        if summary.halted {
            println!(
                "{} {} step(s), halted",
                "  Finished".green().bold(),
                summary.steps
            );
        } else {
            println!(
                "{} step budget of {} exhausted at {}",
                "   Stopped".yellow().bold(),
                options.steps,
                cpu.cursor()
            );
        }
    }
    Ok(())
}

fn print_human(cpu: &Cpu, options: &RunOptions) {
    if options.trace {
        println!();
        for (i, entry) in cpu.trace().iter().enumerate() {
            println!("{:>6}  {}", i.to_string().dimmed(), entry);
        }
    }

    println!();
    println!("{}", "Registers".bold());
    for (name, value) in cpu.registers().iter() {
        println!("    {:<12} {}", name.to_string().yellow(), value);
    }

    println!("{}", "Memory".bold());
    if cpu.memory().is_empty() {
        println!("    {}", "(empty)".dimmed());
    }
    for (address, value) in cpu.memory().iter() {
        println!("    {:<12} {}", format!("[{}]", address).yellow(), value);
    }
    println!();
}

fn print_json(cpu: &Cpu, options: &RunOptions, steps: Option<usize>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if options.trace {
        write_jsonl(&mut out, cpu.trace()).context("Failed to write trace")?;
    }

    let summary = serde_json::json!({
        "steps": steps.unwrap_or(cpu.trace().len()),
        "halted": cpu.is_halted(),
        "cursor": cpu.cursor(),
        "bit_width": cpu.bit_width(),
        "instructions": cpu.program().map_or(0, Program::instruction_count),
        "registers": cpu.registers(),
        "memory": cpu.memory(),
    });
    serde_json::to_writer(&mut out, &summary).context("Failed to write summary")?;
    writeln!(out)?;
    Ok(())
}
