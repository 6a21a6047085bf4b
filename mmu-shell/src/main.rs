//! Interactive memory allocation simulator.
//!
//! Usage: mmu-shell [OPTIONS] <page_size>
//!
//! Reads one command per line from stdin until `exit`.

mod command;
mod error;
mod logging;
mod memory;
mod shell;
mod value;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use clap::{value_parser, Arg, Command};
use log::{info, LevelFilter};
use mmu::config::DEFAULT_MEMORY_SIZE;
use mmu::{Mmu, MmuConfig};

use crate::error::ShellResult;
use crate::memory::PhysicalMemory;
use crate::shell::{Flow, Shell};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn cli() -> Command<'static> {
    Command::new("mmu-shell")
        .about("Memory Allocation Simulator")
        .arg(
            Arg::new("page_size")
                .required(true)
                .takes_value(true)
                .value_parser(value_parser!(u32))
                .help("Bytes per page"),
        )
        .arg(
            Arg::new("memory_size")
                .short('m')
                .long("memory-size")
                .takes_value(true)
                .value_parser(value_parser!(u32))
                .help("Bytes of physical memory and of every virtual space [default: 64MiB]"),
        )
        .arg(
            Arg::new("log_level")
                .short('l')
                .long("log-level")
                .takes_value(true)
                .value_parser(["off", "error", "warn", "info", "debug", "trace"])
                .help("Log verbosity, falls back to the LOG environment variable"),
        )
}

fn print_start_message(page_size: u32) {
    println!(
        "Welcome to the Memory Allocation Simulator! Using a page size of {} bytes.",
        page_size
    );
    println!("Commands:");
    println!("  * create <text_size> <data_size> (initializes a new process)");
    println!("  * allocate <PID> <var_name> <data_type> <number_of_elements> (allocated memory on the heap)");
    println!("  * set <PID> <var_name> <offset> <value_0> <value_1> <value_2> ... <value_N> (set the value for a variable)");
    println!("  * free <PID> <var_name> (deallocate memory on the heap that is associated with <var_name>)");
    println!("  * terminate <PID> (kill the specified process)");
    println!("  * print <object> (prints data)");
    println!("    * If <object> is \"mmu\", print the MMU memory table");
    println!("    * if <object> is \"page\", print the page table");
    println!("    * if <object> is \"processes\", print a list of PIDs for processes that are still running");
    println!("    * if <object> is a \"<PID>:<var_name>\", print the value of the variable for that process");
    println!();
}

fn run() -> ShellResult<()> {
    let matches = cli().get_matches();

    let level = matches
        .get_one::<String>("log_level")
        .cloned()
        .or_else(|| env::var("LOG").ok())
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Warn);
    logging::init(level);

    let page_size = matches
        .get_one::<u32>("page_size")
        .copied()
        .ok_or(error::ShellError::Usage("mmu-shell <page_size>"))?;
    let memory_size = matches
        .get_one::<u32>("memory_size")
        .copied()
        .unwrap_or(DEFAULT_MEMORY_SIZE);

    let config = MmuConfig::new(page_size)?
        .with_space_size(memory_size)
        .with_physical_memory_size(memory_size);
    let memory = PhysicalMemory::new(memory_size as usize);
    info!(
        "page size {} bytes, {} bytes of physical memory",
        config.page_size, config.physical_memory_size
    );
    let mut shell = Shell::new(Mmu::new(config)?, memory);

    print_start_message(page_size);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        stdout.lock().flush()?;
        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let mut out = stdout.lock();
        match shell.execute_line(&line, &mut out) {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => writeln!(out, "error: {}", e)?,
        }
        writeln!(out)?;
    }
    Ok(())
}
