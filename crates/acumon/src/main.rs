use std::fs::File;
use std::io::{self, IsTerminal};

use anyhow::{ensure, Context};
use byteorder::{LittleEndian, ReadBytesExt};
use clap::Parser;
use log::{info, LevelFilter};

use acurite433::{PulseEvent, Receiver};

mod app;
mod cli;

use cli::Args;

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(err) = run(&args) {
        // fatal errors bypass the logger so --quiet cannot hide them
        eprintln!("acumon: {:#}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), anyhow::Error> {
    let mut input = open_input(args)?;

    // five-byte edge records until the source runs dry
    let events = std::iter::from_fn(move || {
        let duration_us = input.read_u32::<LittleEndian>().ok()?;
        let level = input.read_u8().ok()?;
        Some(PulseEvent { level, duration_us })
    });

    // the stock installation: freezer + fridge probes and the outdoor unit
    let mut rx = Receiver::default();
    app::run(args, &mut rx, events)?;

    Ok(())
}

// RUST_LOG takes precedence over the -v / -q flags when set
fn init_logging(args: &Args) {
    if std::env::var_os("RUST_LOG").is_some() {
        pretty_env_logger::init();
        return;
    }

    let filter = if args.quiet {
        LevelFilter::Off
    } else {
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    pretty_env_logger::formatted_builder()
        .filter_level(filter)
        .init();
}

// Edge records come from a capture file or a pipe; an interactive
// terminal cannot produce them
fn open_input(args: &Args) -> Result<Box<dyn io::BufRead>, anyhow::Error> {
    if args.input_is_stdin() {
        ensure!(
            !io::stdin().is_terminal(),
            "standard input is a terminal; pipe edge records in, or replay a capture with --file"
        );
        info!("reading edge records from standard input");
        Ok(Box::new(io::BufReader::new(io::stdin())))
    } else {
        info!("reading edge records from \"{}\"", &args.file);
        let file = File::open(&args.file)
            .with_context(|| format!("unable to open --file \"{}\"", args.file))?;
        Ok(Box::new(io::BufReader::new(file)))
    }
}
