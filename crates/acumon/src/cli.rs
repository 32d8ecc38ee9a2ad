use clap::Parser;

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts raw edge records — a little-endian u32 pulse duration in microseconds followed by one u8 level — and decodes any AcuRite 00523M / 00609SBLA2 temperature blocks that are present. Decoded records are printed one per line.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts raw edge records from a 433 MHz receiver's data pin and decodes any AcuRite 00523M / 00609SBLA2 temperature blocks that are present. Decoded records are printed one per line.

Each input record is five bytes: a little-endian u32 pulse duration in microseconds, then one u8 logical level (0 or 1) for the pulse that just ended. Produce them from a GPIO capture tool, or replay a recorded session:

    acumon --file capture.bin -vv

With --binary, every decoded record is written to standard output as the fixed 14-byte wire payload (tag, model, device, status, battery, temperature ×10, humidity ×10; all little-endian) for a downstream transport, and the human-readable lines are suppressed:

    acumon --binary < capture.bin | socat - UDP-DATAGRAM:224.3.29.70:50000

Pulses shorter than 100 µs are discarded as receiver noise before decoding.
"#;

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even decoded records
    #[arg(short, long)]
    pub quiet: bool,

    /// Input file (or "-" for stdin)
    ///
    /// The input must be raw five-byte edge records: little-endian
    /// u32 duration in microseconds, then one u8 level.
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Write each decoded 14-byte payload record to stdout
    ///
    /// Suppresses the human-readable lines; pipe the output to your
    /// transport.
    #[arg(short, long)]
    pub binary: bool,

    /// Report a timeout after SECS of signal without a decode
    ///
    /// Measured in signal time (the sum of pulse durations), so
    /// replayed captures behave the same as live input.
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["acumon"]).unwrap();
        assert!(args.input_is_stdin());
        assert!(!args.binary);
        assert_eq!(args.timeout, None);
    }
}
