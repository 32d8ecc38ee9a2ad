//! Decode loop
//!
//! Feeds edge records to the receiver and reports every decoded
//! payload. Timeouts are measured in *signal time* — the running sum
//! of pulse durations since the last decode — so a replayed capture
//! reports exactly the timeouts a live session would have.

use std::io::{self, Write};

use log::{info, warn};

use acurite433::{Payload, PulseEvent, Receiver, MIN_PULSE_US};

use crate::cli::Args;

/// Totals from one run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Payload records decoded
    pub decoded: usize,

    /// Timeout windows elapsed without a decode
    pub timeouts: usize,
}

/// Run the application
///
/// Drives the `receiver` with every edge record from `input` until
/// the input is exhausted. Decoded payloads are printed (or written
/// as wire records with `--binary`).
pub fn run<I>(args: &Args, receiver: &mut Receiver, input: I) -> Result<RunStats, anyhow::Error>
where
    I: IntoIterator<Item = PulseEvent>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let timeout_us = args.timeout.map(|secs| secs.saturating_mul(1_000_000));
    let mut since_decode_us: u64 = 0;
    let mut stats = RunStats::default();

    for event in input {
        since_decode_us = since_decode_us.saturating_add(u64::from(event.duration_us));

        if event.duration_us >= MIN_PULSE_US {
            if let Some(payload) = receiver.input(event.duration_us, event.level) {
                report(args, &mut out, &payload)?;
                stats.decoded += 1;
                since_decode_us = 0;
            }
        }

        if let Some(limit_us) = timeout_us {
            if since_decode_us >= limit_us {
                warn!(
                    "timeout: no record within {} s of signal",
                    since_decode_us / 1_000_000
                );
                if !args.quiet && !args.binary {
                    println!("timeout");
                }
                stats.timeouts += 1;
                since_decode_us = 0;
            }
        }
    }

    info!(
        "input exhausted: {} record(s), {} timeout(s)",
        stats.decoded, stats.timeouts
    );
    Ok(stats)
}

// Print one decoded record, or emit its wire form
fn report<W: Write>(args: &Args, out: &mut W, payload: &Payload) -> Result<(), anyhow::Error> {
    if args.binary {
        out.write_all(&payload.to_bytes())?;
        out.flush()?;
    } else if !args.quiet {
        println!("{}", payload);
    }
    Ok(())
}
