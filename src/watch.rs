use std::io::{BufRead, BufReader, Write};
use std::num::ParseIntError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel as channel;
use dwa::{Clock, DecayingWindowAverage, Snapshot};
use tracing::{debug, info, warn};

use crate::cli::{ReportFormat, Watch};

pub fn run_watch(watch: Watch) -> Result<()> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    {
        let stop = stop_flag.clone();
        let _ = ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
        });
    }

    let input = BufReader::new(std::io::stdin());
    let stdout = std::io::stdout();
    run_watch_with(&watch, input, &mut stdout.lock(), stop_flag)
}

pub(crate) fn run_watch_with<R, W>(
    watch: &Watch,
    input: R,
    out: &mut W,
    stop_flag: Arc<AtomicBool>,
) -> Result<()>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let window = watch.window.build()?;
    info!(
        capacity = window.capacity(),
        decay_ms = watch.window.decay_ms,
        interval_ms = watch.interval_ms,
        "Watching stdin"
    );

    let (batch_tx, batch_rx) = channel::bounded::<Vec<i64>>(1024);

    // Stdin reader thread: one batch per line
    let reader = thread::spawn(move || -> Result<()> {
        for line in input.lines() {
            let line = line.context("Reading samples")?;
            match parse_samples(&line) {
                Ok(batch) if batch.is_empty() => {}
                Ok(batch) => {
                    if batch_tx.send(batch).is_err() {
                        // Receiver gone; shutting down
                        break;
                    }
                }
                Err(e) => warn!(?e, line = %line, "Skipping unparseable samples"),
            }
        }
        Ok(())
    });

    let ticker = channel::tick(Duration::from_millis(watch.interval_ms.max(1)));
    let mut stopped = false;
    loop {
        if stop_flag.load(Ordering::Relaxed) {
            stopped = true;
            break;
        }
        channel::select! {
            recv(batch_rx) -> msg => match msg {
                Ok(batch) => window.add(&batch),
                Err(_) => break,
            },
            recv(ticker) -> _ => report(&window, watch.format, out)?,
        }
    }

    report(&window, watch.format, out)?;

    // A reader blocked on stdin is left behind on Ctrl-C
    if !stopped {
        reader.join().unwrap_or(Ok(()))?;
    }
    info!("Stopped watching");
    Ok(())
}

pub(crate) fn parse_samples(line: &str) -> Result<Vec<i64>, ParseIntError> {
    line.split_whitespace().map(str::parse).collect()
}

fn report<C: Clock, W: Write>(
    window: &DecayingWindowAverage<C>,
    format: ReportFormat,
    out: &mut W,
) -> Result<()> {
    let snapshot = window.snapshot();
    debug!(average = snapshot.average, samples = snapshot.samples, "Report");
    write_report(&snapshot, format, out).context("Writing report")
}

fn write_report<W: Write>(snapshot: &Snapshot, format: ReportFormat, out: &mut W) -> Result<()> {
    match format {
        ReportFormat::Text => writeln!(
            out,
            "avg={} samples={}/{}",
            snapshot.average, snapshot.samples, snapshot.capacity
        )?,
        ReportFormat::Json => {
            serde_json::to_writer(&mut *out, snapshot)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
