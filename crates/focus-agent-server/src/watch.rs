//! Standalone monitor: analyze and print on a fixed interval.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Local;
use focus_agent_core::{AnalysisResult, Analyzer, AnalyzerError};

use crate::config::WatchArgs;

/// Loop until Ctrl-C, printing one report per analysis.
///
/// Analysis errors are printed and the loop goes on.
pub async fn run(analyzer: Arc<dyn Analyzer>, args: &WatchArgs) {
    let interval = Duration::from_secs(args.interval_secs);
    println!("Screen analyzer starting...");

    loop {
        let started = Instant::now();
        let outcome = tokio::select! {
            outcome = analyzer.analyze(&args.task) => outcome,
            _ = tokio::signal::ctrl_c() => break,
        };

        let stamp = Local::now().format("%H:%M:%S").to_string();
        println!("{}", report(&stamp, started.elapsed(), &outcome));
        println!("Waiting {} seconds...", interval.as_secs());

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("\nStopped.");
}

fn report(
    stamp: &str,
    elapsed: Duration,
    outcome: &Result<AnalysisResult, AnalyzerError>,
) -> String {
    let body = match outcome {
        Ok(result) => format!("{}: {}", result.state, result.summary),
        Err(e) => format!("error: {e}"),
    };
    format!("\n[{stamp}] ({:.1}s)\n{body}", elapsed.as_secs_f64())
}
