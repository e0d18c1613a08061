use std::process::ExitCode;
use std::time::Instant;

use serde_json::json;

use chess_rules::config::PerftConfig;
use chess_rules::engine::perft::{divide_total, perft, perft_divide};

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays plain JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_rules=info,chess_perft=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("perft failed: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = PerftConfig::from_env();
    if std::env::args().skip(1).any(|a| a == "--divide") {
        config.divide = true;
    }
    let pos = config.position()?;

    tracing::info!(
        "chess-perft v{} on {} at depth {}: {}",
        env!("CARGO_PKG_VERSION"),
        config.board_size,
        config.depth,
        pos.to_fen()
    );

    let started = Instant::now();
    let (total, output) = if config.divide {
        let rows = perft_divide(&pos, config.depth);
        let total = divide_total(&rows, config.depth);
        let moves: Vec<_> = rows
            .iter()
            .map(|(mv, result)| json!({ "move": mv.to_string(), "result": result }))
            .collect();
        (total, json!({ "moves": moves, "total": total }))
    } else {
        let result = perft(&pos, config.depth);
        (result, serde_json::to_value(result)?)
    };
    let elapsed = started.elapsed();

    let nps = if elapsed.as_secs_f64() > 0.0 {
        (total.nodes as f64 / elapsed.as_secs_f64()) as u64
    } else {
        0
    };
    tracing::info!(
        nodes = total.nodes,
        elapsed_ms = elapsed.as_millis() as u64,
        nps,
        "perft finished"
    );

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
