use std::io::{self, BufRead, Write};

use menteed::{config::Config, ipc, store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    dotenvy::dotenv().ok();

    // stdout carries responses; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "menteed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "config unreadable, using defaults");
            Config::default()
        }
    };
    let gate = match config.mentor_gate() {
        Ok(g) => g,
        Err(e) => {
            tracing::warn!(error = %e, "mentor password misconfigured, mentor access disabled");
            menteed::mentor::MentorGate::disabled()
        }
    };
    if !gate.is_configured() {
        tracing::warn!("no mentor password configured");
    }

    let mut state = ipc::AppState::new(config, gate);
    if state.config.storage.open_on_start {
        let dir = state.config.storage.data_dir.clone();
        match store::open_storage(state.config.storage.backend, &dir) {
            Ok(storage) => {
                state.workspace = Some(dir);
                state.storage = Some(storage);
            }
            Err(e) => tracing::warn!(error = %e, "could not open data directory"),
        }
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "menteed ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = writeln!(stdout, "{}", ipc::bad_json(e.to_string()));
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
