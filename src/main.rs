//! Bucle JSON-lines: una petición por línea en stdin, una respuesta por línea
//! en stdout.

use log::{error, info};
use molcalc_rust::{AppConfig, AppState, Request, Response};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };
    let state = match AppState::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("startup failed: {e}");
            std::process::exit(5);
        }
    };
    info!("molcalc ready (spool={})", config.spool_dir.display());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("stdin: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => state.dispatch(request).await,
            Err(e) => Response::with_status(400, json!({ "error": "400", "message": format!("bad request: {e}") })),
        };
        let mut out = match serde_json::to_string(&response) {
            Ok(s) => s,
            Err(e) => {
                error!("serialize response: {e}");
                continue;
            }
        };
        out.push('\n');
        if let Err(e) = stdout.write_all(out.as_bytes()).await {
            error!("stdout: {e}");
            break;
        }
        let _ = stdout.flush().await;
    }
}
