mod ipc;
mod precomputed;
mod record;
mod sheet;
mod situation;
mod stats;

use std::io::{self, BufRead, Write};

fn main() {
    // Logging goes to stderr; stdout carries only protocol lines.
    env_logger::init();

    let mut state = ipc::AppState { snapshot: None };

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
                // No id to echo back; emit a bare envelope.
                log::warn!("unparseable request line: {}", e);
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        log::debug!("request {} {}", req.id, req.method);
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
