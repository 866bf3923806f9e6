// ABOUTME: Relay server binary: parses CLI flags, runs the accept loop, and drives shutdown
// ABOUTME: Stdin driver accepts the literal line `quit` to initiate an orderly stop (§6)

use argh::FromArgs;
use chatrelay::config::ServerConfig;
use chatrelay::server;
use tokio::sync::oneshot;

/// A multi-user chat relay server.
#[derive(FromArgs)]
struct Args {
    /// host to bind the listener to
    #[argh(option, default = "String::from(\"127.0.0.1\")")]
    host: String,

    /// port to listen on
    #[argh(option, default = "65432")]
    port: u16,

    /// listen backlog size
    #[argh(option, default = "10")]
    backlog: u32,
}

#[tokio::main]
async fn main() -> chatrelay::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Args = argh::from_env();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        backlog: args.backlog,
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let serve_task = tokio::spawn(async move { server::serve(&config, shutdown_rx).await });

    println!("[0] Quit\n");
    wait_for_quit().await;

    let _ = shutdown_tx.send(());
    serve_task
        .await
        .map_err(|e| Box::new(e) as chatrelay::Error)??;
    Ok(())
}

/// Blocks on stdin until the operator types `quit`, without blocking the
/// runtime's other tasks (the accept loop and directory keep running on
/// their own tasks while this one waits on a blocking thread).
async fn wait_for_quit() {
    let _ = tokio::task::spawn_blocking(|| {
        use std::io::BufRead;
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) if line.trim() == "quit" => break,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
    })
    .await;
}
