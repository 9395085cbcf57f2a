//! Command line driver for the simple firewall test.
//!
//! `serve` plays the responder for every incoming control connection,
//! `check` connects to a server and plays the tester.

use std::{
    future::Future,
    io::{self, Write},
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sfw::{
    sfw_proto::ControlChannel, sfw_sockets::ConnectionStats, CurrentTest, Responder, SfwConfig,
    Tester,
};
use tokio::{
    net::{TcpListener, TcpStream},
    time::sleep,
};
use tracing::{error, info};

mod config;
mod logging;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

use crate::config::CliConfig;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid value for {0}: {1} ({2})")]
    InvalidConfigOption(String, String, String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parsing(#[from] serde_json::Error),
    #[error(transparent)]
    LogAppender(#[from] tracing_appender::rolling::InitError),
}

#[derive(Parser)]
#[clap(version, about = "Checks whether a firewall drops unsolicited inbound TCP")]
struct Opt {
    /// JSON config file
    #[clap(short, long)]
    config_file: Option<PathBuf>,
    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    #[clap(about = "Answers firewall tests from connecting testers")]
    Serve {
        #[clap(short, long, default_value = "0.0.0.0:3001")]
        listen: SocketAddr,
    },
    #[clap(about = "Runs a firewall test against a server")]
    Check {
        /// Server as host:port
        server: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    let config = match &opt.config_file {
        Some(path) => CliConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => CliConfig::default(),
    };
    let _guard = logging::setup_logging(
        config.log_file_path.as_deref(),
        config.log_level,
        config.log_file_count,
    )?;

    match opt.cmd {
        Cmd::Serve { listen } => serve(listen, config.sfw).await,
        Cmd::Check { server } => check(&server, config.sfw).await,
    }
}

async fn serve(listen: SocketAddr, config: SfwConfig) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Cannot listen on {}", listen))?;
    info!("Listening on {}", listen);

    let listener = &listener;
    accept_loop(move || listener.accept(), config).await;
    Ok(())
}

/// Runs a responder session for every accepted connection.
///
/// Failing to accept, e.g. when out of descriptors, is logged and retried
/// after [ACCEPT_BACKOFF].
async fn accept_loop<A, F>(mut accept: A, config: SfwConfig)
where
    A: FnMut() -> F,
    F: Future<Output = io::Result<(TcpStream, SocketAddr)>>,
{
    loop {
        let (stream, peer) = match accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept control connection: {}", e);
                sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        let config = config.clone();
        tokio::spawn(async move {
            info!("Connection from {}", peer);
            if let Err(e) = respond(stream, config).await {
                error!("Session with {} failed: {:#}", peer, e);
            }
        });
    }
}

async fn respond(stream: TcpStream, config: SfwConfig) -> Result<()> {
    let max_msg_len = config.max_message_len;
    let mut ctl = ControlChannel::from_tcp(stream)?.with_max_msg_len(max_msg_len);
    let stats = connection_stats(&ctl)?;
    let responder = Responder::new(config, Arc::new(CurrentTest::default()));

    match responder.run(&mut ctl, stats.as_ref()).await {
        Ok(Some(result)) => info!("Simple firewall test finished: {}", result),
        Ok(None) => info!("Simple firewall test disabled"),
        Err(e) => error!("{} (exit code {})", e, e.exit_code()),
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn connection_stats(ctl: &ControlChannel<TcpStream>) -> Result<Box<dyn ConnectionStats>> {
    Ok(Box::new(sfw::sfw_sockets::TcpInfoStats::new(
        ctl.tcp_stream(),
    )?))
}

#[cfg(not(target_os = "linux"))]
fn connection_stats(_ctl: &ControlChannel<TcpStream>) -> Result<Box<dyn ConnectionStats>> {
    Ok(Box::new(sfw::sfw_sockets::UnsupportedStats))
}

async fn check(server: &str, config: SfwConfig) -> Result<()> {
    let host = host_of(server);
    let stream = TcpStream::connect(server)
        .await
        .with_context(|| format!("Cannot connect to {}", server))?;
    let mut ctl = ControlChannel::from_tcp(stream)?.with_max_msg_len(config.max_message_len);

    print!("checking for firewalls . . . . . . . . . . . . . . . . . . .  ");
    std::io::stdout().flush()?;

    match Tester::new(config).run(&mut ctl, host).await {
        Ok(session) => {
            println!("Done");
            for line in session.report(host) {
                println!("{}", line);
            }
            Ok(())
        }
        Err(e) => {
            println!();
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Host part of `host:port`, without IPv6 brackets
fn host_of(server: &str) -> &str {
    let host = server.rsplit_once(':').map_or(server, |(host, _)| host);
    host.trim_start_matches('[').trim_end_matches(']')
}
