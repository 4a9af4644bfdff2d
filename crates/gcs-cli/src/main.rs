mod sim;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use gcs_dispatch::Dispatcher;
use gcs_link::{spawn_reader, Handshake, LinkError, SerialLink, VerifiedPorts};
use gcs_mission::{available_missions, Mission, Scheduler};
use gcs_proto::wire::encode_wire_command;

use sim::SimVehicle;

#[derive(Debug, Parser)]
#[command(name = "gcsd", version, about = "SwarmGCS - serial bridge for multi-drone choreography")]
struct Cli {
    #[arg(long, default_value = "gcs.toml")]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sanity-check the configuration.
    Doctor,
    /// Probe the configured port and report whether the ground radio answers.
    Verify,
    /// Answer inbound control requests on the configured port.
    Serve,
    /// List mission files in the missions directory.
    Missions,
    /// Play a mission over the port, frame by frame. Ctrl-C lands everyone.
    Fly { mission: PathBuf },
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    link: LinkCfg,
    handshake: Option<HandshakeCfg>,
    missions: MissionsCfg,
}

#[derive(Debug, serde::Deserialize)]
struct LinkCfg {
    port: String,
    baud: u32,
    /// Poll window for the serve loop's bounded reads.
    read_timeout_ms: Option<u64>,
}

#[derive(Debug, serde::Deserialize)]
struct HandshakeCfg {
    probe: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, serde::Deserialize)]
struct MissionsCfg {
    dir: String,
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    Ok(toml::from_str(&s).context("parse config toml")?)
}

fn handshake_from(cfg: &Config) -> Handshake {
    let mut hs = Handshake::default();
    if let Some(h) = &cfg.handshake {
        if let Some(probe) = &h.probe {
            hs.probe = probe.clone();
        }
        if let Some(ms) = h.timeout_ms {
            hs.window = Duration::from_millis(ms);
        }
    }
    hs
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg),
        Command::Verify => verify(&cfg).await,
        Command::Serve => serve(&cfg).await,
        Command::Missions => missions(&cfg),
        Command::Fly { mission } => fly(&cfg, &mission).await,
    }
}

fn doctor(cfg: &Config) -> Result<()> {
    anyhow::ensure!(!cfg.link.port.is_empty(), "link.port missing");
    anyhow::ensure!(cfg.link.baud > 0, "link.baud invalid");
    if !std::path::Path::new(&cfg.missions.dir).is_dir() {
        warn!(dir = %cfg.missions.dir, "missions dir does not exist yet");
    }
    info!("doctor: OK");
    Ok(())
}

async fn verify(cfg: &Config) -> Result<()> {
    let hs = handshake_from(cfg);
    let mut link = SerialLink::open(&cfg.link.port, cfg.link.baud)?;
    let mut ports = VerifiedPorts::new();

    let (reader, writer) = link.halves();
    let verified = ports
        .verify_port(&cfg.link.port, &hs, reader, writer)
        .await?;

    if verified {
        println!("VERIFIED: {}", cfg.link.port);
        Ok(())
    } else {
        // rejected handle must not linger half-verified
        drop(link);
        println!("REJECTED: {} (no ack within {:?})", cfg.link.port, hs.window);
        Ok(())
    }
}

/// Inbound loop: one request, one response, in order, on one task. A bad
/// line answers with an error token; only transport loss ends the loop.
async fn serve(cfg: &Config) -> Result<()> {
    let mut link = SerialLink::open(&cfg.link.port, cfg.link.baud)?;
    let mut dispatcher = Dispatcher::new(SimVehicle::default());
    let poll = Duration::from_millis(cfg.link.read_timeout_ms.unwrap_or(50));

    info!(port = %cfg.link.port, "serving control requests");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("serve: interrupted");
                return Ok(());
            }
            got = link.recv_line(poll) => match got {
                Ok(Some(line)) => {
                    let resp = dispatcher.handle_line(&line);
                    link.send_line(&resp).await?;
                }
                Ok(None) => {}
                Err(LinkError::Closed) => {
                    warn!("serve: connection lost");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn missions(cfg: &Config) -> Result<()> {
    let found = available_missions(&cfg.missions.dir);
    if found.is_empty() {
        println!("no missions in {}", cfg.missions.dir);
        return Ok(());
    }
    for entry in found {
        println!("{}\t{}", entry.name, entry.path.display());
    }
    Ok(())
}

/// Outbound loop: frames strictly in order, every command of a frame written
/// and flushed before the frame delay runs. Ctrl-C aborts to landing.
async fn fly(cfg: &Config, mission_path: &std::path::Path) -> Result<()> {
    let mission = Mission::load(mission_path)
        .with_context(|| format!("load mission {}", mission_path.display()))?;

    let mut scheduler = Scheduler::new();
    scheduler.build(mission);
    info!(frames = scheduler.total_frames(), "mission ready");

    let link = SerialLink::open(&cfg.link.port, cfg.link.baud)?;
    let (reader, mut writer) = link.into_split();

    // Drain radio chatter in the background so the write side never stalls.
    let mut inbound = spawn_reader(reader);
    tokio::spawn(async move {
        while let Some(line) = inbound.recv().await {
            info!(%line, "radio");
        }
    });

    use tokio::io::AsyncWriteExt;

    while let Some(frame) = scheduler.next() {
        info!(frame = frame.frame_index, commands = frame.commands.len(), "tick");
        for cmd in &frame.commands {
            let line = encode_wire_command(cmd);
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(frame.delay_ms)) => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("fly: interrupted, aborting to landing");
                for cmd in scheduler.abort_to_landing() {
                    let line = encode_wire_command(&cmd);
                    writer.write_all(line.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
                return Ok(());
            }
        }
    }

    info!("mission complete");
    Ok(())
}
