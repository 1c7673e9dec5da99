//! # Effect Demo Server
//!
//! Drives the effect engine against an in-memory host at the reference tick
//! rate: a ring of simulated clients, a channel-backed transport thread, and
//! two animated spirals.
//!
//! ## Usage
//!
//! ```bash
//! effect_server --clients 16 --duration 10 --revision v1_8_R3
//! effect_server --config ignis.toml
//! ```

use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ignis_effects::host::{ChannelSink, ClientRef, FixedRevision, NoLiquid, StaticDirectory};
use ignis_effects::{
    ClientId, DispatchFacade, DisplayPoint, EffectColor, EffectInvocation, EffectKind,
    EffectResult, Emitter, EngineConfig, SpiralTask, TaskScheduler, TickLoop, Vec3,
    VisibilityFilter, WorldId,
};

struct Options {
    config: Option<String>,
    clients: u32,
    duration_secs: Option<u64>,
    revision: Option<String>,
    verbose: bool,
}

fn parse_args() -> Option<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        config: None,
        clients: 8,
        duration_secs: Some(10),
        revision: None,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--config" | "-c" => {
                options.config = value.cloned();
                i += 1;
            }
            "--clients" | "-n" => {
                options.clients = value.and_then(|v| v.parse().ok()).unwrap_or(8);
                i += 1;
            }
            "--duration" | "-d" => {
                options.duration_secs = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--forever" => options.duration_secs = None,
            "--revision" | "-r" => {
                options.revision = value.cloned();
                i += 1;
            }
            "--verbose" | "-v" => options.verbose = true,
            "--help" | "-h" => {
                println!("Usage: effect_server [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>        TOML engine configuration");
                println!("  -n, --clients <NUM>        Simulated clients (default: 8)");
                println!("  -d, --duration <SECS>      Run for N seconds (default: 10)");
                println!("      --forever              Run until killed");
                println!("  -r, --revision <REV>       Server revision (default: v1_8_R3)");
                println!("  -v, --verbose              Debug logging");
                println!("  -h, --help                 Show this help");
                return None;
            }
            _ => {}
        }
        i += 1;
    }
    Some(options)
}

fn main() -> ExitCode {
    let Some(options) = parse_args() else {
        return ExitCode::SUCCESS;
    };

    tracing_subscriber::fmt()
        .with_max_level(if options.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "effect server stopped");
            ExitCode::FAILURE
        }
    }
}

/// Places `count` clients on a circle of radius 12 around the origin.
fn ring_of_clients(count: u32) -> Vec<ClientRef> {
    (0..count)
        .map(|i| {
            let theta = f64::from(i) / f64::from(count.max(1)) * std::f64::consts::TAU;
            ClientRef::new(
                ClientId(i + 1),
                WorldId::OVERWORLD,
                Vec3::new(12.0 * theta.cos(), 64.0, 12.0 * theta.sin()),
            )
        })
        .collect()
}

fn run(options: &Options) -> EffectResult<()> {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         IGNIS EFFECT SERVER                                      ║");
    println!("║         THE DISPATCH ENGINE                                      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let mut config = match &options.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if options.revision.is_some() {
        config.server_revision.clone_from(&options.revision);
        config.validate()?;
    }
    let revision = config
        .server_revision
        .clone()
        .unwrap_or_else(|| "v1_8_R3".to_owned());

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Tick Rate:          {} Hz", config.tick_rate);
    println!("│ Clients:            {}", options.clients);
    println!("│ Revision:           {revision}");
    println!("│ Queue Capacity:     {}", config.sink_queue_capacity);
    match options.duration_secs {
        Some(d) => println!("│ Duration:           {d} seconds"),
        None => println!("│ Duration:           infinite"),
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    // Host side: directory, transport queue, protocol source.
    let directory = Arc::new(StaticDirectory::new(ring_of_clients(options.clients)));
    let (sink, outbound) = ChannelSink::bounded(config.sink_queue_capacity);
    let sent_packets = Arc::new(AtomicU64::new(0));
    let sent_bytes = Arc::new(AtomicU64::new(0));
    let transport = {
        let sent_packets = Arc::clone(&sent_packets);
        let sent_bytes = Arc::clone(&sent_bytes);
        std::thread::spawn(move || {
            for packet in outbound {
                sent_packets.fetch_add(1, Ordering::Relaxed);
                sent_bytes.fetch_add(packet.packet.len() as u64, Ordering::Relaxed);
            }
        })
    };

    let facade = Arc::new(DispatchFacade::new(
        directory,
        Arc::new(NoLiquid),
        Arc::new(sink),
        Arc::new(FixedRevision::new(revision)),
    ));
    let version = facade.server_version()?;
    tracing::info!(%version, era = ?version.era(), "protocol ready");

    let audience = VisibilityFilter::radius(config.default_view_range)?;
    let center = DisplayPoint::new(WorldId::OVERWORLD, Vec3::new(0.0, 65.0, 0.0), audience);

    let scheduler = TaskScheduler::new();

    let flame = EffectInvocation::builder(EffectKind::Flame).speed(0.03).build()?;
    let ring = SpiralTask::builder(Arc::clone(&facade), Emitter::new(flame, center.clone()))
        .radius(5.0)
        .increment(5.0)
        .solid(true)
        .delay(3)
        .build()?;
    let ring_handle = scheduler.schedule(ring)?;

    let dust = EffectInvocation::builder(EffectKind::Redstone)
        .color(EffectColor::rgb(255, 0, 0)?)
        .build()?;
    let rainbow = SpiralTask::builder(Arc::clone(&facade), Emitter::new(dust, center.at(Vec3::new(0.0, 66.0, 0.0))))
        .radius(2.0)
        .increment(15.0)
        .rotations(3)
        .modifier(|firing, builder| {
            let shade = i32::try_from(firing * 10 % 256).unwrap_or(0);
            match EffectColor::rgb(255 - shade, shade, 128) {
                Ok(color) => builder.color(color),
                Err(_) => builder,
            }
        })
        .build()?;
    let rainbow_handle = scheduler.schedule(rainbow)?;

    tracing::info!(%ring_handle, %rainbow_handle, "animations scheduled");

    let mut tick_loop = TickLoop::new(config.tick_rate);
    let start = Instant::now();
    let stats_interval = u64::from(config.tick_rate) * 5;
    let mut last_stats_tick = 0u64;

    loop {
        if let Some(duration) = options.duration_secs {
            if start.elapsed().as_secs() >= duration {
                break;
            }
        }

        tick_loop.wait_for_next_tick();

        while tick_loop.should_tick() {
            let tick_start = tick_loop.begin_tick();
            scheduler.tick();
            tick_loop.end_tick(tick_start);

            let current_tick = tick_loop.tick_count();
            if current_tick - last_stats_tick >= stats_interval {
                last_stats_tick = current_tick;
                let timing = tick_loop.stats();
                let tasks = scheduler.stats();

                println!("┌─ SERVER STATUS (Tick {current_tick}) ─────────────────────────────────");
                println!("│ Uptime:             {:.1}s", start.elapsed().as_secs_f64());
                println!("│ Scheduled Tasks:    {}", scheduler.len());
                println!("│ Firings:            {} ok / {} failed / {} panicked", tasks.fired, tasks.failed, tasks.panicked);
                println!("│ Packets Sent:       {}", sent_packets.load(Ordering::Relaxed));
                println!("│ Bytes Sent:         {}", sent_bytes.load(Ordering::Relaxed));
                println!("│ Avg Tick Time:      {} μs", timing.avg_tick_us);
                println!("│ Late Ticks:         {}", timing.late_ticks);
                println!("└──────────────────────────────────────────────────────────────────");
                println!();
            }
        }
    }

    scheduler.shutdown();
    drop(facade);
    if transport.join().is_err() {
        tracing::warn!("transport thread panicked");
    }

    let tasks = scheduler.stats();
    println!("═══════════════════════════════════════════════════════════════════");
    println!(" FINAL: {} ticks, {} firings, {} packets, {} bytes",
        tick_loop.tick_count(),
        tasks.fired,
        sent_packets.load(Ordering::Relaxed),
        sent_bytes.load(Ordering::Relaxed));
    println!("═══════════════════════════════════════════════════════════════════");
    Ok(())
}
