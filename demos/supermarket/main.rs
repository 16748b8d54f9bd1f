use marketsim::{Engine, ServiceTimeModel, SimulationConfig, Snapshot, Tick};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::time::Duration;

/// Command-line surface for the supermarket demo.
///
/// Defaults: open 8:00, close midnight, 6m15s expected checkout, 600
/// expected customers, 4 lanes, 30 ms per step.
struct DemoOptions {
    opening: Tick,
    closing: Tick,
    service_secs: Tick,
    customers: u64,
    lanes: usize,
    step_delay_ms: u64,
    seed: Option<u64>,
    legacy_service: bool,
}

impl DemoOptions {
    fn defaults() -> Self {
        Self {
            opening: 8 * 3600,
            closing: 0,
            service_secs: 375,
            customers: 600,
            lanes: 4,
            step_delay_ms: 30,
            seed: None,
            legacy_service: false,
        }
    }
}

/// Parse "HH:MM" into seconds since midnight.
fn parse_clock(text: &str) -> Result<Tick, String> {
    let (hours, minutes) = text
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got '{}'", text))?;
    let hours: Tick = hours.parse().map_err(|_| format!("bad hour in '{}'", text))?;
    let minutes: Tick = minutes
        .parse()
        .map_err(|_| format!("bad minute in '{}'", text))?;
    if hours > 23 || minutes > 59 {
        return Err(format!("'{}' is not a valid time of day", text));
    }
    Ok(hours * 3600 + minutes * 60)
}

fn parse_args() -> Result<DemoOptions, String> {
    let mut options = DemoOptions::defaults();
    let mut args = std::env::args().skip(1);

    while let Some(flag) = args.next() {
        let mut value = |name: &str| {
            args.next().ok_or_else(|| format!("{} needs a value", name))
        };
        match flag.as_str() {
            "--open" => options.opening = parse_clock(&value("--open")?)?,
            "--close" => options.closing = parse_clock(&value("--close")?)?,
            "--service-secs" => {
                options.service_secs = value("--service-secs")?
                    .parse()
                    .map_err(|_| "bad --service-secs value".to_string())?
            }
            "--customers" => {
                options.customers = value("--customers")?
                    .parse()
                    .map_err(|_| "bad --customers value".to_string())?
            }
            "--lanes" => {
                options.lanes = value("--lanes")?
                    .parse()
                    .map_err(|_| "bad --lanes value".to_string())?
            }
            "--delay-ms" => {
                options.step_delay_ms = value("--delay-ms")?
                    .parse()
                    .map_err(|_| "bad --delay-ms value".to_string())?
            }
            "--seed" => {
                options.seed = Some(
                    value("--seed")?
                        .parse()
                        .map_err(|_| "bad --seed value".to_string())?,
                )
            }
            "--legacy-service" => options.legacy_service = true,
            other => return Err(format!("unknown flag '{}'", other)),
        }
    }
    Ok(options)
}

/// Redraw the lane board and counters after each simulation step.
fn draw(snapshot: &Snapshot) {
    // Clear and home the cursor for a full-screen redraw.
    print!("\x1B[2J\x1B[H");
    println!("Running Simulation...");
    println!("{}", "-".repeat(60));

    for (index, length) in snapshot.lane_lengths.iter().enumerate() {
        println!("{:>3}: {}", index + 1, "#".repeat(*length));
    }

    println!();
    println!(
        "Number of events processed: {}/{}",
        snapshot.events_processed, snapshot.total_events
    );
    println!("Number of arrivals processed: {}", snapshot.arrivals_processed);
    println!(
        "Number of departures processed: {}",
        snapshot.departures_processed
    );
    println!(
        "Longest line encountered so far: {}",
        snapshot.longest_line
    );
    let _ = std::io::stdout().flush();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let options = parse_args().map_err(|message| {
        eprintln!(
            "usage: supermarket [--open HH:MM] [--close HH:MM] [--service-secs N] \
             [--customers N] [--lanes N] [--delay-ms N] [--seed N] [--legacy-service]"
        );
        message
    })?;

    let mut config = SimulationConfig::new(
        options.opening,
        options.closing,
        options.service_secs,
        options.customers,
        options.lanes,
    );
    if options.legacy_service {
        config = config.with_service_model(ServiceTimeModel::LegacyBiased);
    }

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut engine = Engine::new(config)?;
    engine.generate_arrivals(&mut rng)?;

    let delay = Duration::from_millis(options.step_delay_ms);
    let stats = engine.run(|snapshot| {
        draw(snapshot);
        std::thread::sleep(delay);
    })?;

    println!();
    println!(
        "Simulation complete: {} customers served, longest line {}",
        stats.customer_count, stats.longest_line
    );
    Ok(())
}
