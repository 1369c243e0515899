use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use spinsim::analysis::AnalysisReport;
use spinsim::config::GncConfig;
use spinsim::disturbance::DisturbanceConfig;
use spinsim::log_files::{
    list_log_files, next_sequential_log_path, resolve_log_path, unique_log_path,
    DEFAULT_LOG_DIR, DEFAULT_LOG_EXTENSION, DEFAULT_LOG_PREFIX,
};
use spinsim::log_parser::TelemetryLogParser;
use spinsim::telemetry::write_log;
use spinsim::{PerformanceAnalyzer, SimulationLoop};
use std::path::Path;
use tracing::{warn, Level};

fn main() -> Result<(), Box<dyn std::error::Error>> {

    let matches = App::new("spinsim")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🛰️  Spin axis attitude control simulator and telemetry analyzer")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table")
                .global(true),
        )
        .arg(
            Arg::with_name("log-dir")
                .short("d")
                .long("log-dir")
                .value_name("DIR")
                .help("Directory holding telemetry logs")
                .takes_value(true)
                .default_value(DEFAULT_LOG_DIR)
                .global(true),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose output")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("simulate")
                .about("🌀 Run the closed-loop simulation and write its telemetry log")
                .arg(
                    Arg::with_name("steps")
                        .short("n")
                        .long("steps")
                        .value_name("STEPS")
                        .help("Number of control steps (default: from config)")
                        .takes_value(true)
                        .validator(|v| match v.parse::<usize>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Steps must be a non-negative integer".into()),
                        }),
                )
                .arg(
                    Arg::with_name("seed")
                        .short("s")
                        .long("seed")
                        .value_name("SEED")
                        .help("Seed for the disturbance torque")
                        .takes_value(true)
                        .validator(|v| match v.parse::<u64>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Seed must be a valid number".into()),
                        }),
                )
                .arg(
                    Arg::with_name("calm")
                        .long("calm")
                        .help("Disable the disturbance torque"),
                )
                .arg(
                    Arg::with_name("unique")
                        .long("unique")
                        .help("Name the log with a timestamp and random suffix instead of the next free index"),
                )
                .arg(
                    Arg::with_name("no-log")
                        .long("no-log")
                        .help("Skip writing the telemetry log"),
                ),
        )
        .subcommand(
            SubCommand::with_name("analyze")
                .about("📊 Parse a hardware telemetry log and report control performance")
                .arg(
                    Arg::with_name("file")
                        .help("Log file path, or a file name inside the log directory")
                        .required(true),
                )
                .arg(
                    Arg::with_name("window")
                        .short("w")
                        .long("window")
                        .value_name("SAMPLES")
                        .help("Rolling duty cycle window (default: from config)")
                        .takes_value(true)
                        .validator(|v| match v.parse::<usize>() {
                            Ok(n) if n > 0 => Ok(()),
                            _ => Err("Window must be a positive integer".into()),
                        }),
                ),
        )
        .subcommand(
            SubCommand::with_name("logs")
                .about("📁 List telemetry logs in the log directory"),
        )
        .get_matches();

    let format = matches.value_of("format").unwrap_or("table");
    let log_dir = Path::new(matches.value_of("log-dir").unwrap_or(DEFAULT_LOG_DIR));
    let verbose = matches.is_present("verbose");
    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let config = match matches.value_of("config") {
        Some(path) => GncConfig::load_from_file(path)?,
        None => GncConfig::default(),
    };

    match matches.subcommand() {
        ("simulate", Some(sub_matches)) => {
            handle_simulate(sub_matches, config, log_dir, format, verbose)?;
        }
        ("analyze", Some(sub_matches)) => {
            handle_analyze(sub_matches, config, log_dir, format, verbose)?;
        }
        ("logs", _) => {
            handle_logs(log_dir, format)?;
        }
        _ => {
            println!("{}", "No command specified. Use --help for usage information.".yellow());
        }
    }

    Ok(())
}

fn handle_simulate(
    matches: &ArgMatches<'_>,
    mut config: GncConfig,
    log_dir: &Path,
    format: &str,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if matches.is_present("calm") {
        config.disturbance = DisturbanceConfig::calm();
    }
    if let Some(seed) = matches.value_of("seed") {
        config.disturbance.seed = Some(seed.parse()?);
    }

    let mut simulation = SimulationLoop::from_config(&config)?;
    if let Some(steps) = matches.value_of("steps") {
        simulation = simulation.with_steps(steps.parse()?);
    }

    if verbose {
        println!("{}", "Running simulation...".dimmed());
    }
    let run = simulation.run();

    if !matches.is_present("no-log") {
        let path = if matches.is_present("unique") {
            unique_log_path(log_dir, DEFAULT_LOG_PREFIX, DEFAULT_LOG_EXTENSION)?
        } else {
            next_sequential_log_path(log_dir, DEFAULT_LOG_PREFIX, DEFAULT_LOG_EXTENSION)?
        };
        write_log(&path, "simulation", &run.records)?;
        if format != "json" {
            println!("{} {}", "Log saved to:".bright_white(), path.display());
        }
    }

    if run.records.is_empty() {
        println!("{}", "Simulation produced no samples.".yellow());
        return Ok(());
    }

    let analyzer = PerformanceAnalyzer::new(&config.analysis)?;
    let report = analyzer.analyze(&run.records)?;
    if format == "table" {
        println!(
            "{} {:.4} rad (setpoint {:.4} rad)",
            "Final heading:".bright_white(),
            run.final_position(),
            run.setpoint
        );
    }
    print_report(&report, format, "rad")?;
    Ok(())
}

fn handle_analyze(
    matches: &ArgMatches<'_>,
    config: GncConfig,
    log_dir: &Path,
    format: &str,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = Path::new(matches.value_of("file").unwrap_or_default());
    let path = resolve_log_path(input, log_dir)?;
    if verbose {
        println!("{} {}", "Analyzing data from:".dimmed(), path.display());
    }

    let parser = TelemetryLogParser::new(&config.parser);
    let parsed = parser.parse_file(&path)?;
    if parsed.is_empty() {
        println!("{}", "No valid data found in file!".yellow());
        return Ok(());
    }
    let malformed = parsed.malformed().count();
    if malformed > 0 {
        warn!("{} malformed lines skipped in {}", malformed, path.display());
    }
    if verbose {
        println!("{} {}", "Loaded data points:".dimmed(), parsed.accepted());
    }

    let window = match matches.value_of("window") {
        Some(w) => w.parse()?,
        None => config.analysis.rolling_window,
    };
    let report = PerformanceAnalyzer::with_window(window)?.analyze(&parsed.records)?;
    print_report(&report, format, "°")?;
    Ok(())
}

fn handle_logs(log_dir: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let entries = list_log_files(log_dir, DEFAULT_LOG_EXTENSION)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
        _ => {
            if entries.is_empty() {
                println!("{} {}", "No log files in".yellow(), log_dir.display());
                return Ok(());
            }
            println!("{}", "Available log files:".bright_blue().bold());
            println!("{}", "-".repeat(40));
            for (index, entry) in entries.iter().enumerate() {
                let name = entry
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!(
                    "{}. {} ({:.1} KB)",
                    index + 1,
                    name.bright_cyan(),
                    entry.size_bytes as f64 / 1024.0
                );
            }
            println!("{}", "-".repeat(40));
        }
    }
    Ok(())
}

fn print_report(
    report: &AnalysisReport,
    format: &str,
    unit: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(report)?),
        "compact" => {
            println!(
                "rms={:.3} max={:.3} right={:.1}% left={:.1}%",
                report.error.rms,
                report.error.max_abs,
                report.duty_cycle.right_percent,
                report.duty_cycle.left_percent
            );
        }
        _ => {
            println!("{}", "=".repeat(60));
            println!("{}", "GNC SYSTEM PERFORMANCE SUMMARY".bright_blue().bold());
            println!("{}", "=".repeat(60));
            println!("{} {}", "Samples:".bright_white(), report.sample_count);
            println!("{} {:.2} s", "Elapsed:".bright_white(), report.duty_cycle.total_elapsed_s);

            println!("\n{}", "Position Statistics:".bright_white().bold());
            println!("  Mean Position: {:.2}{}", report.position.mean, unit);
            println!("  Std Dev: {:.2}{}", report.position.std_dev, unit);
            println!(
                "  Range: {:.2}{} to {:.2}{}",
                report.position.min, unit, report.position.max, unit
            );

            println!("\n{}", "Error Statistics:".bright_white().bold());
            println!("  Mean Error: {:.2}{}", report.error.mean, unit);
            println!("  Std Dev: {:.2}{}", report.error.std_dev, unit);
            println!("  RMS Error: {:.2}{}", report.error.rms, unit);
            println!("  Max Error: {:.2}{}", report.error.max_abs, unit);

            println!("\n{}", "Thruster Usage:".bright_white().bold());
            println!(
                "  Right Thruster Duty Cycle: {}",
                format!("{:.1}%", report.duty_cycle.right_percent).yellow()
            );
            println!(
                "  Left Thruster Duty Cycle: {}",
                format!("{:.1}%", report.duty_cycle.left_percent).red()
            );
            println!(
                "  Total Active Time: {:.2}s",
                report.duty_cycle.total_active_time_s()
            );
            if let Some(Some(latest)) = report.rolling_duty_cycle.right_percent.last() {
                println!(
                    "  Right Duty (last {} samples): {:.1}%",
                    report.rolling_duty_cycle.window, latest
                );
            }
            if let Some(Some(latest)) = report.rolling_duty_cycle.left_percent.last() {
                println!(
                    "  Left Duty (last {} samples): {:.1}%",
                    report.rolling_duty_cycle.window, latest
                );
            }
            println!("{}", "=".repeat(60));
        }
    }
    Ok(())
}
