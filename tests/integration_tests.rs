use spinsim::config::GncConfig;
use spinsim::control_law::ControlLawMapper;
use spinsim::disturbance::{DisturbanceConfig, DisturbanceTorque};
use spinsim::dynamics::{DynamicsModel, RigidBody};
use spinsim::log_files::{
    list_log_files, next_sequential_log_path, resolve_log_path, unique_log_path, LogFileError,
};
use spinsim::pid::PidController;
use spinsim::telemetry::write_log;
use spinsim::*;
use std::fs;
use std::path::{Path, PathBuf};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("spinsim-it-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn calm_config(steps: usize) -> GncConfig {
    let mut config = GncConfig::default();
    config.disturbance = DisturbanceConfig::calm();
    config.simulation.sample_count = steps + 1;
    config.simulation.duration_s = 0.02 * (steps + 1) as f64;
    config
}

#[cfg(test)]
mod simulation_tests {
    use super::*;

    #[test]
    fn test_simulation_produces_one_record_per_step() {
        let run = SimulationLoop::from_config(&calm_config(50)).unwrap().run();
        assert_eq!(run.records.len(), 50);
        assert_eq!(run.state.len(), 51);
        assert!((run.dt - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_records_follow_state_history() {
        let run = SimulationLoop::from_config(&calm_config(20)).unwrap().run();
        for (record, sample) in run.records.iter().zip(run.state.samples()) {
            assert_eq!(record.angular_position, sample.theta);
            assert_eq!(record.gyro_z, sample.omega);
        }
    }

    #[test]
    fn test_first_step_fires_toward_setpoint() {
        let run = SimulationLoop::from_config(&calm_config(5)).unwrap().run();
        let first = &run.records[0];

        // Setpoint pi from rest: positive error, positive output, right thruster
        assert!((first.error - std::f64::consts::PI).abs() < 1e-12);
        assert!(first.pid_output > 0.0);
        assert!(first.right_solenoid);
        assert!(!first.left_solenoid);
        assert!((run.state.samples()[1].tau - -1.5).abs() < 1e-12);
    }

    #[test]
    fn test_calm_runs_are_bit_identical() {
        let thetas = || {
            SimulationLoop::from_config(&calm_config(300))
                .unwrap()
                .run()
                .state
                .thetas()
                .map(f64::to_bits)
                .collect::<Vec<_>>()
        };
        assert_eq!(thetas(), thetas());
    }

    #[test]
    fn test_seeded_disturbance_is_reproducible() {
        let mut config = GncConfig::default();
        config.disturbance.seed = Some(2024);

        let a = SimulationLoop::from_config(&config).unwrap().with_steps(200).run();
        let b = SimulationLoop::from_config(&config).unwrap().with_steps(200).run();
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn test_disturbance_changes_every_step() {
        let mut config = GncConfig::default();
        config.disturbance.seed = Some(9);
        let run = SimulationLoop::from_config(&config).unwrap().with_steps(100).run();

        let mapper = ControlLawMapper::default();
        let disturbances: Vec<f64> = run
            .records
            .iter()
            .zip(&run.state.samples()[1..])
            .map(|(record, sample)| sample.tau - mapper.torque_command(record.pid_output))
            .collect();

        assert!(disturbances.iter().all(|d| d.abs() <= 1.0 + 1e-12));
        assert!(disturbances.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_hand_built_loop() {
        let dynamics = DynamicsModel::new(RigidBody::new(0.5).unwrap(), 0.02).unwrap();
        let pid = PidController::with_gains(1.0, 0.0, 0.0, -1.0);
        let simulation = SimulationLoop::new(
            dynamics,
            pid,
            ControlLawMapper::default(),
            DisturbanceTorque::none(),
            3,
        );
        let run = simulation.run();

        // Negative error drives the left thruster and positive torque
        assert!(run.records.iter().all(|r| r.left_solenoid && !r.right_solenoid));
        let samples = run.state.samples();
        assert!((samples[1].alpha - 3.0).abs() < 1e-12);
        assert!((samples[1].omega - 0.06).abs() < 1e-12);
        assert!((samples[1].theta - 0.0006).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = GncConfig::default();
        config.body.moment_of_inertia = Some(-0.3);
        assert!(matches!(
            SimulationLoop::from_config(&config),
            Err(ConfigError::InvalidInertia(_))
        ));
    }
}

#[cfg(test)]
mod log_file_tests {
    use super::*;

    #[test]
    fn test_sequential_names_fill_lowest_gap() {
        let dir = scratch_dir("sequential");
        assert_eq!(next_sequential_log_path(&dir, "test", "csv").unwrap(), dir.join("test1.csv"));

        fs::write(dir.join("test1.csv"), "").unwrap();
        fs::write(dir.join("test3.csv"), "").unwrap();
        assert_eq!(next_sequential_log_path(&dir, "test", "csv").unwrap(), dir.join("test2.csv"));

        fs::write(dir.join("test2.csv"), "").unwrap();
        assert_eq!(next_sequential_log_path(&dir, "test", "csv").unwrap(), dir.join("test4.csv"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_sequential_creates_directory() {
        let dir = scratch_dir("create").join("nested");
        let path = next_sequential_log_path(&dir, "test", "csv").unwrap();
        assert!(dir.is_dir());
        assert_eq!(path, dir.join("test1.csv"));
        fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_unique_names_differ() {
        let dir = scratch_dir("unique");
        let a = unique_log_path(&dir, "run", "csv").unwrap();
        let b = unique_log_path(&dir, "run", "csv").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.extension().unwrap(), "csv");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_resolve_falls_back_to_log_dir() {
        let dir = scratch_dir("resolve");
        fs::write(dir.join("test7.csv"), "x").unwrap();

        let resolved = resolve_log_path(Path::new("test7.csv"), &dir).unwrap();
        assert_eq!(resolved, dir.join("test7.csv"));

        let direct = resolve_log_path(&dir.join("test7.csv"), Path::new("elsewhere")).unwrap();
        assert_eq!(direct, dir.join("test7.csv"));

        let missing = resolve_log_path(Path::new("test8.csv"), &dir);
        assert!(matches!(missing, Err(LogFileError::NotFound(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_listing_sorted_csv_only() {
        let dir = scratch_dir("listing");
        fs::write(dir.join("test2.csv"), "abc").unwrap();
        fs::write(dir.join("test1.csv"), "a").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let entries = list_log_files(&dir, "csv").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, dir.join("test1.csv"));
        assert_eq!(entries[0].size_bytes, 1);
        assert_eq!(entries[1].size_bytes, 3);

        assert!(list_log_files(&dir.join("absent"), "csv").unwrap().is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }
}

#[cfg(test)]
mod end_to_end_tests {
    use super::*;

    #[test]
    fn test_simulated_log_round_trips_through_parser() {
        let dir = scratch_dir("roundtrip");
        let mut config = GncConfig::default();
        config.disturbance.seed = Some(11);
        let run = SimulationLoop::from_config(&config).unwrap().with_steps(120).run();

        let path = next_sequential_log_path(&dir, "test", "csv").unwrap();
        write_log(&path, "simulation", &run.records).unwrap();

        let parsed = TelemetryLogParser::default().parse_file(&path).unwrap();
        assert_eq!(parsed.accepted(), run.records.len());
        assert_eq!(parsed.malformed().count(), 0);
        for (read, written) in parsed.records.iter().zip(&run.records) {
            assert_eq!(read.delta_time, written.delta_time);
            assert_eq!(read.angular_position, written.angular_position);
            assert_eq!(read.right_solenoid, written.right_solenoid);
            assert_eq!(read.left_solenoid, written.left_solenoid);
            assert_eq!(read.pid_output, written.pid_output);
            assert_eq!(read.error, written.error);
            assert!((read.cumulative_time - written.cumulative_time).abs() < 1e-9);
        }

        let analyzer = PerformanceAnalyzer::default();
        let from_sim = analyzer.analyze(&run.records).unwrap();
        let from_log = analyzer.analyze(&parsed.records).unwrap();
        assert_eq!(from_sim.error, from_log.error);
        assert!((from_sim.duty_cycle.right_percent - from_log.duty_cycle.right_percent).abs() < 1e-9);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_duty_cycles_partition_active_samples() {
        let run = SimulationLoop::from_config(&calm_config(400)).unwrap().run();
        let report = PerformanceAnalyzer::default().analyze(&run.records).unwrap();

        // With a zero dead zone a thruster fires on every non-zero output
        let firing = run.records.iter().filter(|r| r.pid_output != 0.0).count() as f64;
        let total = report.duty_cycle.right_percent + report.duty_cycle.left_percent;
        assert!((total - firing * 100.0 / run.records.len() as f64).abs() < 1e-6);
        assert!(report.duty_cycle.right_percent <= 100.0);
        assert!(report.duty_cycle.left_percent <= 100.0);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let run = SimulationLoop::from_config(&calm_config(60)).unwrap().run();
        let report = PerformanceAnalyzer::default().analyze(&run.records).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["sample_count"], 60);
        assert!(json["error"]["rms"].is_number());
        assert!(json["rolling_duty_cycle"]["right_percent"][0].is_null());
        assert!(json["rolling_duty_cycle"]["right_percent"][59].is_number());
    }
}
