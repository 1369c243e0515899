use spinsim::config::ParserConfig;
use spinsim::log_files::LogFileError;
use spinsim::log_parser::{RejectReason, TelemetryLogParser};
use std::fs;
use std::path::PathBuf;

const GOOD_LINE: &str = "[2024-01-01 00:00:00.000] 0.1,0.0,0,1,0,0,0,1.2,0.05,0.0";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("spinsim-parser-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[cfg(test)]
mod line_acceptance_tests {
    use super::*;

    #[test]
    fn test_single_record_with_debug_line() {
        let parser = TelemetryLogParser::default();
        let text = format!("{}\nLeft Firing\n", GOOD_LINE);
        let report = parser.parse(&text);

        assert_eq!(report.accepted(), 1);
        let record = &report.records[0];
        assert_eq!(record.delta_time, 0.1);
        assert!(record.left_solenoid);
        assert!(!record.right_solenoid);
        assert_eq!(record.pid_output, 1.2);
        assert_eq!(record.error, 0.05);
        assert_eq!(record.cumulative_time, 0.1);
    }

    #[test]
    fn test_nine_fields_rejected() {
        let parser = TelemetryLogParser::default();
        let text = format!("{}\n[2024-01-01 00:00:00.100] 0.1,0.0,0,1,0,0,0,1.2,0.05\n", GOOD_LINE);
        let report = parser.parse(&text);

        assert_eq!(report.accepted(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line_number, 2);
        assert_eq!(report.rejected[0].reason, RejectReason::FieldCount { found: 9 });
    }

    #[test]
    fn test_markers_and_headers_skipped() {
        let parser = TelemetryLogParser::default();
        let text = [
            "Serial Log Started: 2024-01-01 00:00:00",
            "Port: /dev/ttyACM0, Baudrate: 115200",
            "--------------------------------------------------",
            "",
            "[2024-01-01 00:00:00.010] ERROR 42",
            "[2024-01-01 00:00:00.020] ERROR,1,2,3,4,5,6,7,8,9",
            "[2024-01-01 00:00:00.030] Right Firing",
            "[2024-01-01 00:00:00.040] DEBUG,integral reset",
            GOOD_LINE,
        ]
        .join("\n");
        let report = parser.parse(&text);

        assert_eq!(report.lines_read, 9);
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.rejected.len(), 8);
        assert_eq!(report.rejected[4].reason, RejectReason::Marker("ERROR".to_string()));
        assert_eq!(report.rejected[5].reason, RejectReason::Marker("ERROR".to_string()));
        assert_eq!(report.rejected[6].reason, RejectReason::NoPayload);
        assert_eq!(report.rejected[7].reason, RejectReason::Marker("DEBUG".to_string()));
        // Header lines are not counted as malformed data
        assert_eq!(report.malformed().count(), 4);
    }

    #[test]
    fn test_custom_markers() {
        let parser = TelemetryLogParser::new(&ParserConfig {
            reject_markers: vec!["WARN".to_string()],
        });
        let text = format!("[t] WARN,1,2,3,4,5,6,7,8,9\n[t] ERROR\n{}", GOOD_LINE);
        let report = parser.parse(&text);
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.rejected[0].reason, RejectReason::Marker("WARN".to_string()));
        assert_eq!(report.rejected[1].reason, RejectReason::NoPayload);
    }

    #[test]
    fn test_non_numeric_field_rejected() {
        let parser = TelemetryLogParser::default();
        let result = parser.parse_line("[t] 0.1,abc,0,1,0,0,0,1.2,0.05,0.0");
        assert_eq!(result, Err(RejectReason::NotNumeric { field: 1 }));
    }

    #[test]
    fn test_negative_delta_time_rejected() {
        let parser = TelemetryLogParser::default();
        let result = parser.parse_line("[t] -0.1,0,0,0,0,0,0,0,0,0");
        assert_eq!(result, Err(RejectReason::NegativeDeltaTime));
    }

    #[test]
    fn test_zero_delta_time_rejected() {
        let parser = TelemetryLogParser::default();
        let result = parser.parse_line("[t] 0.0,0,0,0,0,0,0,0,0,0");
        assert_eq!(result, Err(RejectReason::ZeroDeltaTime));
    }

    #[test]
    fn test_whitespace_around_fields_tolerated() {
        let parser = TelemetryLogParser::default();
        let record = parser
            .parse_line("[12:00:00]  0.25 , 90.0, 1 ,0, 0.1,0.2,0.3, -4.5 , 2.0 , 0.5 \r")
            .unwrap();
        assert_eq!(record.delta_time, 0.25);
        assert_eq!(record.angular_position, 90.0);
        assert!(record.right_solenoid);
        assert_eq!(record.gyro_z, 0.3);
        assert_eq!(record.pid_output, -4.5);
        assert_eq!(record.derivative, 0.5);
    }
}

#[cfg(test)]
mod sequence_tests {
    use super::*;

    fn sample_log() -> String {
        let mut lines = Vec::new();
        for i in 0..20 {
            lines.push(format!(
                "[00:00:{:02}] 0.{},{},{},{},0,0,0.5,{},{},0",
                i,
                (i % 3) + 1,
                i * 10,
                i % 2,
                (i + 1) % 2,
                i as f64 * 0.1,
                -(i as f64)
            ));
            if i % 4 == 0 {
                lines.push("[00:00:00] garbage".to_string());
                lines.push("[00:00:00] 1,2,3".to_string());
            }
        }
        lines.join("\n")
    }

    #[test]
    fn test_cumulative_time_is_prefix_sum_of_accepted() {
        let parser = TelemetryLogParser::default();
        let report = parser.parse(&sample_log());
        assert_eq!(report.accepted(), 20);

        let mut expected = 0.0;
        let mut previous = f64::NEG_INFINITY;
        for record in &report.records {
            expected += record.delta_time;
            assert!((record.cumulative_time - expected).abs() < 1e-12);
            assert!(record.cumulative_time > previous);
            previous = record.cumulative_time;
        }
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = TelemetryLogParser::default();
        let text = sample_log();
        assert_eq!(parser.parse(&text), parser.parse(&text));
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let parser = TelemetryLogParser::default();
        let report = parser.parse("header only\n\n");
        assert!(report.is_empty());
        assert_eq!(report.lines_read, 2);
    }
}

#[cfg(test)]
mod file_tests {
    use super::*;

    #[test]
    fn test_missing_file_is_distinct_error() {
        let parser = TelemetryLogParser::default();
        let dir = scratch_dir("missing");
        let result = parser.parse_file(&dir.join("does-not-exist.csv"));
        assert!(matches!(result, Err(LogFileError::NotFound(_))));
    }

    #[test]
    fn test_file_and_text_parse_agree() {
        let parser = TelemetryLogParser::default();
        let dir = scratch_dir("agree");
        let path = dir.join("test1.csv");
        let text = format!("Serial Log Started\n{}\n[x] ERROR 3\n{}\n", GOOD_LINE, GOOD_LINE);
        fs::write(&path, &text).unwrap();

        let from_file = parser.parse_file(&path).unwrap();
        assert_eq!(from_file, parser.parse(&text));
        assert_eq!(from_file.accepted(), 2);
        assert!((from_file.records[1].cumulative_time - 0.2).abs() < 1e-12);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_file_yields_empty_report() {
        let parser = TelemetryLogParser::default();
        let dir = scratch_dir("empty");
        let path = dir.join("test1.csv");
        fs::write(&path, "").unwrap();

        let report = parser.parse_file(&path).unwrap();
        assert!(report.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let parser = TelemetryLogParser::default();
        let dir = scratch_dir("utf8");
        let path = dir.join("test1.csv");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(GOOD_LINE.as_bytes());
        bytes.extend_from_slice(b"\n[t] \xff\xfe garbage\r\n");
        bytes.extend_from_slice(GOOD_LINE.as_bytes());
        bytes.push(b'\n');
        fs::write(&path, &bytes).unwrap();

        let report = parser.parse_file(&path).unwrap();
        assert_eq!(report.accepted(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line_number, 2);
        assert!((report.records[1].cumulative_time - 0.2).abs() < 1e-12);

        fs::remove_dir_all(&dir).unwrap();
    }
}
