use std::io::Write;

use relay_server::config::CliArgs;

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["relay-server"];
    argv.extend_from_slice(extra);
    <CliArgs as clap::Parser>::parse_from(argv)
}

#[test]
fn defaults_apply_when_nothing_is_given() {
    let resolved = args(&[]).resolve();
    assert_eq!(resolved.host, relay_proto::DEFAULT_HOST);
    assert_eq!(resolved.port, relay_proto::DEFAULT_PORT);
    assert_eq!(resolved.room, relay_proto::DEFAULT_ROOM);
    assert_eq!(resolved.ocr_timeout_secs, relay_proto::DEFAULT_OCR_TIMEOUT_SECS);
}

#[test]
fn cli_flags_override_defaults() {
    let resolved = args(&["--port", "9999", "--room", "custom"]).resolve();
    assert_eq!(resolved.port, 9999);
    assert_eq!(resolved.room, "custom");
}

#[test]
fn config_file_overrides_defaults_but_not_cli() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"server":{{"host":"10.0.0.5","port":7000,"room":"from-file"}}}}"#).unwrap();

    let resolved = args(&["--config", file.path().to_str().unwrap(), "--port", "8080"]).resolve();
    assert_eq!(resolved.host, "10.0.0.5");
    assert_eq!(resolved.room, "from-file");
    assert_eq!(resolved.port, 8080, "CLI flag must win over the config file");
}

#[test]
fn unreadable_config_file_falls_back_to_defaults_without_failing() {
    let resolved = args(&["--config", "/nonexistent/path/config.json"]).resolve();
    assert_eq!(resolved.host, relay_proto::DEFAULT_HOST);
    assert_eq!(resolved.port, relay_proto::DEFAULT_PORT);
}

#[test]
fn ocr_timeout_zero_is_preserved_as_disable_sentinel() {
    let resolved = args(&["--ocr-timeout-secs", "0"]).resolve();
    assert_eq!(resolved.ocr_timeout_secs, 0);
}

#[test]
fn log_level_defaults_then_config_file_then_cli_flag() {
    let resolved = args(&[]).resolve();
    assert_eq!(resolved.log_level, "info");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"logging":{{"level":"debug"}}}}"#).unwrap();
    let resolved = args(&["--config", file.path().to_str().unwrap()]).resolve();
    assert_eq!(resolved.log_level, "debug", "top-level logging.level from the config file must apply");

    let resolved =
        args(&["--config", file.path().to_str().unwrap(), "--log-level", "trace"]).resolve();
    assert_eq!(resolved.log_level, "trace", "--log-level must win over the config file");
}
