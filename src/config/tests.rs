use super::{RunConfig, RunLimit, Scheme, Target, apply_config, load_config_file, validate_args};
use clap::{CommandFactory, FromArgMatches};
use std::time::Duration;
use tempfile::tempdir;

use crate::args::{HttpMethod, TesterArgs};
use crate::error::{AppError, ValidationError};

fn parse_args(argv: &[&str]) -> Result<(TesterArgs, clap::ArgMatches), String> {
    let matches = TesterArgs::command()
        .try_get_matches_from(argv)
        .map_err(|err| format!("parse args failed: {}", err))?;
    let args = TesterArgs::from_arg_matches(&matches)
        .map_err(|err| format!("parse args failed: {}", err))?;
    Ok((args, matches))
}

fn args_from(argv: &[&str]) -> Result<TesterArgs, String> {
    parse_args(argv).map(|(args, _)| args)
}

fn expect_validation(
    result: Result<RunLimit, AppError>,
    check: fn(&ValidationError) -> bool,
) -> Result<(), String> {
    match result {
        Err(AppError::Validation(err)) if check(&err) => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(limit) => Err(format!("Expected validation failure, got {:?}", limit)),
    }
}

#[test]
fn parse_toml_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("hitload.toml");
    let content = r#"
url = "http://localhost:3000"
concurrency = 12
requests = 40
keep_alive = true
read_timeout = 250
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.url.as_deref() != Some("http://localhost:3000") {
        return Err("Unexpected url".to_owned());
    }
    if config.clients != Some(12) || config.requests != Some(40) {
        return Err("Unexpected clients/requests".to_owned());
    }
    if config.keep_alive != Some(true) || config.read_timeout != Some(250) {
        return Err("Unexpected keep_alive/read_timeout".to_owned());
    }
    Ok(())
}

#[test]
fn parse_json_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("hitload.json");
    let content = r#"{
  "urls_file": "urls.txt",
  "duration": 15,
  "dump": true,
  "cipher": "TLS_AES_128_GCM_SHA256"
}"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.urls_file.as_deref() != Some("urls.txt") || config.duration != Some(15) {
        return Err("Unexpected urls_file/duration".to_owned());
    }
    if config.dump != Some(true) || config.cipher.is_none() {
        return Err("Unexpected dump/cipher".to_owned());
    }
    Ok(())
}

#[test]
fn config_rejects_unknown_keys_and_extensions() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let toml_path = dir.path().join("hitload.toml");
    std::fs::write(&toml_path, "rate = 10\n").map_err(|err| format!("write failed: {}", err))?;
    if load_config_file(&toml_path).is_ok() {
        return Err("Expected unknown key to be rejected".to_owned());
    }

    let yaml_path = dir.path().join("hitload.yaml");
    std::fs::write(&yaml_path, "url: x\n").map_err(|err| format!("write failed: {}", err))?;
    match load_config_file(&yaml_path) {
        Err(AppError::Config(_)) => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected unsupported extension".to_owned()),
    }
}

#[test]
fn cli_values_win_over_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("hitload.toml");
    let content = r#"
url = "http://from-file"
clients = 7
requests = 3
write_timeout = 900
track_max_latency = true
histogram_sigfig = 2
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;
    let config = load_config_file(&path).map_err(|err| err.to_string())?;

    let (mut args, matches) = parse_args(&["hitload", "-u", "http://from-cli", "-c", "2"])?;
    apply_config(&mut args, &matches, &config).map_err(|err| err.to_string())?;

    if args.url.as_deref() != Some("http://from-cli") {
        return Err("CLI url should win".to_owned());
    }
    if args.clients.get() != 2 {
        return Err(format!("CLI clients should win, got {}", args.clients.get()));
    }
    if args.requests.map(u64::from) != Some(3) {
        return Err("Expected requests from config".to_owned());
    }
    if args.write_timeout_ms.get() != 900 {
        return Err("Expected write timeout from config".to_owned());
    }
    if !args.track_max_latency || args.histogram_sigfig != 2 {
        return Err("Expected diagnostics from config".to_owned());
    }
    Ok(())
}

#[test]
fn config_rejects_zero_clients() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("hitload.toml");
    std::fs::write(&path, "clients = 0\n").map_err(|err| format!("write failed: {}", err))?;
    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    let (mut args, matches) = parse_args(&["hitload"])?;
    match apply_config(&mut args, &matches, &config) {
        Err(AppError::Config(_)) => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(()) => Err("Expected zero clients to be rejected".to_owned()),
    }
}

#[test]
fn validate_requires_target() -> Result<(), String> {
    let args = args_from(&["hitload", "-r", "5"])?;
    expect_validation(validate_args(&args), |err| {
        matches!(err, ValidationError::MissingTarget)
    })
}

#[test]
fn validate_rejects_url_with_urls_file() -> Result<(), String> {
    let args = args_from(&["hitload", "-u", "http://a", "-f", "urls.txt", "-r", "5"])?;
    expect_validation(validate_args(&args), |err| {
        matches!(err, ValidationError::UrlAndUrlsFile)
    })
}

#[test]
fn validate_rejects_urls_file_with_per_url_flags() -> Result<(), String> {
    for (flag, value) in [("--host", "example.com"), ("--auth", "Bearer x"), ("--resolve", "example.com")] {
        let args = args_from(&["hitload", "-f", "urls.txt", "-r", "5", flag, value])?;
        expect_validation(validate_args(&args), |err| {
            matches!(err, ValidationError::UrlsFileConflict { .. })
        })?;
    }
    Ok(())
}

#[test]
fn validate_requires_exactly_one_limit() -> Result<(), String> {
    let args = args_from(&["hitload", "-u", "http://a"])?;
    expect_validation(validate_args(&args), |err| {
        matches!(err, ValidationError::MissingLimit)
    })?;
    let args = args_from(&["hitload", "-u", "http://a", "-r", "1", "-t", "1"])?;
    expect_validation(validate_args(&args), |err| {
        matches!(err, ValidationError::RequestsAndDuration)
    })
}

#[test]
fn validate_requires_cert_and_key_together() -> Result<(), String> {
    let args = args_from(&["hitload", "-u", "https://a", "-r", "1", "-x", "cert.pem"])?;
    expect_validation(validate_args(&args), |err| {
        matches!(err, ValidationError::CertKeyPair)
    })
}

#[test]
fn validate_returns_limit() -> Result<(), String> {
    let args = args_from(&["hitload", "-u", "http://a", "-t", "3"])?;
    let limit = validate_args(&args).map_err(|err| err.to_string())?;
    if limit != RunLimit::Duration(Duration::from_secs(3)) || limit.requests_per_worker().is_some() {
        return Err(format!("Unexpected limit {:?}", limit));
    }
    Ok(())
}

#[test]
fn target_defaults_ports_by_scheme() -> Result<(), String> {
    let plain = Target::parse("http://example.com/path?q=1").map_err(|err| err.to_string())?;
    if plain.port() != 80 || plain.scheme() != Scheme::Http {
        return Err(format!("Unexpected http target {:?}", plain));
    }
    if plain.path_and_query() != "/path?q=1" || plain.authority() != "example.com" {
        return Err(format!("Unexpected request parts {:?}", plain));
    }

    let secure = Target::parse("https://example.com").map_err(|err| err.to_string())?;
    if secure.port() != 443 || secure.path_and_query() != "/" || secure.server_name().is_none() {
        return Err(format!("Unexpected https target {:?}", secure));
    }

    let explicit = Target::parse("http://127.0.0.1:8080/x").map_err(|err| err.to_string())?;
    if explicit.port() != 8080 || explicit.authority() != "127.0.0.1:8080" {
        return Err(format!("Unexpected explicit port target {:?}", explicit));
    }
    Ok(())
}

#[test]
fn target_strips_ipv6_brackets_for_dialing() -> Result<(), String> {
    let target = Target::parse("http://[::1]:9000/").map_err(|err| err.to_string())?;
    if target.host() != "::1" || target.authority() != "[::1]:9000" {
        return Err(format!("Unexpected ipv6 target {:?}", target));
    }
    Ok(())
}

#[test]
fn target_rejects_unsupported_scheme() -> Result<(), String> {
    match Target::parse("ftp://example.com/file") {
        Err(AppError::Validation(ValidationError::UnsupportedScheme { scheme, .. }))
            if scheme == "ftp" =>
        {
            Ok(())
        }
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(target) => Err(format!("Expected rejection, got {:?}", target)),
    }
}

#[test]
fn run_config_reads_url_file_and_body() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let urls = dir.path().join("urls.txt");
    std::fs::write(&urls, "http://a.test/one\n\n  http://b.test/two  \nhttp://c.test/\n")
        .map_err(|err| format!("write failed: {}", err))?;
    let body = dir.path().join("body.json");
    std::fs::write(&body, b"{\"k\":1}").map_err(|err| format!("write failed: {}", err))?;

    let urls_arg = urls.to_string_lossy().into_owned();
    let body_arg = body.to_string_lossy().into_owned();
    let args = args_from(&["hitload", "-f", &urls_arg, "-d", &body_arg, "-r", "9", "-c", "3"])?;
    let config = RunConfig::from_args(&args).map_err(|err| err.to_string())?;

    let hosts: Vec<&str> = config.targets.iter().map(Target::host).collect();
    if hosts != ["a.test", "b.test", "c.test"] {
        return Err(format!("Unexpected targets {:?}", hosts));
    }
    if config.method != HttpMethod::Post {
        return Err("Expected POST with a body file".to_owned());
    }
    if config.body.as_deref() != Some(b"{\"k\":1}".as_slice()) {
        return Err("Unexpected body".to_owned());
    }
    if config.limit != RunLimit::RequestsPerWorker(9) || config.clients != 3 {
        return Err("Unexpected limit/clients".to_owned());
    }
    Ok(())
}

#[test]
fn run_config_rejects_empty_url_file() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let urls = dir.path().join("urls.txt");
    std::fs::write(&urls, "\n  \n").map_err(|err| format!("write failed: {}", err))?;
    let urls_arg = urls.to_string_lossy().into_owned();
    let args = args_from(&["hitload", "-f", &urls_arg, "-r", "1"])?;
    match RunConfig::from_args(&args) {
        Err(AppError::Http(_)) => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected empty URL file to be rejected".to_owned()),
    }
}

#[test]
fn run_config_rejects_unknown_cipher() -> Result<(), String> {
    let args = args_from(&["hitload", "-u", "https://a.test", "-r", "1", "--cipher", "NOPE"])?;
    match RunConfig::from_args(&args) {
        Err(AppError::Validation(ValidationError::UnknownCipherSuite { name })) if name == "NOPE" => {
            Ok(())
        }
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected unknown cipher to be rejected".to_owned()),
    }
}

#[test]
fn run_config_prefers_resolve_for_server_name() -> Result<(), String> {
    let args = args_from(&[
        "hitload",
        "-u",
        "https://10.0.0.5:8443/",
        "-r",
        "1",
        "--resolve",
        "api.example.com",
        "--cipher",
        "TLS_AES_128_GCM_SHA256",
        "--host",
        "api.example.com",
    ])?;
    let config = RunConfig::from_args(&args).map_err(|err| err.to_string())?;
    let target = config
        .targets
        .first()
        .ok_or_else(|| "Missing target".to_owned())?;
    let name = target
        .verification_name(config.server_name_override.as_ref())
        .ok_or_else(|| "Missing server name".to_owned())?;
    if name.to_str() != "api.example.com" {
        return Err(format!("Unexpected server name {:?}", name));
    }
    if target.dial_addr() != "10.0.0.5:8443" {
        return Err(format!("Unexpected dial address {}", target.dial_addr()));
    }
    if config.host_header.as_ref().map(http::HeaderValue::as_bytes) != Some(b"api.example.com".as_slice()) {
        return Err("Unexpected host header".to_owned());
    }
    Ok(())
}

#[test]
fn run_config_rejects_bad_header_values() -> Result<(), String> {
    let args = args_from(&["hitload", "-u", "http://a.test", "-r", "1", "--auth", "bad\nvalue"])?;
    match RunConfig::from_args(&args) {
        Err(AppError::Validation(ValidationError::InvalidHeaderValue { header, .. }))
            if header == "Authorization" =>
        {
            Ok(())
        }
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected invalid header to be rejected".to_owned()),
    }
}
