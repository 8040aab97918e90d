mod support;

use std::fs;

use tempfile::tempdir;

use support::{
    OK_RESPONSE, UNAVAILABLE_RESPONSE, closed_port_url, describe, run_hitload,
    spawn_http_server_or_skip, total_for,
};

#[test]
fn e2e_request_count_run_reports_totals() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip(OK_RESPONSE)? else {
        return Ok(());
    };

    let output = run_hitload(["-u", url.as_str(), "-c", "2", "-r", "3"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Dispatching 2 clients") {
        return Err(format!("missing dispatch line:\n{}", stdout));
    }
    if total_for(&stdout, "Requests:")? != 6 {
        return Err(describe(&output));
    }
    if total_for(&stdout, "Successful requests:")? != 6 {
        return Err(describe(&output));
    }
    if total_for(&stdout, "Network failed:")? != 0 {
        return Err(describe(&output));
    }
    if total_for(&stdout, "Read throughput:")? == 0 {
        return Err("Expected non-zero read throughput.".to_owned());
    }
    if !stdout.contains("Stdev") || !stdout.contains("Latency") {
        return Err(format!("missing latency table:\n{}", stdout));
    }
    Ok(())
}

#[test]
fn e2e_non_2xx_counts_as_bad_request() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip(UNAVAILABLE_RESPONSE)? else {
        return Ok(());
    };

    let output = run_hitload(["-u", url.as_str(), "-c", "1", "-r", "2"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if total_for(&stdout, "Bad requests failed (!2xx):")? != 2 {
        return Err(describe(&output));
    }
    if total_for(&stdout, "Successful requests:")? != 0 {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_refused_connection_counts_as_network_failure() -> Result<(), String> {
    let url = closed_port_url()?;

    let output = run_hitload(["-u", url.as_str(), "-c", "1", "-r", "1", "--quiet-errors"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if total_for(&stdout, "Requests:")? != 1 {
        return Err(describe(&output));
    }
    if total_for(&stdout, "Network failed:")? != 1 {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_urls_file_round_robins_targets() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip(OK_RESPONSE)? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let urls_path = dir.path().join("urls.txt");
    fs::write(&urls_path, format!("{url}/first\n{url}/second\n", url = url))
        .map_err(|err| format!("write urls file failed: {}", err))?;

    let output = run_hitload([
        "-f".to_owned(),
        urls_path.to_string_lossy().into_owned(),
        "-c".to_owned(),
        "1".to_owned(),
        "-r".to_owned(),
        "3".to_owned(),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    // Budget is checked once per pass over the list, so 3 rounds up to 4.
    if total_for(&stdout, "Requests:")? != 4 {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_config_toml_supplies_run_settings() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip(OK_RESPONSE)? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config_path = dir.path().join("hitload.toml");
    let config = format!(
        r#"url = "{url}"
clients = 2
requests = 2
read_timeout = 2000
"#,
        url = url
    );
    fs::write(&config_path, config).map_err(|err| format!("write config failed: {}", err))?;

    let output = run_hitload([
        "--config".to_owned(),
        config_path.to_string_lossy().into_owned(),
        "-c".to_owned(),
        "1".to_owned(),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    // The CLI client count wins over the file.
    if total_for(&stdout, "Requests:")? != 2 {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_conflicting_limits_exit_with_usage() -> Result<(), String> {
    let output = run_hitload(["-u", "http://127.0.0.1:1/", "-r", "1", "-t", "1"])?;
    if output.status.code() != Some(1) {
        return Err(describe(&output));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.contains("Error:") || !stderr.contains("Usage:") {
        return Err(describe(&output));
    }
    if !output.stdout.is_empty() {
        return Err("Expected no report on a configuration error.".to_owned());
    }
    Ok(())
}

#[test]
fn e2e_missing_limit_exits_with_error() -> Result<(), String> {
    let output = run_hitload(["-u", "http://127.0.0.1:1/"])?;
    if output.status.code() != Some(1) {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_unknown_cipher_lists_valid_suites() -> Result<(), String> {
    let output = run_hitload([
        "-u",
        "https://127.0.0.1:1/",
        "-r",
        "1",
        "--cipher",
        "NOT_A_SUITE",
    ])?;
    if output.status.code() != Some(1) {
        return Err(describe(&output));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.contains("Valid suites:") || !stderr.contains("TLS_AES_128_GCM_SHA256") {
        return Err(describe(&output));
    }
    Ok(())
}
