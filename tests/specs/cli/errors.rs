//! CLI error specs
//!
//! Verify operator mistakes fail with actionable messages.

use crate::prelude::*;

#[test]
fn unknown_backend_is_rejected() {
    let temp = Dumps::empty();

    temp.walscan()
        .args(&["tail", "--pchannel", "dml_0", "--backend", "rocksmq"])
        .fails()
        .stderr_has("unsupported backend 'rocksmq'")
        .stderr_has("rocksmq is not supported yet")
        .stderr_has("available backends: file, memory");
}

#[test]
fn file_backend_without_data_dir_is_rejected() {
    let temp = Dumps::empty();

    temp.walscan()
        .args(&["tail", "--pchannel", "dml_0"])
        .fails()
        .stderr_has("requires a data directory")
        .stderr_has("--data-dir");
}

#[test]
fn compare_needs_two_channels() {
    let temp = Dumps::empty();

    temp.walscan()
        .args(&["compare", "--pchannels", "only", "--data-dir", &temp.data_dir()])
        .fails()
        .stderr_has("at least 2 pchannels are required for comparison");
}

#[test]
fn missing_config_file_is_rejected() {
    let temp = Dumps::empty();

    temp.walscan()
        .args(&["--config", "nope.toml", "tail", "--pchannel", "dml_0"])
        .fails()
        .stderr_has("failed to read config");
}

#[test]
fn malformed_config_file_is_rejected() {
    let temp = Dumps::empty();
    temp.file("bad.toml", "read_ahead_buffer_size = \"lots\"\n");

    temp.walscan()
        .args(&["--config", "bad.toml", "tail", "--pchannel", "dml_0"])
        .fails()
        .stderr_has("failed to parse config");
}

#[test]
fn unknown_deliver_policy_is_rejected() {
    let temp = Dumps::empty();

    temp.walscan()
        .args(&["tail", "--pchannel", "dml_0", "--from", "yesterday"])
        .fails()
        .stderr_has("unknown deliver policy");
}
