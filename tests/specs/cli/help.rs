//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    Dumps::empty()
        .walscan()
        .args(&["--help"])
        .passes()
        .stdout_has("tail")
        .stdout_has("compare");
}

#[test]
fn tail_help_lists_flags() {
    Dumps::empty()
        .walscan()
        .args(&["tail", "--help"])
        .passes()
        .stdout_has("--pchannel")
        .stdout_has("--show-system")
        .stdout_has("--limit");
}
