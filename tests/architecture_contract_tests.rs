//! Architecture contract tests.

mod support;

use support::architecture::{code_lines_containing, non_export_lines_in_mod_files, path_exists};

#[test]
fn cli_has_no_direct_infrastructure_imports() {
    let hits = code_lines_containing("src/adapter/inbound/cli", &["crate::infrastructure"]);
    assert!(
        hits.is_empty(),
        "found direct infrastructure imports in inbound CLI adapters: {hits:#?}"
    );
}

#[test]
fn domain_has_no_framework_or_outer_layer_imports() {
    let hits = code_lines_containing(
        "src/domain",
        &[
            "crate::adapter",
            "crate::infrastructure",
            "crate::application",
            "crate::port",
            "tokio::",
            "reqwest::",
            "diesel::",
        ],
    );
    assert!(
        hits.is_empty(),
        "found forbidden imports in domain layer: {hits:#?}"
    );
}

#[test]
fn domain_reads_no_clock() {
    let hits = code_lines_containing("src/domain", &["Utc::now()", "SystemTime::now()"]);
    assert!(
        hits.is_empty(),
        "domain code must take the current instant as a parameter: {hits:#?}"
    );
}

#[test]
fn mod_rs_is_export_only() {
    let hits = non_export_lines_in_mod_files("src");
    assert!(
        hits.is_empty(),
        "found non-export content in mod.rs files: {hits:#?}"
    );
}

#[test]
fn application_layer_has_no_direct_adapter_imports() {
    let hits = code_lines_containing("src/application", &["crate::adapter::", "crate::infrastructure::"]);
    assert!(
        hits.is_empty(),
        "application layer should not import adapters directly: {hits:#?}"
    );
}

#[test]
fn ports_depend_only_on_domain() {
    let hits = code_lines_containing(
        "src/port",
        &["crate::application", "crate::adapter", "crate::infrastructure"],
    );
    assert!(
        hits.is_empty(),
        "ports should only reference domain types: {hits:#?}"
    );
}

#[test]
fn operator_ports_are_transport_agnostic() {
    let hits = code_lines_containing("src/port/inbound", &["std::path::Path", "PathBuf"]);
    assert!(
        hits.is_empty(),
        "inbound ports should not expose filesystem path types: {hits:#?}"
    );
}

#[test]
fn settlement_math_stays_off_floating_point() {
    let hits = code_lines_containing("src/domain/settlement.rs", &["f64", "f32"]);
    assert!(
        hits.is_empty(),
        "money-moving code must use integer arithmetic: {hits:#?}"
    );
}

#[test]
fn composition_root_lives_in_infrastructure() {
    assert!(path_exists("src/infrastructure/bootstrap.rs"));
    assert!(path_exists("src/infrastructure/operator/entry.rs"));
    assert!(
        !path_exists("src/adapter/inbound/cli/operator.rs"),
        "the CLI receives its operator from main, it does not build one"
    );
}
