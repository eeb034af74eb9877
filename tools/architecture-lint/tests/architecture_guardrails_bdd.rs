//! Behaviour tests for the client architecture guardrails.

use std::cell::RefCell;
use std::fs;

use architecture_lint::{ArchitectureLintError, LintSource, Violation};
use camino::{Utf8Path, Utf8PathBuf};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

#[derive(Default)]
struct LintWorld {
    sources: RefCell<Vec<LintSource>>,
    result: RefCell<Option<Result<(), ArchitectureLintError>>>,
}

impl LintWorld {
    fn add_source(&self, file: &str, contents: &str) {
        self.sources.borrow_mut().push(LintSource {
            file: Utf8PathBuf::from(file),
            contents: contents.to_owned(),
        });
    }

    fn add_valid_modules(&self) {
        self.add_source(
            "domain/ports/token_store.rs",
            "pub trait TokenStore { fn get(&self, key: &str) -> Option<String>; }",
        );
        self.add_source(
            "domain/api_client.rs",
            "use crate::domain::ports::TokenStore; use envelope::Envelope; \
             pub struct ApiClient; impl ApiClient { pub fn bearer(&self, s: &dyn TokenStore) -> Option<String> { s.get(\"token\") } }",
        );
        self.add_source(
            "inbound/cli/mod.rs",
            "use crate::domain::api_client::ApiClient; use clap::Parser; use cap_std::fs::Dir; fn run(_: &ApiClient) {}",
        );
        self.add_source(
            "outbound/http/reqwest_transport.rs",
            "use crate::domain::ports::TokenStore; use reqwest::Client; pub struct ReqwestTransport { client: Client }",
        );
    }

    fn violations(&self) -> Vec<Violation> {
        let result = self.result.borrow();
        match result.as_ref().expect("lint must have run") {
            Ok(()) => panic!("expected violations, lint succeeded"),
            Err(ArchitectureLintError::Violations(violations)) => violations.clone(),
            Err(other) => panic!("expected violations error, got: {other:?}"),
        }
    }

    fn assert_violation(&self, file: &str, fragment: &str) {
        let violations = self.violations();
        assert!(
            violations
                .iter()
                .any(|violation| violation.file == file && violation.message.contains(fragment)),
            "expected violation in '{file}' containing '{fragment}', got: {violations:?}"
        );
    }
}

#[fixture]
fn world() -> LintWorld {
    LintWorld::default()
}

#[given("valid domain, inbound, and outbound modules")]
fn valid_modules(world: &LintWorld) {
    world.add_valid_modules();
}

#[given("an inbound module that imports the outbound layer")]
fn inbound_imports_outbound(world: &LintWorld) {
    world.add_source(
        "inbound/cli/mod.rs",
        "use erp_client::outbound::http::ReqwestTransport; fn run() { let _ = ReqwestTransport::new; }",
    );
}

#[given("an outbound module that imports the inbound layer")]
fn outbound_imports_inbound(world: &LintWorld) {
    world.add_source(
        "outbound/storage/file_token_store.rs",
        "use crate::inbound::cli::CliError; fn save() -> Result<(), CliError> { Ok(()) }",
    );
}

#[given("a domain module that imports reqwest")]
fn domain_imports_reqwest(world: &LintWorld) {
    world.add_source(
        "domain/api_client.rs",
        "use reqwest::StatusCode; fn classify(status: StatusCode) -> bool { status.is_success() }",
    );
}

#[given("valid modules mixed with multiple boundary violations")]
fn valid_modules_with_multiple_violations(world: &LintWorld) {
    world.add_valid_modules();
    world.add_source(
        "inbound/cli/session_handler.rs",
        "use crate::outbound::storage::FileTokenStore; fn clear(_: &FileTokenStore) {}",
    );
    world.add_source(
        "domain/session_keys.rs",
        "use crate::config::ClientSettings; fn keys(_: &ClientSettings) {}",
    );
}

#[when("the architecture lint runs")]
fn run_architecture_lint(world: &LintWorld) {
    let temp_dir = TempDir::new().expect("tempdir");
    let client_dir = Utf8Path::from_path(temp_dir.path())
        .expect("utf-8 temp path")
        .join("client");
    let src_dir = client_dir.join("src");
    for source in world.sources.borrow().iter() {
        let path = src_dir.join(&source.file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, &source.contents).expect("write source file");
    }

    let result = architecture_lint::lint_client_sources(&client_dir);
    *world.result.borrow_mut() = Some(result);
}

#[then("the lint succeeds")]
fn lint_succeeds(world: &LintWorld) {
    let result = world.result.borrow();
    let outcome = result.as_ref().expect("lint must have run");
    assert!(outcome.is_ok(), "expected success, got: {outcome:?}");
}

#[then("the lint fails")]
fn lint_fails(world: &LintWorld) {
    let result = world.result.borrow();
    let outcome = result.as_ref().expect("lint must have run");
    assert!(outcome.is_err(), "expected failure, got: {outcome:?}");
}

#[then("the lint fails due to outbound access from inbound")]
fn lint_fails_due_to_outbound_access(world: &LintWorld) {
    world.assert_violation("inbound/cli/mod.rs", "crate::outbound");
}

#[then("the lint fails due to inbound access from outbound")]
fn lint_fails_due_to_inbound_access(world: &LintWorld) {
    world.assert_violation("outbound/storage/file_token_store.rs", "crate::inbound");
}

#[then("the lint fails due to HTTP crate usage in the domain")]
fn lint_fails_due_to_http_crate(world: &LintWorld) {
    world.assert_violation("domain/api_client.rs", "external crate `reqwest`");
}

#[then("all boundary violations are reported")]
fn all_boundary_violations_are_reported(world: &LintWorld) {
    assert_eq!(world.violations().len(), 2);
    world.assert_violation("inbound/cli/session_handler.rs", "crate::outbound");
    world.assert_violation("domain/session_keys.rs", "crate::config");
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Well-layered modules pass"
)]
fn well_layered_modules_pass(world: LintWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "The CLI may not construct the HTTP transport"
)]
fn cli_may_not_construct_transport(world: LintWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Storage adapters may not depend on the CLI"
)]
fn storage_may_not_depend_on_cli(world: LintWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "The domain stays independent of reqwest"
)]
fn domain_stays_independent_of_reqwest(world: LintWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Every violation is reported in one run"
)]
fn every_violation_is_reported(world: LintWorld) {
    drop(world);
}
