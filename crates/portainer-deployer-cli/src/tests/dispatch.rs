// crates/portainer-deployer-cli/src/tests/dispatch.rs
// ============================================================================
// Module: Dispatcher Tests
// Description: Validation order and command routing without a network.
// Purpose: Ensure invalid input never reaches the API or the stack file.
// Dependencies: portainer-deployer-cli
// ============================================================================

//! ## Overview
//! Drives [`crate::dispatch::dispatch`] with a recording fake connector.

use std::fs;

use clap::Parser;
use clap::error::ErrorKind;
use portainer_deployer_config::ConfigLocator;
use portainer_deployer_config::ConfigStore;
use portainer_deployer_core::KeyPath;
use portainer_deployer_core::get_path;
use portainer_deployer_core::load_document;
use serde_yaml::Value;

use super::support::Call;
use super::support::FakeConnector;
use super::support::STACK_YAML;
use super::support::Workspace;
use super::support::run;
use crate::api_client::StackSelector;
use crate::cli::Cli;
use crate::cli::Command;
use crate::cli::ConfigArgs;
use crate::cli::DeployArgs;
use crate::cli::GetArgs;
use crate::dispatch::stack_selector;

/// Builds `deploy --path <path> --endpoint <endpoint>` with overrides.
fn deploy_file(path: &std::path::Path, endpoint: u64, update_keys: &[&str]) -> Command {
    Command::Deploy(DeployArgs {
        path: Some(path.to_path_buf()),
        endpoint,
        update_keys: update_keys.iter().map(|token| (*token).to_string()).collect(),
        ..DeployArgs::default()
    })
}

// ============================================================================
// SECTION: Get
// ============================================================================

#[test]
fn all_flag_overrides_id_and_name() {
    let args = GetArgs {
        id: Some(3),
        name: Some("web".into()),
        all: true,
    };
    assert_eq!(stack_selector(&args), StackSelector::All);
}

#[test]
fn selector_defaults_to_all() {
    assert_eq!(stack_selector(&GetArgs::default()), StackSelector::All);
    assert_eq!(
        stack_selector(&GetArgs {
            id: Some(4),
            ..GetArgs::default()
        }),
        StackSelector::ById(4)
    );
    assert_eq!(
        stack_selector(&GetArgs {
            name: Some("web".into()),
            ..GetArgs::default()
        }),
        StackSelector::ByName("web".into())
    );
}

#[test]
fn id_and_name_are_rejected_at_parse_time() {
    let err = Cli::try_parse_from(["portainer-deployer", "get", "--id", "1", "--name", "web"])
        .expect_err("conflicting selectors must not parse");

    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn parsed_all_with_name_fetches_every_stack() {
    let cli = Cli::try_parse_from(["portainer-deployer", "get", "--all", "--name", "web"])
        .expect("parse get");
    let Some(command) = cli.command else {
        panic!("expected a subcommand");
    };
    let workspace = Workspace::configured();
    let connector = FakeConnector::default();

    let outcome = run(command, &workspace.context(None), &connector);

    assert!(outcome.envelope.status, "{:?}", outcome.envelope);
    assert_eq!(connector.calls(), vec![Call::Get(StackSelector::All)]);
}

#[test]
fn get_connects_with_configured_profile() {
    let workspace = Workspace::configured();
    let connector = FakeConnector::default();

    let outcome = run(
        Command::Get(GetArgs {
            name: Some("web".into()),
            ..GetArgs::default()
        }),
        &workspace.context(None),
        &connector,
    );

    assert!(outcome.envelope.status, "{:?}", outcome.envelope);
    assert_eq!(connector.calls(), vec![Call::Get(StackSelector::ByName("web".into()))]);
    let profiles = connector.profiles.borrow();
    assert_eq!(profiles[0].connection_base(), "http://127.0.0.1:9000");
    assert_eq!(profiles[0].api_token(), "ptr_secret");
}

#[test]
fn get_without_configuration_fails_before_connecting() {
    let workspace = Workspace::unconfigured();
    let connector = FakeConnector::default();

    let outcome = run(Command::Get(GetArgs::default()), &workspace.context(None), &connector);

    assert!(!outcome.envelope.status);
    assert_eq!(outcome.envelope.message, "Configuration error");
    assert_eq!(connector.connects.get(), 0);
}

// ============================================================================
// SECTION: Deploy
// ============================================================================

#[test]
fn deploy_patches_file_before_upload() {
    let workspace = Workspace::configured();
    let stack = workspace.write("stack.yml", STACK_YAML);
    let connector = FakeConnector::default();

    let outcome = run(
        deploy_file(&stack, 2, &["services.web.image=nginx:1.25"]),
        &workspace.context(None),
        &connector,
    );

    assert!(outcome.envelope.status, "{:?}", outcome.envelope);
    let calls = connector.calls();
    assert_eq!(calls.len(), 1);
    let Call::PostFile {
        path,
        endpoint_id,
        name,
        content_at_call,
    } = &calls[0]
    else {
        panic!("unexpected call: {calls:?}");
    };
    assert_eq!(path, &stack);
    assert_eq!(*endpoint_id, 2);
    assert_eq!(name, &None);
    assert!(content_at_call.contains("nginx:1.25"), "file at call time: {content_at_call}");
}

#[test]
fn deploy_applies_every_override_in_order() {
    let workspace = Workspace::configured();
    let stack = workspace.write("stack.yml", STACK_YAML);
    let connector = FakeConnector::default();

    let outcome = run(
        deploy_file(
            &stack,
            1,
            &["services.web.image=nginx:1.25", "services.web.ports=[80:80, 443:443]"],
        ),
        &workspace.context(None),
        &connector,
    );

    assert!(outcome.envelope.status);
    let document = load_document(&stack).unwrap();
    let ports = get_path(&document, &KeyPath::parse("services.web.ports").unwrap()).unwrap();
    assert_eq!(
        ports,
        &Value::Sequence(vec![Value::String("80:80".into()), Value::String("443:443".into())])
    );
}

#[test]
fn invalid_override_aborts_before_any_patch() {
    let workspace = Workspace::configured();
    let stack = workspace.write("stack.yml", STACK_YAML);
    let connector = FakeConnector::default();

    let outcome = run(
        deploy_file(&stack, 2, &["services.web.image=nginx:1.25", "a.b=[1,2"]),
        &workspace.context(None),
        &connector,
    );

    assert!(!outcome.envelope.status);
    assert_eq!(
        outcome.envelope.message,
        "Invalid key=value pair in --update-keys argument: a.b=[1,2"
    );
    assert_eq!(fs::read_to_string(&stack).unwrap(), STACK_YAML);
    assert_eq!(connector.connects.get(), 0);
}

#[test]
fn conflicting_override_aborts_without_api_call() {
    let workspace = Workspace::configured();
    let stack = workspace.write("stack.yml", STACK_YAML);
    let connector = FakeConnector::default();

    let outcome = run(
        deploy_file(&stack, 2, &["services.web.image.tag=1"]),
        &workspace.context(None),
        &connector,
    );

    assert!(!outcome.envelope.status);
    assert_eq!(outcome.envelope.message, "Failed to update stack file");
    assert!(outcome.envelope.details.contains("services.web.image"));
    assert!(connector.calls().is_empty());
    assert_eq!(fs::read_to_string(&stack).unwrap(), STACK_YAML);
}

#[test]
fn missing_configuration_leaves_stack_file_untouched() {
    let workspace = Workspace::unconfigured();
    let stack = workspace.write("stack.yml", STACK_YAML);
    let connector = FakeConnector::default();

    let outcome = run(
        deploy_file(&stack, 2, &["services.web.image=nginx:1.25"]),
        &workspace.context(None),
        &connector,
    );

    assert!(!outcome.envelope.status);
    assert_eq!(fs::read_to_string(&stack).unwrap(), STACK_YAML);
    assert_eq!(connector.connects.get(), 0);
}

#[test]
fn update_keys_with_inline_stack_is_rejected() {
    let workspace = Workspace::configured();
    let connector = FakeConnector::default();

    let outcome = run(
        Command::Deploy(DeployArgs {
            stack: Some(STACK_YAML.into()),
            update_keys: vec!["a=1".into()],
            endpoint: 1,
            ..DeployArgs::default()
        }),
        &workspace.context(None),
        &connector,
    );

    assert!(!outcome.envelope.status);
    assert_eq!(outcome.envelope.message, "Invalid use of --update-keys");
    assert!(outcome.envelope.details.contains("--path"));
    assert_eq!(connector.connects.get(), 0);
}

#[test]
fn missing_stack_source_is_reported() {
    let workspace = Workspace::configured();
    let connector = FakeConnector::default();

    let outcome = run(
        Command::Deploy(DeployArgs {
            endpoint: 1,
            ..DeployArgs::default()
        }),
        &workspace.context(None),
        &connector,
    );

    assert!(!outcome.envelope.status);
    assert_eq!(outcome.envelope.message, "No stack argument specified");
    assert_ne!(outcome.envelope.details, outcome.envelope.message);
    assert_eq!(connector.connects.get(), 0);
}

#[test]
fn inline_stack_wins_over_path_with_warning() {
    let workspace = Workspace::configured();
    let stack = workspace.write("stack.yml", STACK_YAML);
    let connector = FakeConnector::default();

    let outcome = run(
        Command::Deploy(DeployArgs {
            stack: Some("services: {}\n".into()),
            path: Some(stack),
            name: Some("inline".into()),
            endpoint: 5,
            ..DeployArgs::default()
        }),
        &workspace.context(None),
        &connector,
    );

    assert!(outcome.envelope.status);
    assert!(outcome.err.starts_with("Warning:"), "stderr: {}", outcome.err);
    assert_eq!(
        connector.calls(),
        vec![Call::PostString {
            content: "services: {}\n".into(),
            endpoint_id: 5,
            name: Some("inline".into()),
        }]
    );
}

#[test]
fn piped_stack_is_used_when_no_positional() {
    let workspace = Workspace::configured();
    let connector = FakeConnector::default();

    let outcome = run(
        Command::Deploy(DeployArgs {
            endpoint: 3,
            ..DeployArgs::default()
        }),
        &workspace.context(Some(STACK_YAML)),
        &connector,
    );

    assert!(outcome.envelope.status);
    assert!(outcome.err.is_empty());
    assert!(matches!(
        connector.calls().as_slice(),
        [Call::PostString { endpoint_id: 3, .. }]
    ));
}

#[test]
fn blank_inline_content_falls_back_to_path() {
    let workspace = Workspace::configured();
    let stack = workspace.write("stack.yml", STACK_YAML);
    let connector = FakeConnector::default();

    let outcome = run(
        Command::Deploy(DeployArgs {
            stack: Some("  \n".into()),
            path: Some(stack),
            endpoint: 1,
            ..DeployArgs::default()
        }),
        &workspace.context(None),
        &connector,
    );

    assert!(outcome.envelope.status);
    assert!(outcome.err.is_empty());
    assert!(matches!(connector.calls().as_slice(), [Call::PostFile { .. }]));
}

// ============================================================================
// SECTION: Config
// ============================================================================

#[test]
fn config_set_then_get_round_trips() {
    let workspace = Workspace::configured();
    let connector = FakeConnector::default();

    let set = run(
        Command::Config(ConfigArgs {
            set: vec!["portainer.port=9443".into(), "extra.note=a=b".into()],
            ..ConfigArgs::default()
        }),
        &workspace.context(None),
        &connector,
    );
    assert!(set.envelope.status, "{:?}", set.envelope);
    assert_eq!(set.envelope.message, "Config operation set completed successfully");
    assert!(set.out.starts_with("Config updated for:"));

    let get = run(
        Command::Config(ConfigArgs {
            get: Some("portainer.port".into()),
            ..ConfigArgs::default()
        }),
        &workspace.context(None),
        &connector,
    );
    assert!(get.envelope.status);
    assert_eq!(get.out, "9443\n");

    let store = ConfigStore::new(&workspace.settings_path);
    assert_eq!(store.get("EXTRA", "note").unwrap(), "a=b");
    assert_eq!(connector.connects.get(), 0);
}

#[test]
fn config_set_validates_every_pair_before_writing() {
    let workspace = Workspace::configured();
    let before = fs::read_to_string(&workspace.settings_path).unwrap();

    let outcome = run(
        Command::Config(ConfigArgs {
            set: vec!["portainer.port=1".into(), "broken".into()],
            ..ConfigArgs::default()
        }),
        &workspace.context(None),
        &FakeConnector::default(),
    );

    assert!(!outcome.envelope.status);
    assert_eq!(outcome.envelope.message, "Invalid config pair: broken");
    assert_eq!(fs::read_to_string(&workspace.settings_path).unwrap(), before);
}

#[test]
fn config_get_reports_missing_key() {
    let workspace = Workspace::configured();

    let outcome = run(
        Command::Config(ConfigArgs {
            get: Some("portainer.username".into()),
            ..ConfigArgs::default()
        }),
        &workspace.context(None),
        &FakeConnector::default(),
    );

    assert!(!outcome.envelope.status);
    assert!(outcome.envelope.details.contains("username"), "{:?}", outcome.envelope);
}

#[test]
fn config_get_rejects_malformed_reference() {
    let workspace = Workspace::configured();

    let outcome = run(
        Command::Config(ConfigArgs {
            get: Some("portainer".into()),
            ..ConfigArgs::default()
        }),
        &workspace.context(None),
        &FakeConnector::default(),
    );

    assert_eq!(outcome.envelope.message, "Invalid config pair: portainer");
}

#[test]
fn config_path_updates_locator() {
    let workspace = Workspace::unconfigured();
    let settings = workspace.write("other.toml", "[PORTAINER]\n");

    let outcome = run(
        Command::Config(ConfigArgs {
            config_path: Some(settings.clone()),
            ..ConfigArgs::default()
        }),
        &workspace.context(None),
        &FakeConnector::default(),
    );

    assert!(outcome.envelope.status);
    assert!(outcome.out.starts_with("Config path updated to:"));
    assert_eq!(ConfigLocator::at(&workspace.locator_path).settings_path().unwrap(), settings);
}

#[test]
fn config_path_requires_existing_file() {
    let workspace = Workspace::unconfigured();

    let outcome = run(
        Command::Config(ConfigArgs {
            config_path: Some(workspace.dir.path().join("missing.toml")),
            ..ConfigArgs::default()
        }),
        &workspace.context(None),
        &FakeConnector::default(),
    );

    assert!(!outcome.envelope.status);
    assert!(!workspace.locator_path.exists());
}

#[test]
fn config_without_action_is_reported() {
    let workspace = Workspace::configured();

    let outcome = run(
        Command::Config(ConfigArgs::default()),
        &workspace.context(None),
        &FakeConnector::default(),
    );

    assert!(!outcome.envelope.status);
    assert_eq!(outcome.envelope.message, "No config action specified");
}
