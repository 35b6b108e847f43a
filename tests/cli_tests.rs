use applogs::cli::pack::pack;
use applogs::cli::run::{self, load_settings, DumpArgs, Overrides, RunError};
use applogs::DumpOutcome;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper: pack one container directory into <root>/<owner>/logs/<app>/<node>
fn pack_container(root: &Path, owner: &str, app: &str, node: &str, container: &str) {
    let work = root.join(format!("work-{}", container));
    fs::create_dir_all(&work).unwrap();
    fs::write(work.join("stdout"), format!("{} says hi\n", container)).unwrap();
    fs::write(work.join("syslog"), "booted\n").unwrap();

    let app_dir = root.join(owner).join("logs").join(app);
    fs::create_dir_all(&app_dir).unwrap();

    let mut out = Vec::new();
    pack(
        &app_dir.join(node),
        &[format!("{}={}", container, work.display())],
        &mut out,
    )
    .unwrap();
}

fn overrides(root: &Path) -> Overrides {
    Overrides {
        config_path: Some(root.join("config.yml")),
        log_root: None,
        suffix: None,
    }
}

fn write_config(root: &Path) {
    fs::write(
        root.join("config.yml"),
        format!(
            "remote_app_log_dir: {}\nremote_app_log_dir_suffix: logs\n",
            root.display()
        ),
    )
    .unwrap();
}

#[test]
fn test_pack_then_dump_with_owner_guess() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());
    pack_container(temp_dir.path(), "bob", "app_7", "host1_8041", "container_7_1");

    // The guessed owner is wrong; the resolver finds bob's directory
    let log_types = vec!["stdout".to_string()];
    let args = DumpArgs {
        app_id: "app_7",
        container_id: "container_7_1",
        node_id: Some("host1:8041"),
        log_types: &log_types,
        owner: Some("alice"),
    };
    let mut out = Vec::new();
    let mut err = Vec::new();
    let config = load_settings(&overrides(temp_dir.path())).unwrap();
    let outcome = run::dump(config, &args, &mut out, &mut err).unwrap();

    assert_eq!(outcome, DumpOutcome::Found);
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("LogType:stdout"));
    assert!(out.contains("container_7_1 says hi"));
    assert!(!out.contains("booted"));
}

#[test]
fn test_owner_command() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());
    pack_container(temp_dir.path(), "bob", "app_7", "host1_8041", "container_7_1");

    let mut out = Vec::new();
    let mut err = Vec::new();
    let config = load_settings(&overrides(temp_dir.path())).unwrap();
    let outcome = run::owner(config, "app_7", Some("alice"), &mut out, &mut err).unwrap();
    assert_eq!(outcome, DumpOutcome::Found);
    assert_eq!(String::from_utf8(out).unwrap(), "bob\n");

    let mut out = Vec::new();
    let mut err = Vec::new();
    let config = load_settings(&overrides(temp_dir.path())).unwrap();
    let outcome = run::owner(config, "app_8", Some("alice"), &mut out, &mut err).unwrap();
    assert_eq!(outcome, DumpOutcome::NotFound);
    assert!(String::from_utf8(err)
        .unwrap()
        .starts_with("Unable to determine the owner of app_8"));
}

#[test]
fn test_overrides_replace_config_values() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());

    let mut settings = overrides(temp_dir.path());
    settings.log_root = Some(temp_dir.path().join("elsewhere"));
    settings.suffix = Some("logs-tfile".to_string());

    let config = load_settings(&settings).unwrap();
    assert_eq!(config.remote_app_log_dir, temp_dir.path().join("elsewhere"));
    assert_eq!(config.suffix(), Some("logs-tfile"));

    settings.suffix = Some("a/b".to_string());
    assert!(matches!(load_settings(&settings), Err(RunError::Config(_))));
}

#[test]
fn test_nodes_and_dump_all() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());
    pack_container(temp_dir.path(), "bob", "app_7", "host1_8041", "container_7_1");
    pack_container(temp_dir.path(), "bob", "app_7", "host2_8041", "container_7_2");

    let mut out = Vec::new();
    let mut err = Vec::new();
    let config = load_settings(&overrides(temp_dir.path())).unwrap();
    run::nodes(config, "app_7", Some("bob"), &mut out, &mut err).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "host1_8041\nhost2_8041\n");

    let mut out = Vec::new();
    let config = load_settings(&overrides(temp_dir.path())).unwrap();
    let outcome = run::dump_all(config, "app_7", Some("bob"), &mut out, &mut err).unwrap();
    assert_eq!(outcome, DumpOutcome::Found);
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Container: container_7_1 on host1_8041"));
    assert!(out.contains("Container: container_7_2 on host2_8041"));
}

#[test]
fn test_invalid_application_id() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path());

    let mut out = Vec::new();
    let mut err = Vec::new();
    let config = load_settings(&overrides(temp_dir.path())).unwrap();
    let result = run::nodes(config, "../etc", Some("bob"), &mut out, &mut err);
    assert!(matches!(result, Err(RunError::ApplicationId(_))));
}
