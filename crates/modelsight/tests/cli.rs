use std::path::Path;
use std::process::{Command, Output};

use tempfile::{TempDir, tempdir};

fn modelsight(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_modelsight"))
        .args(args)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("MODELSIGHT_CACHE_DIR", dir.path().join("cache"))
        .env("MODELSIGHT_STORE_PATH", dir.path().join("session.json"))
        .env("MODELSIGHT_SCENE__SETTLE_DELAY_MS", "0")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[test]
fn test_validate_reports_each_payload() {
    let dir = tempdir().unwrap();

    let ok = modelsight(&dir, &["validate", "https://cdn.example.com/heart.glb"]);
    assert!(ok.status.success());
    assert_eq!(
        stdout(&ok).trim(),
        "ok\tGLB\tDirect\thttps://cdn.example.com/heart.glb"
    );

    let mixed = modelsight(
        &dir,
        &["validate", "https://cdn.example.com/heart.glb", "https://example.com/index.html"],
    );
    assert!(!mixed.status.success());
    let out = stdout(&mixed);
    assert!(out.lines().any(|l| l.starts_with("rejected\t")), "{out}");
}

#[test]
fn test_config_merges_file_and_env() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("modelsight.toml"), "strict_https = true\n").unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_modelsight"));
    let output = cmd
        .arg("config")
        .current_dir(dir.path())
        .env("MODELSIGHT_MAX_ERRORS", "7")
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("strict_https = true"), "{out}");
    assert!(out.contains("max_errors = 7"), "{out}");
    assert!(out.contains("[scene]"), "{out}");
}

#[test]
fn test_session_renders_local_model_and_persists_it() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("heart.glb");
    std::fs::write(&model, b"glTF model bytes").unwrap();
    let url = file_url(&model);

    let output = modelsight(&dir, &["session", "--quiet", "--hold-ms", "200", &url]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout(&output);
    assert!(out.contains(&format!("ready\t{url}\t{}", model.display())), "{out}");
    assert!(out.contains("scene\tComplete"), "{out}");
    assert!(out.contains("render\tloaded=true\tmaterials=1\tanimations=2"), "{out}");
    assert!(out.contains("state\trendering\t0"), "{out}");

    let current = modelsight(&dir, &["current"]);
    assert!(stdout(&current).contains(&format!("\"source_uri\": \"{url}\"")));

    let cleared = modelsight(&dir, &["current", "--clear"]);
    assert!(cleared.status.success());
    assert_eq!(stdout(&modelsight(&dir, &["current"])).trim(), "no current model");
}

#[test]
fn test_session_counts_failures_and_resets() {
    let dir = tempdir().unwrap();
    let missing = file_url(&dir.path().join("missing.glb"));

    let output = modelsight(
        &dir,
        &["session", "--quiet", "not a model", &missing, &missing, &missing],
    );
    assert!(output.status.success());
    let states: Vec<String> = stdout(&output)
        .lines()
        .filter(|l| l.starts_with("state\t"))
        .map(str::to_string)
        .collect();
    assert_eq!(
        states,
        ["state\terror\t0", "state\terror\t1", "state\terror\t2", "state\tscanning\t0"]
    );
}

#[test]
fn test_stored_marker_is_registered_in_marker_mode() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("heart.glb");
    std::fs::write(&model, b"glTF model bytes").unwrap();

    let set = modelsight(&dir, &["current", "--marker", "https://cdn.example.com/marker.png"]);
    assert!(set.status.success());
    let current = stdout(&modelsight(&dir, &["current"]));
    assert!(current.contains("marker\thttps://cdn.example.com/marker.png"), "{current}");

    let output = Command::new(env!("CARGO_BIN_EXE_modelsight"))
        .args(["session", "--quiet", "--hold-ms", "100", &file_url(&model)])
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("MODELSIGHT_CACHE_DIR", dir.path().join("cache"))
        .env("MODELSIGHT_STORE_PATH", dir.path().join("session.json"))
        .env("MODELSIGHT_SCENE__SETTLE_DELAY_MS", "0")
        .env("MODELSIGHT_SCENE__MARKER_TRACKING", "true")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout(&output);
    assert!(out.contains("marker=markerTarget"), "{out}");

    let world = modelsight(&dir, &["session", "--quiet", "--hold-ms", "100", &file_url(&model)]);
    assert!(stdout(&world).contains("marker=-"), "{}", stdout(&world));
}

#[test]
fn test_session_input_is_debounced() {
    let dir = tempdir().unwrap();
    let output = modelsight(
        &dir,
        &["session", "--quiet", "--debounce-ms", "60000", "not a model", "", "not a model"],
    );
    assert!(output.status.success());
    let states: Vec<String> = stdout(&output)
        .lines()
        .filter(|l| l.starts_with("state\t"))
        .map(str::to_string)
        .collect();
    assert_eq!(states, ["state\terror\t0"]);
}
