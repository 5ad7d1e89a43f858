// Integration tests for `msift` against checkpoint trees built in a tempdir.
// Run with: cargo test -p modelsift-cli --test cli_tests
//
// Manual smoke test (needs a real TTY):
//   msift browse <models dir>
//   Verify: checkboxes toggle, command line updates, y copies, q restores the terminal.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Fixture {
    _tmp: tempfile::TempDir,
    root: PathBuf,
    models: PathBuf,
}

impl Fixture {
    fn new(titles: &[&str]) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let models = root.join("models");
        fs::create_dir_all(&models).unwrap();
        let fixture = Fixture { _tmp: tmp, root, models };
        for title in titles {
            fixture.add_run(title, "20171116-2329", None);
        }
        fixture
    }

    fn add_run(&self, title: &str, stamp: &str, epoch: Option<&str>) {
        let dir = self.models.join(title).join(stamp);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model.ckpt.meta"), b"").unwrap();
        if let Some(epoch) = epoch {
            fs::write(dir.join("model.ckpt.epoch"), epoch).unwrap();
        }
    }

    fn msift(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_msift"));
        // Keep the user's real settings out; --config still wins over this
        cmd.current_dir(&self.root)
            .env("MODELSIFT_CONFIG", self.root.join("no-settings.toml"))
            .env_remove("MODELSIFT_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.msift().args(args).output().expect("run msift")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_ok(output: &Output) {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        stderr(output)
    );
}

fn models_arg(fixture: &Fixture) -> String {
    fixture.models.to_str().unwrap().to_string()
}

const TITLES: [&str; 3] = [
    "Seq2Seq-lr-0.001-bs-32-x-y",
    "Seq2Seq-lr-0.01-bs-32-x-y",
    "CNN-lr-0.001-bs-64-x-y",
];

// ---------------------------------------------------------------------------
// command
// ---------------------------------------------------------------------------

#[test]
fn command_lists_every_model_by_default() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["command", &models_arg(&fx)]);
    assert_ok(&out);
    // Scan order is by name
    assert_eq!(
        stdout(&out).trim_end(),
        "tensorboard --logdir=models/CNN-lr-0.001-bs-64-x-y,\
models/Seq2Seq-lr-0.001-bs-32-x-y,models/Seq2Seq-lr-0.01-bs-32-x-y"
    );
}

#[test]
fn where_and_exclude_narrow_the_command() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&[
        "command",
        &models_arg(&fx),
        "--where",
        "lr=0.001",
        "--exclude",
        "type=CNN",
    ]);
    assert_ok(&out);
    assert_eq!(
        stdout(&out).trim_end(),
        "tensorboard --logdir=models/Seq2Seq-lr-0.001-bs-32-x-y"
    );
}

#[test]
fn empty_selection_still_prints_command() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["command", &models_arg(&fx), "--where", "bs=128"]);
    assert_ok(&out);
    assert_eq!(stdout(&out).trim_end(), "tensorboard --logdir=");
}

#[test]
fn tool_override_and_dedupe() {
    let fx = Fixture::new(&["A-lr-0.1-x-y"]);
    fx.add_run("A-lr-0.1-x-y", "20171117-0800", None);

    let out = fx.run(&["command", &models_arg(&fx), "--tool", "tb"]);
    assert_ok(&out);
    assert_eq!(
        stdout(&out).trim_end(),
        "tb --logdir=models/A-lr-0.1-x-y,models/A-lr-0.1-x-y"
    );

    let out = fx.run(&["command", &models_arg(&fx), "--dedupe"]);
    assert_ok(&out);
    assert_eq!(stdout(&out).trim_end(), "tensorboard --logdir=models/A-lr-0.1-x-y");
}

#[test]
fn command_json_contract() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["command", &models_arg(&fx), "--where", "type=CNN", "--json"]);
    assert_ok(&out);
    let doc: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(doc["command"], "tensorboard --logdir=models/CNN-lr-0.001-bs-64-x-y");
    assert_eq!(doc["logdirs"], serde_json::json!(["models/CNN-lr-0.001-bs-64-x-y"]));
    assert_eq!(doc["matching"], 1);
    assert_eq!(doc["total"], 3);
    assert_eq!(doc["monitor_url"], "http://localhost:6006");
}

#[test]
fn copy_without_terminal_still_succeeds() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["command", &models_arg(&fx), "--copy"]);
    assert_ok(&out);
    assert!(!stdout(&out).contains("\x1b]52"), "escape must not reach stdout");
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[test]
fn list_shows_title_and_timestamp() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["list", &models_arg(&fx), "--where", "type=Seq2Seq"]);
    assert_ok(&out);
    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Seq2Seq-lr-0.001-bs-32-x-y"));
    assert!(lines[0].ends_with("20171116-2329"));
}

#[test]
fn list_json_includes_attributes_and_epoch() {
    let fx = Fixture::new(&[]);
    fx.add_run("A-lr-0.1-x-y", "20171116-2329", Some("7\n"));
    fx.add_run("B-lr-0.2-x-y", "20171116-2330", None);

    let out = fx.run(&["list", &models_arg(&fx), "--json", "--epochs"]);
    assert_ok(&out);
    let doc: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let entries = doc.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["title"], "A-lr-0.1-x-y");
    assert_eq!(entries[0]["type"], "A");
    assert_eq!(entries[0]["attributes"]["lr"], "0.1");
    assert_eq!(entries[0]["path"], "models/A-lr-0.1-x-y/20171116-2329/model.ckpt.meta");
    assert_eq!(entries[0]["started_at"], "2017-11-16T23:29");
    assert_eq!(entries[0]["epoch"], 7);
    assert!(entries[1].get("epoch").is_none());
}

#[test]
fn list_epochs_plain() {
    let fx = Fixture::new(&[]);
    fx.add_run("A-lr-0.1-x-y", "20171116-2329", Some("12"));
    let out = fx.run(&["list", &models_arg(&fx), "--epochs"]);
    assert_ok(&out);
    assert!(stdout(&out).contains("epoch 12"));
}

#[test]
fn from_list_reads_paths_relative_to_cwd() {
    let fx = Fixture::new(&TITLES);
    let list = fx.root.join("paths.txt");
    fs::write(
        &list,
        "./models/B-lr-0.2-x-y/t/model.ckpt.meta\nmodels/A-lr-0.1-x-y/t/model.ckpt.meta\n\n",
    )
    .unwrap();
    let out = fx.run(&["command", "--from-list", list.to_str().unwrap()]);
    assert_ok(&out);
    // List order is kept
    assert_eq!(
        stdout(&out).trim_end(),
        "tensorboard --logdir=models/B-lr-0.2-x-y,models/A-lr-0.1-x-y"
    );
}

#[test]
fn from_list_accepts_absolute_paths_under_cwd() {
    let fx = Fixture::new(&TITLES);
    let marker = fx.models.join(TITLES[2]).join("20171116-2329/model.ckpt.meta");
    let list = fx.root.join("paths.txt");
    fs::write(&list, format!("{}\n", marker.display())).unwrap();
    let out = fx.run(&["command", "--from-list", list.to_str().unwrap()]);
    assert_ok(&out);
    assert_eq!(
        stdout(&out).trim_end(),
        "tensorboard --logdir=models/CNN-lr-0.001-bs-64-x-y"
    );
}

#[test]
fn from_list_rejects_paths_above_cwd() {
    let fx = Fixture::new(&TITLES);
    let list = fx.root.join("paths.txt");
    fs::write(&list, "../models/A-lr-0.1-x-y/t/model.ckpt.meta\n").unwrap();
    let out = fx.run(&["command", "--from-list", list.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("../models/A-lr-0.1-x-y/t/model.ckpt.meta"));
}

// ---------------------------------------------------------------------------
// filters
// ---------------------------------------------------------------------------

#[test]
fn filters_show_domains_with_counts() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["filters", &models_arg(&fx), "--exclude", "bs=64"]);
    assert_ok(&out);
    let text = stdout(&out);
    assert!(text.contains("[x] type  (2/2 selected)"), "got:\n{text}");
    assert!(text.contains("[-] bs  (1/2 selected)"), "got:\n{text}");
    assert!(text.contains("    [x] 0.001  (2)"), "got:\n{text}");
    assert!(text.contains("    [ ] 64  (1)"), "got:\n{text}");
}

#[test]
fn filters_json_marks_selection() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["filters", &models_arg(&fx), "--where", "lr=0.01", "--json"]);
    assert_ok(&out);
    let doc: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let keys: Vec<&str> = doc
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["type", "lr", "bs"]);
    let lr = &doc[1]["values"];
    assert_eq!(lr[0]["value"], "0.001");
    assert_eq!(lr[0]["selected"], false);
    assert_eq!(lr[1]["value"], "0.01");
    assert_eq!(lr[1]["selected"], true);
}

// ---------------------------------------------------------------------------
// errors and exit codes
// ---------------------------------------------------------------------------

#[test]
fn empty_directory_exits_3() {
    let fx = Fixture::new(&[]);
    let out = fx.run(&["command", &models_arg(&fx)]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("no models found"));
    assert!(stderr(&out).contains("model.ckpt.meta"));
}

#[test]
fn custom_marker_finds_other_files() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["command", &models_arg(&fx), "--marker", "events.out"]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn unknown_filter_key_exits_2() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["command", &models_arg(&fx), "--where", "momentum=0.9"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("available keys: type, lr, bs"));
}

#[test]
fn malformed_where_exits_2() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["list", &models_arg(&fx), "--where", "lr"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn missing_directory_exits_5() {
    let fx = Fixture::new(&[]);
    let missing = fx.root.join("nowhere");
    let out = fx.run(&["list", missing.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(5));
}

#[test]
fn missing_input_exits_2() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["list"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn strict_rejects_nonconforming_titles() {
    let fx = Fixture::new(&TITLES);
    fx.add_run("scratch", "20171116-2329", None);

    // Lenient: kept, but it has no lr so the default filters skip it
    let out = fx.run(&["list", &models_arg(&fx)]);
    assert_ok(&out);
    assert!(stderr(&out).contains("scratch"), "expected a warning naming the title");

    let out = fx.run(&["list", &models_arg(&fx), "--strict"]);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("scratch"));
}

#[test]
fn browse_refuses_stdin_list() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["browse", "--from-list", "-"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn browse_without_terminal_exits_5() {
    let fx = Fixture::new(&TITLES);
    let out = fx.run(&["browse", &models_arg(&fx)]);
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("hint:"));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_file_changes_defaults() {
    let fx = Fixture::new(&TITLES);
    let settings = fx.root.join("settings.toml");
    fs::write(&settings, "[command]\ntool = \"tensorboard-dev\"\nlogdir_prefix = \"runs/\"\n").unwrap();

    let out = fx
        .msift()
        .args(["--config", settings.to_str().unwrap()])
        .args(["command", &models_arg(&fx), "--where", "type=CNN"])
        .output()
        .unwrap();
    assert_ok(&out);
    assert_eq!(
        stdout(&out).trim_end(),
        "tensorboard-dev --logdir=runs/CNN-lr-0.001-bs-64-x-y"
    );
}

#[test]
fn config_init_writes_once() {
    let fx = Fixture::new(&[]);
    let path = fx.root.join("conf").join("settings.toml");
    let p = path.to_str().unwrap();

    let out = fx.run(&["config", "--init", "--config", p]);
    assert_ok(&out);
    assert!(Path::new(p).exists());

    let out = fx.run(&["config", "--init", "--config", p]);
    assert_eq!(out.status.code(), Some(6));

    let out = fx.run(&["config", "--config", p]);
    assert_ok(&out);
    assert!(stdout(&out).contains("marker_filename = \"model.ckpt.meta\""));
}

#[test]
fn broken_config_exits_6() {
    let fx = Fixture::new(&TITLES);
    let settings = fx.root.join("bad.toml");
    fs::write(&settings, "[command\n").unwrap();
    let out = fx.run(&["list", &models_arg(&fx), "--config", settings.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(6));
}
