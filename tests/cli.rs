use std::{
    fs::{create_dir_all, write},
    path::Path,
};

use assert_cmd::Command;
use tempfile::TempDir;

const CONFIG: &str = r#"
python = "this-python-does-not-exist"

[layout]
stdlib = "lib"
site_packages = "lib/site-packages"
makefile = "lib/config/Makefile"
config_header = "include/pyconfig.h"

[aliases]
"lazy.py" = "lazy_impl.py"
"#;

fn installation() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let files = [
        ("pydeps.toml", CONFIG),
        ("lib/site.py", ""),
        ("lib/sysconfig.py", ""),
        ("lib/config/Makefile", ""),
        ("include/pyconfig.h", ""),
        ("lib/lazy.py", ""),
        ("lib/lazy_impl.py", "import helper\n"),
        ("lib/helper.py", ""),
        ("lib/site-packages/pkg/__init__.py", ""),
        ("lib/site-packages/pkg/extra.py", ""),
        ("app/main.py", "import sys\nimport lazy\nimport pkg\n"),
        ("app/broken.py", "import (\n"),
    ];
    for (path, contents) in files {
        let path = dir.path().join(path);
        create_dir_all(path.parent().unwrap()).unwrap();
        write(path, contents).unwrap();
    }
    dir
}

fn lines(root: &Path, paths: &[&str]) -> String {
    paths
        .iter()
        .map(|p| format!("{}\n", root.join(p).display()))
        .collect()
}

fn pydeps() -> Command {
    Command::cargo_bin("pydeps").unwrap()
}

#[test]
fn prints_dependencies_in_order() {
    let dir = installation();
    pydeps()
        .current_dir(dir.path())
        .arg("app/main.py")
        .assert()
        .success()
        .stdout(expected_output(dir.path()));
}

#[test]
fn explicit_config_and_script_discovery() {
    let dir = installation();
    let elsewhere = tempfile::tempdir().unwrap();
    pydeps()
        .current_dir(elsewhere.path())
        .arg("--config")
        .arg(dir.path().join("pydeps.toml"))
        .arg(dir.path().join("app/main"))
        .assert()
        .success()
        .stdout(expected_output(dir.path()));
}

fn expected_output(root: &Path) -> String {
    lines(
        root,
        &[
            "lib/config/Makefile",
            "include/pyconfig.h",
            "lib/site.py",
            "lib/sysconfig.py",
            "lib/lazy.py",
            "lib/lazy_impl.py",
            "lib/site-packages/pkg/__init__.py",
            "lib/site-packages/pkg/extra.py",
            "lib/helper.py",
        ],
    )
}

#[test]
fn unparseable_script_fails_without_output() {
    let dir = installation();
    pydeps()
        .current_dir(dir.path())
        .args(["app/main.py", "app/broken.py"])
        .assert()
        .failure()
        .stdout("");
}

#[test]
fn missing_script_fails() {
    let dir = installation();
    pydeps()
        .current_dir(dir.path())
        .arg("app/missing.py")
        .assert()
        .failure()
        .stdout("");
}

#[test]
fn requires_a_script() {
    pydeps().assert().failure();
}
