use std::{fs, path::Path};

use tempfile::{TempDir, tempdir};

use quire::QuireError;
use quire_cli::{Args, Command, run};

const OVERVIEW: &str = "---
title: Overview
description: Start here
---

Welcome to the handbook.

## Request flow

```mermaid
flowchart LR
    Client --> API{Auth?}
    API -->|yes| Service[(Database)]
    API -.->|no| Reject([401])
```

```rust
fn main() {}
```
";

const SETUP: &str = "# Setup

Install the tools.

```mermaid
flowchart TD
    A[unclosed --> B
```
";

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// A site with two pages and a config file pointing at it.
fn site_fixture() -> TempDir {
    let dir = tempdir().expect("Failed to create temp directory");
    write(dir.path(), "content/index.md", OVERVIEW);
    write(dir.path(), "content/guide/setup.md", SETUP);
    write(
        dir.path(),
        "quire.toml",
        &format!(
            "[site]\ntitle = \"Handbook\"\n\n[content]\ndir = {:?}\n\n[build]\noutput_dir = {:?}\n",
            dir.path().join("content"),
            dir.path().join("out"),
        ),
    );
    dir
}

fn args(dir: &TempDir, command: Command) -> Args {
    Args {
        command,
        config: Some(dir.path().join("quire.toml").to_string_lossy().to_string()),
        content: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_build_site() {
    let dir = site_fixture();

    run(&args(&dir, Command::Build { out: None })).expect("build failed");

    let out = dir.path().join("out");
    for relative in [
        "index.html",
        "404.html",
        "docs/index.html",
        "docs/guide/setup/index.html",
    ] {
        assert!(out.join(relative).is_file(), "missing {relative}");
    }

    let overview = fs::read_to_string(out.join("docs/index.html")).unwrap();
    assert!(overview.contains("<title>Overview | Handbook</title>"));
    assert!(overview.contains("<svg"));
    assert!(overview.contains("language-rust"));
    assert!(!overview.contains("Loading diagram..."));

    let setup = fs::read_to_string(out.join("docs/guide/setup/index.html")).unwrap();
    assert!(setup.contains(r#"<pre style="color: red;">Error rendering diagram</pre>"#));
}

#[test]
fn e2e_build_out_override() {
    let dir = site_fixture();
    let out = dir.path().join("public");

    run(&args(
        &dir,
        Command::Build {
            out: Some(out.to_string_lossy().to_string()),
        },
    ))
    .expect("build failed");

    assert!(out.join("docs/index.html").is_file());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn e2e_page_to_file() {
    let dir = site_fixture();
    let output = dir.path().join("setup.html");

    run(&args(
        &dir,
        Command::Page {
            segments: vec!["guide".to_string(), "setup".to_string()],
            output: Some(output.to_string_lossy().to_string()),
        },
    ))
    .expect("page failed");

    let html = fs::read_to_string(output).unwrap();
    assert!(html.contains("<h1>Setup</h1>"));
}

#[test]
fn e2e_unknown_page_is_not_found() {
    let dir = site_fixture();

    let err = run(&args(
        &dir,
        Command::Page {
            segments: vec!["nonexistent-page".to_string()],
            output: None,
        },
    ))
    .unwrap_err();

    assert!(matches!(err, QuireError::NotFound(_)));
}

#[test]
fn e2e_diagram_command() {
    let dir = site_fixture();
    let input = dir.path().join("flow.mmd");
    let output = dir.path().join("flow.svg");
    fs::write(&input, "flowchart TD\n    A[Start] --> B{Ready?}\n").unwrap();

    run(&args(
        &dir,
        Command::Diagram {
            input: input.to_string_lossy().to_string(),
            output: output.to_string_lossy().to_string(),
        },
    ))
    .expect("diagram failed");

    let svg = fs::read_to_string(output).unwrap();
    assert!(svg.contains(r#"id="diagram-flow""#));
}

#[test]
fn e2e_diagram_command_reports_parse_errors() {
    let dir = site_fixture();
    let input = dir.path().join("broken.mmd");
    fs::write(&input, "flowchart TD\n    A[unclosed --> B\n").unwrap();

    let err = run(&args(
        &dir,
        Command::Diagram {
            input: input.to_string_lossy().to_string(),
            output: dir.path().join("broken.svg").to_string_lossy().to_string(),
        },
    ))
    .unwrap_err();

    assert!(matches!(err, QuireError::Diagram { .. }));
    assert!(!quire_cli::error_adapter::to_reportables(&err).is_empty());
}
