//! tgkit project scaffolder.
//!
//! `scaffold <directory> <server>` creates a new bot project with build, run
//! and deploy scripts, a Cargo manifest, an echo bot `src/main.rs`, a config
//! template and a .gitignore.
//!
//! With `--cli`: asks for the directory and server interactively instead.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

// ── Templates ──────────────────────────────────────────────────────────────────

struct Boilerplate {
    file_name: &'static str,
    contents: &'static str,
    executable: bool,
}

const BOILERPLATE: &[Boilerplate] = &[
    Boilerplate {
        file_name: "build",
        contents: r#"#!/bin/bash
cargo build --release
"#,
        executable: true,
    },
    Boilerplate {
        file_name: "run",
        contents: r#"#!/bin/bash
./build && ./target/release/{directory} config.toml
"#,
        executable: true,
    },
    Boilerplate {
        file_name: "deploy",
        contents: r#"#!/usr/bin/bash

./build && ssh {server} << EOF
    cd {directory}
    git pull
    ./build
    systemctl restart {directory}
EOF
"#,
        executable: true,
    },
    Boilerplate {
        file_name: "Cargo.toml",
        contents: r#"[package]
name = "{directory}"
version = "0.1.0"
edition = "2021"

[dependencies]
tgkit = "0.1"
tokio = { version = "1", features = ["full"] }
anyhow = "1"
"#,
        executable: false,
    },
    Boilerplate {
        file_name: "src/main.rs",
        contents: r#"use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = tgkit::Config::load(Path::new(&path))?;
    tgkit::init_logging(&config.logging)?;

    let kit = tgkit::create(&config)?;

    let composer = Arc::clone(&kit.composer);
    kit.engine
        .on_message(move |event| {
            let composer = Arc::clone(&composer);
            async move {
                let text = event.effective_text().unwrap_or_default();
                composer
                    .send(event.chat_id(), text, &event.attachments, None)
                    .await
            }
        })
        .await;

    kit.start().await
}
"#,
        executable: false,
    },
    Boilerplate {
        file_name: "config.toml",
        contents: r#"[telegram]
bot_token = ""

[polling]
wait_secs = 20

[logging]
enabled = true
filter = "info,{directory}=debug,tgkit=debug"
"#,
        executable: false,
    },
    Boilerplate {
        file_name: ".gitignore",
        contents: r#"/target
config.toml
"#,
        executable: false,
    },
];

struct ScaffoldParams<'a> {
    directory: &'a str,
    server: &'a str,
}

/// Fill in `{directory}` and `{server}`. Extracted so it can be unit-tested.
fn render(template: &str, p: &ScaffoldParams<'_>) -> String {
    template
        .replace("{directory}", p.directory)
        .replace("{server}", p.server)
}

// ── Generation ─────────────────────────────────────────────────────────────────

/// Create `root` and write every boilerplate file into it.
/// Refuses to touch a directory that already exists.
fn generate_and_place(root: &Path, server: &str) -> Result<Vec<PathBuf>> {
    let directory = root
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a usable project directory: {}", root.display()))?;

    if root.exists() {
        bail!("{} already exists", root.display());
    }
    std::fs::create_dir_all(root)
        .with_context(|| format!("Could not create {}", root.display()))?;

    let params = ScaffoldParams { directory, server };
    let mut written = Vec::with_capacity(BOILERPLATE.len());

    for file in BOILERPLATE {
        let path = root.join(file.file_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        std::fs::write(&path, render(file.contents, &params))
            .with_context(|| format!("Could not write {}", path.display()))?;
        if file.executable {
            make_executable(&path)?;
        }
        written.push(path);
    }

    Ok(written)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)
        .with_context(|| format!("Could not stat {}", path.display()))?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    std::fs::set_permissions(path, permissions)
        .with_context(|| format!("Could not make {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

// ── CLI mode ───────────────────────────────────────────────────────────────────

fn run_cli() -> Result<(String, String)> {
    use std::io::{self, Write};

    println!("=== tgkit project setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let directory = read_line("Project directory: ")?;
    let server = read_line("Deploy server (ssh host): ")?;
    Ok((directory, server))
}

// ── Entry point ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let (directory, server) = if args.iter().any(|a| a == "--cli") {
        run_cli()?
    } else {
        match args.as_slice() {
            [directory, server] => (directory.clone(), server.clone()),
            _ => bail!("usage: scaffold <directory> <server>  |  scaffold --cli"),
        }
    };

    if directory.is_empty() || server.is_empty() {
        bail!("Both a project directory and a deploy server are required");
    }

    let root = PathBuf::from(&directory);
    let written = generate_and_place(&root, &server)?;

    println!("\n✓  Created {} files in {}", written.len(), root.display());
    println!("   Fill in bot_token in config.toml, then:  cd {directory} && ./run\n");
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn params<'a>(directory: &'a str, server: &'a str) -> ScaffoldParams<'a> {
        ScaffoldParams { directory, server }
    }

    fn template(name: &str) -> &'static str {
        BOILERPLATE
            .iter()
            .find(|b| b.file_name == name)
            .map(|b| b.contents)
            .unwrap()
    }

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tgkit-scaffold-{}-{}", std::process::id(), tag))
            .join("echo_bot")
    }

    #[test]
    fn test_deploy_script_targets_server_and_directory() {
        let out = render(template("deploy"), &params("echo_bot", "prod.example.org"));
        assert!(out.contains("ssh prod.example.org << EOF"));
        assert!(out.contains("cd echo_bot"));
        assert!(out.contains("systemctl restart echo_bot"));
        assert!(!out.contains('{'));
    }

    #[test]
    fn test_manifest_uses_directory_as_package_name() {
        let out = render(template("Cargo.toml"), &params("echo_bot", "s"));
        assert!(out.contains(r#"name = "echo_bot""#));
        assert!(out.contains(r#"tgkit = "0.1""#));
    }

    #[test]
    fn test_main_template_builds_an_echo_bot() {
        let out = render(template("src/main.rs"), &params("echo_bot", "s"));
        assert_eq!(out, template("src/main.rs"));
        assert!(out.contains("async fn main() -> Result<()> {"));
        assert!(out.contains("tgkit::create(&config)?"));
        assert!(out.contains("kit.start().await"));
    }

    #[test]
    fn test_gitignore_hides_config() {
        let out = render(template(".gitignore"), &params("d", "s"));
        assert!(out.lines().any(|l| l == "config.toml"));
        assert!(out.lines().any(|l| l == "/target"));
    }

    #[test]
    fn test_generate_writes_every_file() {
        let root = temp_root("all");
        let _ = std::fs::remove_dir_all(root.parent().unwrap());

        let written = generate_and_place(&root, "host").unwrap();
        assert_eq!(written.len(), BOILERPLATE.len());
        for file in BOILERPLATE {
            assert!(root.join(file.file_name).is_file(), "{} missing", file.file_name);
        }

        assert!(written.contains(&root.join("src").join("main.rs")));

        let run = std::fs::read_to_string(root.join("run")).unwrap();
        assert!(run.contains("./target/release/echo_bot"));

        std::fs::remove_dir_all(root.parent().unwrap()).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let root = temp_root("exec");
        let _ = std::fs::remove_dir_all(root.parent().unwrap());
        generate_and_place(&root, "host").unwrap();

        for file in BOILERPLATE {
            let mode = std::fs::metadata(root.join(file.file_name))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o100 != 0, file.executable, "{}", file.file_name);
        }

        std::fs::remove_dir_all(root.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_existing_directory_is_left_alone() {
        let root = temp_root("exists");
        std::fs::create_dir_all(&root).unwrap();

        let err = generate_and_place(&root, "host").unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(std::fs::read_dir(&root).unwrap().next().is_none());

        std::fs::remove_dir_all(root.parent().unwrap()).unwrap();
    }
}
