//! Integration tests for the `vault` CLI binary.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn vault_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vault"));
    cmd.env_remove("OMNI_VAULT_CONFIG")
        .env("RUST_LOG", "off")
        .arg("--root")
        .arg(root);
    cmd
}

fn json_stdout(output: &Output) -> Result<Value, Box<dyn std::error::Error>> {
    assert!(
        output.status.success(),
        "vault command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(serde_json::from_slice(&output.stdout)?)
}

fn make_vault() -> Result<TempDir, Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    fs::create_dir_all(tmp.path().join(".obsidian"))?;
    write_file(&tmp.path().join("A.md"), "[[B]] #shared")?;
    write_file(&tmp.path().join("B.md"), "[[C]] [[Missing]]")?;
    write_file(&tmp.path().join("C.md"), "#shared")?;
    Ok(tmp)
}

#[test]
fn test_vault_list_and_broken() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = make_vault()?;

    let listed = json_stdout(&vault_cmd(tmp.path()).arg("list").output()?)?;
    assert_eq!(listed, serde_json::json!(["A", "B", "C"]));

    let broken = json_stdout(&vault_cmd(tmp.path()).arg("broken").output()?)?;
    assert_eq!(broken, serde_json::json!({ "B": ["Missing"] }));
    Ok(())
}

#[test]
fn test_vault_create_then_read() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = make_vault()?;

    let created = json_stdout(
        &vault_cmd(tmp.path())
            .args(["create", "Idea", "--folder", "inbox"])
            .args(["--content", "Links to [[A]]"])
            .args(["--meta", "{title: Idea, tags: [draft]}"])
            .output()?,
    )?;
    assert_eq!(
        created.get("identifier").and_then(Value::as_str),
        Some("inbox/Idea")
    );
    assert!(tmp.path().join("inbox/Idea.md").is_file());

    let read = json_stdout(&vault_cmd(tmp.path()).args(["read", "inbox/Idea"]).output()?)?;
    assert_eq!(read.get("body").and_then(Value::as_str), Some("Links to [[A]]"));
    assert_eq!(
        read.pointer("/metadata/title").and_then(Value::as_str),
        Some("Idea")
    );
    assert_eq!(read.get("links"), Some(&serde_json::json!(["A"])));

    let again = vault_cmd(tmp.path())
        .args(["create", "inbox/Idea", "--content", "other"])
        .output()?;
    assert!(!again.status.success());
    Ok(())
}

#[test]
fn test_vault_update_appends() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = make_vault()?;
    let updated = json_stdout(
        &vault_cmd(tmp.path())
            .args(["update", "C", "--content", " and [[A]]"])
            .output()?,
    )?;
    assert_eq!(
        updated.get("body").and_then(Value::as_str),
        Some("#shared and [[A]]")
    );
    assert_eq!(fs::read_to_string(tmp.path().join("C.md"))?, "#shared and [[A]]");
    Ok(())
}

#[test]
fn test_vault_suggest_graph_and_summary() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = make_vault()?;

    let graph = json_stdout(&vault_cmd(tmp.path()).args(["suggest", "graph"]).output()?)?;
    let rows = graph.as_array().ok_or("suggestions should be an array")?;
    let pairs: Vec<(&str, &str)> = rows
        .iter()
        .filter_map(|row| {
            Some((
                row.get("note1")?.as_str()?,
                row.get("note2")?.as_str()?,
            ))
        })
        .collect();
    assert_eq!(pairs, vec![("A", "C"), ("A", "Missing")]);
    assert_eq!(
        rows[0].pointer("/evidence/kind").and_then(Value::as_str),
        Some("via")
    );

    let summary = json_stdout(&vault_cmd(tmp.path()).arg("summary").output()?)?;
    assert_eq!(
        summary.pointer("/stats/total_notes").and_then(Value::as_u64),
        Some(3)
    );
    assert_eq!(
        summary.pointer("/stats/broken_links").and_then(Value::as_u64),
        Some(1)
    );
    Ok(())
}

#[test]
fn test_vault_rejects_missing_sentinel() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let output = vault_cmd(tmp.path()).arg("list").output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open vault"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn test_vault_rejects_path_escape() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = make_vault()?;
    let output = vault_cmd(tmp.path())
        .args(["read", "../../etc/passwd"])
        .output()?;
    assert!(!output.status.success());
    Ok(())
}
