//! [`VaultClient`] backed by the 1Password `op` command-line tool.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::applier::VaultClient;
use crate::error::{VaultError, VaultResult};
use crate::models::Record;

/// Runs `op` subcommands as child processes.
#[derive(Debug, Clone)]
pub struct OpCli {
    program: PathBuf,
}

impl Default for OpCli {
    fn default() -> Self {
        Self::new("op")
    }
}

impl OpCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Check that `op` is installed and signed in.
    pub fn verify_ready(&self) -> VaultResult<()> {
        self.run(&["whoami".to_string()]).map(|_| ()).map_err(|e| match e {
            VaultError::Command(msg) if msg.contains("not found") => VaultError::Command(format!(
                "1Password CLI ({}) not found. Please install it from: https://developer.1password.com/docs/cli/get-started/",
                self.program.display()
            )),
            VaultError::Command(msg) => VaultError::Command(format!(
                "failed to verify 1Password CLI sign-in; please run 'op signin': {}",
                msg
            )),
            other => other,
        })
    }

    /// List login items, optionally restricted to one vault.
    pub fn fetch_records(&self, vault: Option<&str>) -> VaultResult<Vec<Record>> {
        let stdout = self.run(&list_args(vault))?;
        let records: Vec<Record> = serde_json::from_slice(&stdout)?;
        debug!(count = records.len(), "fetched login items");
        Ok(records)
    }

    fn run(&self, args: &[String]) -> VaultResult<Vec<u8>> {
        debug!(program = %self.program.display(), ?args, "running op command");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => VaultError::Command(format!(
                    "{} not found",
                    self.program.display()
                )),
                _ => VaultError::Command(format!("op command failed: {}", e)),
            })?;

        if !output.status.success() {
            return Err(VaultError::Command(format!(
                "op command failed: {}\nstderr: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim_end()
            )));
        }

        Ok(output.stdout)
    }
}

impl VaultClient for OpCli {
    fn edit_record(&mut self, id: &str, body_json: &str) -> VaultResult<()> {
        // The template file is removed when `template` is dropped.
        let mut template = tempfile::Builder::new()
            .prefix("vault-dedupe-")
            .suffix(".json")
            .tempfile()?;
        template.write_all(body_json.as_bytes())?;
        template.flush()?;

        self.run(&edit_args(id, template.path())).map(|_| ())
    }

    fn archive_record(&mut self, id: &str) -> VaultResult<()> {
        self.run(&archive_args(id)).map(|_| ())
    }
}

fn list_args(vault: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = ["item", "list", "--categories", "LOGIN", "--format", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if let Some(vault) = vault.filter(|v| !v.is_empty()) {
        args.push("--vault".to_string());
        args.push(vault.to_string());
    }
    args
}

fn edit_args(id: &str, template: &Path) -> Vec<String> {
    vec![
        "item".to_string(),
        "edit".to_string(),
        id.to_string(),
        "--template".to_string(),
        template.to_string_lossy().into_owned(),
    ]
}

fn archive_args(id: &str) -> Vec<String> {
    vec![
        "item".to_string(),
        "delete".to_string(),
        id.to_string(),
        "--archive".to_string(),
    ]
}
