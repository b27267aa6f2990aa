//! Config command - inspect and edit the reader configuration.
//!
//! Keys are dotted paths into the JSON form of [`ReaderConfig`], e.g.
//! `speech.program` or `upload.max_file_size`.

use std::fs;
use std::path::Path;

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use readaloud_core::models::config::ReaderConfig;

use super::config_file;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a configuration file with default values
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value (e.g. "speech.program")
    Get { key: String },

    /// Change one value; non-JSON input is stored as a string
    Set { key: String, value: String },

    /// List every key with its current value
    Keys,

    /// Print where the configuration file lives
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_file(config_path);
    match args.command {
        ConfigCommand::Show => show(&path),
        ConfigCommand::Init { force } => init(&path, force),
        ConfigCommand::Get { key } => get(&path, &key),
        ConfigCommand::Set { key, value } => set(&path, &key, &value),
        ConfigCommand::Keys => keys(&path),
        ConfigCommand::Path => where_is(&path),
    }
}

/// The file's contents, or defaults when it does not exist yet.
fn read(path: &Path) -> anyhow::Result<Value> {
    let config = if path.exists() {
        ReaderConfig::from_file(path)?
    } else {
        ReaderConfig::default()
    };
    Ok(serde_json::to_value(config)?)
}

fn lookup<'a>(json: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(json, |node, part| node.get(part))
}

fn lookup_mut<'a>(json: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    key.split('.').try_fold(json, |node, part| node.get_mut(part))
}

fn show(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        eprintln!("{} {} does not exist, showing defaults", style("ℹ").blue(), path.display());
    }
    println!("{}", serde_json::to_string_pretty(&read(path)?)?);
    Ok(())
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (pass --force to replace it)", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    ReaderConfig::default().save(path)?;

    println!("{} Wrote defaults to {}", style("✓").green(), path.display());
    Ok(())
}

fn get(path: &Path, key: &str) -> anyhow::Result<()> {
    let json = read(path)?;
    let value = lookup(&json, key).ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))?;
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn set(path: &Path, key: &str, raw: &str) -> anyhow::Result<()> {
    let mut json = read(path)?;
    let slot = lookup_mut(&mut json, key).ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))?;
    if slot.is_object() {
        anyhow::bail!("{} is a section; set one of its keys instead", key);
    }
    *slot = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    let shown = slot.to_string();

    let config: ReaderConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
    config.validate()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;

    println!("{} {} = {}", style("✓").green(), key, shown);
    Ok(())
}

fn keys(path: &Path) -> anyhow::Result<()> {
    fn walk(prefix: &str, node: &Value, out: &mut Vec<(String, String)>) {
        match node {
            Value::Object(map) => {
                for (name, child) in map {
                    let key = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{}.{}", prefix, name)
                    };
                    walk(&key, child, out);
                }
            }
            leaf => out.push((prefix.to_string(), leaf.to_string())),
        }
    }

    let mut entries = Vec::new();
    walk("", &read(path)?, &mut entries);
    let width = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in entries {
        println!("{:width$}  {}", style(&key).cyan(), value, width = width);
    }
    Ok(())
}

fn where_is(path: &Path) -> anyhow::Result<()> {
    let status = if path.exists() {
        style("exists").green()
    } else {
        style("not created").yellow()
    };
    println!("{} ({})", path.display(), status);
    Ok(())
}
