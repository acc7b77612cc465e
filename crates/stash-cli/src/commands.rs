use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::Value;
use stash_store::{remove_store_file, FsBackend, Store, StoreConfig};
use tracing::debug;

use crate::cli::*;

type JsonStore = Store<Value>;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = store_config(&cli)?;
    let format = cli.format;

    match cli.command {
        Command::Get(args) => cmd_get(&open_store(&config)?, &args.key, format),
        Command::Set(args) => cmd_set(&mut open_store(&config)?, args, format).await,
        Command::Contains(args) => cmd_contains(&open_store(&config)?, &args.key, format),
        Command::Keys => cmd_keys(&open_store(&config)?, format),
        Command::Dump => cmd_dump(&open_store(&config)?, format),
        Command::Hash => cmd_hash(&open_store(&config)?, format),
        // Never loads the file, so a corrupt store can still be removed.
        Command::Delete => cmd_delete(&config.resolve_path()?).await,
    }
}

fn open_store(config: &StoreConfig) -> anyhow::Result<JsonStore> {
    let store: JsonStore = Store::open(config)
        .with_context(|| format!("opening store {}", describe(config)))?;
    debug!(path = %store.path().display(), "store ready");
    Ok(store)
}

/// `--store` beats `--config`, which beats the default resolution.
pub fn store_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    if let Some(path) = &cli.store {
        return Ok(StoreConfig::at(path.clone()));
    }
    match &cli.config {
        Some(file) => StoreConfig::from_toml_file(file)
            .with_context(|| format!("reading config {}", file.display())),
        None => Ok(StoreConfig::default()),
    }
}

fn describe(config: &StoreConfig) -> String {
    config
        .resolve_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "<unresolved>".into())
}

/// Parse a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn cmd_get(store: &JsonStore, key: &str, format: OutputFormat) -> anyhow::Result<()> {
    let value = store.get(key);
    match format {
        OutputFormat::Json => println!("{}", value.cloned().unwrap_or(Value::Null)),
        OutputFormat::Text => match value {
            Some(v) => println!("{v}"),
            None => println!("{} {}", "not set:".dimmed(), key.yellow()),
        },
    }
    Ok(())
}

pub async fn cmd_set(
    store: &mut JsonStore,
    args: SetArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let value = parse_value(&args.value);
    let existed = store.contains(&args.key);
    store.set_with(args.key.as_str(), value, !args.no_override)?;
    let written = store.is_dirty() || args.force;
    store.write(args.force).await?;

    let kept = existed && args.no_override;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "key": args.key,
                "kept_existing": kept,
                "written": written,
                "hash": store.cache_hash(),
            })
        ),
        OutputFormat::Text if kept => {
            println!(
                "{} {} already set; kept existing value",
                "-".dimmed(),
                args.key.yellow()
            );
        }
        OutputFormat::Text => {
            let state = if written { "written" } else { "unchanged" };
            println!("{} {} ({})", "✓".green().bold(), args.key.yellow(), state);
        }
    }
    Ok(())
}

fn cmd_contains(store: &JsonStore, key: &str, format: OutputFormat) -> anyhow::Result<()> {
    let present = store.contains(key);
    match format {
        OutputFormat::Json => println!("{present}"),
        OutputFormat::Text if present => println!("{} {}", "✓".green(), key),
        OutputFormat::Text => println!("{} {}", "✗".red(), key),
    }
    Ok(())
}

fn cmd_keys(store: &JsonStore, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let keys: Vec<&str> = store.keys().collect();
            println!("{}", serde_json::to_string(&keys)?);
        }
        OutputFormat::Text => store.keys().for_each(|k| println!("{k}")),
    }
    Ok(())
}

fn cmd_dump(store: &JsonStore, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(store.entries())?),
        OutputFormat::Text => {
            println!(
                "Store {} ({} keys)",
                store.path().display().to_string().bold(),
                store.len()
            );
            for (k, v) in store.entries() {
                println!("  {} = {}", k.yellow(), v);
            }
        }
    }
    Ok(())
}

fn cmd_hash(store: &JsonStore, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "cache": store.cache_hash(),
                "persisted": store.last_known_hash(),
                "dirty": store.is_dirty(),
            })
        ),
        OutputFormat::Text => {
            println!("cache:     {}", store.cache_hash().cyan());
            println!("persisted: {}", store.last_known_hash().cyan());
        }
    }
    Ok(())
}

async fn cmd_delete(path: &Path) -> anyhow::Result<()> {
    remove_store_file(&FsBackend, path).await?;
    println!("{} Deleted {}", "✓".green().bold(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parse_value_json_or_string() {
        assert_eq!(parse_value("42"), serde_json::json!(42));
        assert_eq!(parse_value(r#"{"a":[1,2]}"#), serde_json::json!({"a": [1, 2]}));
        assert_eq!(parse_value("hello"), Value::String("hello".into()));
        assert_eq!(parse_value("\"quoted\""), Value::String("quoted".into()));
    }

    #[test]
    fn store_flag_overrides_config() {
        let cli = Cli::try_parse_from([
            "stash", "keys", "--store", "a.json", "--config", "missing.toml",
        ])
        .unwrap();
        let config = store_config(&cli).unwrap();
        assert_eq!(config.path, Some(PathBuf::from("a.json")));
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("stash.toml");
        let base_dir = dir.path().display().to_string();
        let toml = format!("base_dir = {base_dir:?}\nfile_name = \"kv.json\"\n");
        std::fs::write(&cfg, toml).unwrap();
        let cli =
            Cli::try_parse_from(["stash", "keys", "--config", cfg.to_str().unwrap()]).unwrap();
        let config = store_config(&cli).unwrap();
        assert_eq!(config.resolve_path().unwrap(), dir.path().join("kv.json"));
    }

    #[test]
    fn missing_config_file_fails() {
        let cli =
            Cli::try_parse_from(["stash", "keys", "--config", "/nonexistent/stash.toml"]).unwrap();
        assert!(store_config(&cli).is_err());
    }

    #[tokio::test]
    async fn set_persists_and_respects_no_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store: JsonStore = Store::open_at(&path).unwrap();

        cmd_set(&mut store, set_args("k", "1", false), OutputFormat::Text)
            .await
            .unwrap();
        let mut keep = set_args("k", "2", false);
        keep.no_override = true;
        cmd_set(&mut store, keep, OutputFormat::Json).await.unwrap();

        let reopened: JsonStore = Store::open_at(&path).unwrap();
        assert_eq!(reopened.get("k"), Some(&serde_json::json!(1)));
    }

    fn set_args(key: &str, value: &str, force: bool) -> SetArgs {
        SetArgs {
            key: key.into(),
            value: value.into(),
            no_override: false,
            force,
        }
    }

    #[tokio::test]
    async fn forced_set_rewrites_unchanged_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store: JsonStore = Store::open_at(&path).unwrap();
        cmd_set(&mut store, set_args("k", "1", false), OutputFormat::Text)
            .await
            .unwrap();

        std::fs::remove_file(&path).unwrap();
        cmd_set(&mut store, set_args("k", "1", false), OutputFormat::Text)
            .await
            .unwrap();
        assert!(!path.exists());
        cmd_set(&mut store, set_args("k", "1", true), OutputFormat::Text)
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn delete_removes_corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        let cli = Cli::try_parse_from(["stash", "delete", "--store", path.to_str().unwrap()])
            .unwrap();

        run_command(cli).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn delete_missing_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = cmd_delete(&path).await.unwrap_err();
        let err = err.downcast::<stash_store::StoreError>().unwrap();
        assert!(err.is_not_found());
    }
}
