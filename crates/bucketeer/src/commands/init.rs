//! Init command: write a starter configuration file.

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use bucketeer_core::config::{PROJECT_CONFIG_FILE, user_config_dir};

const STARTER_CONFIG: &str = r#"# bucketeer configuration
#
# Every rule is tried against every path. A path matched by several rules is
# registered once per rule, so the last matching rule decides where it ends up.

# log_level = "info"
# catalog = "bucketeer-catalog.json"

# Create groups that do not exist yet.
allow_group_creation = true

# Remove every empty group (except the default one) after each scan.
prune_empty_buckets = false

# [[rules]]
# pattern = "Assets/Art/*"        # `*` and `?` wildcards; no wildcard means prefix match
# match_kind = "wildcard"         # or "regex"
# group = "Art-%PATH%[2]"         # %PATH%[n] is the n-th `/` segment of the path
# simplify_address = true         # address becomes the file name without extension
# labels = ["art"]
"#;

/// Arguments for the `init` subcommand.
#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Write to the user config directory instead of the current directory
    #[arg(long)]
    pub user: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Serialize)]
struct InitResult {
    path: Utf8PathBuf,
    overwritten: bool,
}

fn target_path(args: &InitArgs, cwd: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    if args.user {
        let dir = user_config_dir().context("could not determine the user config directory")?;
        Ok(dir.join("config.toml"))
    } else {
        Ok(cwd.join(PROJECT_CONFIG_FILE))
    }
}

/// Write a starter config, refusing to clobber an existing one unless forced.
#[instrument(name = "cmd_init", skip_all, fields(user = args.user, force = args.force))]
pub fn cmd_init(args: InitArgs, global_json: bool, cwd: &Utf8Path) -> anyhow::Result<()> {
    let path = target_path(&args, cwd)?;
    debug!(path = %path, "executing init command");

    let exists = path.exists();
    if exists && !args.force {
        bail!("{path} already exists (use --force to overwrite)");
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {parent}"))?;
    }
    std::fs::write(&path, STARTER_CONFIG).with_context(|| format!("failed to write {path}"))?;
    tracing::info!(path = %path, "config written");

    let result = InitResult {
        path,
        overwritten: exists,
    };
    if global_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let verb = if result.overwritten { "Overwrote" } else { "Created" };
        println!("{} {}", verb.green(), result.path.cyan());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketeer_core::config::ConfigLoader;
    use tempfile::TempDir;

    fn tmp_dir() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    #[test]
    fn writes_loadable_config() {
        let (_tmp, dir) = tmp_dir();
        cmd_init(InitArgs::default(), true, &dir).unwrap();

        let file = dir.join(PROJECT_CONFIG_FILE);
        let (config, _) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&file)
            .load()
            .unwrap();
        assert!(config.allow_group_creation);
        assert!(!config.prune_empty_buckets);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let (_tmp, dir) = tmp_dir();
        std::fs::write(dir.join(PROJECT_CONFIG_FILE), "log_level = \"warn\"").unwrap();

        let err = cmd_init(InitArgs::default(), true, &dir).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        let kept = std::fs::read_to_string(dir.join(PROJECT_CONFIG_FILE)).unwrap();
        assert_eq!(kept, "log_level = \"warn\"");
    }

    #[test]
    fn force_overwrites() {
        let (_tmp, dir) = tmp_dir();
        std::fs::write(dir.join(PROJECT_CONFIG_FILE), "old").unwrap();

        let args = InitArgs {
            force: true,
            ..InitArgs::default()
        };
        cmd_init(args, true, &dir).unwrap();
        let written = std::fs::read_to_string(dir.join(PROJECT_CONFIG_FILE)).unwrap();
        assert!(written.contains("allow_group_creation"));
    }
}
