//! Build helpers for bucketeer.
//!
//! ```text
//! cargo xtask man [--out DIR]
//! cargo xtask completions [--out DIR]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "xtask", about = "Development tasks for bucketeer")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate man pages for the CLI and every subcommand
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/completions")]
        out: PathBuf,
    },
}

fn main() -> std::io::Result<()> {
    match Xtask::parse().task {
        Task::Man { out } => man(&out),
        Task::Completions { out } => completions(&out),
    }
}

fn man(out: &Path) -> std::io::Result<()> {
    fs::create_dir_all(out)?;
    let cmd = bucketeer::command();
    clap_mangen::generate_to(cmd, out)?;
    println!("man pages written to {}", out.display());
    Ok(())
}

fn completions(out: &Path) -> std::io::Result<()> {
    fs::create_dir_all(out)?;
    let mut cmd = bucketeer::command();
    for shell in Shell::value_variants() {
        let path = clap_complete::generate_to(*shell, &mut cmd, "bucketeer", out)?;
        println!("{shell} completions written to {}", path.display());
    }
    Ok(())
}
