use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::aot::{Generator, Shell};
use clap_complete::generate;

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

const BIN_NAME: &str = "railsync";

impl CompletionShell {
    const fn generator(self) -> Shell {
        match self {
            Self::Bash => Shell::Bash,
            Self::Zsh => Shell::Zsh,
            Self::Fish => Shell::Fish,
        }
    }
}

/// Print the script, or write it to `output_path`.
///
/// A directory target gets the shell's conventional file name, e.g.
/// `railsync.fish` under `~/.config/fish/completions`.
pub fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let script = render_completions(shell);

    let Some(path) = output_path else {
        io::stdout().write_all(&script)?;
        return Ok(());
    };
    let target = completion_target(shell, path);
    std::fs::write(&target, &script)?;
    tracing::debug!("Wrote {shell:?} completions to {}", target.display());
    println!("{}", target.display());
    Ok(())
}

pub fn render_completions(shell: CompletionShell) -> Vec<u8> {
    let mut buffer = Vec::new();
    generate(shell.generator(), &mut Cli::command(), BIN_NAME, &mut buffer);
    buffer
}

fn completion_target(shell: CompletionShell, path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(shell.generator().file_name(BIN_NAME))
    } else {
        path.to_path_buf()
    }
}
