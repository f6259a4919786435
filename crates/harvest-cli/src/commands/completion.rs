use anyhow::Result;
use clap::Command;
use clap_complete::{Shell, generate};
use std::io::{self, Write};

/// Write the completion script for `shell` to stdout
pub fn execute(shell: Shell, cmd: &mut Command) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_script(shell, cmd, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn write_script<W: Write>(shell: Shell, cmd: &mut Command, out: &mut W) -> Result<()> {
    let bin_name = cmd.get_name().to_string();
    tracing::debug!("Generating {} completions for {}", shell, bin_name);
    generate(shell, cmd, bin_name, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Arg;

    #[test]
    fn test_script_names_every_subcommand() {
        let mut cmd = Command::new("harvest")
            .subcommand(Command::new("emails").arg(Arg::new("url")))
            .subcommand(Command::new("listings"));

        let mut out = Vec::new();
        write_script(Shell::Bash, &mut cmd, &mut out).unwrap();

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("emails"));
        assert!(script.contains("listings"));
        assert!(script.contains("complete -F _harvest"));
    }
}
