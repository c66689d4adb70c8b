//! fclones command-line construction.
//!
//! Translates [`ScanSettings`] into the argument vector for
//! `fclones group`. The command is built separately from running it so the
//! exact invocation can be logged and unit tested.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::FclonesConfig;

use super::ScanSettings;

/// A fully built `fclones group` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FclonesCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl FclonesCommand {
    /// Build the command for a scan.
    #[must_use]
    pub fn build(tool: &FclonesConfig, settings: &ScanSettings) -> Self {
        let mut args: Vec<OsString> = vec!["group".into(), settings.root.clone().into_os_string()];

        args.push("--format".into());
        args.push("json".into());

        args.push("--min".into());
        args.push(settings.min_size_bytes().to_string().into());

        for ext in settings.extension_filters() {
            args.push("--name".into());
            args.push(format!("*.{ext}").into());
        }

        for dir in settings.excluded_dirs() {
            args.push("--exclude".into());
            args.push(exclude_pattern(&dir).into());
        }

        if settings.scan_hidden {
            args.push("--hidden".into());
        }
        if settings.follow_symlinks {
            args.push("--follow-links".into());
        }
        if !tool.respect_ignore_files {
            args.push("--no-ignore".into());
        }

        args.extend(tool.extra_args.iter().map(OsString::from));

        Self {
            program: tool.path.clone(),
            args,
        }
    }

    /// Build the `--version` query for the configured tool.
    #[must_use]
    pub fn version(tool: &FclonesConfig) -> Self {
        Self {
            program: tool.path.clone(),
            args: vec!["--version".into()],
        }
    }

    /// Program that will be executed.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Shell-like rendering for logs and error messages.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Convert into a [`Command`] ready to spawn.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// Glob pattern that excludes a directory by name anywhere, or an absolute
/// directory and everything under it.
fn exclude_pattern(dir: &str) -> String {
    if Path::new(dir).is_absolute() {
        format!("{dir}/**")
    } else {
        format!("**/{dir}/**")
    }
}

fn quote_arg(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    if arg.is_empty() || arg.contains([' ', '*', '"', '\'']) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &FclonesCommand) -> Vec<String> {
        cmd.args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_settings() {
        let tool = FclonesConfig::default();
        let cmd = FclonesCommand::build(&tool, &ScanSettings::for_root("/data"));

        assert_eq!(cmd.program(), Path::new("fclones"));
        assert_eq!(
            args_of(&cmd),
            vec!["group", "/data", "--format", "json", "--min", "1", "--no-ignore"]
        );
    }

    #[test]
    fn test_all_options() {
        let tool = FclonesConfig {
            path: PathBuf::from("/opt/fclones"),
            extra_args: vec!["--threads".to_string(), "4".to_string()],
            respect_ignore_files: true,
        };
        let settings = ScanSettings {
            root: PathBuf::from("/data"),
            min_size_kb: 2,
            extensions: ".txt, pdf".to_string(),
            exclude_dirs: "node_modules,/data/cache".to_string(),
            scan_hidden: true,
            follow_symlinks: true,
        };

        let cmd = FclonesCommand::build(&tool, &settings);
        assert_eq!(cmd.program(), Path::new("/opt/fclones"));
        assert_eq!(
            args_of(&cmd),
            vec![
                "group",
                "/data",
                "--format",
                "json",
                "--min",
                "2048",
                "--name",
                "*.txt",
                "--name",
                "*.pdf",
                "--exclude",
                "**/node_modules/**",
                "--exclude",
                "/data/cache/**",
                "--hidden",
                "--follow-links",
                "--threads",
                "4",
            ]
        );
    }

    #[test]
    fn test_display_quotes_globs_and_spaces() {
        let settings = ScanSettings {
            root: PathBuf::from("/my docs"),
            extensions: "txt".to_string(),
            ..ScanSettings::for_root("/")
        };
        let cmd = FclonesCommand::build(&FclonesConfig::default(), &settings);
        let shown = cmd.display();

        assert!(shown.starts_with("fclones group \"/my docs\""));
        assert!(shown.contains("--name \"*.txt\""));
    }

    #[test]
    fn test_version_query() {
        let cmd = FclonesCommand::version(&FclonesConfig::default());
        assert_eq!(args_of(&cmd), vec!["--version"]);
    }
}
