//! Interactive shell over a [`FileSystem`]
//!
//! Tokenizes command lines, runs them against one session, and prints the
//! results. `get` and `put` are the only commands that touch the real
//! filesystem: `get` exports a file's content next to the shell's export
//! directory and `put` imports a real file's bytes.

use crate::core::error::{FsError, Result};
use crate::core::filesystem::FileSystem;
use crate::core::session::Session;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const HELP: &str = "\
=== Available Commands ===
pwd                     - Print working directory
cd <path>               - Change directory
ls [path]               - List directory contents
tree [path]             - Show a directory subtree
mkdir <path>            - Create directory (and missing parents)
touch <name>            - Create file
rm <name>               - Remove file or empty directory
rm -r <name>            - Remove directory recursively
cp <source> <dest>      - Copy file or directory
mv <source> <dest>      - Move/rename file or directory
get <file>              - Display file content and export it
put <real> [dir]        - Copy real file into the filesystem
info <path>             - Display file information
defrag                  - Defragment disk
stats                   - Show disk usage
check                   - Verify sector bookkeeping
help                    - Show this help
exit                    - Exit program
==========================";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Pwd,
    Cd(String),
    Ls(Option<String>),
    Tree(Option<String>),
    Mkdir(String),
    Touch(String),
    Rm { name: String, recursive: bool },
    Cp { source: String, dest: String },
    Mv { source: String, dest: String },
    Get(String),
    Put { real: PathBuf, dir: String },
    Info(String),
    Defrag,
    Stats,
    Check,
}

impl Command {
    /// Parse one input line
    ///
    /// Returns `Ok(None)` for a blank line and `Err` with a usage message for
    /// unknown commands or missing arguments.
    pub fn parse(line: &str) -> std::result::Result<Option<Command>, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let arg = |idx: usize, what: &str| -> std::result::Result<String, String> {
            args.get(idx)
                .map(|s| s.to_string())
                .ok_or_else(|| format!("{} requires {}", command, what))
        };

        let parsed = match command {
            "help" => Command::Help,
            "exit" | "quit" => Command::Exit,
            "pwd" => Command::Pwd,
            "cd" => Command::Cd(arg(0, "a path")?),
            "ls" => Command::Ls(args.first().map(|s| s.to_string())),
            "tree" => Command::Tree(args.first().map(|s| s.to_string())),
            "mkdir" => Command::Mkdir(arg(0, "a name")?),
            "touch" => Command::Touch(arg(0, "a filename")?),
            "rm" => match args {
                ["-r", name] => Command::Rm {
                    name: name.to_string(),
                    recursive: true,
                },
                [name, ..] => Command::Rm {
                    name: name.to_string(),
                    recursive: false,
                },
                [] => return Err("rm requires a name".to_string()),
            },
            "cp" | "mv" => {
                if args.len() < 2 {
                    return Err(format!("{} requires source and destination", command));
                }
                let (source, dest) = (args[0].to_string(), args[1].to_string());
                if command == "cp" {
                    Command::Cp { source, dest }
                } else {
                    Command::Mv { source, dest }
                }
            }
            "get" => Command::Get(arg(0, "a filename")?),
            "put" => Command::Put {
                real: PathBuf::from(arg(0, "a real file name")?),
                dir: args.get(1).unwrap_or(&".").to_string(),
            },
            "info" => Command::Info(arg(0, "a filename")?),
            "defrag" => Command::Defrag,
            "stats" => Command::Stats,
            "check" => Command::Check,
            other => {
                return Err(format!(
                    "Unknown command: {}\nType 'help' for available commands",
                    other
                ))
            }
        };
        Ok(Some(parsed))
    }
}

/// Whether the shell loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    fs: FileSystem,
    session: Session,
    export_dir: PathBuf,
}

impl Shell {
    pub fn new(fs: FileSystem) -> Self {
        let session = fs.session();
        Shell {
            fs,
            session,
            export_dir: PathBuf::from("."),
        }
    }

    /// Directory `get` writes exported files into
    pub fn with_export_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn fs(&self) -> &FileSystem {
        &self.fs
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Parse and run one line
    ///
    /// Results go to `out`; usage and operation errors go to `errors` as
    /// `Error: <message>` and the shell keeps going.
    pub fn run_line<W: Write, E: Write>(
        &mut self,
        line: &str,
        out: &mut W,
        errors: &mut E,
    ) -> std::io::Result<Flow> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(usage) => {
                writeln!(errors, "Error: {}", usage)?;
                return Ok(Flow::Continue);
            }
        };

        match self.execute(&command, out) {
            Ok(flow) => Ok(flow),
            Err(FsError::Io(err)) if err.kind() == std::io::ErrorKind::BrokenPipe => Err(err),
            Err(err) => {
                writeln!(errors, "Error: {}", err)?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn execute<W: Write>(&mut self, command: &Command, out: &mut W) -> Result<Flow> {
        debug!("Executing {:?}", command);
        let session = self.session;

        match command {
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Exit => {
                writeln!(out, "Goodbye!")?;
                return Ok(Flow::Exit);
            }
            Command::Pwd => writeln!(out, "{}", self.fs.pwd(&session)?)?,
            Command::Cd(path) => self.fs.cd(&mut self.session, path)?,
            Command::Ls(path) => {
                for entry in self.fs.ls(&session, path.as_deref())? {
                    let suffix = if entry.is_dir { "/" } else { "" };
                    writeln!(out, "{}{}", entry.name, suffix)?;
                }
            }
            Command::Tree(path) => {
                for (depth, entry) in self.fs.walk(&session, path.as_deref().unwrap_or("."))? {
                    let suffix = if entry.is_dir && entry.name != "/" { "/" } else { "" };
                    writeln!(out, "{}{}{}", "  ".repeat(depth), entry.name, suffix)?;
                }
            }
            Command::Mkdir(path) => {
                for id in self.fs.mkdir(&session, path)? {
                    writeln!(out, "Directory created: {}", self.fs.tree().path_of(id)?)?;
                }
            }
            Command::Touch(name) => {
                self.fs.touch(&session, name)?;
                writeln!(out, "File created: {}", name)?;
            }
            Command::Rm { name, recursive } => {
                self.fs.rm(&session, name, *recursive)?;
                let note = if *recursive { " (recursively)" } else { "" };
                writeln!(out, "Removed: {}{}", name, note)?;
            }
            Command::Cp { source, dest } => {
                let copy = self.fs.cp(&session, source, dest)?;
                writeln!(out, "Copied: {} -> {}", source, self.fs.tree().path_of(copy)?)?;
            }
            Command::Mv { source, dest } => {
                let moved = self.fs.mv(&session, source, dest)?;
                writeln!(out, "Moved: {} -> {}", source, self.fs.tree().path_of(moved)?)?;
            }
            Command::Get(path) => {
                let content = self.fs.get(&session, path)?;
                writeln!(out, "{}", String::from_utf8_lossy(&content))?;

                let target = self.export_dir.join(export_name(path));
                std::fs::write(&target, &content)?;
                debug!("Exported {} to {:?}", path, target);
            }
            Command::Put { real, dir } => {
                let name = import_name(real)?;
                let content = std::fs::read(real)?;
                self.fs.put_into(&session, dir, &name, content)?;
                writeln!(
                    out,
                    "File copied from real system: {} -> {}",
                    real.display(),
                    dir
                )?;
            }
            Command::Info(path) => {
                let entry = self.fs.info(&session, path)?;
                writeln!(out, "Name: {}", entry.name)?;
                writeln!(out, "Path: {}", entry.path)?;
                match entry.size {
                    Some(size) => {
                        writeln!(out, "Size: {} bytes", size)?;
                        if !entry.sectors.is_empty() {
                            let sectors: Vec<String> =
                                entry.sectors.iter().map(u64::to_string).collect();
                            writeln!(out, "Sectors: {}", sectors.join(" "))?;
                        }
                    }
                    None => writeln!(out, "Type: Directory")?,
                }
            }
            Command::Defrag => {
                writeln!(out, "Starting disk defragmentation...")?;
                let report = self.fs.defrag()?;
                writeln!(out, "Found {} files", report.files)?;
                writeln!(out, "Defragmentation completed successfully!")?;
                if report.used_sectors > 0 {
                    writeln!(out, "Used sectors: 0 to {}", report.used_sectors - 1)?;
                } else {
                    writeln!(out, "Used sectors: none")?;
                }
                writeln!(out, "Free sectors: {}", report.free_sectors)?;
            }
            Command::Stats => {
                let stats = self.fs.stats();
                writeln!(
                    out,
                    "Sectors: {} total, {} used, {} free ({} bytes each)",
                    stats.total_sectors, stats.used_sectors, stats.free_sectors, stats.sector_size
                )?;
                writeln!(
                    out,
                    "Nodes: {} files, {} directories",
                    stats.files, stats.directories
                )?;
                writeln!(out, "Fragmentation: {:.3}", stats.fragmentation)?;
            }
            Command::Check => {
                let report = self.fs.check()?;
                if report.is_consistent() {
                    writeln!(out, "Filesystem is consistent")?;
                } else {
                    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
                }
            }
        }
        Ok(Flow::Continue)
    }
}

/// Real file name `get` exports to: the last segment of the virtual path
fn export_name(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path)
}

/// Virtual file name `put` imports as: the real file's name
fn import_name(real: &Path) -> Result<String> {
    real.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| FsError::InvalidName(format!("{}", real.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("pwd").unwrap(), Some(Command::Pwd));
        assert_eq!(Command::parse("quit").unwrap(), Some(Command::Exit));
        assert_eq!(Command::parse("ls").unwrap(), Some(Command::Ls(None)));
        assert_eq!(
            Command::parse("  cd   docs  ").unwrap(),
            Some(Command::Cd("docs".to_string()))
        );
    }

    #[test]
    fn test_parse_rm_flags() {
        assert_eq!(
            Command::parse("rm -r dir").unwrap(),
            Some(Command::Rm {
                name: "dir".to_string(),
                recursive: true
            })
        );
        assert_eq!(
            Command::parse("rm file").unwrap(),
            Some(Command::Rm {
                name: "file".to_string(),
                recursive: false
            })
        );
        assert!(Command::parse("rm").is_err());
    }

    #[test]
    fn test_parse_put_default_dir() {
        assert_eq!(
            Command::parse("put notes.txt").unwrap(),
            Some(Command::Put {
                real: PathBuf::from("notes.txt"),
                dir: ".".to_string()
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("cd").unwrap_err(), "cd requires a path");
        assert_eq!(
            Command::parse("cp a").unwrap_err(),
            "cp requires source and destination"
        );
        assert!(Command::parse("format c:")
            .unwrap_err()
            .starts_with("Unknown command: format"));
    }

    #[test]
    fn test_export_name() {
        assert_eq!(export_name("notes.txt"), "notes.txt");
        assert_eq!(export_name("/docs/notes.txt"), "notes.txt");
        assert_eq!(export_name("docs/sub/"), "sub");
    }
}
