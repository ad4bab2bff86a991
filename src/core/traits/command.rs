use std::ffi::OsString;
use std::path::Path;

/// Program plus argument vector handed to the spawner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl CommandLine {
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Decides how the executable and its arguments become a command line.
///
/// The capture, timeout and reap logic is shared; implementations only differ
/// in the argv they assemble.
pub trait CommandLineBuilder: std::fmt::Debug + Send + Sync {
    fn build(&self, executable: &Path, args: &[String]) -> CommandLine;
}

/// Runs the executable as is.
#[derive(Clone, Debug, Default)]
pub struct DirectCommand;

impl CommandLineBuilder for DirectCommand {
    fn build(&self, executable: &Path, args: &[String]) -> CommandLine {
        CommandLine {
            program: executable.as_os_str().to_owned(),
            args: args.iter().map(OsString::from).collect(),
        }
    }
}

/// Runs the executable under a trace utility found on `PATH`:
/// `[program, ...flags, executable, ...args]`.
#[derive(Clone, Debug)]
pub struct TracedCommand {
    pub program: String,
    pub flags: Vec<String>,
}

impl TracedCommand {
    pub fn new(program: impl Into<String>, flags: Vec<String>) -> Self {
        Self {
            program: program.into(),
            flags,
        }
    }
}

impl CommandLineBuilder for TracedCommand {
    fn build(&self, executable: &Path, args: &[String]) -> CommandLine {
        let mut argv: Vec<OsString> = self.flags.iter().map(OsString::from).collect();
        argv.push(executable.as_os_str().to_owned());
        argv.extend(args.iter().map(OsString::from));

        CommandLine {
            program: OsString::from(&self.program),
            args: argv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_direct_command_passes_args_through() {
        let line = DirectCommand.build(Path::new("/opt/calc"), &args(&["10", "5", "add"]));

        assert_eq!(line.program, OsString::from("/opt/calc"));
        assert_eq!(line.args, vec!["10", "5", "add"]);
        assert_eq!(line.display(), "/opt/calc 10 5 add");
    }

    #[test]
    fn test_traced_command_prefixes_utility_and_flags() {
        let builder = TracedCommand::new("strace", args(&["-f", "-e", "trace=write"]));

        let line = builder.build(Path::new("./calc"), &args(&["1", "2"]));

        assert_eq!(line.program, OsString::from("strace"));
        assert_eq!(line.args, vec!["-f", "-e", "trace=write", "./calc", "1", "2"]);
    }

    #[test]
    fn test_traced_command_without_flags() {
        let line = TracedCommand::new("ltrace", Vec::new()).build(Path::new("/bin/prog"), &[]);

        assert_eq!(line.display(), "ltrace /bin/prog");
    }
}
