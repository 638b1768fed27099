// File: ./src/cli.rs
//! Command-line parsing and help text for the `synchrohnize` binary.
use crate::model::UserRole;
use anyhow::{Context, Result, anyhow, bail};
use std::path::PathBuf;
use std::str::FromStr;

pub fn print_help(binary_name: &str) {
    println!(
        "Synchrohnize v{} - Office hours from pasted text to your calendar",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [OPTIONS] <COMMAND>", binary_name);
    println!();
    println!("COMMANDS:");
    println!("    stream --course <id> [--lines]            Parse stdin, streaming previews to stdout");
    println!("    parse --course <id>                       Parse stdin into a JSON array of entries");
    println!("    preview                                   Render stdin as readable markdown");
    println!("    import --user <id>                        Store a JSON array of entries from stdin");
    println!("    update --user <id> --id <n>               Replace an entry (JSON on stdin), notify students");
    println!("    delete --user <id> --ids <n,n,...>        Delete entries you own");
    println!("    export [--user <id> | --ids <n,n,...>]    Print an iCalendar file");
    println!("           [--data-url]                       ...as a data: URL instead");
    println!("    courses [--user <id>]                     List courses");
    println!("    add-course <code> <title> <instructor>    Create a course");
    println!("    enroll --user <id> --course <id>          Enroll a user in a course");
    println!("           [--email <addr>] [--role <role>]   ...and record their address");
    println!("    unenroll --user <id> --course <id>        Remove an enrollment");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -v, --verbose         Log debug output.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("EXAMPLES:");
    println!("    pbpaste | {} stream --course 3 --lines", binary_name);
    println!("    {} parse --course 3 < syllabus.txt > entries.json", binary_name);
    println!("    {} import --user prof-lee < entries.json", binary_name);
    println!("    {} export --user student-1 > office-hours.ics", binary_name);
    println!();
    println!("The model and mail API keys are read from config.toml, or from");
    println!("OPENAI_API_KEY and SENDGRID_API_KEY when the file leaves them empty.");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stream { course_id: i64, lines: bool },
    Parse { course_id: i64 },
    Preview,
    Import { user_id: String },
    Update { user_id: String, id: i64 },
    Delete { user_id: String, ids: Vec<i64> },
    Export { selection: ExportSelection, data_url: bool },
    Courses { user_id: Option<String> },
    AddCourse { code: String, title: String, instructor: String },
    Enroll { user_id: String, course_id: i64, email: Option<String>, role: UserRole },
    Unenroll { user_id: String, course_id: i64 },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSelection {
    User(String),
    Ids(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub root: Option<PathBuf>,
    pub verbose: bool,
    pub command: Command,
}

/// Collects `--flag value` pairs and bare words of one subcommand.
struct Flags {
    pairs: Vec<(String, String)>,
    switches: Vec<String>,
    positional: Vec<String>,
}

impl Flags {
    const SWITCHES: [&'static str; 2] = ["--lines", "--data-url"];

    fn collect(args: &[String]) -> Result<Self> {
        let mut flags = Flags {
            pairs: Vec::new(),
            switches: Vec::new(),
            positional: Vec::new(),
        };
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if Self::SWITCHES.contains(&arg.as_str()) {
                flags.switches.push(arg.clone());
            } else if arg.starts_with("--") {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("Missing value for {}", arg))?;
                flags.pairs.push((arg.clone(), value.clone()));
            } else {
                flags.positional.push(arg.clone());
            }
        }
        Ok(flags)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| anyhow!("{} is required", name))
    }

    fn id(&self, name: &str) -> Result<i64> {
        let raw = self.require(name)?;
        raw.parse()
            .with_context(|| format!("{} expects a number, got '{}'", name, raw))
    }

    fn has(&self, name: &str) -> bool {
        self.switches.iter().any(|s| s == name)
    }
}

pub fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().with_context(|| format!("'{}' is not an id", s)))
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        bail!("Expected at least one id");
    }
    Ok(ids)
}

/// Parses everything after the binary name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut root = None;
    let mut verbose = false;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-r" | "--root" => {
                let path = iter.next().ok_or_else(|| anyhow!("--root needs a path"))?;
                root = Some(PathBuf::from(path));
            }
            "-v" | "--verbose" => verbose = true,
            _ => rest.push(arg.clone()),
        }
    }

    let Some((name, sub_args)) = rest.split_first() else {
        return Ok(Invocation { root, verbose, command: Command::Help });
    };
    if matches!(name.as_str(), "-h" | "--help" | "help") || sub_args.iter().any(|a| a == "--help" || a == "-h") {
        return Ok(Invocation { root, verbose, command: Command::Help });
    }

    let flags = Flags::collect(sub_args)?;
    let command = match name.as_str() {
        "stream" => Command::Stream {
            course_id: flags.id("--course")?,
            lines: flags.has("--lines"),
        },
        "parse" => Command::Parse {
            course_id: flags.id("--course")?,
        },
        "preview" => Command::Preview,
        "import" => Command::Import {
            user_id: flags.require("--user")?.to_string(),
        },
        "update" => Command::Update {
            user_id: flags.require("--user")?.to_string(),
            id: flags.id("--id")?,
        },
        "delete" => Command::Delete {
            user_id: flags.require("--user")?.to_string(),
            ids: parse_id_list(flags.require("--ids")?)?,
        },
        "export" => {
            let selection = match (flags.get("--user"), flags.get("--ids")) {
                (Some(user), None) => ExportSelection::User(user.to_string()),
                (None, Some(ids)) => ExportSelection::Ids(parse_id_list(ids)?),
                _ => bail!("export needs exactly one of --user or --ids"),
            };
            Command::Export {
                selection,
                data_url: flags.has("--data-url"),
            }
        }
        "courses" => Command::Courses {
            user_id: flags.get("--user").map(str::to_string),
        },
        "add-course" => {
            let [code, title, instructor] = flags.positional.as_slice() else {
                bail!("add-course needs <code> <title> <instructor>");
            };
            Command::AddCourse {
                code: code.clone(),
                title: title.clone(),
                instructor: instructor.clone(),
            }
        }
        "enroll" => Command::Enroll {
            user_id: flags.require("--user")?.to_string(),
            course_id: flags.id("--course")?,
            email: flags.get("--email").map(str::to_string),
            role: match flags.get("--role") {
                Some(r) => UserRole::from_str(r).map_err(|_| anyhow!("Unknown role '{}'", r))?,
                None => UserRole::default(),
            },
        },
        "unenroll" => Command::Unenroll {
            user_id: flags.require("--user")?.to_string(),
            course_id: flags.id("--course")?,
        },
        other => bail!("Unknown command '{}'. Try --help.", other),
    };

    Ok(Invocation {
        root,
        verbose,
        command,
    })
}
