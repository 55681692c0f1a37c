use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use subler_tag_config::{Config, LoadOptions};
use subler_tag_core::{
    Atom, Atoms, ExitCode, MediaKind, RunOutput, Subler, SublerCommand, SublerError, Tag,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tag media files with SublerCLI", long_about = None)]
struct Cli {
    /// Media file to tag
    #[arg(
        value_name = "SOURCE",
        required_unless_present_any = ["list_tags", "list_media_kinds"]
    )]
    source: Option<PathBuf>,

    /// Output path (defaults to a numbered sibling of SOURCE)
    #[arg(short = 'd', long = "dest", value_name = "PATH")]
    dest: Option<PathBuf>,

    /// Metadata atom, repeatable (e.g. --tag "Artist=Jane Doe")
    #[arg(short = 't', long = "tag", value_name = "TAG=VALUE", allow_hyphen_values = true)]
    tags: Vec<String>,

    /// Cover art file, shorthand for --tag Artwork=PATH
    #[arg(long = "artwork", value_name = "PATH")]
    artwork: Option<PathBuf>,

    /// Media kind label (e.g. "TV Show"), or "none" to omit it
    #[arg(short = 'k', long = "media-kind", value_name = "KIND")]
    media_kind: Option<String>,

    /// Do not pass -chapterspreview
    #[arg(long = "no-chapters-preview")]
    no_chapters_preview: bool,

    /// Do not pass -optimize
    #[arg(long = "no-optimize")]
    no_optimize: bool,

    /// Do not pass -organizegroups
    #[arg(long = "no-organize-groups")]
    no_organize_groups: bool,

    /// Do not pass -64bitchunk
    #[arg(long = "no-64bit-chunk")]
    no_64bit_chunk: bool,

    /// SublerCLI executable (overrides SUBLER_CLI_PATH and config)
    #[arg(long = "executable", value_name = "PATH")]
    executable: Option<PathBuf>,

    /// Configuration file to layer over .subler-tag.toml
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Reject tags that SublerCLI does not recognise
    #[arg(long = "strict")]
    strict: bool,

    /// Print the command instead of running it
    #[arg(long = "print")]
    print: bool,

    /// Output format for --print
    #[arg(long = "format", value_enum, default_value_t = Format::Plain)]
    format: Format,

    /// Suppress the tagging tool's standard output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// List recognised tag labels and exit
    #[arg(long = "list-tags")]
    list_tags: bool,

    /// List media kind labels and exit
    #[arg(long = "list-media-kinds")]
    list_media_kinds: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Plain,
    Json,
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return usage_exit(&err),
    };
    init_logging(cli.verbose);
    match run(cli) {
        Ok(exit) | Err(exit) => std::process::ExitCode::from(exit as u8),
    }
}

/// Help and version requests succeed; any other parse failure maps to
/// `InvalidArguments` instead of clap's own status 2.
fn usage_exit(err: &clap::Error) -> std::process::ExitCode {
    let _ = err.print();
    let exit = if err.use_stderr() {
        ExitCode::InvalidArguments
    } else {
        ExitCode::Success
    };
    std::process::ExitCode::from(exit as u8)
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();

    if let Err(err) = result {
        eprintln!("Log system initialization failed: {err}");
    }
}

fn run(cli: Cli) -> Result<ExitCode, ExitCode> {
    if cli.list_tags {
        return print_lines(Tag::labels());
    }
    if cli.list_media_kinds {
        return print_lines(MediaKind::labels());
    }

    let config = load_config(&cli)?;
    let subler = build_subler(&cli, &config)?;

    if cli.print {
        return match subler.build_command() {
            Ok(command) => print_command(&command, cli.format),
            Err(err) => Err(report(&err)),
        };
    }

    match subler.run() {
        Ok(output) => {
            handle_success(&cli, &output);
            Ok(ExitCode::Success)
        }
        Err(err) => {
            if let SublerError::ExternalProcess { stdout, stderr, .. } = &err {
                if !cli.quiet {
                    if let Err(io_err) = write_stdout(stdout) {
                        report_io(&io_err);
                    }
                }
                eprint!("{stderr}");
            }
            Err(report(&err))
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, ExitCode> {
    let mut options = LoadOptions::default();
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }

    Config::load(options).map_err(|err| report(&SublerError::Config(err.to_string())))
}

fn build_subler(cli: &Cli, config: &Config) -> Result<Subler, ExitCode> {
    let Some(source) = &cli.source else {
        eprintln!("SOURCE is required");
        return Err(ExitCode::InvalidArguments);
    };

    let atoms = build_atoms(cli, config.strict_tags || cli.strict).map_err(|err| report(&err))?;
    let media_kind = match &cli.media_kind {
        Some(raw) => parse_media_kind(raw).map_err(|err| report(&err))?,
        None => config.media_kind,
    };

    let mut flags = config.flags;
    flags.chapters_preview &= !cli.no_chapters_preview;
    flags.optimize &= !cli.no_optimize;
    flags.organize_groups &= !cli.no_organize_groups;
    flags.chunk_64bit &= !cli.no_64bit_chunk;

    let executable = cli
        .executable
        .clone()
        .unwrap_or_else(|| config.executable.clone());

    let mut subler = Subler::new(source, atoms)
        .flags(flags)
        .media_kind(media_kind)
        .executable(executable);
    if let Some(dest) = &cli.dest {
        subler = subler.dest(dest);
    }
    Ok(subler)
}

fn build_atoms(cli: &Cli, strict: bool) -> Result<Atoms, SublerError> {
    let mut atoms = Atoms::new();
    for raw in &cli.tags {
        atoms.push(parse_tag(raw)?);
    }
    if let Some(path) = &cli.artwork {
        atoms.push(Atom::new(Tag::Artwork, path.to_string_lossy()));
    }

    if let Some(unknown) = atoms.unrecognized().next() {
        if strict {
            return Err(SublerError::InvalidArguments(format!(
                "unrecognised tag '{}' (see --list-tags)",
                unknown.tag()
            )));
        }
        for atom in atoms.unrecognized() {
            warn!(tag = atom.tag(), "tag is not in the recognised table");
        }
    }

    Ok(atoms)
}

fn parse_tag(raw: &str) -> Result<Atom, SublerError> {
    match raw.split_once('=') {
        Some((tag, value)) if !tag.trim().is_empty() => Ok(Atom::new(tag.trim(), value)),
        _ => Err(SublerError::InvalidArguments(format!(
            "expected TAG=VALUE, got '{raw}'"
        ))),
    }
}

fn parse_media_kind(raw: &str) -> Result<Option<MediaKind>, SublerError> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    raw.parse::<MediaKind>().map(Some).map_err(|err| {
        SublerError::InvalidArguments(format!(
            "{err} (expected one of: {})",
            MediaKind::labels().join(", ")
        ))
    })
}

fn print_lines(lines: Vec<&str>) -> Result<ExitCode, ExitCode> {
    let mut text = lines.join("\n");
    text.push('\n');
    write_stdout(&text).map_err(|err| report_io(&err))?;
    Ok(ExitCode::Success)
}

fn print_command(command: &SublerCommand, format: Format) -> Result<ExitCode, ExitCode> {
    let text = match format {
        Format::Plain => format!("{command}\n"),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(command).map_err(|err| {
                eprintln!("Failed to serialise command: {err}");
                ExitCode::Io
            })?;
            json.push('\n');
            json
        }
    };
    write_stdout(&text).map_err(|err| report_io(&err))?;
    Ok(ExitCode::Success)
}

fn handle_success(cli: &Cli, output: &RunOutput) {
    if !output.stderr.is_empty() {
        eprint!("{}", output.stderr);
    }
    if cli.quiet {
        return;
    }
    if let Err(err) = write_stdout(&output.stdout) {
        report_io(&err);
    }
}

fn write_stdout(text: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match handle.write_all(text.as_bytes()).and_then(|_| handle.flush()) {
        Ok(()) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(err).context("Failed to write to stdout"),
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}

fn report(err: &SublerError) -> ExitCode {
    eprintln!("{err}");
    err.exit_code()
}

fn report_io(err: &anyhow::Error) -> ExitCode {
    eprintln!("{err:#}");
    ExitCode::Io
}
