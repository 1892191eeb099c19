use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use yaml_bridge::{DecodeOptions, EncodeOptions, Indent};

#[derive(Parser, Debug)]
#[command(name = "yaml-bridge", version, about = "YAML <-> JSON converter")]
struct Args {
    /// Input file path (.json, .yaml or .yml). Omit or use '-' to read from stdin.
    input: Option<String>,

    /// Output file path (prints to stdout if omitted).
    #[arg(short, long, value_name = "file")]
    output: Option<String>,

    /// Convert YAML input to JSON (overrides auto-detection).
    #[arg(short = 'j', long = "to-json", conflicts_with = "to_yaml")]
    to_json: bool,

    /// Convert JSON input to YAML (overrides auto-detection).
    #[arg(short = 'y', long = "to-yaml")]
    to_yaml: bool,

    /// Indentation size for YAML output and pretty JSON (default: 2).
    #[arg(long, value_name = "number", default_value_t = 2)]
    indent: usize,

    /// Reject duplicate mapping keys when reading YAML.
    #[arg(long)]
    strict: bool,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    ToJson,
    ToYaml,
}

#[derive(Debug)]
enum InputSource {
    Stdin,
    File(String),
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("ERROR  {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let (input_text, input_source) = read_input(args.input.as_deref())?;
    let mode = resolve_mode(&args, &input_source)?;
    tracing::debug!(?mode, ?input_source, "converting");

    let output = match mode {
        Mode::ToJson => to_json(&args, &input_text)?,
        Mode::ToYaml => to_yaml(&args, &input_text)?,
    };

    let output_target = OutputTarget::from_arg(args.output.as_deref());
    write_output(output_target.path(), output.as_bytes())?;
    if let OutputTarget::File(path) = &output_target {
        report_status(mode, &input_source, path);
    }
    Ok(())
}

fn to_json(args: &Args, input: &str) -> Result<String, Box<dyn Error>> {
    let options = DecodeOptions::new().with_strict(args.strict);
    let value = yaml_bridge::yaml_to_json_value(input, &options)?;
    let mut out = if args.pretty {
        pretty_json(&value, args.indent)?
    } else {
        serde_json::to_string(&value)?
    };
    out.push('\n');
    Ok(out)
}

fn to_yaml(args: &Args, input: &str) -> Result<String, Box<dyn Error>> {
    let options = EncodeOptions::new().with_indent(Indent::spaces(args.indent));
    Ok(yaml_bridge::json_to_yaml_with_options(input, &options)?)
}

fn resolve_mode(args: &Args, input_source: &InputSource) -> Result<Mode, Box<dyn Error>> {
    if args.to_json {
        return Ok(Mode::ToJson);
    }

    if args.to_yaml {
        return Ok(Mode::ToYaml);
    }

    match input_source {
        InputSource::Stdin => Ok(Mode::ToYaml),
        InputSource::File(path) => match Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Ok(Mode::ToYaml),
            Some("yaml" | "yml") => Ok(Mode::ToJson),
            _ => Err("unable to auto-detect mode; use --to-json or --to-yaml".into()),
        },
    }
}

fn read_input(input: Option<&str>) -> Result<(String, InputSource), Box<dyn Error>> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok((buf, InputSource::Stdin))
        }
        Some(path) => {
            let buf = fs::read_to_string(path)?;
            Ok((buf, InputSource::File(path.to_string())))
        }
    }
}

#[derive(Clone, Debug)]
enum OutputTarget {
    Stdout,
    File(String),
}

impl OutputTarget {
    fn from_arg(output: Option<&str>) -> Self {
        match output {
            Some(path) if path != "-" => OutputTarget::File(path.to_string()),
            _ => OutputTarget::Stdout,
        }
    }

    fn path(&self) -> Option<&str> {
        match self {
            OutputTarget::Stdout => None,
            OutputTarget::File(path) => Some(path.as_str()),
        }
    }
}

fn write_output(path: Option<&str>, data: &[u8]) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => fs::write(path, data)?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(data)?;
        }
    }
    Ok(())
}

fn pretty_json(value: &Value, indent: usize) -> Result<String, Box<dyn Error>> {
    let indent_bytes = vec![b' '; indent.max(1)];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent_bytes);
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

fn report_status(mode: Mode, input_source: &InputSource, output_path: &str) {
    let input_label = match input_source {
        InputSource::Stdin => "stdin".to_string(),
        InputSource::File(path) => display_path(path),
    };
    let output_label = display_path(output_path);
    let target = match mode {
        Mode::ToJson => "JSON",
        Mode::ToYaml => "YAML",
    };
    println!("✔ Converted {input_label} → {output_label} ({target})");
}

fn display_path(path: &str) -> String {
    let path = Path::new(path);
    let Ok(cwd) = std::env::current_dir() else {
        return path.to_string_lossy().into_owned();
    };
    match path.strip_prefix(&cwd) {
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
