use bundle_js::BuildConfig;
use bundle_js::BuildError;
use bundle_js::BuildErrorKind;
use bundle_js::BuildOptions;
use bundle_js::BuildOutput;
use bundle_js::Builder;
use bundle_js::NameStyle;
use clap::Parser;
use clap::ValueEnum;
use serde_json::json;
use std::fs;
use std::io::stdout;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use tempfile::NamedTempFile;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
  name = "bundle-js",
  about = "Bundle a graph of JavaScript modules into one program"
)]
struct Cli {
  /// Entry point: a `.js` file, or a module name looked up in the search paths.
  entry: String,

  /// Bundle destination; omit for stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Stylesheet destination; extracted styles are dropped when omitted.
  #[arg(long)]
  css: Option<PathBuf>,

  /// Write a source map of the bundle to this file.
  #[arg(long)]
  source_map: Option<PathBuf>,

  /// Write the page generated from the `index.html` template to this file.
  #[arg(long)]
  html: Option<PathBuf>,

  /// Append the source map to the bundle as a data URL comment.
  #[arg(long)]
  inline_source_map: bool,

  /// Rename identifiers to short names.
  #[arg(short, long)]
  minify: bool,

  /// Emit only the entry module, expecting its dependencies to be loaded separately.
  #[arg(long)]
  standalone: bool,

  /// Directory searched for named modules; may be repeated.
  #[arg(short = 'I', long = "search-path", value_name = "DIR")]
  search_paths: Vec<PathBuf>,

  /// Directory searched after the search paths.
  #[arg(long)]
  resource_dir: Option<PathBuf>,

  /// Prefer `name.<PLATFORM>.js` variants of source files.
  #[arg(long)]
  platform: Option<String>,

  /// Naming scheme of unminified output.
  #[arg(long, value_enum)]
  naming: Option<NamingArg>,

  /// JSON build configuration; command line flags take precedence.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Print a JSON report instead of human readable messages.
  #[arg(long)]
  json: bool,

  /// On failure, also write an HTML page describing the error to this file.
  #[arg(long)]
  error_html: Option<PathBuf>,

  /// Emit JSON tracing events and spans to stderr at debug level.
  #[arg(long)]
  trace: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NamingArg {
  Short,
  Long,
}

fn init_tracing(trace: bool) {
  if trace {
    let _ = tracing_subscriber::fmt()
      .with_span_events(FmtSpan::CLOSE)
      .with_max_level(Level::DEBUG)
      .with_writer(std::io::stderr)
      .json()
      .with_ansi(false)
      .try_init();
    return;
  }
  if let Ok(filter) = EnvFilter::try_from_default_env() {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .try_init();
  }
}

fn config(args: &Cli) -> Result<BuildConfig, BuildError> {
  let mut config = match &args.config {
    Some(path) => BuildConfig::load(path)?,
    None => BuildConfig::default(),
  };
  config.search_paths.extend(args.search_paths.iter().cloned());
  if config.search_paths.is_empty() && config.resource_dir.is_none() {
    config.search_paths.push(PathBuf::from("."));
  }
  if let Some(dir) = &args.resource_dir {
    config.resource_dir = Some(dir.clone());
  }
  if let Some(platform) = &args.platform {
    config.platform = Some(platform.clone());
  }
  if let Some(naming) = args.naming {
    config.naming = match naming {
      NamingArg::Short => NameStyle::Short,
      NamingArg::Long => NameStyle::Long,
    };
  }
  config.source_map |= args.source_map.is_some();
  config.inline_source_map |= args.inline_source_map;
  Ok(config)
}

fn write_error(path: &Path, err: &std::io::Error) -> BuildError {
  BuildError::new(
    BuildErrorKind::Io,
    path,
    format!("failed to write {}: {err}", path.display()),
  )
}

/// Writes `text` to a temporary file in the destination's directory.
fn stage(path: &Path, text: &str) -> Result<NamedTempFile, BuildError> {
  let dir = match path.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => dir,
    _ => Path::new("."),
  };
  let mut file = NamedTempFile::new_in(dir).map_err(|err| write_error(path, &err))?;
  file
    .write_all(text.as_bytes())
    .and_then(|_| file.flush())
    .map_err(|err| write_error(path, &err))?;
  Ok(file)
}

/// Nothing is moved into place until every output has been staged.
fn write_outputs(args: &Cli, output: &BuildOutput) -> Result<(), BuildError> {
  let mut files: Vec<(&Path, String)> = Vec::new();
  if let Some(path) = &args.output {
    files.push((path, output.js.clone()));
  }
  if let Some(path) = &args.css {
    files.push((path, output.css.clone()));
  }
  if let (Some(path), Some(map)) = (&args.source_map, &output.source_map) {
    files.push((path, map.to_json()));
  }
  if let Some(path) = &args.html {
    let Some(html) = &output.html else {
      return Err(BuildError::new(
        BuildErrorKind::Io,
        path,
        "no index.html template found in the search paths",
      ));
    };
    files.push((path, html.clone()));
  }

  let mut staged = Vec::with_capacity(files.len());
  for (path, text) in files.iter() {
    staged.push((*path, stage(path, text)?));
  }
  for (path, file) in staged {
    file
      .persist(path)
      .map_err(|err| write_error(path, &err.error))?;
  }
  Ok(())
}

fn run(args: &Cli) -> Result<BuildOutput, BuildError> {
  let builder = Builder::new(config(args)?);
  let output = builder.build_with_options(
    &args.entry,
    &BuildOptions {
      minify: args.minify,
      standalone: args.standalone,
    },
  )?;
  write_outputs(args, &output)?;
  Ok(output)
}

fn report_failure(args: &Cli, err: &BuildError) -> ExitCode {
  if let Some(path) = &args.error_html {
    if let Err(write_err) = fs::write(path, err.render_html()) {
      eprintln!("failed to write {}: {write_err}", path.display());
    }
  }
  if args.json {
    println!(
      "{}",
      json!({
        "schema_version": 1,
        "entry": args.entry,
        "error": err,
      })
    );
  } else {
    eprintln!("{}", err.render());
  }
  ExitCode::from(1)
}

fn main() -> ExitCode {
  let args = Cli::parse();
  init_tracing(args.trace);
  let output = match run(&args) {
    Ok(output) => output,
    Err(err) => return report_failure(&args, &err),
  };

  if args.json {
    let mut report = json!({
      "schema_version": 1,
      "entry": args.entry,
      "export": output.export,
      "css": output.css,
      "warnings": output.warnings,
    });
    if args.output.is_none() {
      report["js"] = json!(output.js);
    }
    println!("{report}");
    return ExitCode::SUCCESS;
  }

  for warning in output.warnings.iter() {
    eprintln!("{warning}");
  }
  if args.output.is_none() {
    let mut out = stdout();
    if let Err(err) = out.write_all(output.js.as_bytes()).and_then(|_| out.flush()) {
      eprintln!("failed to write output: {err}");
      return ExitCode::from(1);
    }
  }
  ExitCode::SUCCESS
}
