use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use markdown_template_config::{Config, LoadOptions, OutputFormat};
use markdown_template_core::diff::build_unified_diff;
use markdown_template_core::{
    RenderRequest, RequestOptions, SaveRequest, Template, TemplateEngine,
};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MARKDOWN_TEMPLATE_LOG";

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = LoadOptions::default();
    if let Some(path) = cli.config {
        options = options.with_override_path(path);
    }
    let config = Config::load(options)?;
    let mut engine = TemplateEngine::bootstrap(config);

    match cli.command {
        Command::Create(args) => handle_create(&engine, args),
        Command::Templates(args) => handle_templates(&mut engine, args),
        Command::Init => handle_init(&mut engine),
        Command::Render(args) => handle_render(&engine, args),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn handle_create(engine: &TemplateEngine, args: CreateArgs) -> Result<i32> {
    let CreateArgs {
        template,
        output,
        title,
        format,
        enhanced,
        word_count,
        expand,
        dry_run,
    } = args;

    let Some(template) = template else {
        bail!("{}", missing_template_message(engine));
    };

    let config = engine.config();
    let format = format.map(OutputFormat::from).unwrap_or(config.output.format);
    let overrides = RequestOptions {
        word_count,
        expand: expand.then_some(true),
    };
    let options = engine.render_options(Some(&overrides));
    let enhanced = enhanced || config.render.enhanced;

    let document = engine.generate(&template, title.as_deref(), &options, enhanced)?;

    match output {
        Some(path) if dry_run => {
            let rendered = document.render_as(format)?;
            let existing = read_existing(&path)?;
            match build_unified_diff(&existing, &rendered, &path.display().to_string()) {
                Some(diff) => emit(&diff)?,
                None => println!("no changes for {}", path.display()),
            }
        }
        Some(path) => {
            engine.write_document(&document, &path, format)?;
            println!("saved {}", path.display());
        }
        None => emit(&document.render_as(format)?)?,
    }

    if enhanced {
        let stats = document.stats();
        eprintln!(
            "words: {}, lines: {}, characters: {}, reading time: {} min",
            stats.word_count, stats.line_count, stats.character_count, stats.reading_time
        );
    }
    Ok(0)
}

fn handle_templates(engine: &mut TemplateEngine, args: TemplatesArgs) -> Result<i32> {
    let TemplatesArgs { add, remove, .. } = args;

    if let Some(file) = add {
        let path = engine.store_mut().add_from_path(&file)?;
        println!("added template from {} as {}", file.display(), path.display());
        return Ok(0);
    }

    if let Some(name) = remove {
        let removed = engine.store_mut().remove(&name)?;
        println!("removed template '{}'", removed.name);
        return Ok(0);
    }

    let store = engine.store();
    if store.is_empty() {
        eprintln!("no templates found in {}", store.dir().display());
        return Ok(0);
    }
    for name in store.list() {
        match store.get(name).and_then(|template| template.title.as_deref()) {
            Some(title) => println!("{name}\t{title}"),
            None => println!("{name}"),
        }
    }
    Ok(0)
}

fn handle_init(engine: &mut TemplateEngine) -> Result<i32> {
    let templates_dir = engine.config().templates.dir.clone();
    let output_dir = engine.config().output.dir.clone();

    for dir in [&templates_dir, &output_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
        println!("ready {}", dir.display());
    }

    let default = Template::default_article();
    if engine.store().contains(&default.name) {
        println!("kept existing template '{}'", default.name);
    } else {
        let path = engine.store_mut().add_template(&default)?;
        println!("created {}", path.display());
    }
    Ok(0)
}

fn handle_render(engine: &TemplateEngine, args: RenderArgs) -> Result<i32> {
    let RenderArgs {
        request,
        save,
        format,
    } = args;

    let raw = read_request(&request)?;
    let request: RenderRequest =
        serde_json::from_str(&raw).context("render request is not valid JSON")?;
    debug!(template = %request.template_name, "handling render request");

    let response = engine.render(&request)?;
    emit(&serde_json::to_string_pretty(&response)?)?;

    if let Some(filename) = save {
        let path = engine.save(&SaveRequest {
            content: response.content,
            filename,
            format: format.map(OutputFormat::from),
        })?;
        eprintln!("saved {}", path.display());
    }
    Ok(0)
}

fn missing_template_message(engine: &TemplateEngine) -> String {
    let store = engine.store();
    if store.is_empty() {
        format!(
            "no template specified and none found in {} (run `markdown-template init`)",
            store.dir().display()
        )
    } else {
        format!(
            "no template specified; pass --template with one of: {}",
            store.list().join(", ")
        )
    }
}

fn read_request(source: &Path) -> Result<String> {
    if source == Path::new("-") {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read render request from stdin")?;
        return Ok(raw);
    }
    fs::read_to_string(source)
        .with_context(|| format!("failed to read render request {}", source.display()))
}

fn read_existing(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn emit(content: &str) -> Result<()> {
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Render JSON templates into Markdown documents",
    propagate_version = true
)]
struct Cli {
    /// Use this config file on top of the discovered ones
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a document from a stored template
    #[command(alias = "c")]
    Create(CreateArgs),
    /// List, add or remove stored templates
    #[command(alias = "t")]
    Templates(TemplatesArgs),
    /// Create the template and output directories with a starter template
    Init,
    /// Answer a JSON render request
    Render(RenderArgs),
}

#[derive(Args)]
struct CreateArgs {
    /// Template to render
    #[arg(short = 't', long, value_name = "NAME")]
    template: Option<String>,
    /// Write to this file instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Document title (defaults to the template's title)
    #[arg(short = 'T', long)]
    title: Option<String>,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
    /// Append a metadata block and report statistics
    #[arg(long)]
    enhanced: bool,
    /// Fit placeholder paragraphs to this many words
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(usize))]
    word_count: Option<usize>,
    /// Pad short placeholders up to --word-count
    #[arg(long)]
    expand: bool,
    /// Show a diff against the output file instead of writing it
    #[arg(long, requires = "output")]
    dry_run: bool,
}

#[derive(Args)]
struct TemplatesArgs {
    /// List stored templates (default)
    #[arg(short, long, conflicts_with_all = ["add", "remove"])]
    #[allow(unused)]
    list: bool,
    /// Validate and store a template from a JSON file
    #[arg(short, long, value_name = "FILE", conflicts_with = "remove")]
    add: Option<PathBuf>,
    /// Delete a stored template
    #[arg(short, long, value_name = "NAME")]
    remove: Option<String>,
}

#[derive(Args)]
struct RenderArgs {
    /// JSON request file, or `-` for stdin
    #[arg(long, value_name = "FILE")]
    request: PathBuf,
    /// Also save the rendered content under the output directory
    #[arg(long, value_name = "NAME")]
    save: Option<String>,
    /// Format used with --save
    #[arg(long, value_enum, requires = "save")]
    format: Option<FormatValue>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatValue {
    #[value(alias = "md")]
    Markdown,
    Html,
    Json,
}

impl From<FormatValue> for OutputFormat {
    fn from(value: FormatValue) -> Self {
        match value {
            FormatValue::Markdown => OutputFormat::Markdown,
            FormatValue::Html => OutputFormat::Html,
            FormatValue::Json => OutputFormat::Json,
        }
    }
}
