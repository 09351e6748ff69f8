use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use globalize_driver::{BundleError, BundleOptions, Bundler, SkipInit, SourceFile, UnresolvedImportPolicy};
use globalize_lexer::{Lexer, Token, TokenKind};

#[derive(Parser)]
#[command(
    name = "globalize",
    version = "0.1.0",
    about = "Bundle ES modules into one script linked through global namespaces",
    long_about = "Compiles ES modules and everything they import into a single script.\nExports are published on `this.<name>` (default exports) and\n`this.<name>Named` (named exports)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle input modules and their imports
    Bundle {
        /// Input module files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write `<output>.map` and link it from the bundle
        #[arg(long, requires = "output")]
        map: bool,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Name of the global namespace object
        #[arg(long)]
        global_name: Option<String>,

        /// Bundle name recorded in the source map (defaults to the output file name)
        #[arg(long)]
        bundle_name: Option<String>,

        /// Leave out namespace initializers
        #[arg(long, value_enum)]
        skip_init: Option<SkipInitArg>,

        /// Use bare variables instead of properties of `this`
        #[arg(long)]
        bare_variable: bool,

        /// Wrap the bundle in a function scope
        #[arg(long)]
        scope_wrapper: bool,

        /// Warn about imports that cannot be loaded instead of failing
        #[arg(long)]
        warn_unresolved: bool,

        /// Rewrite specifiers starting with FROM to start with TO
        #[arg(long = "alias", value_name = "FROM=TO")]
        aliases: Vec<String>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Lex a JavaScript file and show tokens (debug)
    Lex {
        /// Input JavaScript file
        input: PathBuf,

        /// Show token positions
        #[arg(short, long)]
        positions: bool,
    },

    /// Parse a JavaScript file and show its imports and exports (debug)
    Parse {
        /// Input JavaScript file
        input: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SkipInitArg {
    /// Skip both initializers
    All,
    /// Skip only the named-export initializer
    Named,
}

struct BundleArgs {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    map: bool,
    config: Option<PathBuf>,
    global_name: Option<String>,
    bundle_name: Option<String>,
    skip_init: Option<SkipInitArg>,
    bare_variable: bool,
    scope_wrapper: bool,
    warn_unresolved: bool,
    aliases: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bundle {
            inputs,
            output,
            map,
            config,
            global_name,
            bundle_name,
            skip_init,
            bare_variable,
            scope_wrapper,
            warn_unresolved,
            aliases,
            verbose,
        } => {
            init_tracing(verbose);
            bundle_command(BundleArgs {
                inputs,
                output,
                map,
                config,
                global_name,
                bundle_name,
                skip_init,
                bare_variable,
                scope_wrapper,
                warn_unresolved,
                aliases,
            })
        }
        Commands::Lex { input, positions } => lex_command(input, positions),
        Commands::Parse { input } => parse_command(input),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if let Err(err) = builder.try_init() {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}

fn bundle_command(args: BundleArgs) -> ExitCode {
    let options = match build_options(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let mut files = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let path = match absolute(input) {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Error resolving input path {}: {}", input.display(), e);
                return ExitCode::FAILURE;
            }
        };
        match SourceFile::read(path) {
            Ok(file) => files.push(file),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let artifact = match Bundler::new().bundle(&files, &options) {
        Ok(artifact) => artifact,
        Err(err) => {
            report_bundle_error(&err);
            return ExitCode::FAILURE;
        }
    };

    let Some(output) = args.output else {
        println!("{}", artifact.content);
        return ExitCode::SUCCESS;
    };

    let mut content = artifact.content;
    if args.map {
        let map_path = map_path_for(&output);
        if let Err(e) = fs::write(&map_path, &artifact.source_map) {
            eprintln!("Error writing source map {}: {}", map_path.display(), e);
            return ExitCode::FAILURE;
        }
        let map_name = map_path.file_name().unwrap_or_default().to_string_lossy();
        content.push_str(&format!("\n//# sourceMappingURL={}\n", map_name));
    }

    match fs::write(&output, content) {
        Ok(_) => {
            eprintln!("Bundle written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing bundle {}: {}", output.display(), e);
            ExitCode::FAILURE
        }
    }
}

/// Config file first, then command-line flags on top. The output file name
/// names the bundle only when neither sets it.
fn build_options(args: &BundleArgs) -> Result<BundleOptions, String> {
    let (mut options, configured_name) = match &args.config {
        Some(path) => load_config(path)?,
        None => (BundleOptions::default(), false),
    };

    if let Some(name) = &args.global_name {
        options.global_namespace_name = name.clone();
    }
    if let Some(name) = &args.bundle_name {
        options.output_artifact_name = name.clone();
    } else if let Some(name) = args.output.as_deref().and_then(Path::file_name).filter(|_| !configured_name) {
        options.output_artifact_name = name.to_string_lossy().into_owned();
    }
    match args.skip_init {
        Some(SkipInitArg::All) => options.skip_namespace_init = SkipInit::All,
        Some(SkipInitArg::Named) => options.skip_namespace_init = SkipInit::Named,
        None => {}
    }
    if args.bare_variable {
        options.attach_to_global_object = false;
    }
    if args.scope_wrapper {
        options.scope_wrapper = true;
    }
    if args.warn_unresolved {
        options.on_unresolved_import = UnresolvedImportPolicy::Warn;
    }
    for alias in &args.aliases {
        let (from, to) = alias
            .split_once('=')
            .ok_or_else(|| format!("invalid alias '{}', expected FROM=TO", alias))?;
        options.aliases.insert(from.to_string(), to.to_string());
    }

    Ok(options)
}

/// Loads a config file; the flag tells whether it names the bundle.
fn load_config(path: &Path) -> Result<(BundleOptions, bool), String> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let raw: serde_json::Value = serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?;
    let configured_name = raw.get("outputArtifactName").is_some();
    let options = BundleOptions::from_json_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok((options, configured_name))
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn map_path_for(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".map");
    output.with_file_name(name)
}

fn lex_command(input: PathBuf, positions: bool) -> ExitCode {
    let source = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filename = input.to_string_lossy().to_string();
    let tokens = Lexer::new(&source).tokenize();

    println!("Tokens for {}:\n", filename);
    println!("{}", "=".repeat(80));

    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Eof {
            println!("\n{:4} | {:?}", i, token.kind);
            break;
        }

        if positions {
            println!(
                "{:4} | {:20?} | {:?} | {}..{}",
                i, token.kind, token.value, token.span.start, token.span.end
            );
        } else {
            println!("{:4} | {:20?} | {:?}", i, token.kind, token.value);
        }
    }

    println!("{}", "=".repeat(80));
    println!("\nTotal tokens: {}", tokens.len());

    let error_count = tokens.iter().filter(|t| t.kind == TokenKind::Error).count();
    if error_count > 0 {
        println!("\nLexer errors found: {}", error_count);
        report_lexer_errors(&tokens, &filename, &source);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn parse_command(input: PathBuf) -> ExitCode {
    let source = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filename = input.to_string_lossy().to_string();

    match globalize_parser::parse_module(&source) {
        Ok(program) => {
            for item in &program.items {
                println!("{}..{} {:#?}", item.span.start, item.span.end, item.value);
            }
            println!("\nModule specifiers: {:?}", program.sources());
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for err in &errors {
                report_error(
                    "E1000",
                    "Parse error",
                    &err.message,
                    err.span.start,
                    err.span.end,
                    &filename,
                    &source,
                );
            }
            ExitCode::FAILURE
        }
    }
}

// Helper functions

fn report_bundle_error(err: &BundleError) {
    match err {
        BundleError::Compile { file, text, errors } => {
            let filename = file.to_string();
            for e in errors {
                report_error("E1000", "Compile error", &e.message, e.span.start, e.span.end, &filename, text);
            }
        }
        other => eprintln!("error: {}", other),
    }
}

fn report_lexer_errors(tokens: &[Token], filename: &str, source: &str) {
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Error) {
        report_error(
            "E0001",
            "Lexical error",
            &token.value,
            token.span.start,
            token.span.end,
            filename,
            source,
        );
    }
}

fn report_error(code: &str, title: &str, message: &str, start: usize, end: usize, filename: &str, source: &str) {
    let span = (filename, start..end);
    // Spans are byte offsets into the source
    let printed = Report::build(ReportKind::Error, span.clone())
        .with_config(Config::default().with_index_type(IndexType::Byte))
        .with_code(code)
        .with_message(title)
        .with_label(
            Label::new(span)
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)));
    if let Err(e) = printed {
        eprintln!("{}: {} ({})", filename, message, e);
    }
}
