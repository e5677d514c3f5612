use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use svgforge::codegen::component_name;
use svgforge::validator::validate_patch_request;
use svgforge::{Forge, ForgeConfig, ForgeError, ForgeResult, GenerateRequest, PatchRequest};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "svgforge.yaml";

#[derive(Parser)]
#[command(name = "svgforge")]
#[command(about = "Compile SVG mockups to React components and patch the result", long_about = None)]
struct Cli {
    /// Config file (defaults to ./svgforge.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless SVGFORGE_LOG or RUST_LOG say otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a TSX component from an SVG file
    Generate {
        svg: PathBuf,

        /// Component name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Write the component into this directory instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Format::Code)]
        format: Format,
    },
    /// Print the features extracted from an SVG file as JSON
    Features { svg: PathBuf },
    /// Apply a JSON patch request to files on disk
    Patch {
        request: PathBuf,

        /// Directory that op `file` paths are relative to
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Report the result without writing any file
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the active palette as YAML
    Palette,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Code,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_forge(cli.config.as_deref()).and_then(|forge| match &cli.command {
        Commands::Generate {
            svg,
            name,
            out,
            format,
        } => generate(&forge, svg, name.as_deref(), out.as_deref(), *format),
        Commands::Features { svg } => features(&forge, svg),
        Commands::Patch {
            request,
            root,
            dry_run,
        } => patch(&forge, request, root, *dry_run),
        Commands::Palette => palette(&forge),
    });

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            print_error(&e);
            process::exit(2);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = std::env::var("SVGFORGE_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn load_forge(config: Option<&Path>) -> ForgeResult<Forge> {
    let config = match config {
        Some(path) => ForgeConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => ForgeConfig::load(DEFAULT_CONFIG)?,
        None => ForgeConfig::default(),
    };
    Forge::from_config(config)
}

fn read(path: &Path) -> ForgeResult<String> {
    fs::read_to_string(path).map_err(|e| {
        ForgeError::Config(format!("failed to read {}: {}", path.display(), e))
    })
}

fn generate(
    forge: &Forge,
    svg: &Path,
    name: Option<&str>,
    out: Option<&Path>,
    format: Format,
) -> ForgeResult<i32> {
    let markup = read(svg)?;
    let name = match name {
        Some(name) => name.to_string(),
        None => component_name(
            &svg.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
    };

    let response = forge.generate(&GenerateRequest::new(markup, name))?;
    for warning in &response.warnings {
        eprintln!("warning: {}", warning);
    }

    let rendered = match format {
        Format::Code => response.code.clone(),
        Format::Json => serde_json::to_string_pretty(&response)?,
    };

    match out {
        Some(dir) => {
            let file_name = Path::new(&response.file_path)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(format!("{}.tsx", response.plan.name)));
            let target = match format {
                Format::Code => dir.join(file_name),
                Format::Json => dir.join(file_name.with_extension("json")),
            };
            fs::create_dir_all(dir)?;
            fs::write(&target, rendered)?;
            println!("✓ wrote {}", target.display());
        }
        None => print!("{}", rendered),
    }
    Ok(0)
}

fn features(forge: &Forge, svg: &Path) -> ForgeResult<i32> {
    let features = forge.extract_features(&read(svg)?)?;
    println!("{}", serde_json::to_string_pretty(&features)?);
    Ok(0)
}

fn patch(forge: &Forge, request: &Path, root: &Path, dry_run: bool) -> ForgeResult<i32> {
    let request = PatchRequest::from_json(&read(request)?)?;
    validate_patch_request(&request)?;

    let mut files = BTreeMap::new();
    for op in &request.ops {
        let file = op.file().to_string();
        if files.contains_key(&file) {
            continue;
        }
        let path = root.join(file.trim_start_matches('/'));
        match fs::read_to_string(&path) {
            Ok(text) => {
                files.insert(file, text);
            }
            Err(e) => debug!(path = %path.display(), error = %e, "patch target unreadable"),
        }
    }
    let originals = files.clone();

    let result = forge.patch_files(&mut files, &request)?;

    if !dry_run {
        for (file, text) in &files {
            if originals.get(file) != Some(text) {
                let path = root.join(file.trim_start_matches('/'));
                fs::write(&path, text)?;
                println!("✓ patched {}", path.display());
            }
        }
    }
    for error in &result.errors {
        eprintln!("✗ {}", error);
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.success { 0 } else { 1 })
}

fn palette(forge: &Forge) -> ForgeResult<i32> {
    #[derive(serde::Serialize)]
    struct Catalog<'a> {
        entries: &'a [svgforge::PaletteEntry],
    }
    let catalog = Catalog {
        entries: forge.palette().entries(),
    };
    print!("{}", serde_yaml::to_string(&catalog)?);
    Ok(0)
}

fn print_error(error: &ForgeError) {
    match error {
        ForgeError::Parse {
            line,
            column,
            message,
        } => {
            eprintln!("✗ Parse error at line {}, column {}:", line, column);
            eprintln!("    {}", message);
        }
        ForgeError::Validation(problems) => {
            eprintln!("✗ Validation failed:");
            for problem in problems {
                eprintln!("    {}", problem);
            }
        }
        ForgeError::UnsafeMarkup { reason } => {
            eprintln!("✗ Unsafe markup rejected:");
            eprintln!("    {}", reason);
        }
        other => eprintln!("✗ {}", other),
    }
}
