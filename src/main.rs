use anyhow::{Context, Result};
use clap::Parser;
use map2struct::cli::Cli;
use map2struct::commands::Generator;
use map2struct::config::{load_config, load_config_from_path, GenConfig};
use map2struct::module_locator::{GoListProvider, ModuleLocator};
use map2struct::observability::init_logging;
use map2struct::output::{derive_output_path, post_process, write_output};
use map2struct::registry::PackageRegistry;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let input = absolute_input(&cli.input_path())?;
    let input_dir = input
        .parent()
        .map(Path::to_path_buf)
        .context("input file has no parent directory")?;
    let config = resolve_config(&cli, &input_dir)?;

    info!(input = %input.display(), prefix = %config.function_prefix, "generating");

    let provider = GoListProvider::new(&input_dir);
    let locator = ModuleLocator::new(Box::new(provider)).with_goroot(config.goroot.clone());
    let registry = PackageRegistry::new(locator);

    let generated = Generator::new(&registry, &config).generate(&input)?;
    for diagnostic in &generated.report.diagnostics {
        warn!(%diagnostic, "incomplete generation");
    }

    let text = if config.format {
        post_process(&generated.text, &config.formatters)?
    } else {
        generated.text
    };

    if cli.stdout {
        print!("{text}");
        return Ok(());
    }

    let output = derive_output_path(&input, cli.output_path().as_deref(), &config.output_suffix);
    write_output(&output, &text)?;
    info!(
        output = %output.display(),
        functions = generated.report.generated.len(),
        diagnostics = generated.report.diagnostics.len(),
        "done"
    );
    Ok(())
}

fn absolute_input(input: &Path) -> Result<PathBuf> {
    if input.is_absolute() {
        return Ok(input.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    Ok(cwd.join(input))
}

/// Explicit `--config` must load; otherwise search upwards from the input.
/// Command-line flags win over file values.
fn resolve_config(cli: &Cli, input_dir: &Path) -> Result<GenConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => load_config(input_dir),
    };
    if let Some(prefix) = &cli.prefix {
        config.function_prefix = prefix.clone();
    }
    if cli.no_format {
        config.format = false;
    }
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}
