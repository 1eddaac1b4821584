//! CLI logic for the Quire documentation tool.
//!
//! [`run`] loads the configuration, applies command-line overrides and
//! dispatches the selected [`Command`].

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{fs, path::Path};

use log::info;

use quire::{QuireError, Site, config::AppConfig, source::ContentSource};

/// Run the Quire CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `QuireError` for:
/// - Configuration loading errors
/// - Content loading errors
/// - File I/O errors
/// - Unknown pages requested with `page`
/// - Diagram parse errors from the `diagram` command
pub fn run(args: &Args) -> Result<(), QuireError> {
    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(content) = &args.content {
        app_config = app_config.with_content_dir(content);
    }

    match &args.command {
        Command::Build { out } => {
            if let Some(out) = out {
                app_config = app_config.with_output_dir(out);
            }
            build(&app_config)
        }
        Command::Page { segments, output } => page(&app_config, segments, output.as_deref()),
        Command::List => list(&app_config),
        Command::Diagram { input, output } => {
            quire_diagram::config::initialize(app_config.diagram().engine_config());
            diagram(input, output)
        }
    }
}

/// Runs `future` to completion on a current-thread runtime.
///
/// The runtime is shut down without waiting for blocking work, so a render
/// that outlived its timeout cannot keep the process alive.
fn block_on<F: Future>(future: F) -> Result<F::Output, QuireError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| QuireError::Config(format!("failed to start runtime: {err}")))?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

fn build(app_config: &AppConfig) -> Result<(), QuireError> {
    let out_dir = app_config.build().output_dir();
    info!(
        content:? = app_config.content().dir(),
        out_dir:? = out_dir;
        "Building site"
    );

    let site = Site::from_config(app_config)?;
    let report = block_on(site.build(out_dir))??;

    info!(
        pages = report.pages,
        diagrams = report.diagrams.total(),
        failed = report.diagrams.failed;
        "Site written"
    );
    Ok(())
}

fn page(
    app_config: &AppConfig,
    segments: &[String],
    output: Option<&str>,
) -> Result<(), QuireError> {
    let site = Site::from_config(app_config)?;
    let page = block_on(site.render_path(segments))??;

    match output {
        Some(path) => {
            fs::write(path, page.html()).map_err(|err| QuireError::io(path, err))?;
            info!(slug:% = page.slug(), output_file = path; "Page written");
        }
        None => println!("{}", page.html()),
    }
    Ok(())
}

fn list(app_config: &AppConfig) -> Result<(), QuireError> {
    let site = Site::from_config(app_config)?;
    for document in site.composer().source().list_all() {
        println!(
            "{}\t{}",
            document.slug().url(quire::DOCS_BASE),
            document.title()
        );
    }
    Ok(())
}

fn diagram(input: &str, output: &str) -> Result<(), QuireError> {
    info!(input_path = input, output_path = output; "Rendering diagram");

    let source = fs::read_to_string(input).map_err(|err| QuireError::io(input, err))?;
    let id = Path::new(input)
        .file_stem()
        .map(|stem| format!("diagram-{}", stem.to_string_lossy()))
        .unwrap_or_else(|| "diagram".to_string());

    let svg = quire::render_diagram(&id, &source)?;
    fs::write(output, svg).map_err(|err| QuireError::io(output, err))?;

    info!(output_file = output; "SVG exported successfully");
    Ok(())
}
