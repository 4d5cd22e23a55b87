use clap::Parser;
use respond_lib::{create_dom_tree, Engine, EngineConfig, FsSheetSource, SharedViewport};
use std::fs;
use std::path::{Path, PathBuf};

const RESPOND_INTRO: &str = r#"
    respond - min/max-width media queries for engines without them
"#;

#[derive(Parser)]
#[command(name = "respond")]
#[command(about = "Apply min/max-width media queries to an HTML document")]
struct Args {
    /// Input HTML file. Linked stylesheets are read relative to it.
    input: PathBuf,

    /// Viewport width in pixels.
    #[arg(short, long, default_value_t = 1024.0)]
    width: f64,

    /// Body client width, used for quirks-mode documents. Defaults to --width.
    #[arg(long)]
    body_width: Option<f64>,

    /// Live query to report, e.g. "(max-width: 600px)". Repeatable.
    #[arg(short, long = "query")]
    queries: Vec<String>,

    /// Minimum milliseconds between resize-triggered passes.
    #[arg(long, default_value_t = respond_lib::config::DEFAULT_THROTTLE_MS)]
    throttle_ms: u64,

    /// Host the page is served from; absolute stylesheet URLs on other hosts
    /// are skipped.
    #[arg(long)]
    host: Option<String>,
}

fn main() {
    env_logger::init();
    eprintln!("{}", RESPOND_INTRO);

    let args: Args = Args::parse();

    let html_content = match fs::read_to_string(&args.input) {
        Ok(html_content) => html_content,
        Err(e) => {
            eprintln!("Error reading HTML file {}: {}", args.input.display(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args, &html_content) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args, html_content: &str) -> Result<(), respond_lib::RespondError> {
    let viewport = SharedViewport::new(args.width);
    if let Some(body_width) = args.body_width {
        viewport.set_body_width(body_width);
    }

    let config = EngineConfig {
        throttle_ms: args.throttle_ms,
        page_host: args.host.clone(),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(create_dom_tree(html_content), viewport).with_config(config);

    let sheet_root = args.input.parent().unwrap_or(Path::new("."));
    engine.update(&mut FsSheetSource::new(sheet_root))?;
    log::info!(
        "{} conditional rule(s) from {} stylesheet block(s)",
        engine.descriptors().len(),
        engine.rules().len()
    );

    for query in &args.queries {
        let list = engine.match_media(query)?;
        eprintln!("{} -> {}", list.media(), list.matches());
    }

    println!("{}", engine.document().to_html());
    Ok(())
}
