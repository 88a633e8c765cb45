use bananalens::{
    download, logger, AspectRatio, BatchOrchestrator, Config, EncodedImage, GeminiClient,
    HistoryCache, ImageSize, LensApp, ModelVariant, SessionEvent, SubmitOutcome,
};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bananalens")]
#[command(version, about = "Generate images from a prompt with Gemini image models")]
struct Cli {
    /// What to draw, or how to modify the base image
    prompt: Vec<String>,

    /// Model engine: fast or high-quality
    #[arg(short, long, default_value = "fast")]
    model: ModelVariant,

    /// One of 1:1, 3:4, 4:3, 9:16, 16:9
    #[arg(short = 'r', long, default_value = "1:1")]
    aspect_ratio: AspectRatio,

    /// Output size for the high-quality model: 1K, 2K or 4K
    #[arg(short, long, default_value = "1K")]
    size: ImageSize,

    /// Number of images to generate in parallel
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=4))]
    count: u8,

    /// Base image to edit
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Gallery file [default: $BANANA_LENS_HISTORY or banana_lens_history.json]
    #[arg(long)]
    history: Option<PathBuf>,

    /// Directory the generated images are saved to [default: $BANANA_LENS_OUTPUT or .]
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print the saved gallery and exit
    #[arg(long)]
    list: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Also append log lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Emit log lines as JSON objects
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn logger_config(&self) -> logger::LoggerConfig {
        let mut config = if self.verbose {
            logger::LoggerConfig::verbose()
        } else {
            logger::LoggerConfig::new()
        };
        if self.log_json {
            config = config
                .with_format(logger::LogFormat::Json)
                .with_colors(false);
        }
        if let Some(path) = &self.log_file {
            config = config.with_file(path);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    logger::init(cli.logger_config())?;
    logger::log_startup_info("BananaLens", env!("CARGO_PKG_VERSION"));
    if !dotenv_loaded {
        log::debug!("No .env file found, using process environment");
    }

    let mut config = Config::from_env();
    if let Some(path) = cli.history.clone() {
        config = config.with_history_path(path);
    }
    if let Some(dir) = cli.out.clone() {
        config = config.with_output_dir(dir);
    }
    logger::log_config_info(&config);

    let cache = HistoryCache::from_config(&config);

    if cli.list {
        let history = cache.load().await;
        if history.is_empty() {
            println!("Gallery is empty.");
        }
        for entry in &history {
            println!(
                "{}  {} | {}{}  \"{}\"",
                entry.id,
                entry.aspect_ratio,
                entry.model.label(),
                entry.size.map(|s| format!(" {}", s)).unwrap_or_default(),
                entry.prompt_text
            );
        }
        return Ok(());
    }

    let client = GeminiClient::new(config.gemini.clone())?;
    let app = LensApp::new(BatchOrchestrator::new(client.image().clone()), cache);
    app.load_history().await;

    app.dispatch(SessionEvent::SetPrompt(cli.prompt.join(" ")));
    app.dispatch(SessionEvent::SelectModel(cli.model));
    app.dispatch(SessionEvent::SelectAspectRatio(cli.aspect_ratio));
    app.dispatch(SessionEvent::SelectImageSize(cli.size));
    app.dispatch(SessionEvent::SetBatchSize(cli.count));
    if let Some(path) = &cli.image {
        let image = EncodedImage::from_file(path).await?;
        app.dispatch(SessionEvent::AttachImage(Some(image)));
    }

    let mut updates = app.subscribe();
    let progress = tokio::spawn(async move {
        let mut last = None;
        while updates.changed().await.is_ok() {
            let (generating, message) = {
                let state = updates.borrow();
                (state.is_generating(), state.progress_message())
            };
            if generating && last != Some(message) {
                eprintln!("  {}", message);
                last = Some(message);
            }
        }
    });

    let outcome = app.submit().await;
    progress.abort();

    match outcome {
        SubmitOutcome::Completed(entries) => {
            for entry in &entries {
                let path = download::save_image(&entry.image_url, &entry.id, &config.output_dir)
                    .await?;
                println!("{}", path.display());
            }
            Ok(())
        }
        SubmitOutcome::Failed(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        SubmitOutcome::Ignored => {
            eprintln!("Nothing to generate: the prompt is empty.");
            std::process::exit(2);
        }
    }
}
