use anyhow::Context;
use clap::Parser;
use meal_story::utils::error::ErrorSeverity;
use meal_story::utils::{logger, validation::Validate};
use meal_story::{
    AppConfig, Authenticator, CliArgs, FileSessionStore, HttpPlatformClient, ImageRenderer,
    MealStoryEngine, NeisMenuFetcher, Publisher, StoryError,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // .env 不存在也沒關係
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.apply_env();

    if config.json_logging() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting meal-story");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    if let Err(e) = run(&args, &config).await {
        tracing::error!(
            "❌ meal-story failed: {} (Severity: {:?})",
            e,
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(args: &CliArgs, config: &AppConfig) -> Result<(), StoryError> {
    config.validate()?;
    let date = args.meal_date()?;
    let slots = args.slots();

    let fetcher = NeisMenuFetcher::new(config)?;
    let renderer = ImageRenderer::new(config);

    let summary = if args.dry_run {
        tracing::info!("🧪 Dry run: images will not be uploaded");
        let engine: MealStoryEngine<_, HttpPlatformClient> =
            MealStoryEngine::dry_run(fetcher, renderer);
        engine.run(&date, &slots).await
    } else {
        let platform = HttpPlatformClient::new(config.publisher.base_url.clone());
        let store = FileSessionStore::new(config.publisher.session_file.clone());
        let state = Authenticator::new(
            &platform,
            &store,
            config.login_credentials().ok(),
            config.login_locale(),
        )
        .authenticate()
        .await?;

        let publisher = Publisher::from_state(platform, state)?;
        MealStoryEngine::new(fetcher, renderer, publisher)
            .run(&date, &slots)
            .await
    };

    for (slot, outcome) in &summary.slots {
        println!("{}: {:?}", slot, outcome);
    }
    Ok(())
}
