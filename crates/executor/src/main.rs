use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};

use common::config::{Settings, Variant};
use common::logger;
use market_data::remote::{BinanceClient, BybitClient, CoinGeckoClient};

use crate::services::telegram_service::format_startup;
use crate::services::{
    IndicatorEvaluator, LeaderboardEvaluator, Notifier, PollingLoop, SymbolEvaluator,
    TelegramService,
};

mod services;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();

    let settings = Settings::from_env().context("invalid configuration")?;
    info!(
        "Bot starting: strategy={} symbols={:?} interval={}s",
        settings.variant,
        settings.symbols,
        settings.check_interval.as_secs()
    );

    let evaluator = build_evaluator(&settings)?;
    let notifier = TelegramService::new(&settings.telegram_token, settings.chat_id);

    match notifier
        .send(&format_startup(settings.variant, &settings.symbols))
        .await
    {
        Ok(()) => info!("Startup message sent"),
        Err(e) => error!("Error sending startup message: {}", e),
    }

    PollingLoop::new(
        settings.symbols.clone(),
        evaluator,
        Box::new(notifier),
        settings.check_interval,
    )
    .run()
    .await;

    info!("Bot stopped.");
    Ok(())
}

fn build_evaluator(settings: &Settings) -> anyhow::Result<Box<dyn SymbolEvaluator>> {
    let evaluator: Box<dyn SymbolEvaluator> = match settings.variant {
        Variant::Crossover => {
            let feed = CoinGeckoClient::new(&settings.coingecko_url, settings.http_timeout)
                .context("failed to build CoinGecko client")?;
            Box::new(IndicatorEvaluator::crossover(Box::new(feed), settings.risk))
        }
        Variant::Confirmed => {
            let feed = BinanceClient::new(&settings.binance_url, settings.http_timeout)
                .context("failed to build Binance client")?;
            Box::new(IndicatorEvaluator::confirmed(Box::new(feed), settings.risk))
        }
        Variant::Leaderboard => {
            let feed = BybitClient::new(&settings.bybit_url, settings.http_timeout)
                .context("failed to build Bybit client")?;
            Box::new(LeaderboardEvaluator::new(Box::new(feed), settings.risk))
        }
    };
    Ok(evaluator)
}
