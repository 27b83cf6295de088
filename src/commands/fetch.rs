use crate::binance::ExchangeClient;
use crate::config::Settings;
use crate::snapshot::CandleFrame;
use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

/// Downloads the configured kline history for every configured symbol and
/// archives each as a versioned candle frame.
pub fn run(settings: &Settings) -> Result<()> {
    let client = ExchangeClient::new(&settings.data.crypto_api)?;
    for symbol in &settings.symbols.crypto {
        archive(settings, &client, symbol)?;
    }
    Ok(())
}

/// Fetches one symbol and writes its archive, returning the file written.
pub fn archive(settings: &Settings, client: &ExchangeClient, symbol: &str) -> Result<PathBuf> {
    let candles = client
        .fetch_klines(symbol, &settings.data.interval, settings.data.limit)
        .with_context(|| format!("fetching {symbol} klines"))?;

    let path = settings.raw_file(symbol);
    let frame = CandleFrame::new(symbol, &settings.data.interval, candles);
    frame
        .save(&path)
        .with_context(|| format!("archiving {symbol} candles"))?;

    info!(
        "archived {} {} candles for {symbol} to {}",
        frame.rows.len(),
        settings.data.interval,
        path.display()
    );
    Ok(path)
}
