use std::net::SocketAddr;

use school_calendar::{CalendarConfig, SchoolCalendar, http_api, load_config, logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let addr: SocketAddr = std::env::var("SCHOOL_CALENDAR_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let config = match std::env::var("SCHOOL_CALENDAR_CONFIG") {
        Ok(path) => load_config(path)?,
        Err(_) => CalendarConfig::default(),
    };

    let calendar = SchoolCalendar::generate(config)?;
    tracing::info!(%addr, "school-calendar HTTP API listening");
    http_api::serve(addr, calendar).await?;
    Ok(())
}
