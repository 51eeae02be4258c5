use anyhow::Result;

mod analysis;
mod app;
mod assistant;
mod backend;
mod config;
mod document;
mod handler;
mod profile;
mod services;
mod tui;
mod ui;

use app::App;
use config::Config;
use services::Services;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|_| Config::new());

    // A configured backend URL switches every capability to HTTP; the
    // default build answers locally with canned responses.
    let services = match config.backend_url.as_deref() {
        Some(url) => Services::remote(url),
        None => Services::simulated(),
    };

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = tui::EventHandler::new();
    let mut app = App::new(config, services, events.sender())?;

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event)?;
        }
    }

    tui::restore()?;

    Ok(())
}
