mod app;
mod components;
mod logging;
mod storage;
mod ui;

use color_eyre::Result;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
};
use std::io::stdout;

fn main() -> Result<()> {
    color_eyre::install()?;
    let data_dir = storage::default_data_dir()?;
    let _log_guard = logging::init(&data_dir.join("logs"))?;
    tracing::info!(data_dir = %data_dir.display(), "starting chain-messenger");

    let app = app::App::new(data_dir)?;
    let terminal = ratatui::init();
    execute!(stdout(), EnableBracketedPaste)?;
    let result = app.run(terminal);
    let _ = execute!(stdout(), DisableBracketedPaste);
    ratatui::restore();
    if let Err(err) = &result {
        tracing::error!(?err, "chain-messenger exited with an error");
    }
    result
}
