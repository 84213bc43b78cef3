//! resona - play a resonator from the terminal
//!
//! Run with: cargo run -- [elastika|tube]
//!
//! Logs go to stderr; set RUST_LOG (e.g. `RUST_LOG=resona_dsp=debug`) and
//! redirect stderr to a file to see them while the UI owns the terminal.

mod app;
mod ui;

use app::Resona;
use color_eyre::eyre::eyre;
use tracing_subscriber::EnvFilter;
use ui::state::EngineKind;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let arg = std::env::args().nth(1);
    let kind = EngineKind::from_arg(arg.as_deref()).ok_or_else(|| {
        eyre!(
            "unknown engine {:?}, expected `elastika` or `tube`",
            arg.unwrap_or_default()
        )
    })?;

    Resona::new(kind).run()
}
