use crate::commands::{Command, CommandContext, Reply};
use crate::components::calendar::CalendarHandle;
use crate::components::magic_input::{DisabledOracle, EventOracle, MagicInput};
#[cfg(feature = "gemini")]
use crate::components::magic_input::GeminiOracle;
use crate::components::storage::{EventPersistence, FileKeyValueStore};
use crate::config::Config;
use crate::error::{CalendarResult, Error};
use crate::shutdown;
use rust_i18n::t;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const PROMPT: &str = "> ";

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,rig=warn")),
        )
        // Keep stdout for the calendar itself
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Pick the oracle for magic input
pub fn build_oracle(config: &Config) -> Arc<dyn EventOracle> {
    match config.gemini_api_key.as_deref() {
        #[cfg(feature = "gemini")]
        Some(api_key) => Arc::new(GeminiOracle::new(api_key, &config.gemini_model)),
        #[cfg(not(feature = "gemini"))]
        Some(_) => {
            warn!("Built without the gemini feature, magic input is disabled");
            Arc::new(DisabledOracle)
        }
        None => {
            warn!("GEMINI_API_KEY not set, magic input is disabled");
            Arc::new(DisabledOracle)
        }
    }
}

async fn write_line<W>(output: &mut W, text: &str) -> CalendarResult<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

/// Read commands from `input` until quit, end of input or `shutdown` resolves.
///
/// Notices from background work are printed as they arrive. The calendar
/// actor is shut down before returning.
pub async fn run_repl<R, W, S>(
    mut ctx: CommandContext,
    input: R,
    output: &mut W,
    mut notices: mpsc::Receiver<String>,
    shutdown: S,
) -> CalendarResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    write_line(output, &t!("app_started")).await?;
    if let Reply::Text(month) = ctx.execute(Command::Show).await? {
        write_line(output, &month).await?;
    }

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                let command = match Command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        write_line(output, &t!("command_error", error = e.to_string())).await?;
                        continue;
                    }
                };
                match ctx.execute(command).await {
                    Ok(Reply::Text(text)) => write_line(output, &text).await?,
                    Ok(Reply::Quit) => break,
                    Err(e) => {
                        warn!("Command failed: {:?}", e);
                        write_line(output, &t!("command_error", error = e.to_string())).await?;
                    }
                }
            }
            Some(notice) = notices.recv() => {
                write_line(output, &format!("\n{}", notice)).await?;
            }
            _ = &mut shutdown => {
                info!("Received shutdown signal, stopping calendar...");
                break;
            }
        }
    }

    write_line(output, &t!("goodbye")).await?;
    if let Err(e) = ctx.calendar.shutdown().await {
        error!("Error shutting down calendar actor: {:?}", e);
    } else {
        info!("Calendar actor shut down successfully");
    }
    Ok(())
}

/// Restore the calendar and run the terminal front end
pub async fn start_app(config: Config) -> miette::Result<()> {
    rust_i18n::set_locale(&config.locale);
    info!("Setting locale to {}", config.locale);

    let tz = config.tz()?;
    let kv = Arc::new(FileKeyValueStore::new(config.data_dir.clone()));
    let persistence = EventPersistence::new(kv, config.storage_key.clone());
    info!("Storing events under '{}' in {}", persistence.key(), config.data_dir.display());
    let calendar = CalendarHandle::load(persistence, tz).await;

    let magic = Arc::new(MagicInput::new(build_oracle(&config), tz));
    let (notice_send, notice_recv) = mpsc::channel(16);
    let ctx = CommandContext::new(calendar, magic, config.max_events_per_cell, notice_send);

    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    run_repl(ctx, input, &mut output, notice_recv, shutdown::wait_for_signal()).await?;
    Ok(())
}
