use std::sync::Arc;

use tracing::{error, info, warn};

use crate::bot::{commands::{commands::BotResult, loader::{CommandLoader, LoadError, LoadReport}, registry::CommandRegistry}, state::def::{AppState, BotError}};

/// What a reload swapped in, and what it had to skip.
#[derive(Debug, Default)]
pub struct ReloadSummary {
    /// Category name and how many commands it now has.
    pub categories: Vec<(String, usize)>,
    pub failures: Vec<String>,
}

impl ReloadSummary {
    pub fn command_count(&self) -> usize {
        self.categories.iter().map(|(_, count)| count).sum()
    }
}

/// Builds the startup registry. A category that collides with one already
/// registered is skipped as a whole.
pub fn registry_from_report(report: LoadReport) -> (CommandRegistry, ReloadSummary) {
    let mut registry = CommandRegistry::new();
    let mut summary = ReloadSummary { failures: report.failures.iter().map(ToString::to_string).collect(), ..Default::default() };

    for (category, definitions) in report.categories {
        let count = definitions.len();
        match registry.replace_category(&category, definitions) {
            Ok(()) => summary.categories.push((category, count)),
            Err(e) => {
                error!("Skipping category `{category}`: {e}");
                summary.failures.push(format!("{category}: {e}"));
            }
        }
    }

    (registry, summary)
}

fn loader(state: &AppState) -> BotResult<Arc<CommandLoader>> {
    state
        .loader
        .clone()
        .ok_or_else(|| BotError::Custom("commands were not loaded from a manifest tree".into()))
}

async fn blocking_load<T, F>(loader: Arc<CommandLoader>, f: F) -> BotResult<T>
where
    T: Send + 'static,
    F: FnOnce(&CommandLoader) -> Result<T, LoadError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || f(&loader))
        .await
        .map_err(|e| BotError::Custom(format!("loader task failed: {e}")))?;
    Ok(result?)
}

/// Re-reads one category from disk and swaps it in. On a collision the
/// registry keeps the old definitions.
pub async fn reload_category(state: Arc<AppState>, category: &str) -> BotResult<ReloadSummary> {
    let category = category.to_lowercase();
    let name = category.clone();
    let (definitions, failures) = blocking_load(loader(&state)?, move |l| l.load_category(&name)).await?;

    let count = definitions.len();
    state.registry.write().await.replace_category(&category, definitions)?;

    for failure in &failures {
        warn!("Reload of `{category}` skipped: {failure}");
    }
    info!("Reloaded category `{category}` ({count} commands)");

    Ok(ReloadSummary { categories: vec![(category, count)], failures: failures.iter().map(ToString::to_string).collect() })
}

/// Re-reads every category and swaps the whole set in at once, so commands
/// may move between categories. Categories gone from disk are dropped. If the
/// new set collides with itself nothing changes.
pub async fn reload_all(state: Arc<AppState>) -> BotResult<ReloadSummary> {
    let report = blocking_load(loader(&state)?, |l| l.load_all()).await?;
    let mut summary = ReloadSummary { failures: report.failures.iter().map(ToString::to_string).collect(), ..Default::default() };

    let mut staged = CommandRegistry::new();
    for (category, definitions) in report.categories {
        let count = definitions.len();
        if let Err(e) = staged.replace_category(&category, definitions) {
            error!("Reload rejected at `{category}`: {e}");
            return Err(e.into());
        }
        summary.categories.push((category, count));
    }

    for failure in &summary.failures {
        warn!("Reload skipped: {failure}");
    }
    *state.registry.write().await = staged;

    info!("Reloaded {} commands in {} categories", summary.command_count(), summary.categories.len());
    Ok(summary)
}
