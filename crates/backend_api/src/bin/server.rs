use ai_client::AssistantConfig;
use backend_api::{init_tracing, run_server, AppState, StoreRepository};
use database::JsonFileStore;
use std::sync::Arc;
use std::{env, path::PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // settings.json (optional) + .env + HOST/PORT/STORE_PATH/GEMINI_* overrides
    let settings_path = env::var("SETTINGS_PATH").ok().map(PathBuf::from);
    let settings = settings_loader::resolve_settings(settings_path.as_ref())?;

    let crate_root = env::current_dir()?;
    let workspace_root = find_workspace_root().unwrap_or_else(|| crate_root.clone());

    // Resolve against workspace root first (the store lives at workspace level), then crate root.
    let store_path = resolve_with_fallback(&settings.store_path, &[&workspace_root, &crate_root]);

    tracing::info!("Planner API Server");
    tracing::info!("Workspace root: {}", workspace_root.display());
    tracing::info!("Store path (resolved): {}", store_path.display());

    let store = JsonFileStore::open(&store_path)?;

    let assistant = match AssistantConfig::from_env() {
        Ok(config) => match &settings.assistant {
            Some(overrides) => Some(config.with_settings(overrides)?),
            None => Some(config),
        },
        Err(e) => {
            tracing::warn!("Assistant disabled: {:#}", e);
            None
        }
    };

    let state = Arc::new(AppState::new(
        Arc::new(StoreRepository::new(Arc::new(store))),
        assistant,
    ));

    run_server(state, &settings.server.host, settings.server.port).await?;

    Ok(())
}

/// Find the Cargo workspace root by traversing up until a Cargo.toml that contains a [workspace] section.
fn find_workspace_root() -> Option<PathBuf> {
    let mut dir = env::current_dir().ok()?;
    for _ in 0..10 {
        let candidate = dir.join("Cargo.toml");
        if candidate.exists() {
            if let Ok(content) = std::fs::read_to_string(&candidate) {
                if content.contains("[workspace]") {
                    return Some(dir.clone());
                }
            }
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Resolve a raw path string against a list of base directories, returning the first existing match, or the path under the first base.
fn resolve_with_fallback(raw: &str, bases: &[&PathBuf]) -> PathBuf {
    let input = PathBuf::from(raw);
    if input.is_absolute() {
        return input;
    }
    for base in bases {
        let candidate = base.join(&input);
        if candidate.exists() {
            return candidate;
        }
    }
    match bases.first() {
        Some(base) => base.join(input),
        None => input,
    }
}
