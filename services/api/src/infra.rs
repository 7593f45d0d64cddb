use metrics_exporter_prometheus::PrometheusHandle;
use preference_sync::config::PreferenceConfig;
use preference_sync::workflows::preferences::{
    ChangeSink, ItemId, PreferenceCommand, PreferenceCsvImporter, PreferenceImportError,
    PreferenceList, PreferenceSession, ReservedBand,
};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seeds from the CSV export when one is given, otherwise starts empty with the band rendered.
pub(crate) fn load_list(
    initial_csv: Option<&Path>,
    min_count: usize,
) -> Result<PreferenceList, PreferenceImportError> {
    match initial_csv {
        Some(path) => PreferenceCsvImporter::from_path(path, min_count),
        None => Ok(PreferenceList::with_band(ReservedBand::new(0, min_count))),
    }
}

pub(crate) fn build_session<S: ChangeSink>(
    list: PreferenceList,
    config: &PreferenceConfig,
    sink: S,
) -> PreferenceSession<S> {
    let session = PreferenceSession::new(list, sink).with_limits(config.limits);
    match config.window {
        Some(window) => session.with_window(window),
        None => session,
    }
}

/// Parses `add:P1`, `remove:P1`, `up:P1`, or `down:P1`.
pub(crate) fn parse_command(raw: &str) -> Result<PreferenceCommand, String> {
    let (verb, item) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("expected '<verb>:<item_id>', got '{raw}'"))?;
    let item = item.trim();
    if item.is_empty() {
        return Err(format!("missing item id in '{raw}'"));
    }
    let item_id = ItemId::new(item);

    match verb.trim().to_ascii_lowercase().as_str() {
        "add" => Ok(PreferenceCommand::Add(item_id)),
        "remove" | "rm" => Ok(PreferenceCommand::Remove(item_id)),
        "up" | "move_up" => Ok(PreferenceCommand::MoveUp(item_id)),
        "down" | "move_down" => Ok(PreferenceCommand::MoveDown(item_id)),
        other => Err(format!(
            "unknown command '{other}' (expected add, remove, up, or down)"
        )),
    }
}
