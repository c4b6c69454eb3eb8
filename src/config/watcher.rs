//! Hot reload of the configuration file.
//!
//! Every modify or create event re-reads and validates the file; only valid
//! configurations reach the server, which swaps them in atomically.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ProxyConfig;

/// Watches one config file and forwards validated reloads.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end the server drains.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Start watching. Reloads stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, updates } = self;
        let reload_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_content_change(&event.kind) => reload(&reload_path, &updates),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    kind.is_modify() || kind.is_create()
}

fn reload(path: &Path, updates: &mpsc::UnboundedSender<ProxyConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                tenants = config.tenants.len(),
                policy = config.rewrite.policy.as_str(),
                "Config file changed, reloading"
            );
            if updates.send(config).is_err() {
                tracing::warn!("Server stopped; dropping config reload");
            }
        }
        Err(e) => tracing::error!(
            path = %path.display(),
            error = %e,
            "Config reload failed; keeping current configuration"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use notify::event::{AccessKind, CreateKind, ModifyKind};

    #[test]
    fn only_content_events_trigger_reload() {
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(!is_content_change(&EventKind::Access(AccessKind::Any)));
    }

    #[test]
    fn reload_forwards_only_valid_files() {
        let dir = std::env::temp_dir().join(format!("preview-proxy-watch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("proxy.toml");
        let (watcher, mut rx) = ConfigWatcher::new(&path);

        std::fs::write(&path, "[upstream]\naddress = \"127.0.0.1:4000\"\n").unwrap();
        reload(&path, &watcher.updates);
        let config = rx.try_recv().unwrap();
        assert_eq!(config.upstream.address, "127.0.0.1:4000");

        std::fs::write(&path, "[[tenants]]\nid = \"Bad Id\"\nname = \"x\"\n").unwrap();
        reload(&path, &watcher.updates);
        assert!(rx.try_recv().is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
