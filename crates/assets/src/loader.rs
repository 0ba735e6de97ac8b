use crate::{AssetError, ModelAsset};
use crossbeam_channel::{Receiver, TryRecvError};
use std::path::{Path, PathBuf};

/// Starts model imports off the frame thread.
pub struct AssetLoader;

impl AssetLoader {
    /// Import `path` on a background thread. The result arrives exactly once
    /// through the returned [`PendingLoad`].
    pub fn spawn(path: impl Into<PathBuf>) -> PendingLoad {
        let path = path.into();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let thread_path = path.clone();
        let spawned = std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let result = ModelAsset::load(&thread_path);
                // The receiver may already be gone if the app shut down.
                let _ = tx.send(result);
            });
        match spawned {
            Ok(_) => tracing::info!(path = %path.display(), "model load started"),
            Err(e) => tracing::error!(path = %path.display(), "could not start loader thread: {e}"),
        }
        PendingLoad { path, receiver: rx }
    }
}

/// An in-flight model import.
#[derive(Debug)]
pub struct PendingLoad {
    path: PathBuf,
    receiver: Receiver<Result<ModelAsset, AssetError>>,
}

impl PendingLoad {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-blocking check for the result.
    pub fn poll(&self) -> Option<Result<ModelAsset, AssetError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(AssetError::LoaderDisconnected(self.path.clone())))
            }
        }
    }

    /// Block until the import finishes.
    pub fn wait(self) -> Result<ModelAsset, AssetError> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(AssetError::LoaderDisconnected(self.path.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;

    #[test]
    fn loads_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("island.glb");
        std::fs::write(&path, fixtures::island_glb()).unwrap();

        let pending = AssetLoader::spawn(&path);
        assert_eq!(pending.path(), path.as_path());
        let model = pending.wait().unwrap();
        assert_eq!(model.name, "island");
    }

    #[test]
    fn invalid_path_reports_an_error() {
        let pending = AssetLoader::spawn("no/such/island.glb");
        let err = pending.wait().unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    fn poll_until_ready(pending: &PendingLoad) -> Result<ModelAsset, AssetError> {
        loop {
            if let Some(r) = pending.poll() {
                return r;
            }
            std::thread::yield_now();
        }
    }

    #[test]
    fn poll_eventually_yields_once() {
        let pending = AssetLoader::spawn("no/such/model.glb");
        let result = poll_until_ready(&pending);
        assert!(matches!(result, Err(AssetError::Io { .. })));
        // The sender is gone after the single message.
        assert!(matches!(
            poll_until_ready(&pending),
            Err(AssetError::LoaderDisconnected(_))
        ));
    }
}
