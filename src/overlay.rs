use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FeedbackError, FeedbackResult};
use crate::feedback::{Overlay, Panel};

/// Top and bottom overlay images layered over the camera view.
///
/// Assets live at `<assets_dir>/ui_<panel>_<NAME>.png`. When an asset is
/// missing the panel keeps whatever it showed before.
pub struct OverlayPanels {
    assets_dir: PathBuf,
    current: HashMap<Panel, Overlay>,
}

impl OverlayPanels {
    pub fn new<P: AsRef<Path>>(assets_dir: P) -> Self {
        Self {
            assets_dir: assets_dir.as_ref().to_path_buf(),
            current: HashMap::new(),
        }
    }

    pub fn asset_path(&self, panel: Panel, overlay: Overlay) -> PathBuf {
        self.assets_dir
            .join(format!("ui_{}_{}.png", panel.name(), overlay.asset_name()))
    }

    pub fn show(&mut self, panel: Panel, overlay: Overlay) -> FeedbackResult<()> {
        let path = self.asset_path(panel, overlay);
        if !path.is_file() {
            return Err(FeedbackError::AssetMissing(path));
        }
        debug!(panel = panel.name(), asset = %path.display(), "overlay");
        self.current.insert(panel, overlay);
        Ok(())
    }

    #[cfg(test)]
    pub fn current(&self, panel: Panel) -> Option<Overlay> {
        self.current.get(&panel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_asset_path_layout() {
        let panels = OverlayPanels::new("assets");
        assert_eq!(
            panels.asset_path(Panel::Top, Overlay::ResultN(2)),
            PathBuf::from("assets/ui_top_RESULT_2.png")
        );
        assert_eq!(
            panels.asset_path(Panel::Bottom, Overlay::Detecting),
            PathBuf::from("assets/ui_bottom_DETECTING.png")
        );
    }

    #[test]
    fn test_show_existing_asset() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ui_top_SWING.png"), b"png").unwrap();
        let mut panels = OverlayPanels::new(dir.path());

        panels.show(Panel::Top, Overlay::Swing).unwrap();
        assert_eq!(panels.current(Panel::Top), Some(Overlay::Swing));
        assert_eq!(panels.current(Panel::Bottom), None);
    }

    #[test]
    fn test_missing_asset_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ui_top_IDLE.png"), b"png").unwrap();
        let mut panels = OverlayPanels::new(dir.path());
        panels.show(Panel::Top, Overlay::Idle).unwrap();

        let err = panels.show(Panel::Top, Overlay::ResultN(6)).unwrap_err();
        assert!(matches!(err, FeedbackError::AssetMissing(_)));
        assert_eq!(panels.current(Panel::Top), Some(Overlay::Idle));
    }
}
