//! Workspace membership classification.
//!
//! Trials run in one of two layouts, selected by the `movableWorkspaces`
//! attribute. Query points arrive in display pixels straight from the input
//! device; workspace centres are in centimetres.

use trialscope_common::screen::ScreenGeometry;

use crate::entities::Workspace;

/// Membership mode for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceLayout {
    /// Workspaces are repositionable discs; a point belongs to a workspace
    /// when it lies within a fixed radius of the centre.
    Movable,

    /// The screen is split into left/right halves with a dead gutter around
    /// the centre seam. Points inside the gutter belong to neither half.
    FixedHalves,
}

impl WorkspaceLayout {
    pub fn for_trial(movable_workspaces: bool) -> Self {
        if movable_workspaces {
            Self::Movable
        } else {
            Self::FixedHalves
        }
    }

    /// Whether the pixel-space point falls inside the given workspace.
    pub fn contains(
        &self,
        screen: &ScreenGeometry,
        workspace: &Workspace,
        x_px: f64,
        y_px: f64,
    ) -> bool {
        match self {
            Self::Movable => {
                let dx = workspace.x - screen.px_to_cm(x_px);
                let dy = workspace.y - screen.px_to_cm(y_px);
                let r = screen.movable_radius_cm();
                dx * dx + dy * dy <= r * r
            }
            Self::FixedHalves => {
                let half_gutter = screen.static_gutter_px * 0.5;
                if screen.on_left_half_cm(workspace.x) {
                    x_px < screen.half_width_px() - half_gutter
                } else {
                    x_px > screen.half_width_px() + half_gutter
                }
            }
        }
    }

    /// First workspace, in creation order, containing the point.
    pub fn classify<'a>(
        &self,
        screen: &ScreenGeometry,
        workspaces: &'a [Workspace],
        x_px: f64,
        y_px: f64,
    ) -> Option<&'a Workspace> {
        workspaces
            .iter()
            .find(|workspace| self.contains(screen, workspace, x_px, y_px))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(participant: &str, x: f64, y: f64) -> Workspace {
        Workspace {
            participant: participant.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn test_movable_membership_is_radial() {
        let screen = ScreenGeometry::default();
        let layout = WorkspaceLayout::Movable;
        // Workspace centred at (100cm, 58cm); radius is 512px ~= 27.5cm.
        let ws = workspace("p1", 100.0, 58.0);
        let centre_px = 100.0 / screen.px_to_cm_factor();
        let y_px = 58.0 / screen.px_to_cm_factor();

        assert!(layout.contains(&screen, &ws, centre_px, y_px));
        let inside_px = centre_px + screen.movable_radius_px - 1.0;
        assert!(layout.contains(&screen, &ws, inside_px, y_px));
        let outside_px = centre_px + screen.movable_radius_px + 1.0;
        assert!(!layout.contains(&screen, &ws, outside_px, y_px));
    }

    #[test]
    fn test_fixed_halves_respects_gutter() {
        let screen = ScreenGeometry::default();
        let layout = WorkspaceLayout::FixedHalves;
        let left = workspace("left", 100.0, 58.0);
        let right = workspace("right", 310.0, 58.0);

        let seam = screen.half_width_px();
        let half_gutter = screen.static_gutter_px * 0.5;

        assert!(layout.contains(&screen, &left, seam - half_gutter - 1.0, 0.0));
        assert!(!layout.contains(&screen, &left, seam - half_gutter, 0.0));
        assert!(layout.contains(&screen, &right, seam + half_gutter + 1.0, 0.0));
        assert!(!layout.contains(&screen, &right, seam + half_gutter, 0.0));

        // Dead centre belongs to neither half.
        let workspaces = [left, right];
        assert!(layout.classify(&screen, &workspaces, seam, 500.0).is_none());
    }

    #[test]
    fn test_classify_first_match_wins() {
        let screen = ScreenGeometry::default();
        let layout = WorkspaceLayout::Movable;
        // Two overlapping workspaces; the earlier-created one claims the point.
        let workspaces = [workspace("a", 100.0, 58.0), workspace("b", 102.0, 58.0)];
        let x_px = 101.0 / screen.px_to_cm_factor();
        let y_px = 58.0 / screen.px_to_cm_factor();
        let hit = layout.classify(&screen, &workspaces, x_px, y_px).unwrap();
        assert_eq!(hit.participant, "a");
    }
}
