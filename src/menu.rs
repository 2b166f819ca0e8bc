//! Right-click context menu. The minimap decides which entries apply; the
//! host renders and positions the menu and reports the chosen command back.

#[cfg(test)]
#[path = "menu_test.rs"]
mod menu_test;

use crate::error::MinimapError;
use crate::host::Viewer;
use crate::viewport::Point;

/// What a menu entry does when chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuCommand {
    OpenSettings,
    /// Create a marker at a content-space point.
    AddMarker(Point),
    EditMarker(String),
    RemoveMarker(String),
    ClearMarkers,
    Fit,
    Synchronize,
    LockGmView,
    UnlockGmView,
    Hide,
}

/// One menu row.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    /// Localization key of the label.
    pub name: &'static str,
    /// Icon class list.
    pub icon: &'static str,
    pub command: MenuCommand,
}

/// A menu to show at a screen position.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub position: Point,
    pub entries: Vec<MenuEntry>,
}

/// Everything the entry conditions look at.
#[derive(Debug, Clone, Copy)]
pub struct MenuContext<'a> {
    pub viewer: &'a Viewer,
    /// Marker under the pointer, if any.
    pub hovered_marker: Option<&'a str>,
    pub marker_count: usize,
    /// Whether the viewer may pan and zoom.
    pub can_navigate: bool,
    pub lock_gm_view: bool,
    /// Content-space point under the pointer, already rounded.
    pub content_point: Point,
}

/// Entries whose condition holds, in display order.
#[must_use]
pub fn entries(ctx: &MenuContext<'_>) -> Vec<MenuEntry> {
    let gm = ctx.viewer.is_gm;
    let settings = ctx.viewer.can_modify_settings;
    let candidates = [
        (settings, "MINIMAP.CONTEXTMENU.SETTINGS", "fas fa-cogs", Some(MenuCommand::OpenSettings)),
        (
            gm && ctx.hovered_marker.is_none(),
            "MINIMAP.CONTEXTMENU.MARKERS.ADD",
            "fa-solid fa-location-dot",
            Some(MenuCommand::AddMarker(ctx.content_point)),
        ),
        (
            gm,
            "MINIMAP.CONTEXTMENU.MARKERS.EDIT",
            "fa-solid fa-location-dot",
            ctx.hovered_marker.map(|id| MenuCommand::EditMarker(id.to_owned())),
        ),
        (
            gm,
            "MINIMAP.CONTEXTMENU.MARKERS.REMOVE",
            "fa-solid fa-trash",
            ctx.hovered_marker.map(|id| MenuCommand::RemoveMarker(id.to_owned())),
        ),
        (gm && ctx.marker_count > 0, "MINIMAP.CONTEXTMENU.MARKERS.CLEAR", "fa-solid fa-circle-minus", Some(MenuCommand::ClearMarkers)),
        (ctx.can_navigate, "MINIMAP.CONTEXTMENU.FIT", "fas fa-frame", Some(MenuCommand::Fit)),
        (gm, "MINIMAP.CONTEXTMENU.SYNCHRONIZE", "fas fa-refresh", Some(MenuCommand::Synchronize)),
        (gm && !ctx.lock_gm_view, "MINIMAP.CONTEXTMENU.LOCKGM", "fas fa-lock", Some(MenuCommand::LockGmView)),
        (gm && ctx.lock_gm_view, "MINIMAP.CONTEXTMENU.UNLOCKGM", "fas fa-lock-open", Some(MenuCommand::UnlockGmView)),
        (settings, "MINIMAP.CONTEXTMENU.HIDE", "fas fa-eye-slash", Some(MenuCommand::Hide)),
    ];

    candidates
        .into_iter()
        .filter_map(|(enabled, name, icon, command)| match (enabled, command) {
            (true, Some(command)) => Some(MenuEntry { name, icon, command }),
            _ => None,
        })
        .collect()
}

/// Build the menu for a right-click at `position`.
///
/// Returns `Ok(None)` when no entry applies, so nothing is shown.
///
/// # Errors
///
/// Returns [`MinimapError::ResourceNotFound`] if the host has no element to
/// mount the menu on.
pub fn open(ctx: &MenuContext<'_>, position: Point, mount_available: bool) -> Result<Option<ContextMenu>, MinimapError> {
    if !mount_available {
        return Err(MinimapError::ResourceNotFound("CONTEXTMENUELEMENTNOTFOUND"));
    }
    let entries = entries(ctx);
    if entries.is_empty() {
        return Ok(None);
    }
    Ok(Some(ContextMenu { position, entries }))
}
