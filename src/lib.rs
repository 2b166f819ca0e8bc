//! Miniature map widget for a virtual tabletop host.
//!
//! The crate mirrors a live scene (tokens, tiles, drawings, notes, backdrop,
//! weather, darkness) into a small pan/zoomable frame, or shows a static
//! image instead. It owns the proxies, their paint order, the viewport and
//! the cross-client view sync. The host owns everything else and plugs in
//! through the traits in [`host`]: it feeds document events, pointer input
//! and settings in, draws the paint output, and performs the returned
//! [`minimap::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`minimap`] | Top-level widget and the [`minimap::Action`]s it emits |
//! | [`renderer`] | Scene mirror: reconciliation, deferred loads, paint list |
//! | [`registry`] | One live proxy per mirrored document |
//! | [`sort`] | Paint-order ranking |
//! | [`layers`] | Scene background, foreground, grid and darkness |
//! | [`weather`] | Weather effects and their catalog |
//! | [`sprite`] | Visual proxy node with owned labels |
//! | [`shape`] | Drawing outlines |
//! | [`doc`] | Mirrored document model and update deltas |
//! | [`scene`] | Scene snapshot and update deltas |
//! | [`viewport`] | Pan/zoom state and coordinate conversions |
//! | [`sync`] | View sync messages on the host channel |
//! | [`settings`] | World settings and per-scene overrides |
//! | [`markers`] | GM map markers |
//! | [`frame`] | Frame placement, shape and overlay border |
//! | [`input`] | Pointer events and the drag state machine |
//! | [`menu`] | Context menu entries |
//! | [`host`] | Traits the embedding application implements |
//! | [`error`] | Error types and localization keys |
//! | [`consts`] | Shared limits and defaults |

pub mod consts;
pub mod doc;
pub mod error;
pub mod frame;
pub mod host;
pub mod input;
pub mod layers;
pub mod markers;
pub mod menu;
pub mod minimap;
pub mod registry;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod shape;
pub mod sort;
pub mod sprite;
pub mod sync;
pub mod viewport;
pub mod weather;

#[cfg(test)]
mod test_support;
