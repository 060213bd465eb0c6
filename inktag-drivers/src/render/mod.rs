//! Image renderers

pub mod panel;

pub use panel::PanelRenderer;
