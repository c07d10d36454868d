//! Panel (viewport) geometry configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Fixed geometry of the panel window the backdrop sits behind.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    /// Margin in points between the panel frame and its content region.
    pub margin: f64,

    /// Height in points of the panel's title bar, excluded from the
    /// content region and from brightness sampling.
    pub titlebar_offset: f64,
}
