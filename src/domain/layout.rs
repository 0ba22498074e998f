// Responsive layout domain model
use super::widget::WidgetId;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ROW_HEIGHT_PX: u32 = 50;

pub const DEFAULT_ENTRY_WIDTH: u32 = 4;
pub const DEFAULT_ENTRY_HEIGHT: u32 = 6;

/// Viewport-width tier, each with its own independent grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Lg,
    Md,
    Sm,
    Xs,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 4] = [Breakpoint::Lg, Breakpoint::Md, Breakpoint::Sm, Breakpoint::Xs];

    pub fn columns(self) -> u32 {
        match self {
            Breakpoint::Lg => 12,
            Breakpoint::Md => 10,
            Breakpoint::Sm => 6,
            Breakpoint::Xs => 2,
        }
    }

    /// Minimum viewport width in pixels at which this tier applies
    pub fn min_width_px(self) -> u32 {
        match self {
            Breakpoint::Lg => 1024,
            Breakpoint::Md => 768,
            Breakpoint::Sm => 480,
            Breakpoint::Xs => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Breakpoint::Lg => "lg",
            Breakpoint::Md => "md",
            Breakpoint::Sm => "sm",
            Breakpoint::Xs => "xs",
        }
    }

    /// Widest tier whose threshold fits the given viewport width
    pub fn for_width(width_px: u32) -> Breakpoint {
        Self::ALL
            .into_iter()
            .find(|bp| width_px >= bp.min_width_px())
            .unwrap_or(Breakpoint::Xs)
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placement rectangle of one widget on one breakpoint's grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    pub widget_id: WidgetId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl LayoutEntry {
    pub fn new(widget_id: WidgetId, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            widget_id,
            x,
            y,
            w,
            h,
        }
    }

    /// First free row below this entry
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn has_area(&self) -> bool {
        self.w > 0 && self.h > 0
    }
}

/// Column count and threshold of a breakpoint, as handed to the grid engine
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointSpec {
    pub name: Breakpoint,
    pub columns: u32,
    pub min_width_px: u32,
}

pub fn breakpoint_specs() -> Vec<BreakpointSpec> {
    Breakpoint::ALL
        .into_iter()
        .map(|bp| BreakpointSpec {
            name: bp,
            columns: bp.columns(),
            min_width_px: bp.min_width_px(),
        })
        .collect()
}
