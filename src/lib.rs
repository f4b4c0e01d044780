#![warn(clippy::all, rust_2018_idioms)]

mod app;
mod export;
mod render;

pub use app::CaseApp;
pub use render::Bitmap;
use serde::{Deserialize, Serialize};

/// One phone model the shop can print cases for
#[derive(Clone, Copy, Debug)]
pub struct CaseModel {
    /// Stable identifier, e.g. "iphone-13-pro_6.1"
    pub id: &'static str,
    /// Label shown in the model selector
    pub label: &'static str,
    /// Width, Height of the printable area, in pixels
    pub bounds: [u32; 2],
}

/// Printable bounds per supported model
pub const CASE_MODELS: &[CaseModel] = &[
    CaseModel {
        id: "iphone-13-pro_6.1",
        label: "iPhone 13 Pro (6.1\")",
        bounds: [300, 500],
    },
    CaseModel {
        id: "iphone-13-pro-max_6.7",
        label: "iPhone 13 Pro Max (6.7\")",
        bounds: [320, 550],
    },
    CaseModel {
        id: "samsung-galaxy-s22_6.1",
        label: "Samsung Galaxy S22 (6.1\")",
        bounds: [290, 510],
    },
    CaseModel {
        id: "samsung-galaxy-s22-ultra_6.8",
        label: "Samsung Galaxy S22 Ultra (6.8\")",
        bounds: [310, 560],
    },
];

/// Transform applied to the user image before each render
#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
pub struct Placement {
    /// Center of the image on the case surface, in pixels
    pub position: [f32; 2],
    /// Uniform scale factor
    pub scale: f32,
    /// Clockwise rotation about the image center
    /// In degrees
    pub rotation: f32,
}

/// Current design: which case, and where the image sits on it
#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
pub struct Design {
    /// Index into [`CASE_MODELS`]
    pub model: usize,
    pub placement: Placement,
}

impl Design {
    /// Selected model; out-of-range indices (stale persisted state) clamp to the last entry
    pub fn model(&self) -> &'static CaseModel {
        &CASE_MODELS[self.model.min(CASE_MODELS.len() - 1)]
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: [50., 50.],
            scale: 1.,
            rotation: 0.,
        }
    }
}

impl Default for Design {
    fn default() -> Self {
        Self {
            model: 0,
            placement: Placement::default(),
        }
    }
}
