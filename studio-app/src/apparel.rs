//! Stock garments and listing suggestions.

use crate::publish::Listing;

/// Price of a listing on a garment photo the user supplied.
pub const CUSTOM_GARMENT_PRICE: f64 = 299.0;

/// Longest suggested product name, in characters.
pub const MAX_SUGGESTED_NAME: usize = 50;

/// A colorway of a stock garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApparelColor {
    /// Display name.
    pub name: &'static str,
    /// Hex swatch, `#rrggbb`.
    pub hex: &'static str,
    /// Mockup photo for this color.
    pub mockup_url: &'static str,
}

/// A stock garment with its mockup photo and base price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApparelPreset {
    /// Stable identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Price before customization.
    pub base_price: f64,
    /// Available colors; the first is the default.
    pub colors: &'static [ApparelColor],
}

impl ApparelPreset {
    /// The default color.
    #[must_use]
    pub fn default_color(&self) -> &'static ApparelColor {
        &self.colors[0]
    }
}

const BLACK: &str = "#2d3436";

/// Every stock garment.
pub const PRESETS: &[ApparelPreset] = &[
    ApparelPreset {
        id: "tshirt-woman-long-sleeve",
        name: "Women's T-shirt",
        base_price: 260.0,
        colors: &[ApparelColor {
            name: "Black",
            hex: BLACK,
            mockup_url: "https://i.ibb.co/kStx0g7/woman-long-sleeve.png",
        }],
    },
    ApparelPreset {
        id: "tshirt-man-short-sleeve",
        name: "Men's T-shirt",
        base_price: 250.0,
        colors: &[ApparelColor {
            name: "White",
            hex: "#FFFFFF",
            mockup_url: "https://i.ibb.co/9vVrw0V/man-short-sleeve.png",
        }],
    },
    ApparelPreset {
        id: "tshirt-classic-hanger",
        name: "Classic T-shirt",
        base_price: 240.0,
        colors: &[ApparelColor {
            name: "Black",
            hex: BLACK,
            mockup_url: "https://i.ibb.co/yQG12t5/classic-hanger.png",
        }],
    },
    ApparelPreset {
        id: "tshirt-man-back",
        name: "Back View",
        base_price: 250.0,
        colors: &[ApparelColor {
            name: "Black",
            hex: BLACK,
            mockup_url: "https://i.ibb.co/hK8bYx5/man-back.png",
        }],
    },
    ApparelPreset {
        id: "tshirt-man-long-sleeve",
        name: "Long-sleeve T-shirt",
        base_price: 270.0,
        colors: &[ApparelColor {
            name: "Black",
            hex: BLACK,
            mockup_url: "https://i.ibb.co/N2c7pHD/man-long-sleeve.png",
        }],
    },
];

/// Look up a preset by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static ApparelPreset> {
    PRESETS.iter().find(|preset| preset.id == id)
}

/// The preset selected when the studio opens.
#[must_use]
pub fn default_preset() -> &'static ApparelPreset {
    &PRESETS[2]
}

/// The garment a design sits on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Garment {
    /// A stock garment in one of its colors.
    Preset(&'static ApparelPreset, &'static ApparelColor),
    /// A garment photo uploaded by the user.
    Custom,
}

impl Garment {
    /// A stock garment in its default color.
    #[must_use]
    pub fn preset(preset: &'static ApparelPreset) -> Self {
        Self::Preset(preset, preset.default_color())
    }
}

/// Suggest a listing for a design.
///
/// The name is taken from the generation prompt when there is one, otherwise
/// from the garment. Custom garments sell at [`CUSTOM_GARMENT_PRICE`], stock
/// garments at their base price.
#[must_use]
pub fn suggest_listing(garment: Garment, prompt: Option<&str>) -> Listing {
    let name = match (prompt.map(str::trim).filter(|p| !p.is_empty()), garment) {
        (Some(prompt), _) => format!("T-shirt design: {prompt}")
            .chars()
            .take(MAX_SUGGESTED_NAME)
            .collect(),
        (None, Garment::Custom) => "T-shirt with custom design and photo".to_string(),
        (None, Garment::Preset(preset, _)) => format!("{} with custom design", preset.name),
    };
    let (price, color) = match garment {
        Garment::Custom => (CUSTOM_GARMENT_PRICE, "Custom"),
        Garment::Preset(preset, color) => (preset.base_price, color.name),
    };
    Listing::new(name, price).with_description(format!(
        "A unique design created by one of our creators. Color: {color}."
    ))
}
