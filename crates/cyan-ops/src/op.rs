//! Composite operator catalogue.

use crate::OpsError;
use std::fmt;
use std::str::FromStr;

/// How a layer is combined with what lies beneath it.
///
/// The integer [`code`](Self::code) is what project files store; it never
/// changes for an existing operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositeOp {
    /// Source over backdrop.
    #[default]
    Over,
    /// Over, with pixels kept or dropped at random in proportion to alpha.
    Dissolve,
    /// Premultiplied sum, clamped.
    Plus,
    /// `cs * cb`.
    Multiply,
    /// Hard light with source and backdrop swapped.
    Overlay,
    /// `cs + cb - cs * cb`.
    Screen,
    /// Brighten backdrop to reflect the source.
    ColorDodge,
    /// `cs + cb`, clamped.
    LinearDodge,
    /// Darken backdrop to reflect the source.
    ColorBurn,
    /// `cs + cb - 1`, clamped.
    LinearBurn,
    /// Per-channel maximum.
    Lighten,
    /// Per-channel minimum.
    Darken,
    /// Whole pixel with the higher luminosity.
    LightenIntensity,
    /// Whole pixel with the lower luminosity.
    DarkenIntensity,
    /// W3C soft light.
    SoftLight,
    /// Multiply or screen depending on the source.
    HardLight,
    /// Color burn or dodge depending on the source.
    VividLight,
    /// `2 cs cb + cb^2 (1 - 2 cs)`.
    PegtopLight,
    /// Darken or lighten depending on the source.
    PinLight,
    /// `cb + 2 cs - 1`, clamped.
    LinearLight,
    /// `|cb - cs|`.
    Difference,
    /// Backdrop minus source, clamped.
    MinusSrc,
    /// Backdrop divided by source, clamped.
    DivideSrc,
    /// Hue of the source with saturation and luminosity of the backdrop.
    Hue,
    /// Saturation of the source with hue and luminosity of the backdrop.
    Saturate,
    /// `cs + cb - 2 cs cb`.
    Exclusion,
}

impl CompositeOp {
    /// Every operator, in code order.
    pub const ALL: [CompositeOp; 26] = [
        CompositeOp::Over,
        CompositeOp::Dissolve,
        CompositeOp::Plus,
        CompositeOp::Multiply,
        CompositeOp::Overlay,
        CompositeOp::Screen,
        CompositeOp::ColorDodge,
        CompositeOp::LinearDodge,
        CompositeOp::ColorBurn,
        CompositeOp::LinearBurn,
        CompositeOp::Lighten,
        CompositeOp::Darken,
        CompositeOp::LightenIntensity,
        CompositeOp::DarkenIntensity,
        CompositeOp::SoftLight,
        CompositeOp::HardLight,
        CompositeOp::VividLight,
        CompositeOp::PegtopLight,
        CompositeOp::PinLight,
        CompositeOp::LinearLight,
        CompositeOp::Difference,
        CompositeOp::MinusSrc,
        CompositeOp::DivideSrc,
        CompositeOp::Hue,
        CompositeOp::Saturate,
        CompositeOp::Exclusion,
    ];

    /// Stable integer id.
    pub fn code(self) -> u16 {
        // ALL is in code order
        Self::ALL.iter().position(|&op| op == self).unwrap_or(0) as u16
    }

    /// Operator for a stable id.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Kebab-case name accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            CompositeOp::Over => "over",
            CompositeOp::Dissolve => "dissolve",
            CompositeOp::Plus => "plus",
            CompositeOp::Multiply => "multiply",
            CompositeOp::Overlay => "overlay",
            CompositeOp::Screen => "screen",
            CompositeOp::ColorDodge => "color-dodge",
            CompositeOp::LinearDodge => "linear-dodge",
            CompositeOp::ColorBurn => "color-burn",
            CompositeOp::LinearBurn => "linear-burn",
            CompositeOp::Lighten => "lighten",
            CompositeOp::Darken => "darken",
            CompositeOp::LightenIntensity => "lighten-intensity",
            CompositeOp::DarkenIntensity => "darken-intensity",
            CompositeOp::SoftLight => "soft-light",
            CompositeOp::HardLight => "hard-light",
            CompositeOp::VividLight => "vivid-light",
            CompositeOp::PegtopLight => "pegtop-light",
            CompositeOp::PinLight => "pin-light",
            CompositeOp::LinearLight => "linear-light",
            CompositeOp::Difference => "difference",
            CompositeOp::MinusSrc => "minus-src",
            CompositeOp::DivideSrc => "divide-src",
            CompositeOp::Hue => "hue",
            CompositeOp::Saturate => "saturate",
            CompositeOp::Exclusion => "exclusion",
        }
    }

    /// Menu label.
    pub const fn label(self) -> &'static str {
        match self {
            CompositeOp::Over => "Normal",
            CompositeOp::Dissolve => "Dissolve",
            CompositeOp::Plus => "Plus",
            CompositeOp::Multiply => "Multiply",
            CompositeOp::Overlay => "Overlay",
            CompositeOp::Screen => "Screen",
            CompositeOp::ColorDodge => "Color Dodge",
            CompositeOp::LinearDodge => "Linear Dodge",
            CompositeOp::ColorBurn => "Color Burn",
            CompositeOp::LinearBurn => "Linear Burn",
            CompositeOp::Lighten => "Lighten",
            CompositeOp::Darken => "Darken",
            CompositeOp::LightenIntensity => "Lighten Intensity",
            CompositeOp::DarkenIntensity => "Darken Intensity",
            CompositeOp::SoftLight => "Soft Light",
            CompositeOp::HardLight => "Hard Light",
            CompositeOp::VividLight => "Vivid Light",
            CompositeOp::PegtopLight => "Pegtop Light",
            CompositeOp::PinLight => "Pin Light",
            CompositeOp::LinearLight => "Linear Light",
            CompositeOp::Difference => "Difference",
            CompositeOp::MinusSrc => "Subtract",
            CompositeOp::DivideSrc => "Divide",
            CompositeOp::Hue => "Hue",
            CompositeOp::Saturate => "Saturation",
            CompositeOp::Exclusion => "Exclusion",
        }
    }

    /// True when swapping source and backdrop of two opaque pixels never
    /// changes the result.
    pub const fn is_commutative(self) -> bool {
        matches!(
            self,
            CompositeOp::Plus
                | CompositeOp::Multiply
                | CompositeOp::Screen
                | CompositeOp::LinearDodge
                | CompositeOp::LinearBurn
                | CompositeOp::Lighten
                | CompositeOp::Darken
                | CompositeOp::Difference
                | CompositeOp::Exclusion
        )
    }
}

impl fmt::Display for CompositeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CompositeOp {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        let alias = match key.as_str() {
            "normal" => Some(CompositeOp::Over),
            "subtract" => Some(CompositeOp::MinusSrc),
            "divide" => Some(CompositeOp::DivideSrc),
            "saturation" => Some(CompositeOp::Saturate),
            "add" => Some(CompositeOp::LinearDodge),
            _ => None,
        };
        alias
            .or_else(|| CompositeOp::ALL.into_iter().find(|op| op.name() == key))
            .ok_or_else(|| OpsError::UnknownOperator(s.to_string()))
    }
}
