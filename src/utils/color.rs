use eframe::egui::Color32;

pub trait ColorExt {
    fn from_hex(hex: &str) -> Option<Self>
    where
        Self: Sized;
}

impl ColorExt for Color32 {
    fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Color32::from_rgb(r, g, b))
    }
}

/// Colors shared by the form, the drop zone and the notifications.
pub struct Palette;

impl Palette {
    pub const PRIMARY_GLOW: &'static str = "#4f8cff";
    pub const BORDER: &'static str = "#3a3f4b";
    pub const SUCCESS: &'static str = "#2e9e5b";
    pub const DANGER: &'static str = "#d9534f";

    pub fn primary_glow() -> Color32 {
        Self::color(Self::PRIMARY_GLOW)
    }

    pub fn border() -> Color32 {
        Self::color(Self::BORDER)
    }

    pub fn success() -> Color32 {
        Self::color(Self::SUCCESS)
    }

    pub fn danger() -> Color32 {
        Self::color(Self::DANGER)
    }

    fn color(hex: &str) -> Color32 {
        Color32::from_hex(hex).unwrap_or(Color32::GRAY)
    }
}
