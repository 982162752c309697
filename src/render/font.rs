use embedded_graphics::mono_font::{ascii, iso_8859_1, MonoFont};

use crate::app::Logger;

/// Tried when the configured font is unknown.
pub const SECONDARY_FONT: &str = "6x10";

/// Built-in last resort.
pub static BUILTIN_FONT: &MonoFont<'static> = &ascii::FONT_6X10;

/// Latin-1 mono fonts by `<width>x<height>` name, so `°` renders.
pub fn lookup(name: &str) -> Option<&'static MonoFont<'static>> {
    let font = match name.trim().to_ascii_lowercase().as_str() {
        "4x6" => &iso_8859_1::FONT_4X6,
        "5x7" => &iso_8859_1::FONT_5X7,
        "5x8" => &iso_8859_1::FONT_5X8,
        "6x9" => &iso_8859_1::FONT_6X9,
        "6x10" => &iso_8859_1::FONT_6X10,
        "6x12" => &iso_8859_1::FONT_6X12,
        "6x13" => &iso_8859_1::FONT_6X13,
        "7x13" => &iso_8859_1::FONT_7X13,
        "7x14" => &iso_8859_1::FONT_7X14,
        "8x13" => &iso_8859_1::FONT_8X13,
        "9x15" => &iso_8859_1::FONT_9X15,
        "9x18" => &iso_8859_1::FONT_9X18,
        "10x20" => &iso_8859_1::FONT_10X20,
        _ => return None,
    };
    Some(font)
}

/// Configured font, then `SECONDARY_FONT`, then the built-in font. Never fails.
pub fn load_font(primary: &str, logger: &Logger) -> &'static MonoFont<'static> {
    load_font_chain(primary, SECONDARY_FONT, logger)
}

/// `primary`, then `secondary`, then the built-in font.
pub fn load_font_chain(
    primary: &str,
    secondary: &str,
    logger: &Logger,
) -> &'static MonoFont<'static> {
    if let Some(font) = lookup(primary) {
        return font;
    }
    logger.warn(format!("unknown font '{primary}', trying '{secondary}'"));
    if let Some(font) = lookup(secondary) {
        return font;
    }
    logger.warn(format!("unknown font '{secondary}', using built-in font"));
    BUILTIN_FONT
}

pub fn glyph_height(font: &MonoFont<'_>) -> u32 {
    font.character_size.height
}
