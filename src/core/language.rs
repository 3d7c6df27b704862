//! Language Code Mapping
//!
//! The generation service expects short ISO-639-1-style codes while the
//! wizard stores display names. Single source of truth for the mapping.

/// Canonical table of supported display names and their wire codes.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("Spanish", "es"),
    ("French", "fr"),
    ("German", "de"),
    ("Italian", "it"),
    ("Portuguese", "pt"),
    ("Dutch", "nl"),
    ("Russian", "ru"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Chinese", "zh"),
    ("Hindi", "hi"),
    ("Arabic", "ar"),
    ("Turkish", "tr"),
    ("Indonesian", "id"),
    ("Vietnamese", "vi"),
];

/// Map a display name to its wire code. Unmapped names pass through
/// unchanged so user-entered languages still reach the service.
pub fn language_code(display_name: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(display_name))
        .map(|(_, code)| *code)
        .unwrap_or(display_name)
}
