//! Internationalization (i18n) module.
//!
//! Catalogues are embedded JSON documents; keys use dot notation, e.g.
//! `wizard.channel_saved`. Placeholders like `{channel}` are filled by the
//! caller with `str::replace`.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::warn;

/// Language used when a key or locale is missing.
pub const DEFAULT_LOCALE: &str = "en";

/// Locales with a bundled catalogue.
pub const SUPPORTED_LOCALES: &[&str] = &["en", "uz"];

/// Global translation store: LangCode -> Key -> Text
static TRANSLATIONS: OnceLock<HashMap<String, Value>> = OnceLock::new();

/// Process language, fixed at start-up from `BOT_LANG`.
static LOCALE: OnceLock<String> = OnceLock::new();

fn catalogues() -> &'static HashMap<String, Value> {
    TRANSLATIONS.get_or_init(|| {
        let mut map = HashMap::new();
        for (lang, raw) in [("en", include_str!("en.json")), ("uz", include_str!("uz.json"))] {
            match serde_json::from_str(raw) {
                Ok(val) => {
                    map.insert(lang.to_string(), val);
                }
                Err(e) => warn!("Failed to parse {} translations: {}", lang, e),
            }
        }
        map
    })
}

/// Load the catalogues up front so a broken file shows up in the start-up log.
pub fn init() {
    let _ = catalogues();
}

/// Fix the process language. Later calls are ignored.
pub fn set_locale(lang: &str) {
    let _ = LOCALE.set(resolve_locale(Some(lang)));
}

/// Process language; English until [`set_locale`] runs.
pub fn locale() -> &'static str {
    LOCALE.get().map(String::as_str).unwrap_or(DEFAULT_LOCALE)
}

/// Get text for a key in a specific language, falling back to English and
/// finally to the key itself.
pub fn get_text(lang: &str, key: &str) -> String {
    let store = catalogues();

    if let Some(text) = store.get(lang).and_then(|val| resolve_key(val, key)) {
        return text;
    }

    if lang != DEFAULT_LOCALE {
        if let Some(text) = store.get(DEFAULT_LOCALE).and_then(|val| resolve_key(val, key)) {
            return text;
        }
    }

    key.to_string()
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    let mut current = val;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str().map(|s| s.to_string())
}

/// Resolve a configured language code to a bundled locale.
pub fn resolve_locale(requested: Option<&str>) -> String {
    requested
        .map(|l| l.trim().to_lowercase())
        .filter(|l| SUPPORTED_LOCALES.contains(&l.as_str()))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rejection;

    #[test]
    fn test_nested_lookup() {
        assert_eq!(get_text("en", "wizard.text_saved"), "✅ Message saved!");
        assert_eq!(get_text("uz", "wizard.text_saved"), "✅ Xabar saqlandi!");
    }

    #[test]
    fn test_unknown_locale_falls_back_to_english() {
        assert_eq!(get_text("fr", "myid.text"), "Your ID: {id}");
    }

    #[test]
    fn test_missing_key_returns_key() {
        assert_eq!(get_text("en", "no.such.key"), "no.such.key");
    }

    #[test]
    fn test_every_rejection_is_translated() {
        for rejection in [
            Rejection::MissingMarker,
            Rejection::NotAChannel,
            Rejection::ChannelUnreachable,
            Rejection::ChannelRequired,
            Rejection::EmptyText,
        ] {
            for lang in SUPPORTED_LOCALES {
                assert_ne!(get_text(lang, rejection.text_key()), rejection.text_key());
            }
        }
    }

    #[test]
    fn test_catalogues_have_the_same_keys() {
        fn keys(prefix: &str, val: &Value, out: &mut Vec<String>) {
            if let Some(obj) = val.as_object() {
                for (k, v) in obj {
                    let path = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    keys(&path, v, out);
                }
            } else {
                out.push(prefix.to_string());
            }
        }

        let store = catalogues();
        let mut en = Vec::new();
        let mut uz = Vec::new();
        keys("", &store["en"], &mut en);
        keys("", &store["uz"], &mut uz);
        en.sort();
        uz.sort();
        assert_eq!(en, uz);
    }

    #[test]
    fn test_default_warning_is_localized() {
        assert_eq!(
            get_text("en", "moderation.default_warning"),
            "❗️ Please subscribe to the channel first!"
        );
        assert_eq!(
            get_text("uz", "moderation.default_warning"),
            "❗️ Iltimos, avval kanalga obuna boʻling!"
        );
    }

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale(Some("UZ")), "uz");
        assert_eq!(resolve_locale(Some("de")), "en");
        assert_eq!(resolve_locale(None), "en");
    }
}
