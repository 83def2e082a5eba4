/*!
    Language selection interface for the installer.

    This only declares the interface that a language catalog provides,
    translating strings and negotiating locales is left to implementors.
*/

use std::sync::Mutex;

/// The language used when nothing else has been chosen.
pub const LANG_DEFAULT: &str = "en_US.UTF-8";

/**
    Marks a string literal for translation and translates it using the given catalog.

    ```
    use pydeps::lang::PassthroughCatalog;

    let catalog = PassthroughCatalog::default();
    assert_eq!(pydeps::tr!(catalog, "Welcome"), "Welcome");
    ```
*/
#[macro_export]
macro_rules! tr {
    ($catalog:expr, $text:expr) => {
        $crate::lang::LanguageCatalog::translate_string(&$catalog, $text)
    };
}

/**
    Marks a string literal for translation without translating it,
    for strings that are translated later on, such as table entries.
*/
#[macro_export]
macro_rules! n_ {
    ($text:expr) => {
        $text
    };
}

/**
    Information about a single language that the installer supports.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangInfo {
    /// Human readable name of the language.
    pub lang: String,
    /// Short key used to select the language, such as `en_US`.
    pub key: String,
    /// Value to use for the `LC_ALL` environment variable.
    pub lc_all: String,
    /// Default keyboard layout for the language.
    pub keyboard: String,
    /// If text can be displayed in this language in a text-mode console.
    pub text_supported: bool,
}

pub trait LanguageCatalog {
    /**
        Lets the user choose a language, returning the key of the chosen language.
    */
    fn choose_language(&self) -> Option<String>;

    fn translate_string(&self, text: &str) -> String;

    /**
        Switches to the language with the given key.

        Returns `false` if the language is unknown, or if it
        is already active and `forced` was not set.
    */
    fn set_language(&self, key: &str, forced: bool) -> bool;

    fn lang_info(&self) -> Vec<LangInfo>;
}

/**
    Normalizes a locale name by removing its codeset and modifier.

    For example, `en_US.UTF-8@euro` is normalized to `en_US`.
*/
#[must_use]
pub fn normalize_lang(s: &str) -> &str {
    let end = s.find(|c: char| c == '.' || c == '@').unwrap_or(s.len());
    &s[..end]
}

/**
    A language catalog that only knows the default language,
    and returns every string exactly as it was given.
*/
#[derive(Debug)]
pub struct PassthroughCatalog {
    current: Mutex<String>,
}

impl Default for PassthroughCatalog {
    fn default() -> Self {
        Self {
            current: Mutex::new(LANG_DEFAULT.to_string()),
        }
    }
}

impl PassthroughCatalog {
    fn default_info() -> LangInfo {
        LangInfo {
            lang: "English".to_string(),
            key: normalize_lang(LANG_DEFAULT).to_string(),
            lc_all: LANG_DEFAULT.to_string(),
            keyboard: "us".to_string(),
            text_supported: true,
        }
    }

    /**
        Returns the locale that is currently active.
    */
    #[must_use]
    pub fn current(&self) -> String {
        self.current
            .lock()
            .map_or_else(|e| e.into_inner().clone(), |c| c.clone())
    }
}

impl LanguageCatalog for PassthroughCatalog {
    fn choose_language(&self) -> Option<String> {
        Some(normalize_lang(&self.current()).to_string())
    }

    fn translate_string(&self, text: &str) -> String {
        text.to_string()
    }

    fn set_language(&self, key: &str, forced: bool) -> bool {
        let Some(info) = self
            .lang_info()
            .into_iter()
            .find(|info| info.key == normalize_lang(key))
        else {
            return false;
        };
        let mut current = match self.current.lock() {
            Ok(current) => current,
            Err(e) => e.into_inner(),
        };
        if *current == info.lc_all && !forced {
            return false;
        }
        *current = info.lc_all;
        true
    }

    fn lang_info(&self) -> Vec<LangInfo> {
        vec![Self::default_info()]
    }
}
