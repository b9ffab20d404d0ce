//! Supported display locales.
//!
//! The set is closed. Unlisted locales resolve to [`LocaleCode::DEFAULT`]
//! instead of failing, so lookups always produce text.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator};

use crate::error::TypeError;

/// Locale code for block names, descriptions and category labels.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case", try_from = "String")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum LocaleCode {
    /// English (default).
    #[default]
    En,
    /// Traditional Chinese.
    #[strum(serialize = "zh-hant", serialize = "zh-tw", serialize = "zh-hant-tw")]
    ZhHant,
    Ja,
    Ko,
    Es,
    Fr,
    De,
    It,
    /// Brazilian Portuguese.
    #[strum(serialize = "pt-br", serialize = "pt")]
    PtBr,
    Ru,
    Pl,
    Hu,
    Cs,
    Bg,
    Tr,
}

impl LocaleCode {
    /// Locale used when a translation or a requested locale is missing.
    pub const DEFAULT: LocaleCode = LocaleCode::En;

    /// Parse a locale tag (case-insensitive, `_` accepted for `-`).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().replace('_', "-");
        <Self as FromStr>::from_str(&normalized).ok()
    }

    /// Parse a locale tag, falling back to [`LocaleCode::DEFAULT`].
    pub fn resolve(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Self::DEFAULT)
    }

    /// Check whether `s` is shaped like a BCP-47 language tag.
    ///
    /// Shape only: `xx`, `xxx`, or either followed by `-`/`_` subtags of
    /// 2 to 8 alphanumerics. Listed-ness is checked by [`LocaleCode::from_str`].
    pub fn is_well_formed(s: &str) -> bool {
        let mut parts = s.split(['-', '_']);
        let Some(lang) = parts.next() else {
            return false;
        };
        if !(2..=3).contains(&lang.len()) || !lang.chars().all(|c| c.is_ascii_alphabetic()) {
            return false;
        }
        parts.all(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
    }

    /// Canonical tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocaleCode::En => "en",
            LocaleCode::ZhHant => "zh-hant",
            LocaleCode::Ja => "ja",
            LocaleCode::Ko => "ko",
            LocaleCode::Es => "es",
            LocaleCode::Fr => "fr",
            LocaleCode::De => "de",
            LocaleCode::It => "it",
            LocaleCode::PtBr => "pt-br",
            LocaleCode::Ru => "ru",
            LocaleCode::Pl => "pl",
            LocaleCode::Hu => "hu",
            LocaleCode::Cs => "cs",
            LocaleCode::Bg => "bg",
            LocaleCode::Tr => "tr",
        }
    }

    /// Native language name, for listings.
    pub fn native_name(&self) -> &'static str {
        match self {
            LocaleCode::En => "English",
            LocaleCode::ZhHant => "繁體中文",
            LocaleCode::Ja => "日本語",
            LocaleCode::Ko => "한국어",
            LocaleCode::Es => "Español",
            LocaleCode::Fr => "Français",
            LocaleCode::De => "Deutsch",
            LocaleCode::It => "Italiano",
            LocaleCode::PtBr => "Português (Brasil)",
            LocaleCode::Ru => "Русский",
            LocaleCode::Pl => "Polski",
            LocaleCode::Hu => "Magyar",
            LocaleCode::Cs => "Čeština",
            LocaleCode::Bg => "Български",
            LocaleCode::Tr => "Türkçe",
        }
    }

    /// All supported locales in declaration order.
    pub fn all() -> impl Iterator<Item = LocaleCode> {
        Self::iter()
    }
}

/// Deserialization accepts everything [`LocaleCode::from_str`] does.
impl TryFrom<String> for LocaleCode {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s).ok_or(TypeError::UnknownLocale(s))
    }
}

impl std::fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
