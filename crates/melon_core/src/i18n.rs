//! UI language selection.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Indonesian,
    English,
}

impl Language {
    /// Picks the Indonesian or English variant of a UI string.
    pub fn tr(self, id: &'static str, en: &'static str) -> &'static str {
        match self {
            Language::Indonesian => id,
            Language::English => en,
        }
    }

    /// Language for a BCP 47 locale such as `id-ID` or `en_US`; Indonesian otherwise.
    pub fn from_locale(locale: &str) -> Self {
        let primary = locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if primary == "en" {
            Language::English
        } else {
            Language::Indonesian
        }
    }

    /// Label of the submit control while idle.
    pub fn submit_label(self) -> &'static str {
        self.tr("Analisis Semangka", "Analyse Watermelon")
    }

    /// Label of the submit control while a request is in flight.
    pub fn submitting_label(self) -> &'static str {
        self.tr("Menganalisis...", "Analysing...")
    }

    pub fn not_an_image(self) -> &'static str {
        self.tr("Mohon pilih file gambar", "Please choose an image file")
    }

    pub fn processing_failed(self) -> &'static str {
        self.tr(
            "Error dalam memproses gambar. Silakan coba lagi.",
            "Error while processing the image. Please try again.",
        )
    }

    pub fn preview_failed(self) -> &'static str {
        self.tr(
            "Gambar tidak dapat dibaca untuk pratinjau.",
            "The image could not be read for preview.",
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePreference {
    #[default]
    System,
    Indonesian,
    English,
}

impl LanguagePreference {
    /// Resolves the preference; `System` falls back to `locale`.
    pub fn resolve(self, locale: Option<&str>) -> Language {
        match self {
            LanguagePreference::Indonesian => Language::Indonesian,
            LanguagePreference::English => Language::English,
            LanguagePreference::System => locale.map(Language::from_locale).unwrap_or_default(),
        }
    }
}
