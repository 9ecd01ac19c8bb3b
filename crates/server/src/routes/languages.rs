//! Supported UI languages.

use axum::Json;
use serde::Serialize;

use maani_core::language::Language;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub code: &'static str,
    pub english_name: &'static str,
    pub native_name: &'static str,
}

impl From<Language> for LanguageEntry {
    fn from(language: Language) -> Self {
        Self {
            code: language.code(),
            english_name: language.english_name(),
            native_name: language.native_name(),
        }
    }
}

/// Every language a seller can pick, in table order.
///
/// GET /api/languages
pub async fn list() -> Json<Vec<LanguageEntry>> {
    Json(Language::ALL.into_iter().map(LanguageEntry::from).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{get, send};

    #[tokio::test]
    async fn test_lists_every_language_with_names() {
        let (status, body) = send(get("/api/languages")).await;

        assert_eq!(status, StatusCode::OK);
        let languages = body.as_array().unwrap();
        assert_eq!(languages.len(), 13);
        assert_eq!(languages[0]["code"], "en");
        assert_eq!(languages[0]["englishName"], "English");

        let kannada = languages.iter().find(|l| l["code"] == "kn").unwrap();
        assert_eq!(kannada["englishName"], "Kannada");
        assert_eq!(kannada["nativeName"], "ಕನ್ನಡ");
    }
}
