//! Regional language tables.
//!
//! Static lookup data keyed by ISO 639-1 code: display names, weekday names,
//! and the primary language of each Indian state or union territory. Used to
//! pick sensible default languages for sellers and to render working hours.

use serde::{Deserialize, Serialize};

use crate::types::ParseStatusError;

/// A language supported by the marketplace UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hi,
    Bn,
    Te,
    Mr,
    Ta,
    Gu,
    Kn,
    Ml,
    Pa,
    Or,
    As,
    Ur,
}

struct LanguageInfo {
    code: &'static str,
    english_name: &'static str,
    native_name: &'static str,
    /// Monday first.
    weekdays: [&'static str; 7],
}

const EN: LanguageInfo = LanguageInfo {
    code: "en",
    english_name: "English",
    native_name: "English",
    weekdays: [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ],
};

const HI: LanguageInfo = LanguageInfo {
    code: "hi",
    english_name: "Hindi",
    native_name: "हिन्दी",
    weekdays: [
        "सोमवार",
        "मंगलवार",
        "बुधवार",
        "गुरुवार",
        "शुक्रवार",
        "शनिवार",
        "रविवार",
    ],
};

const BN: LanguageInfo = LanguageInfo {
    code: "bn",
    english_name: "Bengali",
    native_name: "বাংলা",
    weekdays: [
        "সোমবার",
        "মঙ্গলবার",
        "বুধবার",
        "বৃহস্পতিবার",
        "শুক্রবার",
        "শনিবার",
        "রবিবার",
    ],
};

const TE: LanguageInfo = LanguageInfo {
    code: "te",
    english_name: "Telugu",
    native_name: "తెలుగు",
    weekdays: [
        "సోమవారం",
        "మంగళవారం",
        "బుధవారం",
        "గురువారం",
        "శుక్రవారం",
        "శనివారం",
        "ఆదివారం",
    ],
};

const MR: LanguageInfo = LanguageInfo {
    code: "mr",
    english_name: "Marathi",
    native_name: "मराठी",
    weekdays: [
        "सोमवार",
        "मंगळवार",
        "बुधवार",
        "गुरुवार",
        "शुक्रवार",
        "शनिवार",
        "रविवार",
    ],
};

const TA: LanguageInfo = LanguageInfo {
    code: "ta",
    english_name: "Tamil",
    native_name: "தமிழ்",
    weekdays: [
        "திங்கள்",
        "செவ்வாய்",
        "புதன்",
        "வியாழன்",
        "வெள்ளி",
        "சனி",
        "ஞாயிறு",
    ],
};

const GU: LanguageInfo = LanguageInfo {
    code: "gu",
    english_name: "Gujarati",
    native_name: "ગુજરાતી",
    weekdays: [
        "સોમવાર",
        "મંગળવાર",
        "બુધવાર",
        "ગુરુવાર",
        "શુક્રવાર",
        "શનિવાર",
        "રવિવાર",
    ],
};

const KN: LanguageInfo = LanguageInfo {
    code: "kn",
    english_name: "Kannada",
    native_name: "ಕನ್ನಡ",
    weekdays: [
        "ಸೋಮವಾರ",
        "ಮಂಗಳವಾರ",
        "ಬುಧವಾರ",
        "ಗುರುವಾರ",
        "ಶುಕ್ರವಾರ",
        "ಶನಿವಾರ",
        "ಭಾನುವಾರ",
    ],
};

const ML: LanguageInfo = LanguageInfo {
    code: "ml",
    english_name: "Malayalam",
    native_name: "മലയാളം",
    weekdays: [
        "തിങ്കൾ",
        "ചൊവ്വ",
        "ബുധൻ",
        "വ്യാഴം",
        "വെള്ളി",
        "ശനി",
        "ഞായർ",
    ],
};

const PA: LanguageInfo = LanguageInfo {
    code: "pa",
    english_name: "Punjabi",
    native_name: "ਪੰਜਾਬੀ",
    weekdays: [
        "ਸੋਮਵਾਰ",
        "ਮੰਗਲਵਾਰ",
        "ਬੁੱਧਵਾਰ",
        "ਵੀਰਵਾਰ",
        "ਸ਼ੁੱਕਰਵਾਰ",
        "ਸ਼ਨਿੱਚਰਵਾਰ",
        "ਐਤਵਾਰ",
    ],
};

const OR: LanguageInfo = LanguageInfo {
    code: "or",
    english_name: "Odia",
    native_name: "ଓଡ଼ିଆ",
    weekdays: [
        "ସୋମବାର",
        "ମଙ୍ଗଳବାର",
        "ବୁଧବାର",
        "ଗୁରୁବାର",
        "ଶୁକ୍ରବାର",
        "ଶନିବାର",
        "ରବିବାର",
    ],
};

const AS: LanguageInfo = LanguageInfo {
    code: "as",
    english_name: "Assamese",
    native_name: "অসমীয়া",
    weekdays: [
        "সোমবাৰ",
        "মঙ্গলবাৰ",
        "বুধবাৰ",
        "বৃহস্পতিবাৰ",
        "শুক্ৰবাৰ",
        "শনিবাৰ",
        "দেওবাৰ",
    ],
};

const UR: LanguageInfo = LanguageInfo {
    code: "ur",
    english_name: "Urdu",
    native_name: "اردو",
    weekdays: ["پیر", "منگل", "بدھ", "جمعرات", "جمعہ", "ہفتہ", "اتوار"],
};

/// Primary language of each Indian state and union territory (lowercase keys).
const REGIONAL_LANGUAGES: &[(&str, Language)] = &[
    ("andhra pradesh", Language::Te),
    ("arunachal pradesh", Language::En),
    ("assam", Language::As),
    ("bihar", Language::Hi),
    ("chhattisgarh", Language::Hi),
    ("goa", Language::Mr),
    ("gujarat", Language::Gu),
    ("haryana", Language::Hi),
    ("himachal pradesh", Language::Hi),
    ("jharkhand", Language::Hi),
    ("karnataka", Language::Kn),
    ("kerala", Language::Ml),
    ("madhya pradesh", Language::Hi),
    ("maharashtra", Language::Mr),
    ("manipur", Language::En),
    ("meghalaya", Language::En),
    ("mizoram", Language::En),
    ("nagaland", Language::En),
    ("odisha", Language::Or),
    ("punjab", Language::Pa),
    ("rajasthan", Language::Hi),
    ("sikkim", Language::En),
    ("tamil nadu", Language::Ta),
    ("telangana", Language::Te),
    ("tripura", Language::Bn),
    ("uttar pradesh", Language::Hi),
    ("uttarakhand", Language::Hi),
    ("west bengal", Language::Bn),
    ("andaman and nicobar islands", Language::Hi),
    ("chandigarh", Language::Pa),
    ("dadra and nagar haveli and daman and diu", Language::Gu),
    ("delhi", Language::Hi),
    ("jammu and kashmir", Language::Ur),
    ("ladakh", Language::Hi),
    ("lakshadweep", Language::Ml),
    ("puducherry", Language::Ta),
];

impl Language {
    /// Every supported language.
    pub const ALL: [Self; 13] = [
        Self::En,
        Self::Hi,
        Self::Bn,
        Self::Te,
        Self::Mr,
        Self::Ta,
        Self::Gu,
        Self::Kn,
        Self::Ml,
        Self::Pa,
        Self::Or,
        Self::As,
        Self::Ur,
    ];

    const fn info(self) -> &'static LanguageInfo {
        match self {
            Self::En => &EN,
            Self::Hi => &HI,
            Self::Bn => &BN,
            Self::Te => &TE,
            Self::Mr => &MR,
            Self::Ta => &TA,
            Self::Gu => &GU,
            Self::Kn => &KN,
            Self::Ml => &ML,
            Self::Pa => &PA,
            Self::Or => &OR,
            Self::As => &AS,
            Self::Ur => &UR,
        }
    }

    /// ISO 639-1 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        self.info().code
    }

    /// Name in English.
    #[must_use]
    pub const fn english_name(self) -> &'static str {
        self.info().english_name
    }

    /// Name in the language itself.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        self.info().native_name
    }

    /// Localized weekday name.
    #[must_use]
    pub const fn weekday_name(self, day: chrono::Weekday) -> &'static str {
        let weekdays = &self.info().weekdays;
        match day {
            chrono::Weekday::Mon => weekdays[0],
            chrono::Weekday::Tue => weekdays[1],
            chrono::Weekday::Wed => weekdays[2],
            chrono::Weekday::Thu => weekdays[3],
            chrono::Weekday::Fri => weekdays[4],
            chrono::Weekday::Sat => weekdays[5],
            chrono::Weekday::Sun => weekdays[6],
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|language| language.code() == code)
            .ok_or_else(|| ParseStatusError {
                kind: "language code",
                value: s.to_owned(),
            })
    }
}

/// Primary language for a region.
///
/// Indian states and union territories are matched case-insensitively; an
/// unknown Indian region falls back to Hindi and any other country to English.
#[must_use]
pub fn regional_language(state: &str, country: &str) -> Language {
    let country = country.trim().to_ascii_lowercase();
    if !matches!(country.as_str(), "india" | "in" | "bharat") {
        return Language::En;
    }

    let state = state.trim().to_lowercase();
    REGIONAL_LANGUAGES
        .iter()
        .find(|(name, _)| *name == state)
        .map_or(Language::Hi, |(_, language)| *language)
}

/// Default UI languages for a seller in `state`: the regional language, then English.
#[must_use]
pub fn default_languages(state: &str, country: &str) -> Vec<Language> {
    let regional = regional_language(state, country);
    if regional == Language::En {
        vec![Language::En]
    } else {
        vec![regional, Language::En]
    }
}
