//! User-facing strings.
//!
//! Every sentence the tool shows a person lives in a [`Messages`] table:
//! status lines, sentinels that end up inside the PDF, the attribution footer.
//! Call sites never hard-code wording; they format a field of the table.
//!
//! Templates use `{name}` placeholders filled by [`fill`]:
//!
//! | Field                | Placeholders          |
//! |----------------------|-----------------------|
//! | `success`            | `{path}`              |
//! | `failure`            | `{error}`             |
//! | `footer_attribution` | `{origin}`, `{date}`  |

use serde::{Deserialize, Serialize};

/// Localised string table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    /// Title used when the page has no `<h1>`.
    pub no_title: String,
    /// Footer date when publication metadata is missing.
    pub unknown_date: String,
    /// Shown while a conversion runs.
    pub converting: String,
    /// Shown when the caller submits an empty URL.
    pub enter_valid_url: String,
    /// Terminal message on success.
    pub success: String,
    /// Terminal message when the content region is absent.
    pub content_not_found: String,
    /// Terminal message on a fatal error.
    pub failure: String,
    /// First footer paragraph.
    pub footer_attribution: String,
    /// Second footer paragraph.
    pub footer_license: String,
}

impl Messages {
    /// Finnish wording (default).
    pub fn finnish() -> Self {
        Self {
            no_title: "Ei otsikkoa".into(),
            unknown_date: "tuntematon päivämäärä".into(),
            converting: "Muunnetaan...".into(),
            enter_valid_url: "Syötä kelvollinen URL.".into(),
            success: "PDF luotu onnistuneesti: {path}".into(),
            content_not_found: "Haluttua div-elementtiä ei löytynyt sivulta.".into(),
            failure: "Virhe: {error}".into(),
            footer_attribution: "Materiaali on alunperin julkaistu {origin} verkkosivuilla {date} \
ja se on tuotettu digitaalisen nuorisotyön osaamiskeskuksen toimesta."
                .into(),
            footer_license: "This work is licensed under CC BY 4.0. To view a copy of this \
license, visit https://creativecommons.org/licenses/by/4.0/"
                .into(),
        }
    }

    /// English wording.
    pub fn english() -> Self {
        Self {
            no_title: "No title".into(),
            unknown_date: "unknown date".into(),
            converting: "Converting...".into(),
            enter_valid_url: "Enter a valid URL.".into(),
            success: "PDF created successfully: {path}".into(),
            content_not_found: "The expected content element was not found on the page.".into(),
            failure: "Error: {error}".into(),
            footer_attribution: "This material was originally published on the {origin} website \
on {date} and was produced by the Centre of Expertise for Digital Youth Work."
                .into(),
            footer_license: "This work is licensed under CC BY 4.0. To view a copy of this \
license, visit https://creativecommons.org/licenses/by/4.0/"
                .into(),
        }
    }

    /// Look up a table by language code (`fi`, `en`).
    pub fn for_language(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "fi" | "fin" | "finnish" => Some(Self::finnish()),
            "en" | "eng" | "english" => Some(Self::english()),
            _ => None,
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::finnish()
    }
}

/// Replace each `{key}` in `template` with its value.
///
/// Unknown placeholders are left as-is.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}
