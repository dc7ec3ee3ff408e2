//! Rewriting: absolutise image sources and wrap the fragment in a standalone
//! HTML document.
//!
//! ## Image sources
//!
//! Every `<img>` whose non-empty `src` does not start with `http://` or
//! `https://` gets `source_url + src`. This is plain string concatenation,
//! not RFC 3986 resolution: `https://site/post/` + `img/a.png` gives
//! `https://site/post/img/a.png`, and `https://site/post` + `img/a.png` gives
//! `https://site/postimg/a.png`. Existing output depends on that exact shape.
//!
//! The rewrite runs through `lol_html`, so every byte of the fragment other
//! than the touched attributes passes through unchanged.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::messages::fill;
use crate::pipeline::extract::ExtractedContent;
use crate::pipeline::fetch::is_http_url;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inline stylesheet of the generated document.
pub const DOCUMENT_STYLE: &str = r#"
        body {
            font-family: Arial, sans-serif;
            line-height: 1.6;
            margin: 0;
            padding: 20px;
        }
        h1 {
            color: #333;
            font-size: 30px;
            text-align: center;
            margin-bottom: 25px;
            padding-bottom: 10px;
            border-bottom: 2px solid #333;
        }
        img {
            max-width: 100%;
        }
        .footer {
            font-size: 12px;
            text-align: center;
            margin-top: 20px;
            padding-top: 10px;
            border-top: 1px solid #ccc;
        }
"#;

/// A complete, self-contained HTML document ready for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderableDocument {
    /// Title embedded in `<title>` and `<h1>` (unescaped).
    pub title: String,
    /// Footer date string.
    pub published_date: String,
    pub html: String,
    /// Number of `<img>` sources that were made absolute.
    pub rewritten_images: usize,
}

/// Build the standalone document for `content`.
///
/// Returns `Ok(None)` when the page had no content region.
pub fn rewrite(
    content: &ExtractedContent,
    source_url: &str,
    config: &ConversionConfig,
) -> Result<Option<RenderableDocument>, ConvertError> {
    let Some(fragment) = content.fragment.as_deref() else {
        return Ok(None);
    };

    let (fragment, rewritten_images) = absolutize_images(fragment, source_url)?;
    debug!("Rewrote {} image source(s)", rewritten_images);

    let title = content.display_title(&config.messages.no_title);
    let published_date = content.published.display_or(&config.messages.unknown_date);
    let html = assemble_document(&title, &fragment, &published_date, config);

    Ok(Some(RenderableDocument {
        title,
        published_date,
        html,
        rewritten_images,
    }))
}

/// `true` when `src` is already an absolute http(s) URL.
pub fn is_absolute_src(src: &str) -> bool {
    is_http_url(src)
}

/// Prefix relative `<img src>` values with `source_url`.
///
/// Returns the rewritten markup and the number of attributes changed.
pub fn absolutize_images(fragment: &str, source_url: &str) -> Result<(String, usize), ConvertError> {
    let mut output = String::with_capacity(fragment.len() + 64);
    let mut rewritten = 0usize;

    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("img[src]", |el| {
                if let Some(src) = el.get_attribute("src") {
                    if !src.is_empty() && !is_absolute_src(&src) {
                        el.set_attribute("src", &format!("{source_url}{src}"))?;
                        rewritten += 1;
                    }
                }
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    rewriter
        .write(fragment.as_bytes())
        .map_err(|e| ConvertError::Internal(format!("image rewrite failed: {e}")))?;
    rewriter
        .end()
        .map_err(|e| ConvertError::Internal(format!("image rewrite failed: {e}")))?;

    Ok((output, rewritten))
}

/// Wrap title, fragment and footer into a full HTML document.
///
/// `title` and the footer text are escaped; `fragment` is inserted verbatim.
pub fn assemble_document(
    title: &str,
    fragment: &str,
    published_date: &str,
    config: &ConversionConfig,
) -> String {
    let messages = &config.messages;
    let attribution = fill(
        &messages.footer_attribution,
        &[("origin", &config.origin_name), ("date", published_date)],
    );
    let title = html_escape(title);

    let mut out = String::with_capacity(fragment.len() + DOCUMENT_STYLE.len() + 1024);
    out.push_str("<!DOCTYPE html>\n");
    out.push_str("<html>\n");
    out.push_str("<head>\n");
    out.push_str("    <meta charset=\"utf-8\">\n");
    out.push_str(&format!("    <title>{title}</title>\n"));
    out.push_str("    <style>");
    out.push_str(DOCUMENT_STYLE);
    out.push_str("    </style>\n");
    out.push_str("</head>\n");
    out.push_str("<body>\n");
    out.push_str(&format!("    <h1>{title}</h1>\n"));
    out.push_str(fragment);
    if !fragment.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("    <div class=\"footer\">\n");
    out.push_str(&format!("        <p>{}</p>\n", html_escape(&attribution)));
    out.push_str(&format!(
        "        <p>{}</p>\n",
        html_escape(&messages.footer_license)
    ));
    out.push_str("    </div>\n");
    out.push_str("</body>\n");
    out.push_str("</html>\n");
    out
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::PublishedDate;
    use chrono::NaiveDate;

    const BASE: &str = "https://www.verke.org/artikkelit/esimerkki/";

    #[test]
    fn relative_src_is_concatenated() {
        let (out, n) = absolutize_images(r#"<div><img src="img/pic.png"></div>"#, BASE).unwrap();
        assert_eq!(n, 1);
        assert!(out.contains(r#"src="https://www.verke.org/artikkelit/esimerkki/img/pic.png""#));
    }

    #[test]
    fn concatenation_does_not_normalise_separators() {
        let (out, _) = absolutize_images(r#"<img src="/media/a.jpg">"#, "https://site/post/").unwrap();
        assert!(out.contains(r#"src="https://site/post//media/a.jpg""#), "got: {out}");

        let (out, _) = absolutize_images(r#"<img src="a.jpg">"#, "https://site/post").unwrap();
        assert!(out.contains(r#"src="https://site/posta.jpg""#), "got: {out}");
    }

    #[test]
    fn absolute_src_is_untouched() {
        let input = r#"<p><img src="http://cdn.example/a.png"><img src="https://cdn.example/b.png"></p>"#;
        let (out, n) = absolutize_images(input, BASE).unwrap();
        assert_eq!(n, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn protocol_relative_src_is_treated_as_relative() {
        let (out, n) = absolutize_images(r#"<img src="//cdn.example/a.png">"#, BASE).unwrap();
        assert_eq!(n, 1);
        assert!(out.contains(&format!("src=\"{BASE}//cdn.example/a.png\"")));
    }

    #[test]
    fn empty_or_missing_src_is_skipped() {
        let input = r#"<img src=""><img alt="no src">"#;
        let (out, n) = absolutize_images(input, BASE).unwrap();
        assert_eq!(n, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn other_markup_passes_through() {
        let input = r#"<div class="column is-8-desktop"><a href="rel/link">x</a><p>Hyvää päivää</p><img src="a.png" alt="A"></div>"#;
        let (out, _) = absolutize_images(input, BASE).unwrap();
        assert!(out.contains(r#"<a href="rel/link">x</a>"#));
        assert!(out.contains("Hyvää päivää"));
        assert!(out.contains(r#"alt="A""#));
    }

    #[test]
    fn rewrite_builds_full_document() {
        let content = ExtractedContent {
            title: Some("Test Article".into()),
            published: PublishedDate::Known(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            fragment: Some(r#"<div class="column is-8-desktop"><img src="img/pic.png"></div>"#.into()),
        };
        let doc = rewrite(&content, BASE, &ConversionConfig::default())
            .unwrap()
            .expect("fragment present");

        assert_eq!(doc.title, "Test Article");
        assert_eq!(doc.published_date, "15.01.2024");
        assert_eq!(doc.rewritten_images, 1);
        assert!(doc.html.starts_with("<!DOCTYPE html>"));
        assert!(doc.html.contains("<title>Test Article</title>"));
        assert!(doc.html.contains("<h1>Test Article</h1>"));
        assert!(doc.html.contains(&format!("src=\"{BASE}img/pic.png\"")));
        assert!(doc.html.contains("verke.org verkkosivuilla 15.01.2024"));
        assert!(doc.html.contains("CC BY 4.0"));
        assert!(doc.html.contains("font-family: Arial"));
    }

    #[test]
    fn rewrite_without_fragment_is_none() {
        let content = ExtractedContent {
            title: Some("T".into()),
            published: PublishedDate::Unknown,
            fragment: None,
        };
        assert!(rewrite(&content, BASE, &ConversionConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn sentinels_fill_missing_title_and_date() {
        let content = ExtractedContent {
            title: None,
            published: PublishedDate::Unknown,
            fragment: Some("<div>x</div>".into()),
        };
        let doc = rewrite(&content, BASE, &ConversionConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(doc.title, "Ei otsikkoa");
        assert!(doc.html.contains("tuntematon päivämäärä"));
    }

    #[test]
    fn title_is_escaped() {
        let html = assemble_document(
            "Q&A: <Tips>",
            "<div></div>",
            "01.01.2024",
            &ConversionConfig::default(),
        );
        assert!(html.contains("<title>Q&amp;A: &lt;Tips&gt;</title>"));
        assert!(!html.contains("<Tips>"));
    }

    #[test]
    fn english_footer() {
        let config = ConversionConfig::builder()
            .messages(crate::messages::Messages::english())
            .origin_name("example.org")
            .build()
            .unwrap();
        let html = assemble_document("T", "<div></div>", "02.03.2024", &config);
        assert!(html.contains("published on the example.org website on 02.03.2024"));
    }
}
