//! Article content extraction
//!
//! Fetches an article page and reduces it to its readable text: title,
//! site name and body paragraphs. Paragraphs inside `<article>` win over
//! the rest of the page when the page has one.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use lol_html::{element, rewrite_str, text, RewriteStrSettings};
use tracing::info;
use url::Url;

use crate::models::ArticleContent;
use crate::upstream::{read_success_body_within, redact, send, Fetch, UpstreamError};

/// Pages larger than this are not worth extracting.
const MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;

// == Extraction State ==
#[derive(Default)]
struct Collected {
    title: String,
    titles_seen: usize,
    og_title: Option<String>,
    site_name: Option<String>,
    article_paragraphs: Vec<String>,
    paragraphs: Vec<String>,
}

// == Extract ==
/// Pulls the readable parts out of an HTML document.
pub fn extract_article(html: &str, page_url: &Url) -> Result<ArticleContent, String> {
    let state = Rc::new(RefCell::new(Collected::default()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("title", {
                    let state = Rc::clone(&state);
                    move |_| {
                        state.borrow_mut().titles_seen += 1;
                        Ok(())
                    }
                }),
                // Only the document title; inline SVG icons carry their own
                text!("title", {
                    let state = Rc::clone(&state);
                    move |t| {
                        let mut state = state.borrow_mut();
                        if state.titles_seen == 1 {
                            state.title.push_str(t.as_str());
                        }
                        Ok(())
                    }
                }),
                element!("meta[property='og:title']", {
                    let state = Rc::clone(&state);
                    move |el| {
                        state.borrow_mut().og_title = el.get_attribute("content");
                        Ok(())
                    }
                }),
                element!("meta[property='og:site_name']", {
                    let state = Rc::clone(&state);
                    move |el| {
                        state.borrow_mut().site_name = el.get_attribute("content");
                        Ok(())
                    }
                }),
                element!("p", {
                    let state = Rc::clone(&state);
                    move |_| {
                        state.borrow_mut().paragraphs.push(String::new());
                        Ok(())
                    }
                }),
                text!("p", {
                    let state = Rc::clone(&state);
                    move |t| {
                        if let Some(last) = state.borrow_mut().paragraphs.last_mut() {
                            last.push_str(t.as_str());
                        }
                        Ok(())
                    }
                }),
                element!("article p", {
                    let state = Rc::clone(&state);
                    move |_| {
                        state.borrow_mut().article_paragraphs.push(String::new());
                        Ok(())
                    }
                }),
                text!("article p", {
                    let state = Rc::clone(&state);
                    move |t| {
                        if let Some(last) = state.borrow_mut().article_paragraphs.last_mut() {
                            last.push_str(t.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| err.to_string())?;

    let collected = state.take();

    let source = if collected.article_paragraphs.iter().any(|p| !p.trim().is_empty()) {
        collected.article_paragraphs
    } else {
        collected.paragraphs
    };
    let paragraphs: Vec<String> = source
        .iter()
        .map(|p| clean_text(p))
        .filter(|p| !p.is_empty())
        .collect();

    let title = collected
        .og_title
        .map(|t| clean_text(&t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| clean_text(&collected.title));

    let site_name = collected
        .site_name
        .map(|s| clean_text(&s))
        .filter(|s| !s.is_empty())
        .or_else(|| {
            page_url
                .host_str()
                .map(|host| host.trim_start_matches("www.").to_string())
        })
        .unwrap_or_default();

    let content = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", escape_html(p)))
        .collect::<String>();

    Ok(ArticleContent {
        title,
        content,
        text_content: paragraphs.join("\n\n"),
        site_name,
    })
}

/// Decodes entities and collapses whitespace.
fn clean_text(raw: &str) -> String {
    decode_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes text for inclusion in an HTML text node.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Decodes the named entities common in news markup plus numeric references.
fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let decoded = tail.find(';').filter(|end| *end <= 10).and_then(|end| {
            let decoded = match &tail[1..end] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some(' '),
                entity => named_entity(entity).or_else(|| numeric_entity(entity)),
            };
            decoded.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn numeric_entity(entity: &str) -> Option<char> {
    let num = entity.strip_prefix('#')?;
    let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => num.parse().ok(),
    };
    code.and_then(char::from_u32)
}

/// Latin-1 letters and the typographic punctuation news sites emit by name.
fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "Agrave" => 'À',
        "Aacute" => 'Á',
        "Acirc" => 'Â',
        "Atilde" => 'Ã',
        "Auml" => 'Ä',
        "Ccedil" => 'Ç',
        "Egrave" => 'È',
        "Eacute" => 'É',
        "Ecirc" => 'Ê',
        "Igrave" => 'Ì',
        "Iacute" => 'Í',
        "Ntilde" => 'Ñ',
        "Ograve" => 'Ò',
        "Oacute" => 'Ó',
        "Ocirc" => 'Ô',
        "Otilde" => 'Õ',
        "Ouml" => 'Ö',
        "Ugrave" => 'Ù',
        "Uacute" => 'Ú',
        "Uuml" => 'Ü',
        "Yacute" => 'Ý',
        "agrave" => 'à',
        "aacute" => 'á',
        "acirc" => 'â',
        "atilde" => 'ã',
        "auml" => 'ä',
        "ccedil" => 'ç',
        "egrave" => 'è',
        "eacute" => 'é',
        "ecirc" => 'ê',
        "euml" => 'ë',
        "igrave" => 'ì',
        "iacute" => 'í',
        "icirc" => 'î',
        "iuml" => 'ï',
        "ntilde" => 'ñ',
        "ograve" => 'ò',
        "oacute" => 'ó',
        "ocirc" => 'ô',
        "otilde" => 'õ',
        "ouml" => 'ö',
        "ugrave" => 'ù',
        "uacute" => 'ú',
        "ucirc" => 'û',
        "uuml" => 'ü',
        "yacute" => 'ý',
        "szlig" => 'ß',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "lsquo" => '‘',
        "rsquo" => '’',
        "sbquo" => '‚',
        "ldquo" => '“',
        "rdquo" => '”',
        "bdquo" => '„',
        "laquo" => '«',
        "raquo" => '»',
        "bull" => '•',
        "middot" => '·',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "euro" => '€',
        "times" => '×',
        _ => return None,
    };
    Some(c)
}

// == Article Extractor ==
/// Live, uncached fetch of an article page keyed by its URL.
pub struct ArticleExtractor {
    http: reqwest::Client,
}

impl ArticleExtractor {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetch for ArticleExtractor {
    type Output = ArticleContent;

    async fn fetch(&self, key: &str) -> Result<ArticleContent, UpstreamError> {
        let url = Url::parse(key).map_err(|err| UpstreamError::InvalidRequest(err.to_string()))?;
        info!("[SCRAPING] {}", redact(&url));

        let response = send(&self.http, &url).await?;
        let body = read_success_body_within(response, &url, MAX_PAGE_BYTES).await?;

        let html = String::from_utf8_lossy(&body);
        extract_article(&html, &url).map_err(|reason| UpstreamError::Decode {
            url: redact(&url),
            reason,
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://www.vnexpress.net/some-story.html").unwrap()
    }

    #[test]
    fn test_extract_prefers_article_paragraphs() {
        let html = r#"<html><head>
            <title>Story | VnExpress</title>
            <meta property="og:site_name" content="VnExpress">
        </head><body>
            <nav><p>Menu</p></nav>
            <article><p>First  paragraph.</p><p>Second <b>bold</b> one.</p></article>
            <footer><p>Copyright</p></footer>
        </body></html>"#;

        let article = extract_article(html, &page_url()).unwrap();

        assert_eq!(article.title, "Story | VnExpress");
        assert_eq!(article.site_name, "VnExpress");
        assert_eq!(article.text_content, "First paragraph.\n\nSecond bold one.");
        assert_eq!(
            article.content,
            "<p>First paragraph.</p><p>Second bold one.</p>"
        );
    }

    #[test]
    fn test_extract_without_article_uses_all_paragraphs() {
        let html = "<html><head><title>T</title></head><body><p>One</p><div><p>Two</p></div></body></html>";

        let article = extract_article(html, &page_url()).unwrap();

        assert_eq!(article.text_content, "One\n\nTwo");
        // Host stands in for a missing og:site_name
        assert_eq!(article.site_name, "vnexpress.net");
    }

    #[test]
    fn test_og_title_wins() {
        let html = r#"<head><title>Long | Site</title><meta property="og:title" content="Short"></head>"#;

        let article = extract_article(html, &page_url()).unwrap();
        assert_eq!(article.title, "Short");
    }

    #[test]
    fn test_content_is_escaped() {
        let html = "<article><p>a &lt;script&gt; tag &amp; more</p></article>";

        let article = extract_article(html, &page_url()).unwrap();

        assert_eq!(article.text_content, "a <script> tag & more");
        assert_eq!(
            article.content,
            "<p>a &lt;script&gt; tag &amp; more</p>"
        );
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&#7879;&#x1EC7;"), "ệệ");
        assert_eq!(decode_entities("a & b"), "a & b");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_decode_latin1_and_punctuation() {
        assert_eq!(
            decode_entities("Caf&eacute; &ndash; Ph&ocirc; &hellip;"),
            "Café – Phô …"
        );
        assert_eq!(decode_entities("&ldquo;Hi&rdquo; &copy; 2025"), "“Hi” © 2025");
    }

    #[test]
    fn test_named_entities_reach_text_content() {
        let html = "<article><p>Caf&eacute; &mdash; 10&deg;C&hellip;</p></article>";

        let article = extract_article(html, &page_url()).unwrap();
        assert_eq!(article.text_content, "Café — 10°C…");
    }

    #[test]
    fn test_svg_title_in_body_is_ignored() {
        let html = "<html><head><title>Story</title></head><body>\
            <svg><title>Close icon</title></svg><p>Body</p></body></html>";

        let article = extract_article(html, &page_url()).unwrap();

        assert_eq!(article.title, "Story");
        assert_eq!(article.text_content, "Body");
    }

    #[test]
    fn test_title_without_head_tag() {
        let html = "<title>Bare</title><p>Body</p><svg><title>Menu</title></svg>";

        let article = extract_article(html, &page_url()).unwrap();
        assert_eq!(article.title, "Bare");
    }
}
