use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use super::types::{VersionEntry, WhatsNewArticle};
use crate::ParseError;
use crate::locate::{AttrFilter, elem_text, find_all, find_one};

static RE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Python (?P<version>\d\.\d+) \((?P<status>.*)\)").expect("invalid regex: version")
});

static RE_PDF_A4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+pdf-a4\.zip$").expect("invalid regex: pdf a4 archive"));

fn href<'a>(element: scraper::ElementRef<'a>) -> Result<&'a str, ParseError> {
    element
        .value()
        .attr("href")
        .ok_or_else(|| ParseError::MissingAttribute(format!("href on <{}>", element.value().name())))
}

/// Relative links to every per-release "What's New" article, in page order.
pub fn parse_whats_new_index(html: &str) -> Result<Vec<String>, ParseError> {
    let document = Html::parse_document(html);
    let main = find_one(
        document.root_element(),
        "section",
        AttrFilter::id("what-s-new-in-python"),
    )?;
    let wrapper = find_one(main, "div", AttrFilter::class("toctree-wrapper"))?;

    find_all(wrapper, "li", AttrFilter::class("toctree-l1"))?
        .into_iter()
        .map(|item| -> Result<String, ParseError> {
            let link = find_one(item, "a", AttrFilter::Any)?;
            Ok(href(link)?.to_string())
        })
        .collect()
}

pub fn parse_whats_new_article(html: &str, url: &str) -> Result<WhatsNewArticle, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let title = elem_text(find_one(root, "h1", AttrFilter::Any)?);
    let editors = elem_text(find_one(root, "dl", AttrFilter::Any)?).replace('\n', " ");

    Ok(WhatsNewArticle {
        link: url.to_string(),
        title,
        editors,
    })
}

pub fn parse_latest_versions(html: &str) -> Result<Vec<VersionEntry>, ParseError> {
    let document = Html::parse_document(html);
    let sidebar = find_one(
        document.root_element(),
        "div",
        AttrFilter::class("sphinxsidebarwrapper"),
    )?;

    let versions = find_all(sidebar, "ul", AttrFilter::Any)?
        .into_iter()
        .find(|ul| elem_text(*ul).contains("All versions"))
        .ok_or_else(|| ParseError::StructureNotFound("list of Python versions".to_string()))?;

    find_all(versions, "a", AttrFilter::Any)?
        .into_iter()
        .map(|a| -> Result<VersionEntry, ParseError> {
            let text = elem_text(a);
            let (version, status) = match RE_VERSION.captures(&text) {
                Some(caps) => (caps["version"].to_string(), caps["status"].to_string()),
                None => (text.clone(), String::new()),
            };
            Ok(VersionEntry {
                link: href(a)?.to_string(),
                version,
                status,
            })
        })
        .collect()
}

/// The relative link to the zipped A4 PDF documentation.
pub fn parse_pdf_a4_link(html: &str) -> Result<String, ParseError> {
    let document = Html::parse_document(html);
    let table = find_one(document.root_element(), "table", AttrFilter::Any)?;
    let link = find_one(
        table,
        "a",
        AttrFilter::Pattern {
            name: "href",
            regex: &RE_PDF_A4,
        },
    )?;
    Ok(href(link)?.to_string())
}
