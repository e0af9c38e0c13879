//! Tag lookups over parsed markup.
//!
//! [`find_one`] is for elements a page is expected to carry exactly once and
//! fails with [`LocateError::TagNotFound`] when they are missing. [`find_all`]
//! never fails on absence; the caller decides whether an empty result matters.

use std::fmt::Display;

use regex::Regex;
use scraper::{ElementRef, Selector};

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("Tag not found: <{tag}> {filter}")]
    TagNotFound { tag: String, filter: String },
    #[error("Invalid tag name: {0}")]
    InvalidSelector(String),
}

/// Attribute constraint applied on top of the tag name.
#[derive(Debug, Clone, Copy)]
pub enum AttrFilter<'a> {
    Any,
    Exact { name: &'a str, value: &'a str },
    OneOf { name: &'a str, values: &'a [&'a str] },
    Pattern { name: &'a str, regex: &'a Regex },
}

impl<'a> AttrFilter<'a> {
    pub fn id(value: &'a str) -> Self {
        AttrFilter::Exact { name: "id", value }
    }

    pub fn class(value: &'a str) -> Self {
        AttrFilter::Exact {
            name: "class",
            value,
        }
    }

    pub fn matches(&self, element: &ElementRef) -> bool {
        let el = element.value();
        match *self {
            AttrFilter::Any => true,
            AttrFilter::Exact { name: "class", value } => el.classes().any(|c| c == value),
            AttrFilter::Exact { name, value } => el.attr(name) == Some(value),
            AttrFilter::OneOf {
                name: "class",
                values,
            } => el.classes().any(|c| values.contains(&c)),
            AttrFilter::OneOf { name, values } => {
                el.attr(name).is_some_and(|v| values.contains(&v))
            }
            AttrFilter::Pattern { name, regex } => el.attr(name).is_some_and(|v| regex.is_match(v)),
        }
    }
}

impl Display for AttrFilter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrFilter::Any => write!(f, "(any attributes)"),
            AttrFilter::Exact { name, value } => write!(f, "[{name}=\"{value}\"]"),
            AttrFilter::OneOf { name, values } => write!(f, "[{name} in {values:?}]"),
            AttrFilter::Pattern { name, regex } => write!(f, "[{name} ~ /{regex}/]"),
        }
    }
}

fn tag_selector(tag: &str) -> Result<Selector, LocateError> {
    Selector::parse(tag).map_err(|_| LocateError::InvalidSelector(tag.to_string()))
}

pub fn find_all<'a>(
    root: ElementRef<'a>,
    tag: &str,
    filter: AttrFilter<'_>,
) -> Result<Vec<ElementRef<'a>>, LocateError> {
    let selector = tag_selector(tag)?;
    Ok(root
        .select(&selector)
        .filter(|el| filter.matches(el))
        .collect())
}

pub fn find_one<'a>(
    root: ElementRef<'a>,
    tag: &str,
    filter: AttrFilter<'_>,
) -> Result<ElementRef<'a>, LocateError> {
    let selector = tag_selector(tag)?;
    root.select(&selector)
        .find(|el| filter.matches(el))
        .ok_or_else(|| {
            let err = LocateError::TagNotFound {
                tag: tag.to_string(),
                filter: filter.to_string(),
            };
            log::error!("{}", err);
            err
        })
}

pub(crate) fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}
