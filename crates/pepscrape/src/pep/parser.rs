use scraper::Html;

use super::types::{PepReference, StatusTable};
use crate::ParseError;
use crate::locate::{AttrFilter, elem_text, find_all, find_one};

/// Index sections, in the order their rows are emitted.
pub const INDEX_SECTIONS: [&str; 3] = ["index-by-category", "numerical-index", "reserved-pep-numbers"];
pub const PEP_PATH_PREFIX: &str = "pep-";
pub const PEP_CONTENT_ID: &str = "pep-content";

/// Splits the type/status cell ("SF", "IA", "P") into its status code: the
/// first character is the PEP type, whatever follows is the status.
fn status_code(cell: &str) -> &str {
    let cell = cell.trim();
    let mut chars = cell.chars();
    chars.next();
    chars.as_str()
}

pub fn parse_pep_index(html: &str, table: &StatusTable) -> Result<Vec<PepReference>, ParseError> {
    let document = Html::parse_document(html);

    let mut sections = find_all(
        document.root_element(),
        "section",
        AttrFilter::OneOf {
            name: "id",
            values: &INDEX_SECTIONS,
        },
    )?;
    if sections.is_empty() {
        return Err(ParseError::StructureNotFound(format!(
            "none of the index sections {:?}",
            INDEX_SECTIONS
        )));
    }
    for id in INDEX_SECTIONS {
        if !sections.iter().any(|s| s.value().attr("id") == Some(id)) {
            log::warn!("Index section '{}' not found, skipping it", id);
        }
    }
    sections.sort_by_key(|s| {
        INDEX_SECTIONS
            .iter()
            .position(|id| s.value().attr("id") == Some(*id))
    });

    let mut references = Vec::new();
    for section in sections {
        let tbody = find_one(section, "tbody", AttrFilter::Any)?;
        for row in find_all(tbody, "tr", AttrFilter::Any)? {
            let cell = elem_text(find_one(row, "td", AttrFilter::Any)?);
            let code = status_code(&cell);
            let Some(expected) = table.expected(code) else {
                log::info!("Unknown status code '{}' in row '{}', skipping", code, cell.trim());
                continue;
            };
            let number = elem_text(find_one(row, "a", AttrFilter::Any)?);
            references.push(PepReference {
                path: format!("{}{}", PEP_PATH_PREFIX, number.trim()),
                expected: expected.to_vec(),
            });
        }
    }

    log::debug!("Parsed {} PEP reference(s) from the index", references.len());
    Ok(references)
}

/// Reads the status a PEP's own page reports.
pub fn parse_pep_status(html: &str) -> Result<String, ParseError> {
    let document = Html::parse_document(html);
    let content = find_one(
        document.root_element(),
        "section",
        AttrFilter::id(PEP_CONTENT_ID),
    )?;
    let abbr = find_one(content, "abbr", AttrFilter::Any)?;
    Ok(elem_text(abbr).trim().to_string())
}
