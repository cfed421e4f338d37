// src/scrape/classes.rs
//
// Class-table extraction. Much simpler than the items table: every class row
// is one wiki link wrapping one icon image, no tiers, no anchors.

use std::collections::HashSet;

use crate::model::{absolutize, slugify, ClassRecord};
use crate::scrape::markup::{attr, Token, Tokenizer};

const WIKI_PREFIX: &str = "/wiki/";

/// Parse the classes page into records: ids unique, names sorted
/// case-insensitively. Never errors; unusable markup yields fewer records.
pub fn parse_classes(html: &str, base_url: &str) -> Vec<ClassRecord> {
    let mut open_href: Option<String> = None;
    let mut found: Vec<(String, String, String)> = Vec::new(); // (name, icon, href)

    for token in Tokenizer::new(html) {
        match token {
            Token::Start { name, attrs } if name == "a" => {
                let href = attr(&attrs, "href").unwrap_or("");
                open_href = href.starts_with(WIKI_PREFIX).then(|| s!(href));
            }
            Token::Start { name, attrs } if name == "img" => {
                if let Some(href) = &open_href {
                    let src = attr(&attrs, "src")
                        .filter(|v| !v.is_empty())
                        .or_else(|| attr(&attrs, "data-src"))
                        .unwrap_or("");
                    let alt = attr(&attrs, "alt").unwrap_or("").trim();
                    if !src.is_empty() && !alt.is_empty() {
                        found.push((s!(alt), s!(src), href.clone()));
                    }
                }
            }
            Token::End { name } if name == "a" => open_href = None,
            _ => {}
        }
    }

    let mut seen = HashSet::new();
    let mut records: Vec<ClassRecord> = found
        .into_iter()
        .filter_map(|(name, icon_src, href)| {
            let id = format!("class-{}", slugify(&name));
            seen.insert(id.clone()).then(|| ClassRecord {
                id,
                name,
                icon_url: absolutize(base_url, &icon_src),
                page_url: absolutize(base_url, &href),
            })
        })
        .collect();
    records.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.realmeye.com";

    #[test]
    fn extracts_linked_class_icons() {
        let html = concat!(
            "<table><tr>",
            "<td><a href=\"/wiki/knight\"><img src=\"/img/knight.png\" alt=\"Knight\"></a></td>",
            "<td><a href=\"/wiki/wizard\"><img src=\"/img/wizard.png\" alt=\"Wizard\"></a></td>",
            "</tr></table>",
        );
        let records = parse_classes(html, BASE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "class-knight");
        assert_eq!(records[0].icon_url, "https://www.realmeye.com/img/knight.png");
        assert_eq!(records[1].name, "Wizard");
    }

    #[test]
    fn non_wiki_links_and_bare_images_are_ignored() {
        let html = concat!(
            "<a href=\"https://elsewhere\"><img src=\"/x.png\" alt=\"Nope\"></a>",
            "<img src=\"/loose.png\" alt=\"Loose\">",
            "<a href=\"/wiki/priest\"><img data-src=\"/img/priest.png\" alt=\"Priest\"></a>",
        );
        let records = parse_classes(html, BASE);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "class-priest");
        assert_eq!(records[0].icon_url, "https://www.realmeye.com/img/priest.png");
    }

    #[test]
    fn duplicates_keep_first_and_output_sorts() {
        let html = concat!(
            "<a href=\"/wiki/wizard\"><img src=\"/1.png\" alt=\"Wizard\"></a>",
            "<a href=\"/wiki/archer\"><img src=\"/2.png\" alt=\"Archer\"></a>",
            "<a href=\"/wiki/wizard-2\"><img src=\"/3.png\" alt=\"Wizard\"></a>",
        );
        let records = parse_classes(html, BASE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Archer");
        assert_eq!(records[1].page_url, "https://www.realmeye.com/wiki/wizard");
    }
}
