// src/scrape/items.rs
//
// Items-table extraction. A row scanner walks the tokenizer events and
// accumulates links, images and cell text per table row; tier sections are
// announced by named anchors that live *outside* the table, so the current
// tier is the one piece of state carried across rows. Each finished row then
// goes through link disambiguation, tier resolution and record synthesis.
//
// Nothing in here performs I/O and nothing raises for broken markup: a row
// that cannot be resolved simply contributes no record.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::RING_CATEGORY;
use crate::core::sanitize::{normalize_entities, normalize_ws};
use crate::model::{absolutize, slugify, ItemRecord};
use crate::scrape::markup::{attr, Token, Tokenizer};

// Row-local tier tokens, word-bounded so item names with tier-like substrings
// don't match. Tiers run T1..T99; there is no tier zero.
static TIER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bT([1-9][0-9]?)\b").unwrap());
static SPECIAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(ST|UT)\b").unwrap());

// Named-anchor forms that open a tier section.
static TIER_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^tier-([1-9][0-9]?)$").unwrap());
static SPECIAL_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:tier-)?(st|ut)$").unwrap());
static UNTIERED_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^untiered(?:-.*)?$").unwrap());
static SET_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^set(?:-.*)?$").unwrap());

/// Rows whose resolved name is a playable class are navigation rows on the
/// equipment pages, not items.
const CLASS_NAMES: &[&str] = &[
    "Rogue", "Archer", "Wizard", "Priest", "Warrior", "Knight", "Paladin",
    "Assassin", "Necromancer", "Huntress", "Mystic", "Trickster", "Sorcerer",
    "Ninja", "Samurai", "Bard", "Summoner", "Kensei",
];

/// Untiered ring "family" rows expand into this many per-tier records.
const RING_BUNDLE_TIERS: u32 = 7;

#[derive(Clone, Debug, Default)]
pub struct ParsedLink {
    pub href: String,
    pub text: String,
    pub has_image: bool,
    pub image_src: String,
    pub image_alt: String,
}

#[derive(Clone, Debug)]
pub struct ParsedImage {
    pub src: String,
    pub alt: String,
}

/// Everything gathered for one `<tr>`, finalized exactly once at row close.
/// `carried_tier` is a snapshot of the anchor tier as of that close, not a
/// reference to the live state.
#[derive(Debug)]
pub struct RowContext {
    pub carried_tier: Option<String>,
    pub links: Vec<ParsedLink>,
    pub images: Vec<ParsedImage>,
    pub cells: Vec<String>,
}

#[derive(Debug, Default)]
struct RowBuild {
    links: Vec<ParsedLink>,
    images: Vec<ParsedImage>,
    cells: Vec<String>,
    cell: Option<String>,       // Some = inside a <td>/<th>
    link: Option<ParsedLink>,   // Some = inside an <a>
}

impl RowBuild {
    fn close_link(&mut self) {
        if let Some(link) = self.link.take() {
            self.links.push(link);
        }
    }

    fn close_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            self.cells.push(cell);
        }
    }

    fn finish(mut self, carried_tier: Option<String>) -> RowContext {
        self.close_link();
        self.close_cell();
        RowContext {
            carried_tier,
            links: self.links,
            images: self.images,
            cells: self.cells,
        }
    }
}

/// Tracks table rows over the token stream. Tier anchors update the scanner
/// even when no row is open; links and images outside rows are ignored.
#[derive(Debug, Default)]
struct RowScanner {
    tier: Option<String>,
    row: Option<RowBuild>,
}

impl RowScanner {
    /// Advance by one token; yields a finished `RowContext` on `</tr>`.
    fn step(&mut self, token: &Token) -> Option<RowContext> {
        match token {
            Token::Start { name, attrs } => match name.as_str() {
                "a" => {
                    if let Some(tier) = attr(attrs, "name").and_then(tier_from_anchor) {
                        logd!("items: tier anchor -> {tier}");
                        self.tier = Some(tier);
                    }
                    if let Some(row) = self.row.as_mut() {
                        row.close_link(); // nested <a> without </a>
                        row.link = Some(ParsedLink {
                            href: s!(attr(attrs, "href").unwrap_or("")),
                            ..ParsedLink::default()
                        });
                    }
                    None
                }
                "tr" => {
                    // A missing </tr> must not fuse two rows together.
                    let previous = self.row.take().map(|r| r.finish(self.tier.clone()));
                    self.row = Some(RowBuild::default());
                    previous
                }
                "td" | "th" => {
                    if let Some(row) = self.row.as_mut() {
                        row.close_cell();
                        row.cell = Some(s!());
                    }
                    None
                }
                "img" => {
                    if let Some(row) = self.row.as_mut() {
                        let src = attr(attrs, "src")
                            .filter(|v| !v.is_empty())
                            .or_else(|| attr(attrs, "data-src"))
                            .unwrap_or("");
                        let alt = attr(attrs, "alt").unwrap_or("").trim();
                        if let Some(link) = row.link.as_mut() {
                            if !link.has_image {
                                link.image_src = s!(src);
                                link.image_alt = s!(alt);
                            }
                            link.has_image = true;
                        }
                        row.images.push(ParsedImage { src: s!(src), alt: s!(alt) });
                    }
                    None
                }
                _ => None,
            },
            Token::End { name } => match name.as_str() {
                "a" => {
                    if let Some(row) = self.row.as_mut() {
                        row.close_link();
                    }
                    None
                }
                "td" | "th" => {
                    if let Some(row) = self.row.as_mut() {
                        row.close_cell();
                    }
                    None
                }
                "tr" => {
                    // Snapshot the tier at row close; anchors seen inside the
                    // row still count for it.
                    let tier = self.tier.clone();
                    self.row.take().map(|r| r.finish(tier))
                }
                _ => None,
            },
            Token::Text(raw) => {
                if let Some(row) = self.row.as_mut() {
                    let chunk = normalize_ws(&normalize_entities(raw));
                    if !chunk.is_empty() {
                        if let Some(link) = row.link.as_mut() {
                            push_joined(&mut link.text, &chunk);
                        }
                        if let Some(cell) = row.cell.as_mut() {
                            push_joined(cell, &chunk);
                        }
                    }
                }
                None
            }
        }
    }

    /// Flush a row left open by a truncated document.
    fn finish(&mut self) -> Option<RowContext> {
        let tier = self.tier.clone();
        self.row.take().map(|r| r.finish(tier))
    }
}

fn push_joined(buf: &mut String, chunk: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(chunk);
}

/// Map a named-anchor value to a tier. Numeric sections are `tier-<N>`;
/// "set" and "untiered" sections come in several spellings.
fn tier_from_anchor(name: &str) -> Option<String> {
    let name = name.trim();
    if let Some(c) = TIER_ANCHOR.captures(name) {
        return Some(format!("T{}", &c[1]));
    }
    if let Some(c) = SPECIAL_ANCHOR.captures(name) {
        return Some(c[1].to_ascii_uppercase());
    }
    if UNTIERED_ANCHOR.is_match(name) {
        return Some(s!("UT"));
    }
    if SET_ANCHOR.is_match(name) {
        return Some(s!("ST"));
    }
    None
}

/// Pick the one link that represents the item, or none (not an item row).
fn choose_link(row: &RowContext) -> Option<&ParsedLink> {
    // Most rows nest the icon inside the item's own link.
    if let Some(link) = row.links.iter().find(|l| l.has_image) {
        return Some(link);
    }
    if let [link] = row.links.as_slice() {
        // Sole link with the icon as a sibling image.
        if !row.images.is_empty() {
            return Some(link);
        }
        if !link.text.is_empty() {
            return Some(link);
        }
    }
    None
}

/// Combine the three tier signals. A row-local ST/UT marker overrides the
/// section anchor (special rows sit inside numeric sections); the numeric
/// text token is the weakest signal.
fn resolve_tier(carried: Option<&str>, row_text: &str) -> Option<String> {
    if let Some(c) = SPECIAL_TOKEN.captures(row_text) {
        return Some(c[1].to_ascii_uppercase());
    }
    if let Some(tier) = carried {
        return Some(s!(tier));
    }
    TIER_TOKEN.captures(row_text).map(|c| format!("T{}", &c[1]))
}

fn is_class_name(name: &str) -> bool {
    CLASS_NAMES.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// Build zero, one or seven records out of a finished row.
fn synthesize(
    row: &RowContext,
    base_url: &str,
    default_item_type: Option<&str>,
    out: &mut Vec<ItemRecord>,
) {
    let Some(link) = choose_link(row) else { return };

    let name = if !link.text.is_empty() {
        link.text.clone()
    } else if !link.image_alt.is_empty() {
        link.image_alt.clone()
    } else {
        match row.images.iter().find(|i| !i.alt.is_empty()) {
            Some(image) => image.alt.clone(),
            None => return,
        }
    };

    // Class links show up in the equipment tables as navigation rows.
    if is_class_name(&name) {
        return;
    }

    let icon_src = if !link.image_src.is_empty() {
        link.image_src.as_str()
    } else {
        match row.images.iter().find(|i| !i.src.is_empty()) {
            Some(image) => image.src.as_str(),
            None => return, // no icon, nothing for the sheet to show
        }
    };

    let row_text = {
        let mut t = name.clone();
        for cell in &row.cells {
            push_joined(&mut t, cell);
        }
        t
    };
    let tier = resolve_tier(row.carried_tier.as_deref(), &row_text);

    let item_type = default_item_type
        .map(|t| s!(t))
        .or_else(|| row.cells.get(2).filter(|c| !c.is_empty()).cloned());

    let base = ItemRecord {
        id: format!("item-{}", slugify(&name)),
        name,
        icon_url: absolutize(base_url, icon_src),
        page_url: absolutize(base_url, &link.href),
        item_type,
        tier,
    };

    // One icon standing in for a whole tiered ring family: fan it out.
    let is_ring_bundle = base.item_type.as_deref() == Some(RING_CATEGORY)
        && base.tier.is_none()
        && base.name.ends_with(" Rings");
    if is_ring_bundle {
        for n in 1..=RING_BUNDLE_TIERS {
            let name = format!("{} (T{n})", base.name);
            out.push(ItemRecord {
                id: format!("item-{}", slugify(&name)),
                name,
                tier: Some(format!("T{n}")),
                ..base.clone()
            });
        }
    } else {
        out.push(base);
    }
}

/// Merge by id (first occurrence wins) and sort by case-insensitive name.
/// Callers scraping several category pages apply this once across the
/// concatenation so cross-page duplicates are caught too.
pub fn dedupe_and_sort(records: Vec<ItemRecord>) -> Vec<ItemRecord> {
    let mut seen = HashSet::new();
    let mut out: Vec<ItemRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    out.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    out
}

/// Parse one category page into item records: ids unique, names sorted
/// case-insensitively. Pure text-in/records-out; any markup that cannot be
/// understood just yields fewer rows.
pub fn parse_items(
    html: &str,
    base_url: &str,
    default_item_type: Option<&str>,
) -> Vec<ItemRecord> {
    let mut scanner = RowScanner::default();
    let mut records = Vec::new();

    for token in Tokenizer::new(html) {
        if let Some(row) = scanner.step(&token) {
            synthesize(&row, base_url, default_item_type, &mut records);
        }
    }
    if let Some(row) = scanner.finish() {
        synthesize(&row, base_url, default_item_type, &mut records);
    }

    dedupe_and_sort(records)
}
