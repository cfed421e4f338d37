// tests/classes_parse.rs

use realm_scrape::scrape::classes::parse_classes;

const BASE: &str = "https://www.realmeye.com";

#[test]
fn sample_classes_page_extracts_records() {
    let html = concat!(
        "<!DOCTYPE html><html><body>",
        "<div class=\"nav\"><a href=\"/\">Home</a></div>",
        "<table class=\"table\">",
        "<tr><td><a href=\"/wiki/knight\"><img src=\"/img/knight.png\" alt=\"Knight\"></a></td>",
        "<td>A stalwart defender</td></tr>",
        "<tr><td><a href=\"/wiki/wizard\"><img src=\"/img/wizard.png\" alt=\"Wizard\"></a></td>",
        "<td>A glass cannon</td></tr>",
        "</table>",
        "</body></html>",
    );
    let records = parse_classes(html, BASE);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "class-knight");
    assert_eq!(records[0].icon_url, "https://www.realmeye.com/img/knight.png");
    assert_eq!(records[0].page_url, "https://www.realmeye.com/wiki/knight");
    assert_eq!(records[1].id, "class-wizard");
}

#[test]
fn broken_markup_yields_empty_not_error() {
    assert!(parse_classes("", BASE).is_empty());
    assert!(parse_classes("<a href=\"/wiki/knight\">no image", BASE).is_empty());
    assert!(parse_classes("</a></td> stray ends <img alt=\"x\">", BASE).is_empty());
}

#[test]
fn parsing_is_idempotent() {
    let html = "<a href=\"/wiki/priest\"><img src=\"/img/priest.png\" alt=\"Priest\"></a>";
    assert_eq!(parse_classes(html, BASE), parse_classes(html, BASE));
}
