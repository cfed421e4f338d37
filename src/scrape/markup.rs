// src/scrape/markup.rs
//
// Forward-only tag/text tokenizer for the wiki's markup. No DOM, no
// lookahead, no errors: whatever the input looks like, the scan terminates
// and yields a (possibly empty) event sequence. Unclosed tags and stray end
// tags are somebody else's problem — downstream trackers ignore what they
// cannot use.

use crate::core::sanitize::normalize_entities;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Opening tag. Void elements (e.g. `<img>`) only ever produce this.
    /// Duplicate attributes resolve last-write-wins.
    Start { name: String, attrs: Vec<(String, String)> },
    End { name: String },
    Text(String),
}

/// Attribute lookup by (lowercased) name.
pub fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

pub struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    pub fn new(doc: &'a str) -> Self {
        Self { rest: doc }
    }

    fn take(&mut self, n: usize) -> &'a str {
        let (head, tail) = self.rest.split_at(n);
        self.rest = tail;
        head
    }

    fn take_char(&mut self) {
        if let Some(c) = self.rest.chars().next() {
            self.take(c.len_utf8());
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest.trim_start();
        self.rest = trimmed;
    }

    fn read_name(&mut self) -> String {
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
            .unwrap_or(self.rest.len());
        self.take(end).to_ascii_lowercase()
    }

    fn read_attr_name(&mut self) -> String {
        let end = self
            .rest
            .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/' | '"' | '\''))
            .unwrap_or(self.rest.len());
        self.take(end).to_ascii_lowercase()
    }

    fn read_attr_value(&mut self) -> String {
        match self.rest.chars().next() {
            Some(q @ ('"' | '\'')) => {
                self.take(1);
                match self.rest.find(q) {
                    Some(i) => {
                        let v = self.take(i).to_string();
                        self.take(1); // closing quote
                        v
                    }
                    None => {
                        // Unterminated quote: swallow the remainder.
                        let v = self.rest.to_string();
                        self.rest = "";
                        v
                    }
                }
            }
            _ => {
                let end = self
                    .rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(self.rest.len());
                let mut v = self.take(end).to_string();
                // `src=foo/>` — the slash belongs to the tag, not the value
                if v.ends_with('/') && self.rest.starts_with('>') {
                    v.pop();
                }
                v
            }
        }
    }

    fn read_start_tag(&mut self) -> Token {
        self.take(1); // '<'
        let name = self.read_name();
        let mut attrs: Vec<(String, String)> = Vec::new();

        loop {
            while self.rest.starts_with(|c: char| c.is_whitespace() || c == '/') {
                self.take_char();
            }
            if self.rest.is_empty() {
                break;
            }
            if self.rest.starts_with('>') {
                self.take(1);
                break;
            }

            let key = self.read_attr_name();
            if key.is_empty() {
                self.take_char(); // junk byte; keep the scan moving
                continue;
            }
            self.skip_ws();
            let value = if self.rest.starts_with('=') {
                self.take(1);
                self.skip_ws();
                self.read_attr_value()
            } else {
                s!()
            };

            let value = normalize_entities(&value);
            match attrs.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => attrs.push((key, value)),
            }
        }

        Token::Start { name, attrs }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if self.rest.is_empty() {
                return None;
            }

            if !self.rest.starts_with('<') {
                let end = self.rest.find('<').unwrap_or(self.rest.len());
                let text = self.take(end);
                return Some(Token::Text(s!(text)));
            }

            let after = &self.rest[1..];

            if after.starts_with("!--") {
                match self.rest.find("-->") {
                    Some(i) => {
                        self.take(i + 3);
                    }
                    None => self.rest = "",
                }
                continue;
            }

            // Doctype, processing instructions
            if after.starts_with('!') || after.starts_with('?') {
                match self.rest.find('>') {
                    Some(i) => {
                        self.take(i + 1);
                    }
                    None => self.rest = "",
                }
                continue;
            }

            if let Some(name_part) = after.strip_prefix('/') {
                let end = name_part
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
                    .unwrap_or(name_part.len());
                let name = name_part[..end].to_ascii_lowercase();
                match self.rest.find('>') {
                    Some(i) => {
                        self.take(i + 1);
                    }
                    None => self.rest = "",
                }
                if name.is_empty() {
                    continue;
                }
                return Some(Token::End { name });
            }

            if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                return Some(self.read_start_tag());
            }

            // A bare '<' that opens nothing; pass it through as text.
            let end = match after.find('<') {
                Some(i) => i + 1,
                None => self.rest.len(),
            };
            let text = self.take(end);
            return Some(Token::Text(s!(text)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(doc: &str) -> Vec<Token> {
        Tokenizer::new(doc).collect()
    }

    #[test]
    fn plain_tags_and_text() {
        let t = toks("<tr><td>Hi</td></tr>");
        assert_eq!(
            t,
            vec![
                Token::Start { name: s!("tr"), attrs: vec![] },
                Token::Start { name: s!("td"), attrs: vec![] },
                Token::Text(s!("Hi")),
                Token::End { name: s!("td") },
                Token::End { name: s!("tr") },
            ]
        );
    }

    #[test]
    fn attributes_quoted_unquoted_and_bare() {
        let t = toks(r#"<a href="/wiki/x" name=anchor hidden>"#);
        let Token::Start { name, attrs } = &t[0] else { panic!("want start tag") };
        assert_eq!(name, "a");
        assert_eq!(attr(attrs, "href"), Some("/wiki/x"));
        assert_eq!(attr(attrs, "name"), Some("anchor"));
        assert_eq!(attr(attrs, "hidden"), Some(""));
    }

    #[test]
    fn duplicate_attributes_last_write_wins() {
        let t = toks(r#"<img src="a.png" src="b.png">"#);
        let Token::Start { attrs, .. } = &t[0] else { panic!("want start tag") };
        assert_eq!(attr(attrs, "src"), Some("b.png"));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn self_closing_img_is_start_only() {
        let t = toks(r#"<img src="i.png" alt="Icon"/>"#);
        assert_eq!(t.len(), 1);
        let Token::Start { name, attrs } = &t[0] else { panic!("want start tag") };
        assert_eq!(name, "img");
        assert_eq!(attr(attrs, "alt"), Some("Icon"));
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let t = toks("<!DOCTYPE html><!-- <tr>nope</tr> --><p>ok</p>");
        assert_eq!(
            t,
            vec![
                Token::Start { name: s!("p"), attrs: vec![] },
                Token::Text(s!("ok")),
                Token::End { name: s!("p") },
            ]
        );
    }

    #[test]
    fn entities_in_attribute_values_are_decoded() {
        let t = toks(r#"<a href="/wiki/x?a=1&amp;b=2">"#);
        let Token::Start { attrs, .. } = &t[0] else { panic!("want start tag") };
        assert_eq!(attr(attrs, "href"), Some("/wiki/x?a=1&b=2"));
    }

    #[test]
    fn stray_angle_brackets_and_truncation_terminate() {
        assert_eq!(toks("a < b"), vec![Token::Text(s!("a ")), Token::Text(s!("< b"))]);
        // Truncated mid-tag: no panic, no hang.
        let t = toks("<td><a href=\"/wiki/x");
        assert_eq!(t[0], Token::Start { name: s!("td"), attrs: vec![] });
        assert_eq!(t.len(), 2);
        assert_eq!(toks(""), vec![]);
    }
}
