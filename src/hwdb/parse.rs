//! Parse hwdb text files

use super::Mapping;
use crate::Error;

/// One entry of a hwdb file: one or more match patterns and the properties which
/// apply to devices matching any of them
#[derive(PartialEq, Eq, Debug, Default)]
pub struct HwdbEntry {
    pub matches: Vec<String>,
    pub properties: Vec<(String, String)>,
}

impl HwdbEntry {
    /// The `KEYBOARD_KEY_` properties as mappings. Scancodes wider than a byte are
    /// not included.
    pub fn keys(&self) -> Vec<Mapping> {
        self.properties
            .iter()
            .filter_map(|(key, value)| {
                let hex = key.strip_prefix("KEYBOARD_KEY_")?;

                if hex.len() > 2 {
                    return None;
                }

                let scancode = u8::from_str_radix(hex, 16).ok()?;

                Some(Mapping::new(scancode, value.as_str()))
            })
            .collect()
    }
}

#[doc(hidden)]
pub enum Line<'a> {
    Blank,
    Comment,
    Match(&'a str),
    Property(&'a str, &'a str),
}

peg::parser! {
    grammar hwdb_text() for str {
        pub rule lines() -> Vec<Line<'input>>
        = lines:(line() ** newline()) { lines }

        rule line() -> Line<'input>
        = _ "#" [^'\n']* { Line::Comment }
        / " " _ key:property_name() "=" value:$([^'\n' | '\r']*) "\r"? { Line::Property(key, value) }
        / m:$([^' ' | '\t' | '\n' | '\r' | '#'] [^'\n' | '\r']*) "\r"? { Line::Match(m.trim_end()) }
        / _ "\r"? { Line::Blank }

        rule property_name() -> &'input str
        = quiet!{$(['A'..='Z' | 'a'..='z' | '0'..='9' | '_']+)}
        / expected!("property name")

        rule newline()
        = "\n"

        rule _ = quiet!{[' ' | '\t']*}
    }
}

/// Parse the contents of a hwdb file
pub fn parse(contents: &str) -> Result<Vec<HwdbEntry>, Error> {
    let lines = hwdb_text::lines(contents).map_err(|e| Error::Parse(format!("{e}")))?;

    let mut entries = Vec::new();
    let mut entry = HwdbEntry::default();

    for (line_no, line) in lines.into_iter().enumerate() {
        match line {
            // comments do not end an entry, only empty lines do
            Line::Comment => (),
            Line::Blank => {
                if !entry.matches.is_empty() {
                    entries.push(std::mem::take(&mut entry));
                }
            }
            Line::Match(pattern) => {
                // a match line after properties starts a new entry
                if !entry.properties.is_empty() {
                    entries.push(std::mem::take(&mut entry));
                }

                entry.matches.push(pattern.to_owned());
            }
            Line::Property(key, value) => {
                if entry.matches.is_empty() {
                    return Err(Error::Parse(format!(
                        "line {}: property ‘{key}’ without match",
                        line_no + 1
                    )));
                }

                entry.properties.push((key.to_owned(), value.to_owned()));
            }
        }
    }

    if !entry.matches.is_empty() {
        entries.push(entry);
    }

    Ok(entries)
}
