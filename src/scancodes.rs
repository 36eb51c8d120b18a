//! Parse scancode to key name mappings, given either on the command line as
//! `<hex>=<name>` or in a toml keymap file.

use crate::{hwdb::Mapping, Error};
use itertools::Itertools;
use std::{fs, path::Path};
use toml::{Table, Value};

/// Parse a mapping like `4b=prog1` or `0x4b:prog1`. The scancode is always hex.
pub fn parse_scankey(arg: &str) -> Result<Mapping, Error> {
    let Some((scancode, keycode)) = arg.split_once(['=', ':']) else {
        return Err(Error::mapping(arg, "missing `=` separator"));
    };

    let scancode = parse_scancode(scancode).map_err(|reason| Error::mapping(arg, reason))?;

    check_keycode(keycode).map_err(|reason| Error::mapping(arg, reason))?;

    Ok(Mapping::new(scancode, keycode))
}

fn parse_scancode(s: &str) -> Result<u8, String> {
    let hex = s.strip_prefix("0x").unwrap_or(s);

    if hex.is_empty() {
        return Err("missing scancode".into());
    }

    // from_str_radix would also accept a leading sign
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("scancode ‘{s}’ is not a hex byte"));
    }

    u8::from_str_radix(hex, 16).map_err(|e| format!("scancode ‘{s}’ is not a hex byte: {e}"))
}

fn check_keycode(keycode: &str) -> Result<(), String> {
    if keycode.is_empty() {
        Err("missing key name".into())
    } else if keycode.contains(|c: char| c.is_whitespace() || c == '=') {
        Err(format!("key name ‘{keycode}’ contains whitespace or `=`"))
    } else {
        Ok(())
    }
}

/// A scancode can only be mapped once
pub fn check_duplicates(mappings: &[Mapping]) -> Result<(), Error> {
    if let Some(dup) = mappings.iter().duplicates_by(|m| m.scancode).next() {
        let keycodes = mappings
            .iter()
            .filter(|m| m.scancode == dup.scancode)
            .map(|m| m.keycode.as_str())
            .join(", ");

        return Err(Error::mapping(
            &format!("{:02x}", dup.scancode),
            format!("scancode mapped more than once: {keycodes}"),
        ));
    }

    Ok(())
}

/// Load mappings from a toml file with a `[scancodes]` table, e.g.
///
/// ```toml
/// [scancodes]
/// 0x4b = "prog1"
/// 0x4c = "prog2"
/// ```
///
/// Entries are returned in file order.
pub fn load_keymap(path: &Path) -> Result<Vec<Mapping>, Error> {
    let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    parse_keymap(&contents, path)
}

fn parse_keymap(contents: &str, path: &Path) -> Result<Vec<Mapping>, Error> {
    let err = |reason: String| Error::Keymap {
        path: path.to_owned(),
        reason,
    };

    let top = contents
        .parse::<Table>()
        .map_err(|e| err(e.message().to_owned()))?;

    let Some(Value::Table(scancodes)) = top.get("scancodes") else {
        return Err(err("missing top level scancodes table".into()));
    };

    let mut res = Vec::new();

    for (scancode, keycode) in scancodes {
        let Value::String(keycode) = keycode else {
            return Err(err(format!("scancode {scancode}: key name must be a string")));
        };

        let code = parse_scancode(scancode).map_err(&err)?;

        check_keycode(keycode).map_err(&err)?;

        res.push(Mapping::new(code, keycode.as_str()));
    }

    Ok(res)
}
