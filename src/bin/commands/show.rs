use crate::Show;
use hwdb_keys::{hwdb, Error};
use std::fs;

pub fn show(args: &Show) -> Result<(), Error> {
    let contents = fs::read_to_string(&args.file).map_err(|e| Error::Io {
        path: args.file.clone(),
        source: e,
    })?;

    let entries = hwdb::parse(&contents)
        .map_err(|e| Error::Parse(format!("{}: {e}", args.file.display())))?;

    for entry in entries {
        if args.keys {
            for key in entry.keys() {
                println!("{:02x}={}", key.scancode, key.keycode);
            }
            continue;
        }

        for matches in &entry.matches {
            println!("{matches}");
        }

        for (key, value) in &entry.properties {
            if let Some(scancode) = key.strip_prefix("KEYBOARD_KEY_") {
                println!("\tScancode\t\t: 0x{scancode} => {value}");
            } else {
                println!("\t{key}\t\t: {value}");
            }
        }
    }

    Ok(())
}
