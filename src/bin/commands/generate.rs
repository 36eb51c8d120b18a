use crate::{Generate, MatchBy};
use hwdb_keys::{
    hwdb,
    inputdev::{self, DmiOptions, Resolver, Sysfs},
    scancodes::{check_duplicates, load_keymap},
    Error,
};
use log::{debug, info};
use std::fs;

pub fn generate(sysfs: Sysfs, args: &Generate) -> Result<(), Error> {
    // mappings are checked before the device is looked at
    let mut mappings = Vec::new();

    for keymap in &args.keymap {
        let list = load_keymap(keymap)?;

        debug!("{}: {} mappings", keymap.display(), list.len());

        mappings.extend(list);
    }

    mappings.extend(args.scankey.iter().cloned());

    check_duplicates(&mappings)?;

    let resolver = Resolver::new(sysfs).with_dmi(DmiOptions {
        sys_vendor: true,
        product_name: args.match_product,
        bios_vendor: args.match_bios_vendor,
    });

    let matches = match args.match_by {
        MatchBy::Name => resolver.resolve(&args.device)?,
        MatchBy::InputId => resolver.resolve_input_id(&args.device)?,
    };

    let entry = hwdb::render(&matches, &mappings);

    println!("HWDB entry:\n{entry}");

    if args.dry_run {
        return Ok(());
    }

    fs::write(&args.output, &entry).map_err(|e| Error::Io {
        path: args.output.clone(),
        source: e,
    })?;

    info!("written hwdb entry to {}", args.output.display());

    let sysname = inputdev::sysname(&args.device);

    println!("Run the following commands to update the hwdb:");
    println!(
        "sudo cp {} {}/",
        args.output.display(),
        args.hwdb_dir.display()
    );
    println!("sudo systemd-hwdb update");
    println!("sudo udevadm trigger --sysname-match={sysname}");
    println!("udevadm info /dev/input/{sysname}");

    Ok(())
}
