use crate::List;
use hwdb_keys::{
    inputdev::{input_id_match, Resolver, Sysfs},
    Error,
};

pub fn list(sysfs: Sysfs, args: &List) -> Result<(), Error> {
    let resolver = Resolver::new(sysfs);

    for (sysname, matches) in resolver.list_devices()? {
        if !args.long {
            println!("{sysname}: {matches}");
            continue;
        }

        let Ok(props) = resolver.properties(&sysname) else {
            continue;
        };

        println!("{sysname}:");

        if let Some(name) = &props.name {
            println!("\tName\t\t\t: {name}");
        }
        if let Some(phys) = &props.phys {
            println!("\tPhysical Path\t\t: {phys}");
        }
        if let Some(ev) = &props.ev {
            println!("\tEvent Types\t\t: {ev}");
        }
        if let Some(id) = &props.input_id {
            println!(
                "\tBus/vendor/product\t: {:04x}:{:04x}:{:04x} version 0x{:04x}",
                id.bus, id.vendor, id.product, id.version
            );
        }
        println!("\tMatch\t\t\t: {matches}");
        if let Ok(matches) = input_id_match(&props) {
            println!("\tMatch by Id\t\t: {matches}");
        }
    }

    Ok(())
}
