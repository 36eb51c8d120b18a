//! Find input devices in sysfs on linux and derive hwdb match strings for them.
//! Everything here is read-only.

use crate::{
    hwdb::{DmiMatch, MatchString},
    Error,
};
use log::{debug, trace};
use std::{
    ffi::OsString,
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

/// Identifiers from the input device `PRODUCT` property
#[derive(PartialEq, Eq, Debug, Default, Clone, Copy)]
pub struct InputId {
    pub bus: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

/// Firmware provided identifiers of the machine. These are shared by all devices.
#[derive(PartialEq, Eq, Debug, Default, Clone)]
pub struct Dmi {
    pub bios_vendor: Option<String>,
    pub sys_vendor: Option<String>,
    pub product_name: Option<String>,
}

/// Properties of a single input event device
#[derive(PartialEq, Eq, Debug, Default, Clone)]
pub struct DeviceProperties {
    /// Name of the event node, e.g. "event13"
    pub sysname: String,
    /// Device name as given by the driver
    pub name: Option<String>,
    /// Physical path, e.g. "isa0060/serio0/input0"
    pub phys: Option<String>,
    /// Bitmask of supported event types, in hex
    pub ev: Option<String>,
    pub input_id: Option<InputId>,
    pub dmi: Dmi,
}

/// Somewhere to get device properties from. On linux this is sysfs; tests use a
/// fixed list.
pub trait PropertySource {
    /// Properties of an event node. Fails with `DeviceNotFound` if there is no such node
    fn properties(&self, sysname: &str) -> Result<DeviceProperties, Error>;

    /// Names of all event nodes, sorted
    fn enumerate(&self) -> Result<Vec<String>, Error>;
}

/// Read device properties from sysfs
pub struct Sysfs {
    root: PathBuf,
}

impl Default for Sysfs {
    fn default() -> Self {
        Sysfs::new("/sys")
    }
}

impl Sysfs {
    /// Use a sysfs mounted at root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Sysfs { root: root.into() }
    }

    fn class_input(&self) -> PathBuf {
        self.root.join("class/input")
    }

    fn read_dmi(&self) -> Dmi {
        let dmi = self.root.join("class/dmi/id");

        let read = |attr: &str| {
            let path = dmi.join(attr);

            match fs::read_to_string(&path) {
                Ok(value) => {
                    let value = dmi_filter(&value);

                    if value.is_empty() {
                        None
                    } else {
                        Some(value)
                    }
                }
                Err(e) => {
                    trace!("{}: {e}", path.display());
                    None
                }
            }
        };

        Dmi {
            bios_vendor: read("bios_vendor"),
            sys_vendor: read("sys_vendor"),
            product_name: read("product_name"),
        }
    }
}

impl PropertySource for Sysfs {
    fn properties(&self, sysname: &str) -> Result<DeviceProperties, Error> {
        let path = self.class_input().join(sysname);

        if !sysname.starts_with("event") || !path.is_dir() {
            return Err(Error::DeviceNotFound(sysname.to_owned()));
        }

        let uevent = read_uevent(&path.join("device"))?;

        let input_id = uevent.product.as_deref().and_then(parse_product);

        Ok(DeviceProperties {
            sysname: sysname.to_owned(),
            name: uevent.name,
            phys: uevent.phys,
            ev: uevent.ev,
            input_id,
            dmi: self.read_dmi(),
        })
    }

    fn enumerate(&self) -> Result<Vec<String>, Error> {
        let path = self.class_input();

        let entries = match fs::read_dir(&path) {
            Ok(res) => res,
            Err(e) => {
                return if e.kind() == ErrorKind::NotFound {
                    // No input subsystem; could be a container
                    Ok(Vec::new())
                } else {
                    Err(Error::io(path, e))
                };
            }
        };

        Ok(event_names(
            entries.map(|entry| entry.map(|entry| entry.file_name())),
            &path,
        ))
    }
}

/// Event node names from a directory listing, sorted. Entries which cannot be read
/// are skipped.
fn event_names(entries: impl Iterator<Item = io::Result<OsString>>, path: &Path) -> Vec<String> {
    let mut list = Vec::new();

    for entry in entries {
        let file_name = match entry {
            Ok(file_name) => file_name,
            Err(e) => {
                debug!("{}: skipping entry: {e}", path.display());
                continue;
            }
        };

        if let Some(file_name) = file_name.to_str() {
            if file_name.starts_with("event") {
                list.push(file_name.to_owned());
            }
        }
    }

    // event2 before event10
    list.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    list
}

#[derive(Default)]
struct UEvent {
    name: Option<String>,
    phys: Option<String>,
    ev: Option<String>,
    product: Option<String>,
}

fn read_uevent(path: &Path) -> Result<UEvent, Error> {
    let file = path.join("uevent");

    let contents = fs::read_to_string(&file).map_err(|e| Error::io(&file, e))?;

    let mut uevent = UEvent::default();

    for line in contents.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value)
            .to_owned();

        match key {
            "NAME" => uevent.name = Some(value),
            "PHYS" => uevent.phys = Some(value),
            "EV" => uevent.ev = Some(value),
            "PRODUCT" => uevent.product = Some(value),
            _ => (),
        }
    }

    Ok(uevent)
}

/// Parse the `PRODUCT=<bus>/<vendor>/<product>/<version>` property, all in hex
fn parse_product(product: &str) -> Option<InputId> {
    let mut fields = product.split('/').map(|f| u16::from_str_radix(f, 16));

    let id = InputId {
        bus: fields.next()?.ok()?,
        vendor: fields.next()?.ok()?,
        product: fields.next()?.ok()?,
        version: fields.next()?.ok()?,
    };

    if fields.next().is_some() {
        None
    } else {
        Some(id)
    }
}

/// The kernel drops spaces, colons and non-printable characters from DMI strings
/// when building the dmi modalias, which is what hwdb matches against.
pub fn dmi_filter(s: &str) -> String {
    s.chars()
        .filter(|c| ('!'..='~').contains(c) && *c != ':')
        .collect()
}

/// Which DMI fields to include in the match string. Fields not included are
/// wildcarded.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct DmiOptions {
    pub sys_vendor: bool,
    pub product_name: bool,
    pub bios_vendor: bool,
}

impl Default for DmiOptions {
    fn default() -> Self {
        DmiOptions {
            sys_vendor: true,
            product_name: false,
            bios_vendor: false,
        }
    }
}

/// Reduce the device or path given on the command line to the event node name
pub fn sysname(identifier: &str) -> &str {
    identifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(identifier)
}

/// Derives hwdb match strings for input devices
pub struct Resolver<P: PropertySource> {
    source: P,
    dmi: DmiOptions,
}

impl<P: PropertySource> Resolver<P> {
    pub fn new(source: P) -> Self {
        Resolver {
            source,
            dmi: DmiOptions::default(),
        }
    }

    pub fn with_dmi(mut self, dmi: DmiOptions) -> Self {
        self.dmi = dmi;
        self
    }

    /// Properties of the device, which may be given as e.g. `event13` or `/dev/input/event13`
    pub fn properties(&self, identifier: &str) -> Result<DeviceProperties, Error> {
        let sysname = sysname(identifier);

        debug!("{identifier}: looking up {sysname}");

        self.source.properties(sysname)
    }

    /// Match string based on device name, physical path and event types
    pub fn resolve(&self, identifier: &str) -> Result<MatchString, Error> {
        let props = self.properties(identifier)?;

        self.name_match(&props)
    }

    /// Match string based on bus, vendor, product and version
    pub fn resolve_input_id(&self, identifier: &str) -> Result<MatchString, Error> {
        let props = self.properties(identifier)?;

        input_id_match(&props)
    }

    pub fn name_match(&self, props: &DeviceProperties) -> Result<MatchString, Error> {
        let dmi = DmiMatch {
            bios_vendor: props.dmi.bios_vendor.clone().filter(|_| self.dmi.bios_vendor),
            sys_vendor: props.dmi.sys_vendor.clone().filter(|_| self.dmi.sys_vendor),
            product_name: props
                .dmi
                .product_name
                .clone()
                .filter(|_| self.dmi.product_name),
        };

        let name = props.name.as_deref().unwrap_or_default();

        let m = MatchString::evdev(name, props.phys.as_deref(), props.ev.as_deref(), dmi)
            .ok_or_else(|| Error::IncompleteDeviceInfo {
                device: props.sysname.clone(),
                missing: "name",
            })?;

        trace!("{}: {m}", props.sysname);

        Ok(m)
    }

    /// All input event devices with their match strings. Devices which cannot be
    /// resolved are skipped.
    pub fn list_devices(&self) -> Result<impl Iterator<Item = (String, MatchString)> + '_, Error> {
        let list = self.source.enumerate()?;

        Ok(list.into_iter().filter_map(move |sysname| {
            match self
                .source
                .properties(&sysname)
                .and_then(|props| self.name_match(&props))
            {
                Ok(m) => Some((sysname, m)),
                Err(e) => {
                    debug!("skipping {e}");
                    None
                }
            }
        }))
    }
}

pub fn input_id_match(props: &DeviceProperties) -> Result<MatchString, Error> {
    let id = props.input_id.ok_or_else(|| Error::IncompleteDeviceInfo {
        device: props.sysname.clone(),
        missing: "bus, vendor and product id",
    })?;

    Ok(MatchString::InputId {
        bus: id.bus,
        vendor: id.vendor,
        product: id.product,
        version: id.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FakeSource(Vec<DeviceProperties>);

    impl PropertySource for FakeSource {
        fn properties(&self, sysname: &str) -> Result<DeviceProperties, Error> {
            self.0
                .iter()
                .find(|p| p.sysname == sysname)
                .cloned()
                .ok_or_else(|| Error::DeviceNotFound(sysname.to_owned()))
        }

        fn enumerate(&self) -> Result<Vec<String>, Error> {
            Ok(self.0.iter().map(|p| p.sysname.clone()).collect())
        }
    }

    fn lenovo() -> Dmi {
        Dmi {
            bios_vendor: Some("LENOVO".into()),
            sys_vendor: Some("LENOVO".into()),
            product_name: Some("20HRCTO1WW".into()),
        }
    }

    fn thinkpad() -> DeviceProperties {
        DeviceProperties {
            sysname: "event13".into(),
            name: Some("ThinkPad Extra Buttons".into()),
            phys: Some("thinkpad_acpi/input0".into()),
            ev: Some("33".into()),
            input_id: Some(InputId {
                bus: 0x19,
                vendor: 0x17aa,
                product: 0x5054,
                version: 0x4101,
            }),
            dmi: lenovo(),
        }
    }

    #[test]
    fn resolve_thinkpad() {
        let resolver = Resolver::new(FakeSource(vec![thinkpad()]));

        assert_eq!(
            resolver.resolve("event13").unwrap().to_string(),
            "evdev:name:ThinkPad Extra Buttons:phys:thinkpad_acpi/input0:ev:33:dmi:bvn*:bvr*:bd*:svnLENOVO:pn*"
        );

        assert_eq!(
            resolver.resolve("/dev/input/event13").unwrap(),
            resolver.resolve("event13").unwrap()
        );

        assert_eq!(
            resolver.resolve_input_id("event13").unwrap().to_string(),
            "evdev:input:b0019v17AAp5054e4101*"
        );

        let resolver = resolver.with_dmi(DmiOptions {
            sys_vendor: true,
            product_name: true,
            bios_vendor: true,
        });

        assert_eq!(
            resolver.resolve("event13").unwrap().to_string(),
            "evdev:name:ThinkPad Extra Buttons:phys:thinkpad_acpi/input0:ev:33:dmi:bvnLENOVO:bvr*:bd*:svnLENOVO:pn20HRCTO1WW"
        );
    }

    #[test]
    fn not_found() {
        let resolver = Resolver::new(FakeSource(vec![thinkpad()]));

        let e = resolver.resolve("event14").unwrap_err();

        assert!(matches!(e, Error::DeviceNotFound(ref s) if s == "event14"));
        assert_eq!(e.to_string(), "event14: no such input device");
    }

    #[test]
    fn incomplete() {
        let resolver = Resolver::new(FakeSource(vec![DeviceProperties {
            sysname: "event3".into(),
            name: Some(String::new()),
            ..Default::default()
        }]));

        assert!(matches!(
            resolver.resolve("event3"),
            Err(Error::IncompleteDeviceInfo {
                missing: "name",
                ..
            })
        ));

        assert!(matches!(
            resolver.resolve_input_id("event3"),
            Err(Error::IncompleteDeviceInfo { .. })
        ));
    }

    #[test]
    fn list_skips_bad() {
        let resolver = Resolver::new(FakeSource(vec![
            thinkpad(),
            DeviceProperties {
                sysname: "event14".into(),
                ..Default::default()
            },
            DeviceProperties {
                sysname: "event2".into(),
                name: Some("Power Button".into()),
                phys: Some("LNXPWRBN/button/input0".into()),
                ev: Some("3".into()),
                ..Default::default()
            },
        ]));

        let list: Vec<_> = resolver
            .list_devices()
            .unwrap()
            .map(|(sysname, m)| format!("{sysname}: {m}"))
            .collect();

        assert_eq!(
            list,
            [
                "event13: evdev:name:ThinkPad Extra Buttons:phys:thinkpad_acpi/input0:ev:33:dmi:bvn*:bvr*:bd*:svnLENOVO:pn*",
                "event2: evdev:name:Power Button:phys:LNXPWRBN/button/input0:ev:3:dmi:bvn*:bvr*:bd*:svn*:pn*"
            ]
        );
    }

    #[test]
    fn list_empty() {
        let resolver = Resolver::new(FakeSource(Vec::new()));

        assert_eq!(resolver.list_devices().unwrap().count(), 0);

        let resolver = Resolver::new(Sysfs::new("testdata/sysfs-empty"));

        assert_eq!(resolver.list_devices().unwrap().count(), 0);
    }

    #[test]
    fn sysfs() {
        let sysfs = Sysfs::new("testdata/sysfs");

        assert_eq!(
            sysfs.enumerate().unwrap(),
            ["event2", "event3", "event13", "event21"]
        );

        assert_eq!(
            sysfs.properties("event13").unwrap(),
            DeviceProperties {
                sysname: "event13".into(),
                name: Some("ThinkPad Extra Buttons".into()),
                phys: Some("thinkpad_acpi/input0".into()),
                ev: Some("33".into()),
                input_id: Some(InputId {
                    bus: 0x19,
                    vendor: 0x17aa,
                    product: 0x5054,
                    version: 0x4101,
                }),
                dmi: Dmi {
                    bios_vendor: Some("LENOVO".into()),
                    sys_vendor: Some("LENOVO".into()),
                    product_name: Some("20HRCTO1WW".into()),
                },
            }
        );

        assert!(matches!(
            sysfs.properties("event99"),
            Err(Error::DeviceNotFound(_))
        ));
        assert!(matches!(
            sysfs.properties("mice"),
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[test]
    fn missing_uevent() {
        let sysfs = Sysfs::new("testdata/sysfs-broken");

        let e = sysfs.properties("event5").unwrap_err();

        assert!(matches!(e, Error::Io { .. }));
        assert_eq!(
            e.to_string(),
            "testdata/sysfs-broken/class/input/event5/device/uevent: No such file or directory (os error 2)"
        );

        let list: Vec<_> = Resolver::new(sysfs)
            .list_devices()
            .unwrap()
            .map(|(sysname, _)| sysname)
            .collect();

        assert_eq!(list, ["event6"]);
    }

    #[test]
    fn unreadable_entries() {
        let entries = vec![
            Ok(OsString::from("event10")),
            Err(io::Error::new(ErrorKind::PermissionDenied, "permission denied")),
            Ok(OsString::from("mouse0")),
            Ok(OsString::from("event2")),
            Err(io::Error::new(ErrorKind::Other, "stale entry")),
            Ok(OsString::from("input4")),
        ];

        assert_eq!(
            event_names(entries.into_iter(), Path::new("/sys/class/input")),
            ["event2", "event10"]
        );
    }

    #[test]
    fn product() {
        assert_eq!(
            parse_product("11/1/1/ab41"),
            Some(InputId {
                bus: 0x11,
                vendor: 1,
                product: 1,
                version: 0xab41
            })
        );
        assert_eq!(parse_product("11/1/1"), None);
        assert_eq!(parse_product("11/1/1/1/1"), None);
        assert_eq!(parse_product("11/x/1/1"), None);
    }

    #[test]
    fn filter() {
        assert_eq!(dmi_filter("Dell Inc.\n"), "DellInc.");
        assert_eq!(dmi_filter("ASUSTeK: COMPUTER"), "ASUSTeKCOMPUTER");
    }

    #[test]
    fn identifiers() {
        assert_eq!(sysname("event13"), "event13");
        assert_eq!(sysname("/dev/input/event13"), "event13");
        assert_eq!(sysname("/sys/class/input/event13/"), "event13");
    }
}
