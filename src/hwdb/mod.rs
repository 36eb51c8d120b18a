//! Render and parse systemd hwdb keyboard entries

use std::fmt::{self, Write};

mod parse;

pub use parse::{parse, HwdbEntry};

/// Single scancode to key name remapping
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Mapping {
    pub scancode: u8,
    /// Key name as understood by udev, e.g. `prog1` or `f13`. Not validated against
    /// the kernel key table
    pub keycode: String,
}

impl Mapping {
    pub fn new(scancode: u8, keycode: impl Into<String>) -> Self {
        Mapping {
            scancode,
            keycode: keycode.into(),
        }
    }
}

/// DMI fields included in an evdev name match. `None` matches anything.
#[derive(PartialEq, Eq, Debug, Default, Clone)]
pub struct DmiMatch {
    pub bios_vendor: Option<String>,
    pub sys_vendor: Option<String>,
    pub product_name: Option<String>,
}

/// A hwdb match pattern for an input device
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum MatchString {
    /// `evdev:name:<name>:phys:<phys>:ev:<ev>:dmi:bvn<..>:bvr*:bd*:svn<..>:pn<..>`
    Evdev {
        name: String,
        phys: Option<String>,
        ev: Option<String>,
        dmi: DmiMatch,
    },
    /// `evdev:input:b<bus>v<vendor>p<product>e<version>*`
    InputId {
        bus: u16,
        vendor: u16,
        product: u16,
        version: u16,
    },
}

impl MatchString {
    /// Match on the device name. Returns `None` if the name is empty, since that
    /// would not identify any device.
    pub fn evdev(
        name: &str,
        phys: Option<&str>,
        ev: Option<&str>,
        dmi: DmiMatch,
    ) -> Option<Self> {
        if name.is_empty() {
            return None;
        }

        let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_owned);

        Some(MatchString::Evdev {
            name: name.to_owned(),
            phys: non_empty(phys),
            ev: non_empty(ev),
            dmi: DmiMatch {
                bios_vendor: dmi.bios_vendor.filter(|s| !s.is_empty()),
                sys_vendor: dmi.sys_vendor.filter(|s| !s.is_empty()),
                product_name: dmi.product_name.filter(|s| !s.is_empty()),
            },
        })
    }
}

impl fmt::Display for MatchString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn field(s: &Option<String>) -> &str {
            s.as_deref().unwrap_or("*")
        }

        match self {
            MatchString::Evdev {
                name,
                phys,
                ev,
                dmi,
            } => write!(
                f,
                "evdev:name:{name}:phys:{}:ev:{}:dmi:bvn{}:bvr*:bd*:svn{}:pn{}",
                field(phys),
                field(ev),
                field(&dmi.bios_vendor),
                field(&dmi.sys_vendor),
                field(&dmi.product_name)
            ),
            MatchString::InputId {
                bus,
                vendor,
                product,
                version,
            } => write!(f, "evdev:input:b{bus:04X}v{vendor:04X}p{product:04X}e{version:04X}*"),
        }
    }
}

/// Render a hwdb entry: the match line followed by one ` KEYBOARD_KEY_xx=name` line
/// per mapping, in the given order.
pub fn render(matches: &MatchString, mappings: &[Mapping]) -> String {
    let mut s = format!("{matches}\n");

    for mapping in mappings {
        assert!(
            !mapping.keycode.is_empty()
                && !mapping
                    .keycode
                    .contains(|c: char| c.is_whitespace() || c == '='),
            "key name ‘{}’ cannot be used in hwdb",
            mapping.keycode
        );

        writeln!(s, " KEYBOARD_KEY_{:02x}={}", mapping.scancode, mapping.keycode).unwrap();
    }

    s
}
