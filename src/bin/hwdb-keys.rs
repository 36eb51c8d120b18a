use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use hwdb_keys::{hwdb::Mapping, inputdev::Sysfs, scancodes::parse_scankey};
use log::{Level, LevelFilter, Metadata, Record};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "hwdb-keys",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Remap keyboard scancodes using systemd hwdb",
    subcommand_required = true
)]
struct App {
    /// Increase message verbosity
    #[arg(long, short, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    /// Silence all warnings
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Where sysfs is mounted
    #[arg(long = "sysfs", global = true, default_value = "/sys")]
    sysfs: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate hwdb entry for input device
    Generate(Generate),
    /// List input devices and their match strings
    List(List),
    /// Show entries in hwdb file
    Show(Show),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MatchBy {
    /// Device name, physical path, event types and system vendor
    Name,
    /// Bus, vendor, product and version id
    InputId,
}

#[derive(Args)]
struct Generate {
    /// Input device to remap keys for (e.g. event13)
    #[arg(name = "DEVICE")]
    device: String,

    /// Scancode to key name mapping like 4b=prog1. Scancodes are hex
    #[arg(
        long = "set-key",
        short = 'k',
        visible_alias = "mapping",
        value_parser = parse_scankey,
        value_delimiter = ',',
        required_unless_present = "keymap",
        name = "SCANKEY",
        help_heading = "MAPPING"
    )]
    scankey: Vec<Mapping>,

    /// Load scancode mappings from toml keymap
    #[arg(long = "keymap", short = 'K', name = "keymap", help_heading = "MAPPING")]
    keymap: Vec<PathBuf>,

    /// Match device by
    #[arg(long = "match-by", value_enum, default_value_t = MatchBy::Name, help_heading = "MATCH")]
    match_by: MatchBy,

    /// Also match on the system product name
    #[arg(long = "match-product", help_heading = "MATCH")]
    match_product: bool,

    /// Also match on the BIOS vendor
    #[arg(long = "match-bios-vendor", help_heading = "MATCH")]
    match_bios_vendor: bool,

    /// File to write the hwdb entry to
    #[arg(long = "output", short = 'o', default_value = "99-keyboard.hwdb")]
    output: PathBuf,

    /// Directory the hwdb file should be installed in
    #[arg(long = "hwdb-dir", default_value = "/etc/udev/hwdb.d")]
    hwdb_dir: PathBuf,

    /// Print hwdb entry but do not write it
    #[arg(long = "dry-run", short = 'n')]
    dry_run: bool,
}

#[derive(Args)]
struct List {
    /// Show all device properties
    #[arg(long = "long", short = 'l')]
    long: bool,
}

#[derive(Args)]
struct Show {
    /// Only print keyboard mappings, in a form accepted by --set-key
    #[arg(long = "keys", short = 'k')]
    keys: bool,

    /// hwdb file
    #[arg(name = "FILE")]
    file: PathBuf,
}

fn main() {
    let args = App::parse();

    log::set_logger(&CLI_LOGGER).unwrap();

    let level = if args.quiet {
        LevelFilter::Error
    } else {
        match args.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    log::set_max_level(level);

    let sysfs = Sysfs::new(&args.sysfs);

    let res = match &args.command {
        Commands::Generate(args) => commands::generate::generate(sysfs, args),
        Commands::List(args) => commands::list::list(sysfs, args),
        Commands::Show(args) => commands::show::show(args),
    };

    if let Err(e) = res {
        log::error!("{e}");
        std::process::exit(e.exit_code());
    }
}

static CLI_LOGGER: CliLogger = CliLogger;

struct CliLogger;

impl log::Log for CliLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{}: {}",
                match record.level() {
                    Level::Trace => "trace",
                    Level::Debug => "debug",
                    Level::Info => "info",
                    Level::Warn => "warn",
                    Level::Error => "error",
                },
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
