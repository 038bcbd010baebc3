//! proctree - Display a tree of processes.
//!
//! Usage:
//!   proctree              # whole tree below init (PID 1), compact
//!   proctree 1234         # subtree rooted at PID 1234
//!   proctree -p -n        # show PIDs, sort by PID (one line per process)
//!   proctree -H 1234      # highlight PID 1234 and its ancestors
//!   proctree --dump > t.json && proctree --snapshot t.json

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::Path;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_os = "linux"))]
use proctree_core::collector::MockFs;
use proctree_core::collector::{RealFs, ScanOptions, UserResolver};
use proctree_core::provider::{LiveProvider, SnapshotProvider, TableProvider, to_json};
use proctree_core::render::{RenderOptions, render_tree};
use proctree_core::tree::{Ancestry, ProcessForest, SortMode};

/// PID of the init process, the default root.
const INIT_PID: u32 = 1;

/// Display a tree of processes.
#[derive(Parser)]
#[command(name = "proctree", about = "Display a tree of processes", version)]
struct Args {
    /// Show command line arguments.
    #[arg(short = 'a', long = "arguments")]
    arguments: bool,

    /// Use ASCII line drawing characters.
    #[arg(short = 'A', long)]
    ascii: bool,

    /// Don't fold single-child chains.
    #[arg(short = 'c', long = "compact-not")]
    compact_not: bool,

    /// Show process group ids; implies -c.
    #[arg(short = 'g', long = "show-pgids")]
    show_pgids: bool,

    /// Highlight this process and its ancestors.
    #[arg(short = 'H', long = "highlight", value_name = "PID")]
    highlight: Option<u32>,

    /// Sort output by PID.
    #[arg(short = 'n', long = "numeric-sort")]
    numeric_sort: bool,

    /// Show PIDs; implies -c.
    #[arg(short = 'p', long = "show-pids")]
    show_pids: bool,

    /// Show uid transitions.
    #[arg(short = 'u', long = "uid-changes")]
    uid_changes: bool,

    /// Path to /proc filesystem.
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Path to the passwd file used to name process owners.
    #[arg(long, default_value = "/etc/passwd")]
    passwd_path: String,

    /// Render a snapshot recorded with --dump instead of the live system.
    #[arg(long, value_name = "FILE")]
    snapshot: Option<String>,

    /// Print the process table as JSON instead of the tree.
    #[arg(long)]
    dump: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,

    /// Root of the displayed tree (default: 1).
    #[arg(value_name = "PID|USER")]
    target: Option<String>,
}

impl Args {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            show_pids: self.show_pids,
            show_args: self.arguments,
            show_pgids: self.show_pgids,
            show_owner_changes: self.uid_changes,
            ascii: self.ascii,
            compact: !self.compact_not,
            highlight: self.highlight,
        }
    }

    fn sort_mode(&self) -> SortMode {
        if self.numeric_sort {
            SortMode::Numeric
        } else {
            SortMode::Name
        }
    }

    /// Root of the displayed tree; `None` when the target names a user.
    fn root_pid(&self) -> Option<u32> {
        match self.target.as_deref() {
            None => Some(INIT_PID),
            Some(target) => target.parse().ok(),
        }
    }
}

/// Help and version requests succeed; every other parse failure is a usage error.
fn usage_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is WARN since the tree itself goes to stdout. Use -q for errors only.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["proctree", "proctree_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(usage_exit_code(e.kind()));
        }
    };

    init_logging(args.verbose, args.quiet);

    let Some(root_pid) = args.root_pid() else {
        eprintln!("User filtering not implemented");
        std::process::exit(1);
    };

    let scan = ScanOptions {
        with_args: args.arguments,
    };
    let provider: Box<dyn TableProvider> = if let Some(ref path) = args.snapshot {
        Box::new(
            SnapshotProvider::new(RealFs::new(), path)
                .with_users(UserResolver::load(&RealFs::new(), Path::new(&args.passwd_path))),
        )
    } else {
        #[cfg(target_os = "linux")]
        let fs = RealFs::new();
        #[cfg(not(target_os = "linux"))]
        let fs = MockFs::typical_system();
        Box::new(LiveProvider::new(fs, &args.proc_path, &args.passwd_path, scan))
    };

    let table = match provider.load() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        processes = table.len(),
        live = provider.is_live(),
        "process table loaded"
    );

    if args.dump {
        match to_json(&table) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let forest = ProcessForest::build(&table, args.sort_mode());
    let options = args.render_options();

    if let Some(target) = options.highlight {
        let path = Ancestry::new(&forest, Some(target)).highlight_path();
        if path.is_empty() {
            warn!(pid = target, "highlight target not in process table");
        } else {
            debug!(?path, "highlighting");
        }
    }

    match render_tree(&forest, &table, provider.user_resolver(), &options, root_pid) {
        Ok(out) => print!("{}", out),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
