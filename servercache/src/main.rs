use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use server_store::{SharedStore, StoreConfig};
use servercache_core::ServerRecord;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;

const LOG_ENV: &str = "SERVERCACHE_LOG";
#[cfg(feature = "prefs")]
const DEFAULT_PREFS_FILE: &str = "servercache-prefs.yaml";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Text, Json, Jsonl }

#[derive(Debug, Parser)]
#[command(name = "servercache", version, about = "Local VPN server cache with starred-server preservation")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./servercache.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database file (overrides db_path from the config)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,
    /// Preference file holding the last connected server
    #[arg(long, global = true, value_name = "FILE")]
    prefs: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Replace the cached server set with a freshly fetched one (JSON array). Starred servers are kept.
    Import {
        /// JSON file with an array of server records
        file: PathBuf,
    },
    /// List cached servers
    List {
        /// Output format: text, json, or jsonl
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Output file (overwrites)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Write CSV instead of text/json when --out is provided
        #[arg(long, default_value_t = false, requires = "out")]
        csv: bool,
        /// Only show starred servers
        #[arg(long, default_value_t = false)]
        starred: bool,
    },
    /// Star every cached server with this IP address
    Star { ip: String },
    /// Remove the star from every cached server with this IP address
    Unstar { ip: String },
    /// Print the edit script turning one server list into another (JSON lines)
    #[cfg(feature = "reconcile")]
    Diff {
        /// JSON file with the list currently shown
        old: PathBuf,
        /// JSON file with the list to show next
        new: PathBuf,
    },
    /// Show or update the last connected server
    #[cfg(feature = "prefs")]
    Last {
        /// Remember the cached server with this host name
        #[arg(long, conflicts_with = "clear")]
        set_host: Option<String>,
        /// Forget the last connected server
        #[arg(long, default_value_t = false)]
        clear: bool,
        /// Output format: text, json, or jsonl
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level.unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn store_config(cli_db: Option<PathBuf>, cfg: &config::Config) -> StoreConfig {
    let path = cli_db
        .or_else(|| cfg.db_path.clone())
        .unwrap_or_else(|| StoreConfig::default().path);
    let mut store_cfg = StoreConfig::new(path);
    if let Some(ms) = cfg.busy_timeout_ms {
        store_cfg = store_cfg.busy_timeout(Duration::from_millis(ms));
    }
    if let Some(mode) = cfg.synchronous.as_deref() {
        store_cfg = store_cfg.synchronous(mode);
    }
    store_cfg
}

fn read_servers(path: &Path) -> Result<Vec<ServerRecord>> {
    let s = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing server list {}", path.display()))
}

/// Bits per second as a short decimal string, e.g. "52.3 Mbps".
fn human_speed(bits: i64) -> String {
    const UNITS: [&str; 5] = ["bps", "Kbps", "Mbps", "Gbps", "Tbps"];
    if bits < 1000 {
        return format!("{} {}", bits.max(0), UNITS[0]);
    }
    let mut v = bits as f64;
    let mut unit = 0;
    while v >= 1000.0 && unit + 1 < UNITS.len() {
        v /= 1000.0;
        unit += 1;
    }
    format!("{:.1} {}", v, UNITS[unit])
}

fn text_line(s: &ServerRecord) -> String {
    format!(
        "{}{} {}:{}/{} {} {} ping {}",
        if s.is_starred { "* " } else { "  " },
        s.host_name,
        s.ip_address,
        s.port,
        s.protocol.to_uppercase(),
        s.country_long,
        human_speed(s.speed),
        s.ping,
    )
}

fn write_servers(w: &mut dyn Write, servers: &[ServerRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for s in servers {
                writeln!(w, "{}", text_line(s))?;
            }
        }
        OutputFormat::Json => writeln!(w, "{}", serde_json::to_string_pretty(servers)?)?,
        OutputFormat::Jsonl => {
            for s in servers {
                writeln!(w, "{}", serde_json::to_string(s)?)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    init_logging(cfg.log_level.as_deref());

    let store = SharedStore::new(store_config(cli.db, &cfg));
    #[cfg(feature = "prefs")]
    let prefs = preferences::PreferenceCache::new(
        cli.prefs
            .or_else(|| cfg.prefs_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_FILE)),
    );

    match cli.command {
        Commands::Version => {
            println!("servercache {} (core {}, schema v{})", env!("CARGO_PKG_VERSION"), servercache_core::version(), server_store::SCHEMA_VERSION);
        }
        Commands::Import { file } => {
            let servers = read_servers(&file)?;
            let store = store.get()?;
            store.replace(&servers)?;
            tracing::info!(count = servers.len(), file = %file.display(), "imported server list");
            let total = store.count()?;
            println!("imported {} servers ({} cached, starred kept)", servers.len(), total);
        }
        Commands::List { format, out, csv, starred } => {
            let mut servers = store.get()?.load_all()?;
            if starred {
                servers.retain(|s| s.is_starred);
            }
            match out {
                Some(path) if csv => {
                    let mut wtr = csv::Writer::from_writer(std::fs::File::create(&path)?);
                    for s in &servers {
                        wtr.serialize(s)?;
                    }
                    wtr.flush()?;
                }
                Some(path) => {
                    let mut w = BufWriter::new(std::fs::File::create(&path)?);
                    write_servers(&mut w, &servers, format)?;
                    w.flush()?;
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut w = stdout.lock();
                    write_servers(&mut w, &servers, format)?;
                }
            }
        }
        Commands::Star { ip } => {
            store.get()?.set_starred(&ip, true)?;
            println!("starred {ip}");
        }
        Commands::Unstar { ip } => {
            store.get()?.set_starred(&ip, false)?;
            println!("unstarred {ip}");
        }
        #[cfg(feature = "reconcile")]
        Commands::Diff { old, new } => {
            let old = read_servers(&old)?;
            let new = read_servers(&new)?;
            let script = reconcile::diff(&old, &new);
            tracing::debug!(edits = script.len(), "computed edit script");
            for edit in script.edits() {
                println!("{}", serde_json::to_string(edit)?);
            }
        }
        #[cfg(feature = "prefs")]
        Commands::Last { set_host, clear, format } => {
            if clear {
                prefs.clear()?;
                println!("cleared last server");
                return Ok(());
            }
            if let Some(host) = set_host {
                let servers = store.get()?.load_all()?;
                let server = servers
                    .iter()
                    .find(|s| s.host_name == host)
                    .with_context(|| format!("no cached server with host name {host}"))?;
                prefs.save_server(server)?;
            }
            match (prefs.server()?, format) {
                (None, OutputFormat::Text) => println!("no last server"),
                (None, _) => println!("null"),
                (Some(last), OutputFormat::Text) => println!("{}", text_line(&last.into_record())),
                (Some(last), OutputFormat::Json) => println!("{}", serde_json::to_string_pretty(&last)?),
                (Some(last), OutputFormat::Jsonl) => println!("{}", serde_json::to_string(&last)?),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_is_humanized() {
        assert_eq!(human_speed(0), "0 bps");
        assert_eq!(human_speed(999), "999 bps");
        assert_eq!(human_speed(52_300_000), "52.3 Mbps");
        assert_eq!(human_speed(1_500_000_000), "1.5 Gbps");
    }

    #[test]
    fn cli_db_overrides_config() {
        let cfg = config::Config {
            db_path: Some(PathBuf::from("from-config.db")),
            busy_timeout_ms: Some(250),
            synchronous: Some("off".into()),
            ..Default::default()
        };
        let sc = store_config(Some(PathBuf::from("from-cli.db")), &cfg);
        assert_eq!(sc.path, PathBuf::from("from-cli.db"));
        assert_eq!(sc.busy_timeout, Duration::from_millis(250));
        assert_eq!(sc.synchronous, "OFF");

        let sc = store_config(None, &config::Config::default());
        assert_eq!(sc.path, StoreConfig::default().path);
    }

    #[test]
    fn text_line_marks_starred_servers() {
        let mut s = ServerRecord::new("vpn1", "1.2.3.4");
        s.port = 1194;
        s.protocol = "udp".into();
        s.is_starred = true;
        let line = text_line(&s);
        assert!(line.starts_with("* vpn1 1.2.3.4:1194/UDP"), "{line}");
    }

    #[test]
    fn jsonl_writes_one_line_per_server() {
        let servers = vec![ServerRecord::new("a", "1"), ServerRecord::new("b", "2")];
        let mut buf = Vec::new();
        write_servers(&mut buf, &servers, OutputFormat::Jsonl).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        let first: ServerRecord = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first.host_name, "a");
    }

    #[test]
    fn cli_parses_list_flags() {
        let cli = Cli::try_parse_from(["servercache", "--db", "x.db", "list", "--format", "jsonl", "--starred"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        assert!(matches!(cli.command, Commands::List { format: OutputFormat::Jsonl, starred: true, .. }));
        assert!(Cli::try_parse_from(["servercache", "list", "--csv"]).is_err());
    }
}
