//! Command-line definitions.

use std::net::IpAddr;
use std::path::PathBuf;

use autoserve_proxy::SslMode;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "autoserve",
    author,
    version,
    about = "Serve a directory over HTTPS with an automatically provisioned DNS name",
    long_about = None
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve a local directory, optionally behind Caddy and a fresh DNS record
    Serve(ServeArgs),
    /// Manage DNS records in the configured zone
    #[command(subcommand)]
    Dns(DnsCommand),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Directory to serve
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Port to listen on (0 picks the first free port from 8000)
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Answer directory requests with 403 instead of a listing
    #[arg(short = 'n', long)]
    pub no_directory_listing: bool,

    /// Put Caddy in front of the file server
    #[arg(long)]
    pub with_caddy: bool,

    /// Public domain for Caddy (defaults to the record created by --with-dns)
    #[arg(long)]
    pub domain: Option<String>,

    /// Trust mode between the Cloudflare edge and Caddy
    #[arg(long, default_value = "flexible", value_parser = parse_ssl_mode)]
    pub ssl_mode: SslMode,

    /// Create a DNS record for this session and delete it on shutdown
    #[arg(long)]
    pub with_dns: bool,

    /// Label for the session record (random when omitted)
    #[arg(short, long, requires = "with_dns")]
    pub subdomain: Option<String>,

    /// Address for the session record (detected when omitted)
    #[arg(long, requires = "with_dns")]
    pub ip: Option<IpAddr>,

    /// Detect the session record address from the local interface
    #[arg(long, requires = "with_dns", conflicts_with = "ip")]
    pub local_ip: bool,

    /// Caddy binary
    #[arg(long, env = "AUTOSERVE_CADDY_BIN", default_value = "caddy")]
    pub caddy_bin: String,

    /// Directory for rendered Caddyfiles
    #[arg(long, env = "AUTOSERVE_CADDY_CONFIG_DIR")]
    pub caddy_config_dir: Option<PathBuf>,

    /// Seconds to wait for Caddy to become ready
    #[arg(long, default_value_t = 10)]
    pub caddy_timeout: u64,

    /// Caddy access log file
    #[arg(long)]
    pub access_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum DnsCommand {
    /// Create an A/AAAA record pointing at this machine
    Create(CreateArgs),
    /// List records in the zone
    List(ListArgs),
    /// Delete a record by id
    Delete(DeleteArgs),
    /// Delete every record this tool created
    Cleanup(OutputArgs),
}

#[derive(Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Address to publish (detected when omitted)
    #[arg(long)]
    pub ip: Option<IpAddr>,

    /// Use the local interface address instead of asking public endpoints
    #[arg(long, conflicts_with = "ip")]
    pub local_ip: bool,

    /// Label to create (random when omitted)
    #[arg(short, long)]
    pub subdomain: Option<String>,

    /// Length of a random label
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u8).range(1..=63))]
    pub length: u8,

    /// Proxy through Cloudflare (default)
    #[arg(long, overrides_with = "no_proxied")]
    pub proxied: bool,

    /// Expose the origin address directly
    #[arg(long, overrides_with = "proxied")]
    pub no_proxied: bool,

    /// TTL in seconds, 1 for automatic
    #[arg(long, default_value_t = 1)]
    pub ttl: u32,

    /// Extra text for the record comment
    #[arg(long)]
    pub comment: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl CreateArgs {
    /// The later of `--proxied` / `--no-proxied` wins
    pub fn is_proxied(&self) -> bool {
        !self.no_proxied
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ListArgs {
    /// Include records this tool did not create
    #[arg(long)]
    pub show_all: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Registrar record id
    pub record_id: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

fn parse_ssl_mode(value: &str) -> Result<SslMode, String> {
    value.parse().map_err(|e: autoserve_proxy::ProxyError| e.to_string())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_defaults_to_proxied() {
        let cli = Cli::try_parse_from(["autoserve", "dns", "create", "--subdomain", "demo"]).unwrap();
        let Command::Dns(DnsCommand::Create(args)) = cli.command else {
            panic!("expected dns create");
        };
        assert!(args.is_proxied());
        assert_eq!(args.length, 8);
        assert_eq!(args.ttl, 1);

        let cli = Cli::try_parse_from(["autoserve", "dns", "create", "--proxied", "--no-proxied"])
            .unwrap();
        let Command::Dns(DnsCommand::Create(args)) = cli.command else {
            panic!("expected dns create");
        };
        assert!(!args.is_proxied());
    }

    #[test]
    fn serve_parses_caddy_options() {
        let cli = Cli::try_parse_from([
            "autoserve",
            "serve",
            "/srv/files",
            "--with-caddy",
            "--domain",
            "x.example.com",
            "--ssl-mode",
            "strict",
            "--port",
            "0",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.path, PathBuf::from("/srv/files"));
        assert_eq!(args.ssl_mode, SslMode::Strict);
        assert_eq!(args.port, 0);
        assert!(args.with_caddy && !args.with_dns);
    }

    #[test]
    fn serve_session_record_address_needs_with_dns() {
        let cli = Cli::try_parse_from(["autoserve", "serve", "--with-dns", "--ip", "1.2.3.4"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.ip, Some("1.2.3.4".parse().unwrap()));
        assert!(!args.local_ip);

        assert!(Cli::try_parse_from(["autoserve", "serve", "--ip", "1.2.3.4"]).is_err());
        assert!(Cli::try_parse_from([
            "autoserve", "serve", "--with-dns", "--ip", "1.2.3.4", "--local-ip"
        ])
        .is_err());
    }

    #[test]
    fn rejects_bad_ssl_mode_and_length() {
        assert!(Cli::try_parse_from(["autoserve", "serve", "--ssl-mode", "off"]).is_err());
        assert!(Cli::try_parse_from(["autoserve", "dns", "create", "--length", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["autoserve", "serve", "--subdomain", "demo"]).is_err(),
            "--subdomain needs --with-dns"
        );
    }
}
