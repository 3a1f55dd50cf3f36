//! account-bridge CLI - JSON in, JSON out
//!
//! Every command works on raw snapshots (the same JSON `to_account_raw` /
//! `to_transaction_raw` produce) against the mock registry:
//!   account-bridge id decode <id>                    → identity fields
//!   account-bridge id switch <id> <type> [version]   → {"id": ...}
//!   account-bridge sync <account.json> [--clear]     → synced account
//!   account-bridge create <account.json>             → empty transaction
//!   account-bridge prepare <account.json> <tx.json>  → prepared transaction
//!   account-bridge status <account.json> <tx.json>   → transaction status
//!   account-bridge variants                          → registered bridges
//!
//! Output format:
//!   --json     Compact JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use account_bridge::logging::init_logging;
use account_bridge::{
    decode_account_id, from_account_raw, from_transaction_raw, switch_account_bridge, to_account_raw, to_transaction_raw, Account,
    AccountBridge, AccountRaw, BridgeConfig, BridgeRegistry, TransactionRaw,
};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::debug;

#[tokio::main]
async fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("account-bridge {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("id") => cmd_id(&opts),
        Some("sync") => cmd_sync(&opts).await,
        Some("create") => cmd_create(&opts),
        Some("prepare") => cmd_prepare(&opts).await,
        Some("status") => cmd_status(&opts),
        Some("variants") => cmd_variants(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    args: Vec<String>,
    config: Option<String>,
    clear: bool,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--clear" => opts.clear = true,
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        opts.config = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts.args = positional;

        if opts.config.is_none() {
            opts.config = env::var("ACCOUNT_BRIDGE_CONFIG").ok().filter(|s| !s.is_empty());
        }

        opts
    }

    fn arg(&self, index: usize, name: &str) -> Result<&str> {
        self.args.get(index).map(String::as_str).ok_or_else(|| anyhow!("missing <{}>", name))
    }
}

fn registry(opts: &ParsedArgs) -> Result<BridgeRegistry> {
    let config = match &opts.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    debug!(config = ?config, "registry");
    Ok(BridgeRegistry::mock(config))
}

fn read_account(path: &str) -> Result<Account> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let raw: AccountRaw = serde_json::from_str(&contents).with_context(|| format!("parsing {}", path))?;
    Ok(from_account_raw(&raw)?)
}

fn read_transaction(path: &str) -> Result<account_bridge::Transaction> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let raw: TransactionRaw = serde_json::from_str(&contents).with_context(|| format!("parsing {}", path))?;
    Ok(from_transaction_raw(&raw)?)
}

fn cmd_id(opts: &ParsedArgs) -> Result<Value> {
    match opts.arg(0, "decode|switch")? {
        "decode" => Ok(serde_json::to_value(decode_account_id(opts.arg(1, "id")?)?)?),
        "switch" => {
            let version = opts.args.get(3).map(String::as_str).unwrap_or("1");
            let id = switch_account_bridge(opts.arg(1, "id")?, opts.arg(2, "type")?, version)?;
            Ok(json!({ "id": id }))
        }
        other => bail!("Unknown id command: {}", other),
    }
}

async fn cmd_sync(opts: &ParsedArgs) -> Result<Value> {
    let account = read_account(opts.arg(0, "account.json")?)?;
    let bridge = registry(opts)?.resolve(&account)?;
    let synced = bridge.sync(&account, opts.clear).await?;
    Ok(serde_json::to_value(to_account_raw(&synced))?)
}

fn cmd_create(opts: &ParsedArgs) -> Result<Value> {
    let account = read_account(opts.arg(0, "account.json")?)?;
    let bridge = registry(opts)?.resolve(&account)?;
    Ok(serde_json::to_value(to_transaction_raw(&bridge.create_transaction(&account)))?)
}

async fn cmd_prepare(opts: &ParsedArgs) -> Result<Value> {
    let account = read_account(opts.arg(0, "account.json")?)?;
    let transaction = Arc::new(read_transaction(opts.arg(1, "tx.json")?)?);
    let bridge = registry(opts)?.resolve(&account)?;
    let prepared = bridge.prepare_transaction(&account, &transaction).await?;
    Ok(serde_json::to_value(to_transaction_raw(&prepared))?)
}

fn cmd_status(opts: &ParsedArgs) -> Result<Value> {
    let account = read_account(opts.arg(0, "account.json")?)?;
    let transaction = read_transaction(opts.arg(1, "tx.json")?)?;
    let bridge = registry(opts)?.resolve(&account)?;
    Ok(serde_json::to_value(bridge.get_transaction_status(&account, &transaction))?)
}

fn cmd_variants(opts: &ParsedArgs) -> Result<Value> {
    let variants: Vec<Value> = registry(opts)?
        .variants()
        .into_iter()
        .map(|(family, type_, version)| json!({"family": family, "type": type_, "version": version}))
        .collect();
    Ok(Value::Array(variants))
}

fn print_usage() {
    println!(
        r#"account-bridge - Account bridges over JSON snapshots

USAGE:
    account-bridge <command> [args] [options]

COMMANDS:
    id decode <id>                      Decode an account id
    id switch <id> <type> [version]     Bind an account id to another bridge variant
    sync <account.json>                 Sync an account, print the updated snapshot
    create <account.json>               Print an empty transaction for the account
    prepare <account.json> <tx.json>    Load fees and derived fields
    status <account.json> <tx.json>     Validate a transaction
    variants                            List registered bridge variants

OPTIONS:
    --clear                 Full resync, replacing cached operations
    --config, -c <path>     TOML bridge config (env: ACCOUNT_BRIDGE_CONFIG)
    --json                  Compact JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

ENVIRONMENT:
    ACCOUNT_BRIDGE_LOG          Log filter, falls back to RUST_LOG
                                (default: warn,account_bridge=info)
    ACCOUNT_BRIDGE_LOG_JSON=1   JSON logs on stderr

EXAMPLES:
    account-bridge id switch "explorer:1:ripple:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh:" mock
    account-bridge sync account.json --clear > synced.json
    account-bridge create synced.json > tx.json
    account-bridge prepare synced.json tx.json"#
    );
}
