use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;

use rxl_ledger::{Ledger, ValidationReport};
use rxl_server::{RxlServer, ServerConfig, StoreConfig, TransactionForm};
use rxl_store::ChainStore;
use rxl_types::Block;

use crate::cli::*;

type CliLedger = Ledger<Box<dyn ChainStore>>;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let Cli {
        command,
        store: store_args,
        format,
        ..
    } = cli;
    let store = store_args.apply(StoreConfig::default());
    let mut out = io::stdout().lock();

    match command {
        Command::Serve(args) => return cmd_serve(&store_args, args),
        Command::Init => cmd_init(&open(&store)?, format, &mut out)?,
        Command::Add(args) => cmd_add(&mut open(&store)?, args, format, &mut out)?,
        Command::Log(args) => cmd_log(&open(&store)?, &args, format, &mut out)?,
        Command::Show(args) => cmd_show(&open(&store)?, &args, format, &mut out)?,
        Command::History(args) => cmd_history(&open(&store)?, &args, format, &mut out)?,
        Command::Verify => {
            if !cmd_verify(&open(&store)?, format, &mut out)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn open(store: &StoreConfig) -> anyhow::Result<CliLedger> {
    Ledger::open(store.open())
        .with_context(|| format!("cannot open ledger at {}", store.path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_block(out: &mut impl Write, block: &Block, oneline: bool) -> io::Result<()> {
    let index = format!("#{}", block.index);
    if oneline {
        return writeln!(
            out,
            "{} {} {}",
            index.yellow(),
            block.hash.short_hex().dimmed(),
            block.data
        );
    }
    writeln!(out, "{}  {}", index.yellow().bold(), block.hash.to_hex().cyan())?;
    writeln!(out, "  Time:     {}", block.timestamp)?;
    writeln!(out, "  Previous: {}", block.previous_hash)?;
    writeln!(out, "  Data:     {}", block.data)
}

fn cmd_init(ledger: &CliLedger, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<()> {
    let genesis = &ledger.chain()[0];
    if format == OutputFormat::Json {
        return print_json(out, genesis);
    }
    writeln!(
        out,
        "{} Ledger ready at {}",
        "✓".green().bold(),
        ledger.store().location().bold()
    )?;
    writeln!(out, "  Genesis: {}", genesis.hash.to_hex().cyan())?;
    writeln!(out, "  Blocks:  {}", ledger.len())?;
    Ok(())
}

fn cmd_add(
    ledger: &mut CliLedger,
    args: AddArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let payload = TransactionForm {
        drug_id: args.drug_id,
        action: args.action,
        manufacturer: args.manufacturer,
    }
    .into_payload()?;
    let block = ledger.append(payload)?;

    if format == OutputFormat::Json {
        return print_json(out, &block);
    }
    writeln!(
        out,
        "{} Recorded transaction {} [{}]",
        "✓".green().bold(),
        format!("#{}", block.index).yellow(),
        block.hash.short_hex()
    )?;
    Ok(())
}

fn cmd_log(
    ledger: &CliLedger,
    args: &LogArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let limit = args.max_count.unwrap_or(usize::MAX);
    let blocks: Vec<&Block> = ledger.chain().iter().rev().take(limit).collect();

    if format == OutputFormat::Json {
        return print_json(out, &blocks);
    }
    for block in blocks {
        write_block(out, block, args.oneline)?;
    }
    Ok(())
}

fn cmd_show(
    ledger: &CliLedger,
    args: &ShowArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let block = ledger.get(args.index).with_context(|| {
        format!("no block at index {} (chain has {} blocks)", args.index, ledger.len())
    })?;

    if format == OutputFormat::Json {
        return print_json(out, block);
    }
    write_block(out, block, false)?;
    Ok(())
}

/// Returns whether the chain passed.
fn cmd_verify(ledger: &CliLedger, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<bool> {
    let report = ledger.audit();
    let valid = report.is_valid();

    if format == OutputFormat::Json {
        print_json(out, &report)?;
        return Ok(valid);
    }
    write_report(out, &report)?;
    Ok(valid)
}

fn write_report(out: &mut impl Write, report: &ValidationReport) -> io::Result<()> {
    if report.is_valid() {
        writeln!(
            out,
            "{} All transactions are valid ({} blocks)",
            "✓".green().bold(),
            report.block_count
        )?;
    } else {
        writeln!(out, "{} Blockchain integrity check failed!", "✗".red().bold())?;
    }
    for violation in &report.violations {
        let marker = if violation.kind.breaks_integrity() {
            "error:".red()
        } else {
            "warning:".yellow()
        };
        writeln!(out, "  {} {}", marker, violation.description)?;
    }
    Ok(())
}

fn cmd_history(
    ledger: &CliLedger,
    args: &HistoryArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let blocks = ledger.history(&args.drug_id);

    if format == OutputFormat::Json {
        return print_json(out, &blocks);
    }
    if blocks.is_empty() {
        writeln!(out, "No transactions recorded for {}.", args.drug_id.bold())?;
        return Ok(());
    }
    writeln!(out, "History of {}:", args.drug_id.bold())?;
    for block in blocks {
        write_block(out, block, true)?;
    }
    Ok(())
}

fn cmd_serve(store_args: &StoreArgs, args: ServeArgs) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    config.store = store_args.apply(config.store);
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let server = RxlServer::new(config)?;
    tokio::runtime::Runtime::new()?.block_on(server.serve())?;
    Ok(ExitCode::SUCCESS)
}
