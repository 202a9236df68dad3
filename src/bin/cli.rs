// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use anyhow::{bail, Context};
use chrono::{TimeZone, Utc};
use clap::{value_t, App, AppSettings, Arg, ArgMatches, SubCommand};
use log::*;
use shibartum::client::*;
use shibartum::pricing;
use shibartum::rpc::HttpRpcClient;
use shibartum::settings::Settings;
use shibartum::wallet::{KeypairWallet, WalletSession};
use std::sync::Arc;

fn app<'a, 'b>() -> App<'a, 'b> {
    let keypair = Arg::with_name("keypair")
        .long("keypair")
        .short("k")
        .value_name("PATH")
        .takes_value(true)
        .help("Keypair file of the paying wallet");

    App::new("shibartum-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Buy Shibartum (SBT) presale tokens")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("buy")
                .about("Purchase tokens with SOL")
                .arg(
                    Arg::with_name("amount")
                        .long("amount")
                        .short("a")
                        .value_name("TOKENS")
                        .takes_value(true)
                        .required(true)
                        .help("Number of tokens to buy, at least 1"),
                )
                .arg(keypair.clone()),
        )
        .subcommand(
            SubCommand::with_name("history")
                .about("Show local purchase history")
                .arg(
                    Arg::with_name("clear")
                        .long("clear")
                        .help("Delete the local history"),
                ),
        )
        .subcommand(
            SubCommand::with_name("balance")
                .about("Show the wallet balance")
                .arg(keypair),
        )
        .subcommand(
            SubCommand::with_name("quote")
                .about("Price a token amount")
                .arg(
                    Arg::with_name("amount")
                        .long("amount")
                        .short("a")
                        .value_name("TOKENS")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("stage")
                        .long("stage")
                        .short("s")
                        .value_name("STAGE")
                        .takes_value(true)
                        .help("Presale stage, defaults to the current one"),
                ),
        )
        .subcommand(SubCommand::with_name("config").about("Show the presale configuration"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    // Parsed before settings are loaded, `--help` must not write a config file
    let matches = app().get_matches();
    let settings = Settings::new()?;

    match matches.subcommand() {
        ("buy", Some(args)) => buy(&settings, args).await,
        ("history", Some(args)) => history(&settings, args.is_present("clear")),
        ("balance", Some(args)) => balance(&settings, args).await,
        ("quote", Some(args)) => quote(&settings, args),
        ("config", _) => config(&settings),
        _ => unreachable!(),
    }
}

async fn connect(settings: &Settings, args: &ArgMatches<'_>) -> anyhow::Result<WalletSession> {
    let path = args
        .value_of("keypair")
        .unwrap_or(&settings.client.keypair_path);
    let wallet = KeypairWallet::from_file(path)?;

    let mut session = WalletSession::new(Some(Arc::new(wallet)));
    if !session.connect(&LogNotifier).await {
        bail!("could not connect wallet {}", path);
    }

    Ok(session)
}

async fn buy(settings: &Settings, args: &ArgMatches<'_>) -> anyhow::Result<()> {
    let amount = clamp_amount(args.value_of("amount").unwrap_or_default());
    let session = connect(settings, args).await?;

    let rpc = HttpRpcClient::from_settings(settings);
    let backend = HttpBackend::new(settings.client.api_base_url.clone());
    let history = FileHistory::new(&settings.client.history_file);
    let flow = PurchaseFlow::new(
        &session,
        &rpc,
        &backend,
        &history,
        &LogNotifier,
        PurchaseConfig::from_settings(settings),
    );

    let receipt = flow.purchase(amount).await?;
    println!("Signature: {}", receipt.signature);
    println!(
        "Paid {} SOL for {} {}",
        receipt.confirmation.total_cost, amount, settings.presale.token_symbol
    );
    println!("Explorer: {}", receipt.explorer_url);

    Ok(())
}

fn history(settings: &Settings, clear: bool) -> anyhow::Result<()> {
    let history = FileHistory::new(&settings.client.history_file);

    if clear {
        history.clear()?;
        println!("History cleared");
        return Ok(());
    }

    let records = history.load()?;
    if records.is_empty() {
        println!("No transactions yet");
        return Ok(());
    }

    for record in records {
        let when = Utc
            .timestamp_millis_opt(record.timestamp)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let signature = record.signature.as_deref().unwrap_or("-");

        println!(
            "{}  {:<7}  {:>12} {}  {:.6} SOL  {}",
            when,
            record.status,
            record.amount,
            settings.presale.token_symbol,
            record.total_cost,
            signature
        );

        if let Some(err) = record.error {
            println!("    {}", err);
        }
    }

    Ok(())
}

async fn balance(settings: &Settings, args: &ArgMatches<'_>) -> anyhow::Result<()> {
    let mut session = connect(settings, args).await?;
    let rpc = HttpRpcClient::from_settings(settings);

    let Some(balance) = session.refresh_balance(&rpc).await else {
        bail!("could not fetch balance from {}", rpc.url());
    };

    if let Some(pubkey) = session.pubkey() {
        println!("{}: {} SOL", pubkey, balance);
    }

    Ok(())
}

fn quote(settings: &Settings, args: &ArgMatches<'_>) -> anyhow::Result<()> {
    let amount = value_t!(args, "amount", f64).context("invalid amount")?;
    let stage = if args.is_present("stage") {
        let number = value_t!(args, "stage", u8).context("invalid stage")?;
        pricing::stage(number).with_context(|| format!("unknown presale stage {number}"))?
    } else {
        pricing::stage_or_first(settings.presale.current_stage)
    };

    let quote = stage.quote_tokens(amount);
    println!("Stage {} ({})", quote.stage, quote.label);
    println!("Price:        {} SOL", quote.price);
    println!("Cost:         {:.6} SOL", quote.sol_cost);
    println!("Bonus tokens: {}", quote.bonus_tokens);
    println!("Total tokens: {}", quote.total_tokens);

    if let Some(next) = quote.next_stage {
        println!(
            "Next stage {} ({}) raises the price by {}%",
            next.stage, next.label, next.price_increase
        );
    }

    Ok(())
}

fn config(settings: &Settings) -> anyhow::Result<()> {
    let presale = &settings.presale;

    println!("Token:     {} ({})", presale.token_name, presale.token_symbol);
    println!("Price:     {} SOL", presale.token_price_sol);
    println!("Network:   {}", presale.network_name);
    println!("RPC:       {}", settings.client.rpc_url(&presale.network_name));
    println!("Backend:   {}", settings.client.api_base_url);
    println!("Owner:     {}", presale.owner_public_key);
    println!("History:   {}", settings.client.history_file);

    let problems = settings.validate();
    if problems.is_empty() {
        return Ok(());
    }

    for problem in &problems {
        warn!("{}", problem);
    }
    bail!("{} configuration problem(s)", problems.len())
}
