use anyhow::Context;
use clap::Parser;
use keel_cli::{Cli, execute, load_config, open_keyspace};
use keel_logger::Logger;
use keel_s3store::{CallContext, CancellationToken, S3Store, Store};
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())
        .and_then(|config| config.with_cli(&cli))
        .context("Critical: Configuration is malformed")?;

    let _log = Logger::from_config(env!("CARGO_BIN_NAME"), &config.log)?;

    let store = S3Store::builder().config(&config.store)?.connect().await?;
    let kv = open_keyspace(&store, &cli.subs, &cli.keyspace).await?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            interrupt.cancel();
        }
    });

    let mut ctx = CallContext::new().with_cancellation(cancel);
    if let Some(timeout) = cli.timeout() {
        ctx = ctx.with_timeout(timeout);
    }
    let kv = kv.with_context(ctx);

    let mut stdout = tokio::io::stdout();
    execute(&kv, &cli.command, tokio::io::stdin(), &mut stdout).await?;

    store.close().await?;
    Ok(())
}
