use std::{io::Read, sync::Arc};

use clap::Parser;

use sql_gateway::{
    adapters::stdio,
    backend::sqlite::SqliteBackend,
    cli::Args,
    client,
    error::{AppError, AppResult},
    logging, Gateway, GatewayConfig,
};

fn main() -> AppResult<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    if args.render {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        print!("{}", client::render_agent_text(&text, args.csv.as_deref())?);
        return Ok(());
    }

    let config = GatewayConfig::from_args(&args);
    tracing::info!(
        database = %config.default_database,
        workgroup = %config.default_workgroup,
        max_rows = config.max_rows,
        data_dir = %args.data_dir.display(),
        "gateway starting"
    );
    let gateway = Gateway::new(config, Arc::new(SqliteBackend::new(&args.data_dir)));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    match args.event {
        Some(path) => rt.block_on(stdio::run_once(&gateway, &path)),
        None => rt.block_on(stdio::run(gateway)),
    }
}
