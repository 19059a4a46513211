use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use savedoc::{Config, DirectoryPicker, FsContentStore, SaveDocumentBridge, save_document_with_dialog, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = savedoc::Args::parse();

    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry()?;

    tracing::debug!("{:?}", args);

    let input = args.input.context("--input is required unless --validate is set")?;
    let bytes = tokio::fs::read(&input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;

    let filename = match args.filename {
        Some(filename) => filename,
        None => input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .context("input path has no file name; pass --filename")?,
    };

    let (picker, outcomes) = DirectoryPicker::new(&config.output_dir);
    let bridge = Arc::new(
        SaveDocumentBridge::new(Arc::new(picker), Arc::new(FsContentStore::new()))
            .with_default_mime_type(config.default_mime_type.clone()),
    );
    let listener = bridge.clone().listen(outcomes);

    let result = save_document_with_dialog(&bridge, &filename, &bytes, args.mime_type.as_deref()).await;
    listener.abort();

    match result {
        Ok(saved) => {
            println!("{}", serde_json::to_string_pretty(&saved)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", serde_json::to_string_pretty(&e.to_rejection())?);
            Err(e.into())
        }
    }
}
