use clap::Parser;
use fabric_import::core::AliasRepository;
use fabric_import::utils::error::{ErrorSeverity, ImportError};
use fabric_import::utils::{logger, validation::Validate};
use fabric_import::{
    CliConfig, ImportConfig, ImportEngine, ImportPipeline, InMemoryRepository,
    JsonSnapshotRepository, LocalStorage, ParsedBatch,
};
use std::sync::Arc;

fn exit_with(e: &ImportError) -> ! {
    tracing::error!(
        "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn print_summary(batch: &ParsedBatch) {
    println!("📋 Import Summary:");
    for source in &batch.sources {
        println!(
            "  {} [{}]: {} aliases, {} zones, {} skipped lines",
            source.source, source.format, source.aliases, source.zones, source.warnings
        );
    }
    println!("  Aliases: {}", batch.aliases.len());
    println!(
        "  Already in inventory: {}",
        batch.aliases.iter().filter(|a| a.exists_in_database).count()
    );
    println!("  Zones: {}", batch.zones.len());
    println!("  Duplicates: {}", batch.duplicates.len());
    println!("  Unmatched WWPNs: {}", batch.unmatched_wwpns.len());

    for unmatched in &batch.unmatched_wwpns {
        println!(
            "    {} in zone {} ({})",
            unmatched.wwpn, unmatched.zone, unmatched.source
        );
    }
    if let Some(error) = &batch.repository_error {
        println!("  ⚠️ Existence check skipped: {}", error);
    }
    println!();
}

fn repository_for(config: &ImportConfig) -> Arc<dyn AliasRepository> {
    match &config.existing_snapshot {
        Some(path) => {
            tracing::info!("📚 Existing inventory snapshot: {}", path);
            Arc::new(JsonSnapshotRepository::new(path))
        }
        None => {
            tracing::warn!("No existing inventory given; every record is treated as new");
            Arc::new(InMemoryRepository::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting fabric-import");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    let repository = repository_for(&config);
    let pipeline = ImportPipeline::new(LocalStorage::default(), config, repository);
    let engine = ImportEngine::new(pipeline);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no files will be written");
        match engine.preview().await {
            Ok(batch) => print_summary(&batch),
            Err(e) => exit_with(&e),
        }
        return Ok(());
    }

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Import completed successfully!");
            println!("✅ Import completed successfully!");
            println!("📁 Payload saved to: {}", output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
