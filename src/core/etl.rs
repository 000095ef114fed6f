use crate::core::Pipeline;
use crate::domain::model::ParsedBatch;
use crate::utils::error::Result;
use std::time::Instant;

pub struct ImportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ImportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Extract and transform only; nothing is written.
    pub async fn preview(&self) -> Result<ParsedBatch> {
        let started = Instant::now();

        tracing::info!("📥 Reading input sources...");
        let sources = self.pipeline.extract().await?;
        tracing::info!("📥 Read {} sources", sources.len());

        tracing::info!("🔄 Parsing and matching...");
        let batch = self.pipeline.transform(sources).await?;
        tracing::info!(
            "🔄 Parsed {} aliases and {} zones in {:?}",
            batch.aliases.len(),
            batch.zones.len(),
            started.elapsed()
        );

        if let Some(error) = &batch.repository_error {
            tracing::warn!("⚠️ Existence check incomplete: {}", error);
        }

        Ok(batch)
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        let batch = self.preview().await?;

        tracing::info!("💾 Writing payload...");
        let output_path = self.pipeline.load(batch).await?;
        tracing::info!("💾 Output saved to: {} ({:?} total)", output_path, started.elapsed());

        Ok(output_path)
    }
}
