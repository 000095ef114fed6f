use crate::core::importer::Importer;
use crate::core::{AliasRepository, ConfigProvider, Pipeline, Storage};
use crate::domain::model::{ParsedBatch, SourceInput};
use crate::utils::error::{ImportError, Result};
use serde::Serialize;

pub const PAYLOAD_FILE: &str = "payload.json";
pub const REPORT_FILE: &str = "report.json";
pub const ALIASES_CSV: &str = "aliases.csv";
pub const ZONES_CSV: &str = "zones.csv";

pub struct ImportPipeline<S: Storage, C: ConfigProvider, R: AliasRepository> {
    storage: S,
    config: C,
    importer: Importer<R>,
}

impl<S: Storage, C: ConfigProvider, R: AliasRepository> ImportPipeline<S, C, R> {
    pub fn new(storage: S, config: C, repository: R) -> Self {
        let importer = Importer::new(repository, config.import_options());
        Self {
            storage,
            config,
            importer,
        }
    }

    fn output_file(&self, name: &str) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), name)
    }
}

#[derive(Serialize)]
struct AliasRow<'a> {
    name: &'a str,
    wwpn: &'a str,
    #[serde(rename = "use")]
    alias_use: String,
    alias_type: String,
    fabric_id: u64,
    create: bool,
    include_in_zoning: bool,
    exists_in_database: bool,
    notes: &'a str,
}

#[derive(Serialize)]
struct ZoneMemberRow<'a> {
    zone: &'a str,
    vsan: u32,
    zone_type: String,
    zoneset: &'a str,
    exists: bool,
    member_wwpn: &'a str,
    matched_alias: &'a str,
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ImportError::IoError(e.into_error()))
}

pub fn aliases_csv(batch: &ParsedBatch) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for alias in &batch.aliases {
        writer.serialize(AliasRow {
            name: &alias.name,
            wwpn: &alias.wwpn,
            alias_use: alias.alias_use.to_string(),
            alias_type: alias.alias_type.to_string(),
            fabric_id: alias.fabric_id,
            create: alias.create,
            include_in_zoning: alias.include_in_zoning,
            exists_in_database: alias.exists_in_database,
            notes: &alias.notes,
        })?;
    }
    finish_csv(writer)
}

/// One row per zone member; member-less zones get a single row with empty member columns.
pub fn zones_csv(batch: &ParsedBatch) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for zone in &batch.zones {
        let row = |member_wwpn, matched_alias| ZoneMemberRow {
            zone: &zone.name,
            vsan: zone.vsan,
            zone_type: zone.zone_type.to_string(),
            zoneset: zone.zoneset.as_deref().unwrap_or_default(),
            exists: zone.exists,
            member_wwpn,
            matched_alias,
        };

        if zone.members.is_empty() {
            writer.serialize(row("", ""))?;
        }
        for member in &zone.members {
            writer.serialize(row(
                &member.wwpn,
                member.matched_alias_name.as_deref().unwrap_or_default(),
            ))?;
        }
    }
    finish_csv(writer)
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, R: AliasRepository> Pipeline for ImportPipeline<S, C, R> {
    async fn extract(&self) -> Result<Vec<SourceInput>> {
        let mut sources = Vec::with_capacity(self.config.input_files().len());

        for path in self.config.input_files() {
            tracing::debug!("Reading input source: {}", path);
            let bytes = self.storage.read_file(path).await?;
            // 交換機輸出偶爾夾雜非 UTF-8 位元組，逐字替換即可
            let text = String::from_utf8_lossy(&bytes).into_owned();
            sources.push(SourceInput::new(path.clone(), text));
        }

        Ok(sources)
    }

    async fn transform(&self, sources: Vec<SourceInput>) -> Result<ParsedBatch> {
        self.importer.import(sources).await
    }

    async fn load(&self, batch: ParsedBatch) -> Result<String> {
        let payload = serde_json::to_vec_pretty(&batch.payload())?;
        self.storage
            .write_file(&self.output_file(PAYLOAD_FILE), &payload)
            .await?;

        let report = serde_json::to_vec_pretty(&batch)?;
        self.storage
            .write_file(&self.output_file(REPORT_FILE), &report)
            .await?;

        self.storage
            .write_file(&self.output_file(ALIASES_CSV), &aliases_csv(&batch)?)
            .await?;
        self.storage
            .write_file(&self.output_file(ZONES_CSV), &zones_csv(&batch)?)
            .await?;

        tracing::debug!("Import outputs written to {}", self.config.output_path());
        Ok(self.output_file(PAYLOAD_FILE))
    }
}
