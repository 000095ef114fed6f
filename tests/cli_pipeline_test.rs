use anyhow::Result;
use fabric_import::config::DEFAULT_OUTPUT_PATH;
use fabric_import::domain::model::ImportOptions;
use fabric_import::{
    CliConfig, ImportConfig, ImportEngine, ImportPipeline, InMemoryRepository,
    JsonSnapshotRepository, LocalStorage, ParsedBatch,
};
use tempfile::TempDir;

const ALIASES: &str = "\
device-alias name ESX01_HBA0 pwwn 21:00:00:1b:32:a1:b2:c3
device-alias name ESX02_HBA0 pwwn 21:00:00:1b:32:a1:b2:c4
";

const ZONES: &str = "\
zoneset name PROD vsan 30
  zone name ESX01_VMAX vsan 30
    member pwwn 21:00:00:1b:32:a1:b2:c3
    member pwwn 50:00:09:72:08:12:34:01
  zone name ESX02_VMAX vsan 30
    member device-alias ESX02_HBA0
";

fn write_inputs(dir: &TempDir) -> Result<()> {
    std::fs::write(dir.path().join("aliases.txt"), ALIASES)?;
    std::fs::write(dir.path().join("zones.txt"), ZONES)?;
    Ok(())
}

fn config(existing_snapshot: Option<String>) -> ImportConfig {
    ImportConfig {
        options: ImportOptions::for_fabric(5).with_project(9),
        input_files: vec!["aliases.txt".to_string(), "zones.txt".to_string()],
        output_path: "out".to_string(),
        existing_snapshot,
    }
}

#[tokio::test]
async fn test_pipeline_writes_payload_report_and_csv() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_inputs(&temp_dir)?;

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = ImportPipeline::new(storage, config(None), InMemoryRepository::new());
    let engine = ImportEngine::new(pipeline);

    let output = engine.run().await?;
    assert_eq!(output, "out/payload.json");

    let out_dir = temp_dir.path().join("out");
    let payload: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out_dir.join("payload.json"))?)?;
    assert_eq!(payload["aliases"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["zones"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["aliases"][0]["aliasType"], "device-alias");
    assert_eq!(payload["aliases"][0]["use"], "init");
    assert_eq!(payload["zones"][0]["zoneset"], "PROD");
    assert!(payload.get("unmatchedWWPNs").is_none());

    let report: ParsedBatch = serde_json::from_slice(&std::fs::read(out_dir.join("report.json"))?)?;
    assert_eq!(report.unmatched_wwpns.len(), 1);
    assert_eq!(report.unmatched_wwpns[0].zone, "ESX01_VMAX");
    assert_eq!(report.unmatched_wwpns[0].source, "zones.txt");
    assert_eq!(report.sources.len(), 2);

    let aliases_csv = std::fs::read_to_string(out_dir.join("aliases.csv"))?;
    let mut lines = aliases_csv.lines();
    assert_eq!(
        lines.next(),
        Some("name,wwpn,use,alias_type,fabric_id,create,include_in_zoning,exists_in_database,notes")
    );
    assert_eq!(lines.count(), 2);

    let zones_csv = std::fs::read_to_string(out_dir.join("zones.csv"))?;
    assert!(zones_csv.contains("ESX02_VMAX,30,standard,PROD,false,21:00:00:1b:32:a1:b2:c4,ESX02_HBA0"));
    assert_eq!(zones_csv.lines().count(), 1 + 3);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_repository_flags_existing_records() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_inputs(&temp_dir)?;

    let snapshot = temp_dir.path().join("inventory.json");
    std::fs::write(
        &snapshot,
        r#"{
            "aliases": [
                {"name": "esx01_hba0", "wwpn": "21:00:00:1b:32:a1:b2:c3", "aliasType": "device-alias", "fabricId": 5},
                {"name": "VMAX_1E", "wwpn": "50:00:09:72:08:12:34:01", "aliasType": "fcalias", "fabricId": 5}
            ],
            "zones": [{"name": "ESX02_VMAX", "vsan": 30, "fabricId": 5}]
        }"#,
    )?;

    let snapshot_path = snapshot.to_string_lossy().into_owned();
    let pipeline = ImportPipeline::new(
        LocalStorage::new(temp_dir.path()),
        config(Some(snapshot_path.clone())),
        JsonSnapshotRepository::new(snapshot_path),
    );
    let batch = ImportEngine::new(pipeline).preview().await?;

    assert!(batch.aliases[0].exists_in_database);
    assert!(!batch.aliases[1].exists_in_database);
    assert!(!batch.zones[0].exists);
    assert!(batch.zones[1].exists);

    // 既有別名也可作為成員對應來源
    assert_eq!(
        batch.zones[0].members[1].matched_alias_name.as_deref(),
        Some("VMAX_1E")
    );
    assert!(batch.unmatched_wwpns.is_empty());
    assert!(batch.repository_error.is_none());
    assert!(!temp_dir.path().join("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_snapshot_fails_open() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_inputs(&temp_dir)?;

    let missing = temp_dir.path().join("nope.json").to_string_lossy().into_owned();
    let pipeline = ImportPipeline::new(
        LocalStorage::new(temp_dir.path()),
        config(Some(missing.clone())),
        JsonSnapshotRepository::new(missing),
    );
    let batch = ImportEngine::new(pipeline).preview().await?;

    assert_eq!(batch.aliases.len(), 2);
    assert!(batch.aliases.iter().all(|a| !a.exists_in_database));
    assert!(batch.zones.iter().all(|z| !z.exists));
    assert!(batch.repository_error.is_some());
    Ok(())
}

#[test]
fn test_cli_resolves_toml_file_with_flag_overrides() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("import.toml");
    std::fs::write(
        &config_path,
        "[import]\nfabric_id = 12\ndefault_use = \"target\"\ninputs = [\"dump.txt\"]\n",
    )?;

    let cli = CliConfig {
        config: Some(config_path.to_string_lossy().into_owned()),
        project: Some(3),
        ..Default::default()
    };
    let resolved = cli.resolve()?;

    assert_eq!(resolved.options.fabric_id, 12);
    assert_eq!(resolved.options.project_id, Some(3));
    assert_eq!(resolved.options.default_use.to_string(), "target");
    assert_eq!(resolved.input_files, vec!["dump.txt".to_string()]);
    assert_eq!(resolved.output_path, DEFAULT_OUTPUT_PATH);
    Ok(())
}
