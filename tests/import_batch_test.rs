use anyhow::Result;
use fabric_import::domain::model::{DuplicateReason, ImportOptions};
use fabric_import::{
    Alias, AliasType, AliasUse, ConflictResolution, ImportError, Importer, InMemoryRepository,
    SourceInput, Zone, ZoneType,
};
use std::sync::Arc;

const FABRIC: u64 = 4;

fn existing_alias(name: &str, wwpn: &str) -> Alias {
    Alias {
        name: name.to_string(),
        wwpn: wwpn.to_string(),
        alias_use: AliasUse::Init,
        alias_type: AliasType::DeviceAlias,
        fabric_id: FABRIC,
        create: false,
        include_in_zoning: true,
        notes: String::new(),
        imported_at: None,
        exists_in_database: true,
    }
}

fn assert_members_complete(zones: &[Zone], batch: &fabric_import::ParsedBatch) {
    for zone in zones {
        let matched = zone
            .members
            .iter()
            .filter(|m| m.matched_alias_name.is_some())
            .count();
        let unmatched = batch.unmatched_for_zone(&zone.name).count();
        assert_eq!(zone.members.len(), matched + unmatched, "zone {}", zone.name);
    }
}

/// 區域成員對應到既有別名，另一個成員列入未匹配清單
#[tokio::test]
async fn test_zone_member_matches_existing_alias() -> Result<()> {
    let repo = InMemoryRepository::new()
        .with_aliases(vec![existing_alias("Host1", "10:00:00:00:c9:aa:bb:01")]);
    let text = "zone name Z1 vsan 75\n\
                  member pwwn 10:00:00:00:C9:AA:BB:01\n\
                  member pwwn 10:00:00:00:c9:aa:bb:ff\n";

    let batch = Importer::new(repo, ImportOptions::for_fabric(FABRIC))
        .import(vec![SourceInput::new("zones.txt", text)])
        .await?;

    assert_eq!(batch.zones.len(), 1);
    let zone = &batch.zones[0];
    assert_eq!(zone.name, "Z1");
    assert_eq!(zone.vsan, 75);
    assert_eq!(zone.members[0].matched_alias_name.as_deref(), Some("Host1"));
    assert_eq!(zone.members[1].matched_alias_name, None);

    assert_eq!(batch.unmatched_wwpns.len(), 1);
    assert_eq!(batch.unmatched_wwpns[0].zone, "Z1");
    assert_eq!(batch.unmatched_wwpns[0].source, "zones.txt");
    assert_eq!(batch.unmatched_wwpns[0].wwpn, "10:00:00:00:c9:aa:bb:ff");
    assert_members_complete(&batch.zones, &batch);
    Ok(())
}

#[tokio::test]
async fn test_conflict_policy_applies_across_files() -> Result<()> {
    let sources = || {
        vec![
            SourceInput::new(
                "device-alias.txt",
                "device-alias name ESX01 pwwn 21:00:00:1b:32:a1:b2:c3\n",
            ),
            SourceInput::new(
                "fcalias.txt",
                "fcalias name ESX01_FC vsan 10\n  member pwwn 2100001B32A1B2C3\n",
            ),
        ]
    };

    let preferred = Importer::new(
        InMemoryRepository::new(),
        ImportOptions::for_fabric(FABRIC),
    )
    .import(sources())
    .await?;
    assert_eq!(preferred.aliases.len(), 1);
    assert_eq!(preferred.aliases[0].alias_type, AliasType::DeviceAlias);
    assert!(preferred
        .duplicates
        .iter()
        .any(|d| d.name == "ESX01_FC" && d.reason == DuplicateReason::TypeConflict));

    let both = Importer::new(
        InMemoryRepository::new(),
        ImportOptions::for_fabric(FABRIC).with_conflict_resolution(ConflictResolution::ImportBoth),
    )
    .import(sources())
    .await?;
    assert_eq!(both.aliases.len(), 2);

    let fcalias = Importer::new(
        InMemoryRepository::new(),
        ImportOptions::for_fabric(FABRIC)
            .with_conflict_resolution(ConflictResolution::PreferFcalias),
    )
    .import(sources())
    .await?;
    assert_eq!(fcalias.aliases.len(), 1);
    assert_eq!(fcalias.aliases[0].name, "ESX01_FC");
    Ok(())
}

#[tokio::test]
async fn test_fcalias_fan_out_feeds_zone_matching() -> Result<()> {
    let text = "\
fcalias name ARRAY vsan 10
  member pwwn 50:05:07:68:10:13:00:01
  member pwwn 50:05:07:68:10:13:00:02
  member pwwn 50:05:07:68:10:13:00:03
zone name Z_ARRAY vsan 10
  member pwwn 50:05:07:68:10:13:00:02
  member fcalias ARRAY_3
";

    let batch = Importer::new(
        InMemoryRepository::new(),
        ImportOptions::for_fabric(FABRIC),
    )
    .import(vec![SourceInput::new("array.cfg", text)])
    .await?;

    let names: Vec<&str> = batch.aliases.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["ARRAY_1", "ARRAY_2", "ARRAY_3"]);
    assert!(batch
        .aliases
        .iter()
        .all(|a| a.alias_type == AliasType::Fcalias));

    let zone = &batch.zones[0];
    assert_eq!(zone.members.len(), 2);
    assert_eq!(zone.members[0].matched_alias_name.as_deref(), Some("ARRAY_2"));
    assert_eq!(zone.members[1].wwpn, "50:05:07:68:10:13:00:03");
    assert_eq!(zone.zone_type, ZoneType::Standard);
    assert_members_complete(&batch.zones, &batch);
    Ok(())
}

#[tokio::test]
async fn test_show_zoneset_keeps_nested_fcalias_members() -> Result<()> {
    let text = "\
zoneset name PROD vsan 10
  zone name Z1 vsan 10
    fcalias name ESX01 vsan 10
      pwwn 21:00:00:1b:32:a1:b2:c3
    pwwn 50:06:01:60:3e:a0:1b:2c
";

    let batch = Importer::new(
        InMemoryRepository::new(),
        ImportOptions::for_fabric(FABRIC),
    )
    .import(vec![SourceInput::new("show-zoneset.txt", text)])
    .await?;

    let names: Vec<&str> = batch.aliases.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["ESX01"]);

    let zone = &batch.zones[0];
    assert_eq!(zone.zoneset.as_deref(), Some("PROD"));
    assert_eq!(zone.members.len(), 2);
    assert_eq!(zone.members[0].matched_alias_name.as_deref(), Some("ESX01"));
    assert_eq!(zone.members[1].wwpn, "50:06:01:60:3e:a0:1b:2c");
    assert_eq!(batch.unmatched_wwpns.len(), 1);
    assert_members_complete(&batch.zones, &batch);
    Ok(())
}

#[tokio::test]
async fn test_existing_records_are_flagged_with_one_query_per_fabric() -> Result<()> {
    let persisted_zone = Zone {
        name: "z_prod".to_string(),
        vsan: 10,
        fabric_id: FABRIC,
        zone_type: ZoneType::Standard,
        create: false,
        exists: true,
        notes: "persisted".to_string(),
        zoneset: None,
        members: Vec::new(),
    };

    let repo = Arc::new(
        InMemoryRepository::new()
            .with_aliases(vec![existing_alias("host_a", "10:00:00:00:00:00:99:99")])
            .with_zones(vec![persisted_zone]),
    );
    let sources = vec![
        SourceInput::new(
            "a.txt",
            "device-alias name HOST_A pwwn 10:00:00:00:00:00:00:01\n\
             device-alias name HOST_B pwwn 10:00:00:00:00:00:00:02\n",
        ),
        SourceInput::new(
            "b.txt",
            "device-alias name HOST_C pwwn 10:00:00:00:00:00:00:03\n\
             zone name Z_PROD vsan 10\n  member device-alias HOST_C\n",
        ),
    ];

    let batch = Importer::new(
        Arc::clone(&repo),
        ImportOptions::for_fabric(FABRIC).with_project(2),
    )
    .import(sources)
    .await?;

    assert_eq!(repo.alias_queries(), 1);
    assert_eq!(repo.zone_queries(), 1);

    let host_a = batch.aliases.iter().find(|a| a.name == "HOST_A").unwrap();
    assert!(host_a.exists_in_database);
    assert!(!host_a.create);
    assert!(batch
        .aliases
        .iter()
        .filter(|a| a.name != "HOST_A")
        .all(|a| !a.exists_in_database && a.create));

    assert!(batch.zones[0].exists);
    assert_eq!(
        batch.zones[0].members[0].matched_alias_name.as_deref(),
        Some("HOST_C")
    );
    assert!(batch
        .duplicates
        .iter()
        .any(|d| d.name == "HOST_A" && d.reason == DuplicateReason::ExistsInDatabase));
    assert!(batch.repository_error.is_none());
    Ok(())
}

#[tokio::test]
async fn test_unparseable_batch_is_no_entries_found() {
    let result = Importer::new(
        InMemoryRepository::new(),
        ImportOptions::for_fabric(FABRIC),
    )
    .import(vec![
        SourceInput::new("motd.txt", "Welcome to the fabric\n"),
        SourceInput::new("bad.txt", "device-alias name BROKEN pwwn 10:00:00\n"),
    ])
    .await;

    match result {
        Err(ImportError::NoEntriesFound { sources }) => assert_eq!(sources, 2),
        other => panic!("expected NoEntriesFound, got {:?}", other),
    }
}
