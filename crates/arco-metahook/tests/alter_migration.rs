//! Alter-phase tests: in-place migration of external registry tables.

use arco_core::FileFormat;
use arco_metahook::config::{DEFAULT_INPUT_FORMAT, DEFAULT_OUTPUT_FORMAT, DEFAULT_SERDE};
use arco_metahook::legacy::{EnvironmentContext, LegacyPartition, LegacyTable};
use arco_metahook::properties::{DEFAULT_FILE_FORMAT, ENGINE_HIVE_ENABLED, TABLE_TYPE};
use arco_metahook::types::{NestedField, PrimitiveType, Schema, TableIdent, Type};
use arco_metahook::{HookError, MetaHook, StatementDriver};
use arco_test_utils::{
    AVRO_INPUT_FORMAT, CatalogOp, LegacyTableBuilder, ORC_INPUT_FORMAT, PARQUET_INPUT_FORMAT,
    TEXT_INPUT_FORMAT, TestContext, assert_unchanged, init_test_logging,
};

const LOCATION: &str = "mem://warehouse/db/events";

fn external_table(input_format: &str) -> LegacyTable {
    LegacyTableBuilder::new("db", "events")
        .external()
        .column("id", "bigint")
        .column("payload", "string")
        .partition_key("day", "string")
        .input_format(input_format)
        .build()
}

fn partitions() -> Vec<LegacyPartition> {
    vec![
        LegacyPartition::new(vec!["2024-01-01".to_string()], format!("{LOCATION}/day=2024-01-01")),
        LegacyPartition::new(vec!["2024-01-02".to_string()], format!("{LOCATION}/day=2024-01-02")),
    ]
}

fn write_partition_files(ctx: &TestContext, extension: &str) {
    ctx.io
        .put_sized(format!("{LOCATION}/day=2024-01-01/part-0.{extension}"), 100);
    ctx.io
        .put_sized(format!("{LOCATION}/day=2024-01-01/part-1.{extension}"), 50);
    ctx.io
        .put_sized(format!("{LOCATION}/day=2024-01-02/part-0.{extension}"), 25);
    ctx.io.put_sized(format!("{LOCATION}/day=2024-01-01/_SUCCESS"), 0);
    ctx.io
        .put_sized(format!("{LOCATION}/day=2024-01-02/.part-0.crc"), 8);
}

#[test]
fn test_external_table_is_migrated_in_place() {
    init_test_logging();
    let ctx = TestContext::standalone();
    write_partition_files(&ctx, "orc");
    let mut table = external_table(ORC_INPUT_FORMAT);
    let mut context = EnvironmentContext::default();

    let state = ctx.hook.pre_alter(&mut table, &mut context).expect("pre_alter");
    let migration = state.migration().expect("migration staged");
    assert_eq!(migration.location, LOCATION);
    assert_eq!(migration.input_format.as_deref(), Some(ORC_INPUT_FORMAT));
    assert_eq!(migration.partition_keys.len(), 1);

    // Record rewritten for the table format.
    assert!(context.partition_key_change_allowed());
    assert!(table.partition_keys.is_empty());
    let columns: Vec<&str> = table.storage.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["id", "payload", "day"]);
    assert_eq!(table.storage.input_format.as_deref(), Some(DEFAULT_INPUT_FORMAT));
    assert_eq!(table.storage.output_format.as_deref(), Some(DEFAULT_OUTPUT_FORMAT));
    assert_eq!(
        table.storage.serde_info.serialization_lib.as_deref(),
        Some(DEFAULT_SERDE)
    );
    assert_eq!(table.parameter(TABLE_TYPE), Some("ICEBERG"));

    ctx.hook
        .commit_alter(&table, &partitions(), state)
        .expect("commit_alter");

    assert!(ctx.catalog.operations().contains(&CatalogOp::Import {
        name: "db.events".to_string(),
        files: 3,
    }));
    let stored = ctx.catalog.table("db.events").expect("imported");
    assert_eq!(
        stored.properties.get(DEFAULT_FILE_FORMAT).map(String::as_str),
        Some("orc")
    );
    assert!(!stored.properties.contains_key(ENGINE_HIVE_ENABLED));

    let plan = stored.import.expect("import plan");
    assert_eq!(plan.format, Some(FileFormat::Orc));
    assert_eq!(plan.total_bytes(), 175);
    assert!(plan.files.iter().all(|f| !f.path.contains("_SUCCESS") && !f.path.contains(".crc")));
    assert_eq!(
        plan.files[2].partition,
        vec![("day".to_string(), "2024-01-02".to_string())]
    );

    let spec = stored.metadata.default_spec().expect("spec");
    assert_eq!(spec.fields.len(), 1);
    assert_eq!(spec.fields[0].source_id, 3);
    assert_eq!(stored.metadata.snapshots.len(), 1);
}

#[test]
fn test_file_format_inferred_from_reader_name() {
    for (reader, extension, expected) in [
        (PARQUET_INPUT_FORMAT, "parquet", "parquet"),
        (AVRO_INPUT_FORMAT, "avro", "avro"),
    ] {
        let ctx = TestContext::standalone();
        write_partition_files(&ctx, extension);
        let mut table = external_table(reader);
        let mut context = EnvironmentContext::default();

        let state = ctx.hook.pre_alter(&mut table, &mut context).expect("pre_alter");
        ctx.hook
            .commit_alter(&table, &partitions(), state)
            .expect("commit_alter");

        let stored = ctx.catalog.table("db.events").expect("imported");
        assert_eq!(
            stored.properties.get(DEFAULT_FILE_FORMAT).map(String::as_str),
            Some(expected)
        );
    }
}

#[test]
fn test_unpartitioned_migration_imports_location_files() {
    let ctx = TestContext::standalone();
    ctx.io.put_sized(format!("{LOCATION}/000000_0"), 10);
    ctx.io.put_sized(format!("{LOCATION}/000001_0"), 20);
    let mut table = LegacyTableBuilder::new("db", "events")
        .external()
        .column("id", "bigint")
        .input_format(PARQUET_INPUT_FORMAT)
        .build();
    let mut context = EnvironmentContext::default();

    let state = ctx.hook.pre_alter(&mut table, &mut context).expect("pre_alter");
    ctx.hook.commit_alter(&table, &[], state).expect("commit_alter");

    let plan = ctx
        .catalog
        .table("db.events")
        .expect("imported")
        .import
        .expect("plan");
    let paths: Vec<&str> = plan.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "mem://warehouse/db/events/000000_0",
            "mem://warehouse/db/events/000001_0"
        ]
    );
    assert!(plan.files.iter().all(|f| f.partition.is_empty()));
}

#[test]
fn test_native_migration_enables_engine() {
    let ctx = TestContext::native();
    write_partition_files(&ctx, "orc");
    let mut table = external_table(ORC_INPUT_FORMAT);
    let mut context = EnvironmentContext::default();

    let state = ctx.hook.pre_alter(&mut table, &mut context).expect("pre_alter");
    ctx.hook
        .commit_alter(&table, &partitions(), state)
        .expect("commit_alter");

    let stored = ctx.catalog.table("db.events").expect("imported");
    assert_eq!(
        stored.properties.get(ENGINE_HIVE_ENABLED).map(String::as_str),
        Some("true")
    );
}

#[test]
fn test_ineligible_tables_are_rejected_unchanged() {
    let cases = [
        ("managed", LegacyTableBuilder::new("db", "events").build()),
        (
            "temporary",
            LegacyTableBuilder::new("db", "events").external().temporary().build(),
        ),
        (
            "transactional",
            LegacyTableBuilder::new("db", "events")
                .external()
                .transactional()
                .build(),
        ),
    ];
    for (label, mut table) in cases {
        let ctx = TestContext::standalone();
        let before = table.clone();
        let mut context = EnvironmentContext::default();

        let result = ctx.hook.pre_alter(&mut table, &mut context);

        assert!(
            matches!(result, Err(HookError::MigrationNotAllowed { .. })),
            "{label}: {result:?}"
        );
        assert_unchanged(&before, &table);
        assert!(!context.partition_key_change_allowed(), "{label}");
    }
}

#[test]
fn test_rejection_names_every_violation() {
    let ctx = TestContext::standalone();
    let mut table = LegacyTableBuilder::new("db", "events")
        .temporary()
        .transactional()
        .build();

    let err = ctx
        .hook
        .pre_alter(&mut table, &mut EnvironmentContext::default())
        .expect_err("rejected");

    let message = err.to_string();
    assert!(message.contains("not external"), "{message}");
    assert!(message.contains("temporary"), "{message}");
    assert!(message.contains("transactional"), "{message}");
    assert!(!err.is_retryable());
}

#[test]
fn test_existing_catalog_table_is_not_migrated() {
    let ctx = TestContext::standalone();
    let schema = Schema::new(vec![NestedField::optional(
        1,
        "id",
        Type::Primitive(PrimitiveType::Long),
    )]);
    ctx.catalog
        .seed_table(&TableIdent::new("db", "events"), LOCATION, schema);
    let mut table = external_table(ORC_INPUT_FORMAT);
    let before = table.clone();
    let mut context = EnvironmentContext::default();

    let state = ctx.hook.pre_alter(&mut table, &mut context).expect("pre_alter");
    assert!(state.migration().is_none());
    assert_unchanged(&before, &table);

    ctx.hook
        .commit_alter(&table, &partitions(), state)
        .expect("commit_alter");
    assert!(
        !ctx.catalog
            .operations()
            .iter()
            .any(|op| matches!(op, CatalogOp::Import { .. }))
    );
}

#[test]
fn test_unknown_format_with_files_is_rejected_before_rewrite() {
    let ctx = TestContext::standalone();
    write_partition_files(&ctx, "txt");
    let mut table = external_table(TEXT_INPUT_FORMAT);
    let before = table.clone();
    let mut context = EnvironmentContext::default();

    let result = ctx.hook.pre_alter(&mut table, &mut context);

    assert!(matches!(result, Err(HookError::Validation { .. })), "{result:?}");
    assert_unchanged(&before, &table);
    assert!(!context.partition_key_change_allowed());
    assert!(!ctx.catalog.contains("db.events"));
}

#[test]
fn test_rejected_text_migration_leaves_registry_and_catalog_untouched() {
    let ctx = TestContext::standalone();
    let location = "mem://warehouse/db/txt";
    ctx.io.put_sized(format!("{location}/000000_0"), 42);
    let mut table = LegacyTableBuilder::new("db", "txt")
        .external()
        .column("line", "string")
        .input_format(TEXT_INPUT_FORMAT)
        .build();
    let before = table.clone();
    let mut persisted = table.clone();
    let driver = StatementDriver::new(&ctx.hook);

    for attempt in 0..2 {
        let result = driver.alter_table(&mut table, &mut EnvironmentContext::default(), |t, _| {
            persisted = t.clone();
            Ok(Vec::new())
        });
        assert!(
            matches!(result, Err(HookError::Validation { .. })),
            "attempt {attempt}: {result:?}"
        );
        assert!(result.is_err_and(|e| e.to_string().contains(TEXT_INPUT_FORMAT)));
    }

    assert_unchanged(&before, &table);
    assert_unchanged(&before, &persisted);
    assert_eq!(persisted.storage.input_format.as_deref(), Some(TEXT_INPUT_FORMAT));
    assert!(persisted.parameter(TABLE_TYPE).is_none());
    assert!(!ctx.catalog.contains("db.txt"));
    assert!(
        !ctx.catalog
            .operations()
            .iter()
            .any(|op| matches!(op, CatalogOp::Import { .. }))
    );
}

#[test]
fn test_unknown_format_without_files_migrates_empty_table() {
    let ctx = TestContext::standalone();
    let mut table = external_table(TEXT_INPUT_FORMAT);
    let mut context = EnvironmentContext::default();

    let state = ctx.hook.pre_alter(&mut table, &mut context).expect("pre_alter");
    ctx.hook.commit_alter(&table, &[], state).expect("commit_alter");

    let stored = ctx.catalog.table("db.events").expect("imported");
    assert!(!stored.properties.contains_key(DEFAULT_FILE_FORMAT));
    assert!(stored.import.expect("plan").files.is_empty());
}

#[test]
fn test_partition_value_count_mismatch_fails_import() {
    let ctx = TestContext::standalone();
    write_partition_files(&ctx, "orc");
    let mut table = external_table(ORC_INPUT_FORMAT);
    let mut context = EnvironmentContext::default();
    let bad = vec![LegacyPartition::new(
        vec!["2024-01-01".to_string(), "extra".to_string()],
        format!("{LOCATION}/day=2024-01-01"),
    )];

    let state = ctx.hook.pre_alter(&mut table, &mut context).expect("pre_alter");
    let result = ctx.hook.commit_alter(&table, &bad, state);

    assert!(matches!(result, Err(HookError::Validation { .. })), "{result:?}");
}
