//! Create-phase tests: schema and spec resolution, record rewrite, adoption.

use arco_metahook::config::{DEFAULT_INPUT_FORMAT, DEFAULT_OUTPUT_FORMAT};
use arco_metahook::properties::{
    ENGINE_HIVE_ENABLED, EXTERNAL_TABLE_PURGE, GC_ENABLED, PARTITION_SPEC, TABLE_SCHEMA,
    TABLE_TYPE,
};
use arco_metahook::types::{
    NestedField, PartitionSpec, PrimitiveType, Schema, TableIdent, Transform, Type,
};
use arco_metahook::{HookConfig, HookError, MetaHook};
use arco_test_utils::{
    CatalogOp, LegacyTableBuilder, ScriptedCommitter, TestContext, assert_unchanged,
    assert_validation_error, init_test_logging,
};

fn names(schema: &Schema) -> Vec<&str> {
    schema.fields.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn test_create_from_columns() {
    init_test_logging();
    let ctx = TestContext::standalone();
    let mut table = LegacyTableBuilder::new("db", "people")
        .column("id", "int")
        .column("name", "string")
        .build();

    let state = ctx.hook.pre_create(&mut table).expect("pre_create");
    assert!(!state.is_adopted());
    ctx.hook.commit_create(&table, state).expect("commit_create");

    let stored = ctx.catalog.table("db.people").expect("created");
    let schema = stored.metadata.current_schema().expect("schema");
    assert_eq!(names(schema), vec!["id", "name"]);
    assert_eq!(schema.fields[0].field_type, Type::Primitive(PrimitiveType::Int));
    assert_eq!(schema.fields[1].field_type, Type::Primitive(PrimitiveType::String));
    assert_eq!(schema.fields[0].id, 1);
    assert_eq!(schema.fields[1].id, 2);
    assert!(stored.metadata.default_spec().expect("spec").is_unpartitioned());
    assert_eq!(stored.metadata.location, "mem://warehouse/db/people");
}

#[test]
fn test_partition_keys_follow_columns_and_become_identity_fields() {
    let ctx = TestContext::standalone();
    let mut table = LegacyTableBuilder::new("db", "events")
        .column("c1", "bigint")
        .column("c2", "string")
        .partition_key("p1", "string")
        .partition_key("p2", "int")
        .build();

    let state = ctx.hook.pre_create(&mut table).expect("pre_create");
    ctx.hook.commit_create(&table, state).expect("commit_create");

    let stored = ctx.catalog.table("db.events").expect("created");
    let schema = stored.metadata.current_schema().expect("schema");
    assert_eq!(names(schema), vec!["c1", "c2", "p1", "p2"]);

    let spec = stored.metadata.default_spec().expect("spec");
    let sources: Vec<i32> = spec.fields.iter().map(|f| f.source_id).collect();
    assert_eq!(sources, vec![3, 4]);
    assert!(spec.fields.iter().all(|f| f.transform == Transform::Identity));

    // Keys are folded into the columns of the registry record.
    assert!(table.partition_keys.is_empty());
    let columns: Vec<&str> = table.storage.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["c1", "c2", "p1", "p2"]);
}

#[test]
fn test_record_points_at_table_format() {
    let ctx = TestContext::standalone();
    let mut table = LegacyTableBuilder::new("db", "t")
        .column("id", "int")
        .build();

    ctx.hook.pre_create(&mut table).expect("pre_create");

    assert_eq!(table.storage.input_format.as_deref(), Some(DEFAULT_INPUT_FORMAT));
    assert_eq!(table.storage.output_format.as_deref(), Some(DEFAULT_OUTPUT_FORMAT));
    assert_eq!(table.parameter(TABLE_TYPE), Some("ICEBERG"));
    assert_eq!(table.parameter(EXTERNAL_TABLE_PURGE), Some("TRUE"));
}

#[test]
fn test_explicit_schema_wins_and_is_stripped_from_record() {
    let ctx = TestContext::standalone();
    let explicit = Schema::new(vec![
        NestedField::optional(1, "ts", Type::Primitive(PrimitiveType::Timestamp)),
        NestedField::optional(2, "level", Type::Primitive(PrimitiveType::String)),
    ]);
    let mut table = LegacyTableBuilder::new("db", "logs")
        .column("ignored", "int")
        .parameter(TABLE_SCHEMA, &explicit.to_json().expect("json"))
        .parameter("name", "db.logs")
        .build();

    let state = ctx.hook.pre_create(&mut table).expect("pre_create");
    assert!(table.parameter(TABLE_SCHEMA).is_none());
    assert!(table.parameter("name").is_none());
    assert!(table.parameter("location").is_none());
    ctx.hook.commit_create(&table, state).expect("commit_create");

    let stored = ctx.catalog.table("db.logs").expect("created");
    let schema = stored.metadata.current_schema().expect("schema");
    assert_eq!(names(schema), vec!["ts", "level"]);
}

#[test]
fn test_explicit_spec_parameter() {
    let ctx = TestContext::standalone();
    let mut table = LegacyTableBuilder::new("db", "clicks")
        .column("id", "bigint")
        .column("user", "string")
        .parameter(
            PARTITION_SPEC,
            r#"{"spec-id":0,"fields":[{"name":"user_bucket","transform":"bucket[16]","source-id":2}]}"#,
        )
        .build();

    let state = ctx.hook.pre_create(&mut table).expect("pre_create");
    ctx.hook.commit_create(&table, state).expect("commit_create");

    let spec = ctx
        .catalog
        .table("db.clicks")
        .expect("created")
        .metadata
        .default_spec()
        .cloned()
        .expect("spec");
    assert_eq!(spec.fields.len(), 1);
    assert_eq!(spec.fields[0].transform, Transform::Bucket(16));
    assert_eq!(spec.fields[0].field_id, 1000);
}

#[test]
fn test_spec_and_partition_keys_are_mutually_exclusive() {
    let ctx = TestContext::standalone();
    let mut table = LegacyTableBuilder::new("db", "t")
        .column("id", "bigint")
        .partition_key("day", "string")
        .parameter(PARTITION_SPEC, r#"{"spec-id":0,"fields":[]}"#)
        .build();
    let before = table.clone();

    let result = ctx.hook.pre_create(&mut table);

    assert_validation_error(&result);
    assert_unchanged(&before, &table);
    assert!(ctx.catalog.table("db.t").is_none());
}

#[test]
fn test_missing_location_leaves_record_unchanged() {
    let ctx = TestContext::standalone();
    let mut table = LegacyTableBuilder::new("db", "t")
        .column("id", "int")
        .location(None)
        .build();
    let before = table.clone();

    let result = ctx.hook.pre_create(&mut table);

    assert_validation_error(&result);
    assert_unchanged(&before, &table);
}

#[test]
fn test_unsupported_type_leaves_record_unchanged() {
    let ctx = TestContext::standalone();
    let mut table = LegacyTableBuilder::new("db", "t")
        .column("small", "tinyint")
        .build();
    let before = table.clone();

    let result = ctx.hook.pre_create(&mut table);

    assert!(matches!(result, Err(HookError::Schema { .. })), "{result:?}");
    assert_unchanged(&before, &table);
}

#[test]
fn test_adopts_existing_catalog_table() {
    let ctx = TestContext::standalone();
    let ident = TableIdent::new("db", "existing");
    let schema = Schema::new(vec![NestedField::optional(
        1,
        "id",
        Type::Primitive(PrimitiveType::Long),
    )]);
    ctx.catalog
        .seed_table(&ident, "mem://warehouse/db/existing", schema);

    let mut table = LegacyTableBuilder::new("db", "existing").build();
    let state = ctx.hook.pre_create(&mut table).expect("pre_create");
    assert!(state.is_adopted());
    assert_eq!(table.parameter(TABLE_TYPE), Some("ICEBERG"));
    assert_eq!(table.storage.input_format.as_deref(), Some(DEFAULT_INPUT_FORMAT));

    ctx.hook.commit_create(&table, state).expect("commit_create");
    assert!(
        !ctx.catalog
            .operations()
            .iter()
            .any(|op| matches!(op, CatalogOp::Create { .. }))
    );
}

#[test]
fn test_adoption_rejects_schema_and_spec_overrides() {
    let ctx = TestContext::standalone();
    let ident = TableIdent::new("db", "existing");
    let schema = Schema::new(vec![NestedField::optional(
        1,
        "id",
        Type::Primitive(PrimitiveType::Long),
    )]);
    let schema_json = schema.to_json().expect("json");
    let spec_json = PartitionSpec::unpartitioned().to_json().expect("json");
    ctx.catalog
        .seed_table(&ident, "mem://warehouse/db/existing", schema);

    for (key, value) in [(TABLE_SCHEMA, schema_json), (PARTITION_SPEC, spec_json)] {
        let mut table = LegacyTableBuilder::new("db", "existing")
            .parameter(key, &value)
            .build();
        let before = table.clone();
        let result = ctx.hook.pre_create(&mut table);
        assert_validation_error(&result);
        assert_unchanged(&before, &table);
    }
}

#[test]
fn test_native_create_enables_engine_and_skips_location_check() {
    let ctx = TestContext::native();
    let mut table = LegacyTableBuilder::new("db", "native")
        .column("id", "int")
        .parameter(EXTERNAL_TABLE_PURGE, "FALSE")
        .build();

    let state = ctx.hook.pre_create(&mut table).expect("pre_create");
    ctx.hook.commit_create(&table, state).expect("commit_create");

    let stored = ctx.catalog.table("db.native").expect("created");
    assert_eq!(
        stored.properties.get(ENGINE_HIVE_ENABLED).map(String::as_str),
        Some("true")
    );
    // Aliased registry keys reach the catalog under their catalog name.
    assert_eq!(stored.properties.get(GC_ENABLED).map(String::as_str), Some("FALSE"));
    assert_eq!(table.parameter(EXTERNAL_TABLE_PURGE), Some("FALSE"));
}

#[test]
fn test_standalone_create_does_not_enable_engine() {
    let ctx = TestContext::standalone();
    let mut table = LegacyTableBuilder::new("db", "plain").column("id", "int").build();

    let state = ctx.hook.pre_create(&mut table).expect("pre_create");
    ctx.hook.commit_create(&table, state).expect("commit_create");

    let stored = ctx.catalog.table("db.plain").expect("created");
    assert!(!stored.properties.contains_key(ENGINE_HIVE_ENABLED));
}

#[test]
fn test_auto_conversion_widens_narrow_types() {
    let ctx = TestContext::build(
        false,
        ScriptedCommitter::succeeding(),
        HookConfig::default().with_schema_auto_conversion(true),
    );
    let mut table = LegacyTableBuilder::new("db", "t")
        .column("small", "smallint")
        .column("code", "varchar(8)")
        .build();

    let state = ctx.hook.pre_create(&mut table).expect("pre_create");
    ctx.hook.commit_create(&table, state).expect("commit_create");

    let stored = ctx.catalog.table("db.t").expect("created");
    let schema = stored.metadata.current_schema().expect("schema");
    assert_eq!(schema.fields[0].field_type, Type::Primitive(PrimitiveType::Int));
    assert_eq!(schema.fields[1].field_type, Type::Primitive(PrimitiveType::String));
}
