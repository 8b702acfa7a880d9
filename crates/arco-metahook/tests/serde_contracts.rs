//! Property tests for the serialized contracts shared with the catalog.

use std::collections::HashMap;

use arco_metahook::legacy::{EXTERNAL_TABLE_TYPE, FieldSchema, LegacyTable, MANAGED_TABLE_TYPE};
use arco_metahook::properties::{LOCATION, METADATA_LOCATION, NAME, PARTITION_SPEC};
use arco_metahook::types::{PartitionSpec, Schema, TableIdent};
use arco_metahook::{MigrationPlanner, PropertyTranslator, SchemaResolver};
use proptest::prelude::*;

fn primitive_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("boolean"),
        Just("int"),
        Just("bigint"),
        Just("float"),
        Just("double"),
        Just("decimal(12,3)"),
        Just("string"),
        Just("date"),
        Just("timestamp"),
        Just("binary"),
    ]
}

fn column_type() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => primitive_type().prop_map(str::to_string),
        1 => primitive_type().prop_map(|t| format!("array<{t}>")),
        1 => (primitive_type(), primitive_type()).prop_map(|(k, v)| format!("map<{k},{v}>")),
        1 => (primitive_type(), primitive_type())
            .prop_map(|(a, b)| format!("struct<a:{a},b:{b}>")),
    ]
}

fn columns() -> impl Strategy<Value = Vec<FieldSchema>> {
    prop::collection::vec(column_type(), 1..8).prop_map(|types| {
        types
            .into_iter()
            .enumerate()
            .map(|(i, t)| FieldSchema::new(format!("c{i}"), t))
            .collect()
    })
}

proptest! {
    #[test]
    fn converted_schemas_survive_json(columns in columns()) {
        let schema = SchemaResolver::new(false).convert(&columns).expect("convert");
        let parsed = Schema::from_json(&schema.to_json().expect("json")).expect("parse");
        prop_assert_eq!(&parsed, &schema);
        prop_assert_eq!(parsed.fields.len(), columns.len());
    }

    #[test]
    fn converted_ids_are_unique_and_top_level_first(columns in columns()) {
        let schema = SchemaResolver::new(false).convert(&columns).expect("convert");
        let top: Vec<i32> = schema.fields.iter().map(|f| f.id).collect();
        let expected: Vec<i32> = (1..=i32::try_from(columns.len()).expect("small")).collect();
        prop_assert_eq!(top, expected);
        prop_assert!(schema.validate().is_ok());
    }

    #[test]
    fn identity_specs_survive_json(columns in columns(), keys in 1usize..4) {
        let schema = SchemaResolver::new(false).convert(&columns).expect("convert");
        let names: Vec<String> = schema
            .fields
            .iter()
            .filter(|f| matches!(f.field_type, arco_metahook::types::Type::Primitive(_)))
            .take(keys)
            .map(|f| f.name.clone())
            .collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let spec = PartitionSpec::identity(&schema, &names).expect("spec");
        let parsed = PartitionSpec::from_json(&schema, &spec.to_json().expect("json"))
            .expect("parse");
        prop_assert_eq!(parsed, spec);
    }

    #[test]
    fn eligibility_truth_table(
        external in any::<bool>(),
        external_param in any::<bool>(),
        temporary in any::<bool>(),
        transactional in any::<bool>(),
    ) {
        let mut table = LegacyTable {
            db_name: "db".to_string(),
            table_name: "t".to_string(),
            table_type: if external { EXTERNAL_TABLE_TYPE } else { MANAGED_TABLE_TYPE }.to_string(),
            temporary,
            ..LegacyTable::default()
        };
        if external_param {
            table.parameters.insert("EXTERNAL".to_string(), "TRUE".to_string());
        }
        if transactional {
            table.parameters.insert("transactional".to_string(), "true".to_string());
        }

        let expected = (external || external_param) && !temporary && !transactional;
        prop_assert_eq!(MigrationPlanner::is_eligible(&table), expected);
        prop_assert_eq!(MigrationPlanner::check_eligibility(&table).is_ok(), expected);
    }

    #[test]
    fn translation_never_leaks_pointer_keys(
        extra in prop::collection::hash_map("[a-z]{1,8}(\\.[a-z]{1,8})?", "[a-z0-9]{0,8}", 0..6),
    ) {
        let mut parameters: HashMap<String, String> = extra.clone();
        parameters.insert(METADATA_LOCATION.to_string(), "mem://m".to_string());
        parameters.insert(PARTITION_SPEC.to_string(), "{}".to_string());
        let ident = TableIdent::new("db", "t");

        let properties = PropertyTranslator::new(HashMap::new())
            .translate(&parameters, Some("mem://t"), &ident);

        prop_assert!(!properties.contains(METADATA_LOCATION));
        prop_assert!(!properties.contains(PARTITION_SPEC));
        prop_assert!(properties.contains(LOCATION));
        prop_assert!(properties.contains(NAME));
        for (key, value) in &extra {
            if key != LOCATION && key != NAME {
                prop_assert_eq!(properties.get(key), Some(value.as_str()));
            }
        }
    }
}
