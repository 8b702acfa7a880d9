//! Contract tests for canonical data-file format handling.

use arco_core::table_format::FileFormat;

#[test]
fn canonical_strings_are_lowercase() {
    assert_eq!(FileFormat::Orc.as_str(), "orc");
    assert_eq!(FileFormat::Parquet.to_string(), "parquet");
    assert_eq!(FileFormat::Avro.as_str(), "avro");
}

#[test]
fn infers_from_registry_reader_names() {
    let cases = [
        ("org.apache.hadoop.hive.ql.io.orc.OrcInputFormat", Some(FileFormat::Orc)),
        (
            "org.apache.hadoop.hive.ql.io.parquet.MapredParquetInputFormat",
            Some(FileFormat::Parquet),
        ),
        (
            "org.apache.hadoop.hive.ql.io.avro.AvroContainerInputFormat",
            Some(FileFormat::Avro),
        ),
        ("org.apache.hadoop.mapred.TextInputFormat", None),
    ];
    for (reader, expected) in cases {
        assert_eq!(FileFormat::infer(reader), expected, "{reader}");
    }
}

#[test]
fn inference_prefers_orc_then_parquet() {
    assert_eq!(FileFormat::infer("ParquetOrcBridge"), Some(FileFormat::Orc));
    assert_eq!(FileFormat::infer("AvroParquetReader"), Some(FileFormat::Parquet));
}

#[test]
fn unknown_reader_names_have_no_format() {
    assert_eq!(FileFormat::infer("org.apache.hadoop.mapred.SequenceFileInputFormat"), None);
    assert_eq!(FileFormat::infer(""), None);
}
