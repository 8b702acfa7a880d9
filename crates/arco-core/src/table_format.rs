//! Canonical data-file format contract.

/// Data-file formats a table-format catalog can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Apache ORC files.
    Orc,
    /// Apache Parquet files.
    Parquet,
    /// Apache Avro files.
    Avro,
}

impl FileFormat {
    /// Order in which [`FileFormat::infer`] checks format names.
    pub const INFERENCE_ORDER: [Self; 3] = [Self::Orc, Self::Parquet, Self::Avro];

    /// Infers the format from a reader implementation name such as
    /// `org.apache.hadoop.hive.ql.io.orc.OrcInputFormat`.
    ///
    /// Matching is a case-insensitive substring test in
    /// [`FileFormat::INFERENCE_ORDER`]; the first hit wins. Returns `None`
    /// when no known format name occurs.
    #[must_use]
    pub fn infer(input_format: &str) -> Option<Self> {
        let lowered = input_format.to_ascii_lowercase();
        Self::INFERENCE_ORDER
            .into_iter()
            .find(|format| lowered.contains(format.as_str()))
    }

    /// Returns the canonical lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orc => "orc",
            Self::Parquet => "parquet",
            Self::Avro => "avro",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
