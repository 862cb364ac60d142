//! Provisioning parameters for a materialized result.

use serde::{Deserialize, Serialize};
use vesta_common::{TempTableConfig, DEFAULT_MAX_UNIQUE_KEY_LENGTH, HASH_COLUMN_WIDTH};
use vesta_storage::{KeyKind, TableSpec};

use super::dedup::DeduplicationStrategy;
use crate::types::DataType;

/// Width of the column count that starts every encoded record.
const RECORD_HEADER_WIDTH: usize = 4;

/// One column of the select list being materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Column type.
    pub data_type: DataType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Internal column that is computed but never stored.
    pub hidden: bool,
}

impl ColumnDescriptor {
    /// Creates a nullable, visible column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            hidden: false,
        }
    }

    /// Creates a NOT NULL, visible column.
    pub fn not_null(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, data_type)
        }
    }

    /// Marks the column as hidden.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Facts about the query expression that affect deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryShape {
    /// The expression is a recursive common table expression.
    pub recursive: bool,
    /// The expression mixes `DISTINCT` and `ALL` set-operation branches.
    pub mixed_distinct_and_all: bool,
}

impl QueryShape {
    /// A plain, non-recursive expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the expression as recursive.
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Marks the expression as mixing `DISTINCT` and `ALL` branches.
    pub fn mixed(mut self) -> Self {
        self.mixed_distinct_and_all = true;
        self
    }
}

/// Options for creating the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateOptions {
    /// Start with the on-disk representation.
    pub force_on_disk: bool,
    /// Widest record a native unique key may cover.
    pub max_unique_key_length: usize,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            force_on_disk: false,
            max_unique_key_length: DEFAULT_MAX_UNIQUE_KEY_LENGTH,
        }
    }
}

impl CreateOptions {
    /// Takes the key length limit from an engine configuration.
    pub fn from_config(config: &TempTableConfig) -> Self {
        Self {
            max_unique_key_length: config.max_unique_key_length,
            ..Self::default()
        }
    }

    /// Forces the on-disk representation.
    pub fn with_force_on_disk(mut self, force: bool) -> Self {
        self.force_on_disk = force;
        self
    }
}

/// Column statistics the storage layer sizes the table from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldTypeCounts {
    /// Large object columns.
    pub blob_fields: usize,
    /// Estimated encoded width of one record, hidden hash column excluded.
    pub record_width: usize,
}

impl FieldTypeCounts {
    /// Counts the given (visible) columns.
    pub fn count(columns: &[ColumnDescriptor]) -> Self {
        columns.iter().fold(
            Self {
                record_width: RECORD_HEADER_WIDTH,
                ..Self::default()
            },
            |mut acc, col| {
                acc.blob_fields += usize::from(col.data_type.is_blob());
                acc.record_width += col.data_type.encoded_width();
                acc
            },
        )
    }
}

/// Everything needed to allocate a result table, resolved once per query
/// expression.
#[derive(Debug, Clone)]
pub struct MaterializationParameters {
    alias: String,
    /// Stored columns, after hidden-column filtering and type conversion.
    columns: Vec<ColumnDescriptor>,
    /// Position of each stored column in the incoming row.
    positions: Vec<usize>,
    /// Width of the incoming row.
    source_width: usize,
    counts: FieldTypeCounts,
    create_table: bool,
    force_on_disk: bool,
    strategy: DeduplicationStrategy,
}

impl MaterializationParameters {
    /// Resolves the parameters of a result table.
    ///
    /// Hidden columns are dropped, bit columns become `BIGINT` when
    /// `bit_fields_as_long` is set, and the deduplication strategy is chosen.
    /// A native unique key is replaced by the hash key when the record is too
    /// wide for it or holds large objects.
    pub fn resolve(
        columns: &[ColumnDescriptor],
        distinct: bool,
        shape: QueryShape,
        options: &CreateOptions,
        alias: impl Into<String>,
        bit_fields_as_long: bool,
        create_table: bool,
    ) -> Self {
        let source_width = columns.len();
        let (positions, columns): (Vec<usize>, Vec<ColumnDescriptor>) = columns
            .iter()
            .enumerate()
            .filter(|(_, col)| !col.hidden)
            .map(|(pos, col)| {
                let mut col = col.clone();
                if bit_fields_as_long && col.data_type.is_bit() {
                    col.data_type = DataType::BigInt;
                }
                (pos, col)
            })
            .unzip();

        let counts = FieldTypeCounts::count(&columns);
        let mut strategy =
            DeduplicationStrategy::select(distinct, shape.recursive, shape.mixed_distinct_and_all);
        if strategy == DeduplicationStrategy::NativeUniqueKey
            && (counts.blob_fields > 0 || counts.record_width > options.max_unique_key_length)
        {
            strategy = DeduplicationStrategy::HashPseudoKey;
        }

        Self {
            alias: alias.into(),
            columns,
            positions,
            source_width,
            counts,
            create_table,
            force_on_disk: options.force_on_disk,
            strategy,
        }
    }

    /// Table alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Stored columns.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Column statistics.
    pub fn counts(&self) -> FieldTypeCounts {
        self.counts
    }

    /// Whether a physical table is allocated at provisioning.
    pub fn create_table(&self) -> bool {
        self.create_table
    }

    /// The resolved deduplication strategy.
    pub fn strategy(&self) -> DeduplicationStrategy {
        self.strategy
    }

    pub(crate) fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub(crate) fn source_width(&self) -> usize {
        self.source_width
    }

    /// Describes the table to the storage engine.
    pub fn table_spec(&self) -> TableSpec {
        let key = self.strategy.key_kind();
        let hash_width = if key == KeyKind::Hash {
            HASH_COLUMN_WIDTH
        } else {
            0
        };
        TableSpec::new(self.alias.clone(), self.columns.len())
            .with_key(key)
            .with_record_width(self.counts.record_width + hash_width)
            .with_blobs(self.counts.blob_fields > 0)
            .with_force_on_disk(self.force_on_disk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_ints() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("a", DataType::Int),
            ColumnDescriptor::new("b", DataType::Int),
        ]
    }

    fn resolve(
        columns: &[ColumnDescriptor],
        distinct: bool,
        shape: QueryShape,
    ) -> MaterializationParameters {
        MaterializationParameters::resolve(
            columns,
            distinct,
            shape,
            &CreateOptions::default(),
            "u",
            false,
            true,
        )
    }

    #[test]
    fn test_hidden_columns_filtered() {
        let columns = vec![
            ColumnDescriptor::new("a", DataType::Int),
            ColumnDescriptor::new("tmp", DataType::BigInt).hidden(),
            ColumnDescriptor::new("b", DataType::Text),
        ];
        let params = resolve(&columns, false, QueryShape::new());

        let names: Vec<_> = params.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(params.positions(), &[0, 2]);
        assert_eq!(params.source_width(), 3);
        assert_eq!(params.counts().blob_fields, 1);
    }

    #[test]
    fn test_bit_fields_as_long() {
        let columns = vec![ColumnDescriptor::new("flags", DataType::Bit(4))];
        let params = MaterializationParameters::resolve(
            &columns,
            false,
            QueryShape::new(),
            &CreateOptions::default(),
            "u",
            true,
            true,
        );
        assert_eq!(params.columns()[0].data_type, DataType::BigInt);

        let params = resolve(&columns, false, QueryShape::new());
        assert_eq!(params.columns()[0].data_type, DataType::Bit(4));
    }

    #[test]
    fn test_field_type_counts() {
        let columns = vec![
            ColumnDescriptor::not_null("id", DataType::Int),
            ColumnDescriptor::new("name", DataType::Varchar(Some(10))),
        ];
        let counts = FieldTypeCounts::count(&columns);
        assert_eq!(counts.blob_fields, 0);
        assert_eq!(counts.record_width, 4 + 5 + 15);

        let with_blob = [columns[0].clone(), ColumnDescriptor::new("doc", DataType::Blob)];
        assert_eq!(FieldTypeCounts::count(&with_blob).blob_fields, 1);
    }

    #[test]
    fn test_strategy_follows_shape() {
        let params = resolve(&two_ints(), true, QueryShape::new());
        assert_eq!(params.strategy(), DeduplicationStrategy::NativeUniqueKey);
        assert_eq!(params.table_spec().key, KeyKind::Unique);

        let params = resolve(&two_ints(), true, QueryShape::new().recursive());
        assert_eq!(params.strategy(), DeduplicationStrategy::HashPseudoKey);

        let params = resolve(&two_ints(), true, QueryShape::new().mixed());
        assert_eq!(params.strategy(), DeduplicationStrategy::HashPseudoKey);
        assert_eq!(params.table_spec().key, KeyKind::Hash);

        let params = resolve(&two_ints(), false, QueryShape::new().mixed());
        assert_eq!(params.strategy(), DeduplicationStrategy::NoDeduplication);
    }

    #[test]
    fn test_native_key_downgraded() {
        let blobs = vec![ColumnDescriptor::new("doc", DataType::Blob)];
        let params = resolve(&blobs, true, QueryShape::new());
        assert_eq!(params.strategy(), DeduplicationStrategy::HashPseudoKey);

        let wide = vec![ColumnDescriptor::new("s", DataType::Varchar(Some(100)))];
        let params = MaterializationParameters::resolve(
            &wide,
            true,
            QueryShape::new(),
            &CreateOptions {
                max_unique_key_length: 64,
                ..CreateOptions::default()
            },
            "u",
            false,
            true,
        );
        assert_eq!(params.strategy(), DeduplicationStrategy::HashPseudoKey);
    }

    #[test]
    fn test_options_from_config() {
        let config = TempTableConfig::default().with_max_unique_key_length(10);
        let options = CreateOptions::from_config(&config);
        assert_eq!(options.max_unique_key_length, 10);
        assert!(!options.force_on_disk);

        let params = MaterializationParameters::resolve(
            &two_ints(),
            true,
            QueryShape::new(),
            &options,
            "u",
            false,
            true,
        );
        assert_eq!(params.strategy(), DeduplicationStrategy::HashPseudoKey);
    }

    #[test]
    fn test_table_spec() {
        let spec = resolve(&two_ints(), true, QueryShape::new().mixed()).table_spec();
        assert_eq!(spec.key, KeyKind::Hash);
        assert_eq!(spec.column_count, 2);
        assert_eq!(spec.record_width, 4 + 5 + 5 + HASH_COLUMN_WIDTH);
        assert!(!spec.requires_disk());

        let params = MaterializationParameters::resolve(
            &two_ints(),
            true,
            QueryShape::new(),
            &CreateOptions::default().with_force_on_disk(true),
            "u",
            false,
            true,
        );
        let spec = params.table_spec();
        assert_eq!(spec.key, KeyKind::Unique);
        assert!(spec.requires_disk());
    }
}
