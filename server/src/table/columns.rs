//! Column metadata, table schema and published configuration
//!
//! Entities declare their columns through [`ColumnDef`] builders. A
//! [`TableSchema`] is built once per entity type and resolves request field
//! names case-insensitively to the canonical field identifier.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::ValidationError;

use super::error::TableError;
use super::value::{CellValue, ValueKind};

/// Semantic data type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    Text,
    Numeric,
    Boolean,
    Date,
    /// Semicolon-delimited text treated as a set of values
    List,
}

impl DataType {
    /// Storage kind used when a column does not declare one
    pub fn default_kind(self) -> ValueKind {
        match self {
            DataType::Text | DataType::List => ValueKind::Text,
            DataType::Numeric => ValueKind::Float,
            DataType::Boolean => ValueKind::Boolean,
            DataType::Date => ValueKind::DateTime,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Text => write!(f, "text"),
            DataType::Numeric => write!(f, "numeric"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Date => write!(f, "date"),
            DataType::List => write!(f, "list"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataAlignHorizontal {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataAlignVertical {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrozenColumnAlign {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellOverflowBehaviour {
    #[default]
    Hidden,
    Wrap,
}

/// Sort direction used for default orderings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Descending,
    Ascending,
}

/// Declarative column definition.
///
/// Flags are stored as declared; the derived rules (frozen columns can't be
/// resized, Boolean columns can't be globally filtered, ...) are applied when
/// the definition is turned into [`ColumnMetadata`].
#[derive(Debug, Clone)]
pub struct ColumnDef {
    field: String,
    header: String,
    data_type: DataType,
    kind: ValueKind,
    nullable: bool,
    align_horizontal: DataAlignHorizontal,
    align_horizontal_user_edit: bool,
    align_vertical: DataAlignVertical,
    align_vertical_user_edit: bool,
    can_be_hidden: bool,
    start_hidden: bool,
    can_be_resized: bool,
    can_be_reordered: bool,
    can_be_sorted: bool,
    can_be_filtered: bool,
    filter_predefined_values_name: String,
    can_be_global_filtered: bool,
    send_to_client: bool,
    column_description: String,
    data_tooltip_show: bool,
    data_tooltip_custom_column_source: String,
    frozen: FrozenColumnAlign,
    overflow: CellOverflowBehaviour,
    overflow_user_edit: bool,
    initial_width: f64,
    date_format: Option<String>,
    date_timezone: Option<String>,
    date_culture: Option<String>,
    export_date_format: Option<String>,
}

impl ColumnDef {
    pub fn new(field: impl Into<String>, data_type: DataType) -> Self {
        Self {
            field: field.into(),
            header: String::new(),
            data_type,
            kind: data_type.default_kind(),
            nullable: true,
            align_horizontal: DataAlignHorizontal::Center,
            align_horizontal_user_edit: true,
            align_vertical: DataAlignVertical::Middle,
            align_vertical_user_edit: true,
            can_be_hidden: true,
            start_hidden: false,
            can_be_resized: true,
            can_be_reordered: true,
            can_be_sorted: true,
            can_be_filtered: true,
            filter_predefined_values_name: String::new(),
            can_be_global_filtered: true,
            send_to_client: true,
            column_description: String::new(),
            data_tooltip_show: true,
            data_tooltip_custom_column_source: String::new(),
            frozen: FrozenColumnAlign::None,
            overflow: CellOverflowBehaviour::Hidden,
            overflow_user_edit: true,
            initial_width: 0.0,
            date_format: None,
            date_timezone: None,
            date_culture: None,
            export_date_format: None,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Underlying storage kind and nullability
    pub fn storage(mut self, kind: ValueKind, nullable: bool) -> Self {
        self.kind = kind;
        self.nullable = nullable;
        self
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn align_horizontal(mut self, align: DataAlignHorizontal, user_edit: bool) -> Self {
        self.align_horizontal = align;
        self.align_horizontal_user_edit = user_edit;
        self
    }

    pub fn align_vertical(mut self, align: DataAlignVertical, user_edit: bool) -> Self {
        self.align_vertical = align;
        self.align_vertical_user_edit = user_edit;
        self
    }

    pub fn hideable(mut self, can_be_hidden: bool, start_hidden: bool) -> Self {
        self.can_be_hidden = can_be_hidden;
        self.start_hidden = start_hidden;
        self
    }

    pub fn resizable(mut self, value: bool) -> Self {
        self.can_be_resized = value;
        self
    }

    pub fn reorderable(mut self, value: bool) -> Self {
        self.can_be_reordered = value;
        self
    }

    pub fn sortable(mut self, value: bool) -> Self {
        self.can_be_sorted = value;
        self
    }

    pub fn filterable(mut self, value: bool) -> Self {
        self.can_be_filtered = value;
        self
    }

    pub fn global_filterable(mut self, value: bool) -> Self {
        self.can_be_global_filtered = value;
        self
    }

    pub fn predefined_values(mut self, name: impl Into<String>) -> Self {
        self.filter_predefined_values_name = name.into();
        self
    }

    /// Keep the column out of the published configuration. Such columns are
    /// always part of row projections.
    pub fn hidden_from_client(mut self) -> Self {
        self.send_to_client = false;
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.column_description = text.into();
        self
    }

    pub fn tooltip(mut self, show: bool, custom_source: impl Into<String>) -> Self {
        self.data_tooltip_show = show;
        self.data_tooltip_custom_column_source = custom_source.into();
        self
    }

    pub fn frozen(mut self, align: FrozenColumnAlign) -> Self {
        self.frozen = align;
        self
    }

    pub fn overflow(mut self, behaviour: CellOverflowBehaviour, user_edit: bool) -> Self {
        self.overflow = behaviour;
        self.overflow_user_edit = user_edit;
        self
    }

    pub fn initial_width(mut self, width: f64) -> Self {
        self.initial_width = width;
        self
    }

    pub fn date_context(
        mut self,
        format: Option<&str>,
        timezone: Option<&str>,
        culture: Option<&str>,
    ) -> Self {
        self.date_format = format.map(str::to_string);
        self.date_timezone = timezone.map(str::to_string);
        self.date_culture = culture.map(str::to_string);
        self
    }

    pub fn export_date_format(mut self, format: impl Into<String>) -> Self {
        self.export_date_format = Some(format.into());
        self
    }

    fn into_column(self, field: &str) -> Column {
        let is_frozen = self.frozen != FrozenColumnAlign::None;
        let is_boolean = self.data_type == DataType::Boolean;

        let metadata = ColumnMetadata {
            field: field.to_string(),
            header: self.header,
            data_type: self.data_type,
            data_align_horizontal: self.align_horizontal,
            data_align_horizontal_allow_user_edit: self.align_horizontal_user_edit,
            data_align_vertical: self.align_vertical,
            data_align_vertical_allow_user_edit: self.align_vertical_user_edit,
            can_be_hidden: self.can_be_hidden,
            start_hidden: self.start_hidden && self.can_be_hidden,
            can_be_resized: self.can_be_resized && !is_frozen,
            can_be_reordered: self.can_be_reordered && !is_frozen,
            can_be_sorted: self.can_be_sorted,
            can_be_filtered: self.can_be_filtered,
            filter_predefined_values_name: self.filter_predefined_values_name,
            can_be_global_filtered: self.can_be_global_filtered
                && self.can_be_filtered
                && !is_boolean,
            column_description: self.column_description,
            data_tooltip_show: self.data_tooltip_show,
            data_tooltip_custom_column_source: lower_first(&self.data_tooltip_custom_column_source),
            frozen_column_align: self.frozen,
            cell_overflow_behaviour: if is_boolean {
                CellOverflowBehaviour::Hidden
            } else {
                self.overflow
            },
            cell_overflow_behaviour_allow_user_edit: self.overflow_user_edit && !is_boolean,
            initial_width: if self.initial_width <= 0.0 && is_frozen {
                100.0
            } else {
                self.initial_width
            },
            date_format: self.date_format,
            date_timezone: self.date_timezone,
            date_culture: self.date_culture,
            export_date_format: self.export_date_format,
        };

        Column {
            metadata,
            kind: self.kind,
            nullable: self.nullable,
            send_to_client: self.send_to_client,
        }
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Column description published to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub field: String,
    pub header: String,
    pub data_type: DataType,
    pub data_align_horizontal: DataAlignHorizontal,
    pub data_align_horizontal_allow_user_edit: bool,
    pub data_align_vertical: DataAlignVertical,
    pub data_align_vertical_allow_user_edit: bool,
    pub can_be_hidden: bool,
    pub start_hidden: bool,
    pub can_be_resized: bool,
    pub can_be_reordered: bool,
    pub can_be_sorted: bool,
    pub can_be_filtered: bool,
    pub filter_predefined_values_name: String,
    pub can_be_global_filtered: bool,
    pub column_description: String,
    pub data_tooltip_show: bool,
    pub data_tooltip_custom_column_source: String,
    pub frozen_column_align: FrozenColumnAlign,
    pub cell_overflow_behaviour: CellOverflowBehaviour,
    pub cell_overflow_behaviour_allow_user_edit: bool,
    pub initial_width: f64,
    pub date_format: Option<String>,
    pub date_timezone: Option<String>,
    pub date_culture: Option<String>,
    pub export_date_format: Option<String>,
}

/// A resolved column: client metadata plus storage details
#[derive(Debug, Clone)]
pub struct Column {
    metadata: ColumnMetadata,
    kind: ValueKind,
    nullable: bool,
    send_to_client: bool,
}

impl Column {
    pub fn field(&self) -> &str {
        &self.metadata.field
    }

    pub fn header(&self) -> &str {
        &self.metadata.header
    }

    pub fn data_type(&self) -> DataType {
        self.metadata.data_type
    }

    pub fn metadata(&self) -> &ColumnMetadata {
        &self.metadata
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn send_to_client(&self) -> bool {
        self.send_to_client
    }

    /// Columns withheld from the client are part of every projection
    pub fn always_included(&self) -> bool {
        !self.send_to_client
    }
}

/// An entity type that can be served as a table.
///
/// `fields` lists every field the entity exposes, in declaration order;
/// `columns` declares metadata for the subset that takes part in the table.
pub trait TableEntity: Send + Sync + 'static {
    fn fields() -> &'static [&'static str];

    fn columns() -> Vec<ColumnDef>;

    /// Read one field by its canonical name
    fn cell(&self, field: &str) -> CellValue;
}

/// The immutable set of columns of one entity type
#[derive(Debug, Clone)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    pub fn of<E: TableEntity>() -> Self {
        Self::from_parts(E::fields(), E::columns())
    }

    /// Build a schema from the entity field list and the declared columns.
    ///
    /// Fields without a definition are skipped with a warning, as are
    /// definitions naming an unknown field or repeating a field.
    pub fn from_parts(fields: &[&str], defs: Vec<ColumnDef>) -> Self {
        let mut defs: Vec<Option<ColumnDef>> = defs.into_iter().map(Some).collect();
        let mut columns = Vec::with_capacity(fields.len());

        for field in fields {
            let slot = defs
                .iter_mut()
                .find(|d| matches!(d, Some(def) if def.field().eq_ignore_ascii_case(field)));
            match slot.and_then(Option::take) {
                Some(def) => columns.push(def.into_column(field)),
                None => {
                    tracing::warn!(field, "Column is missing its metadata, skipping");
                }
            }
        }

        for def in defs.into_iter().flatten() {
            tracing::warn!(
                field = def.field(),
                "Column definition does not match an entity field, skipping"
            );
        }

        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Case-insensitive lookup
    pub fn resolve(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.field().eq_ignore_ascii_case(name))
    }

    pub fn require(&self, name: &str) -> Result<&Column, TableError> {
        self.resolve(name).ok_or_else(|| {
            TableError::invalid_configuration(format!("Unknown column '{}'", name))
        })
    }

    pub fn always_included(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.always_included())
    }

    /// Configuration published to clients: only columns sent to the client
    pub fn configuration(&self, options: &TableOptions) -> TableConfiguration {
        TableConfiguration {
            columns_info: self
                .columns
                .iter()
                .filter(|c| c.send_to_client())
                .map(|c| c.metadata().clone())
                .collect(),
            allowed_items_per_page: options.allowed_items_per_page.clone(),
            date_format: options.date_format.clone(),
            date_timezone: options.date_timezone.clone(),
            date_culture: options.date_culture.clone(),
            max_views: options.max_views,
            export_date_format: options.export_date_format.clone(),
        }
    }
}

pub const DEFAULT_ALLOWED_ITEMS_PER_PAGE: [u8; 6] = [10, 20, 30, 50, 75, 100];
pub const DEFAULT_DATE_FORMAT: &str = "dd-MMM-yyyy HH:mm:ss zzzz";
pub const DEFAULT_DATE_TIMEZONE: &str = "+00:00";
pub const DEFAULT_DATE_CULTURE: &str = "en-US";
pub const DEFAULT_MAX_VIEWS: u8 = 10;
pub const DEFAULT_EXPORT_DATE_FORMAT: &str = "dd-MMM-yyyy HH:mm:ss";

/// Table-wide settings used to publish a configuration and validate requests
#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    pub allowed_items_per_page: Vec<u8>,
    pub date_format: String,
    pub date_timezone: String,
    pub date_culture: String,
    pub max_views: u8,
    pub export_date_format: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            allowed_items_per_page: DEFAULT_ALLOWED_ITEMS_PER_PAGE.to_vec(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            date_timezone: DEFAULT_DATE_TIMEZONE.to_string(),
            date_culture: DEFAULT_DATE_CULTURE.to_string(),
            max_views: DEFAULT_MAX_VIEWS,
            export_date_format: DEFAULT_EXPORT_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfiguration {
    pub columns_info: Vec<ColumnMetadata>,
    pub allowed_items_per_page: Vec<u8>,
    pub date_format: String,
    pub date_timezone: String,
    pub date_culture: String,
    pub max_views: u8,
    pub export_date_format: String,
}

impl TableConfiguration {
    /// Apply per-field overrides, matched case-insensitively. Unknown fields
    /// are logged and skipped.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, ColumnMetadataOverride>) {
        for (name, values) in overrides {
            match self
                .columns_info
                .iter_mut()
                .find(|c| c.field.eq_ignore_ascii_case(name))
            {
                Some(column) => values.apply_to(column),
                None => tracing::warn!(column = %name, "Override targets an unknown column"),
            }
        }
    }
}

/// Partial overrides for published column metadata. Only set values apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnMetadataOverride {
    pub header: Option<String>,
    pub data_align_horizontal: Option<DataAlignHorizontal>,
    pub data_align_horizontal_allow_user_edit: Option<bool>,
    pub data_align_vertical: Option<DataAlignVertical>,
    pub data_align_vertical_allow_user_edit: Option<bool>,
    pub can_be_hidden: Option<bool>,
    pub start_hidden: Option<bool>,
    pub can_be_resized: Option<bool>,
    pub can_be_reordered: Option<bool>,
    pub can_be_sorted: Option<bool>,
    pub can_be_filtered: Option<bool>,
    pub can_be_global_filtered: Option<bool>,
    pub column_description: Option<String>,
    pub data_tooltip_show: Option<bool>,
    pub cell_overflow_behaviour: Option<CellOverflowBehaviour>,
    pub cell_overflow_behaviour_allow_user_edit: Option<bool>,
    pub date_format: Option<String>,
    pub date_timezone: Option<String>,
    pub date_culture: Option<String>,
}

impl ColumnMetadataOverride {
    pub fn apply_to(&self, target: &mut ColumnMetadata) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        fn set_opt(slot: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        set(&mut target.header, &self.header);
        set(&mut target.data_align_horizontal, &self.data_align_horizontal);
        set(
            &mut target.data_align_horizontal_allow_user_edit,
            &self.data_align_horizontal_allow_user_edit,
        );
        set(&mut target.data_align_vertical, &self.data_align_vertical);
        set(
            &mut target.data_align_vertical_allow_user_edit,
            &self.data_align_vertical_allow_user_edit,
        );
        set(&mut target.can_be_hidden, &self.can_be_hidden);
        set(&mut target.start_hidden, &self.start_hidden);
        set(&mut target.can_be_resized, &self.can_be_resized);
        set(&mut target.can_be_reordered, &self.can_be_reordered);
        set(&mut target.can_be_sorted, &self.can_be_sorted);
        set(&mut target.can_be_filtered, &self.can_be_filtered);
        set(&mut target.can_be_global_filtered, &self.can_be_global_filtered);
        set(&mut target.column_description, &self.column_description);
        set(&mut target.data_tooltip_show, &self.data_tooltip_show);
        set(&mut target.cell_overflow_behaviour, &self.cell_overflow_behaviour);
        set(
            &mut target.cell_overflow_behaviour_allow_user_edit,
            &self.cell_overflow_behaviour_allow_user_edit,
        );
        set_opt(&mut target.date_format, &self.date_format);
        set_opt(&mut target.date_timezone, &self.date_timezone);
        set_opt(&mut target.date_culture, &self.date_culture);
    }
}

/// Validator for the requested page size
pub fn validate_page_size(page_size: u8, allowed: &[u8]) -> Result<(), ValidationError> {
    if !allowed.contains(&page_size) {
        return Err(ValidationError::new("page_size_not_allowed").with_message(
            format!("Page size {} is not one of {:?}", page_size, allowed).into(),
        ));
    }
    Ok(())
}

/// Validator for the requested column list
pub fn validate_columns(columns: Option<&[String]>) -> Result<(), ValidationError> {
    match columns {
        Some(cols) if !cols.is_empty() => Ok(()),
        _ => Err(ValidationError::new("columns_empty")
            .with_message("At least one column must be requested".into())),
    }
}

/// True when the page size is allowed and at least one column is requested.
/// `allowed` falls back to the default page sizes.
pub fn validate_items_per_page_and_cols(
    items_per_page: u8,
    columns: Option<&[String]>,
    allowed: Option<&[u8]>,
) -> bool {
    let allowed = allowed.unwrap_or(&DEFAULT_ALLOWED_ITEMS_PER_PAGE);
    validate_page_size(items_per_page, allowed).is_ok() && validate_columns(columns).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> TableSchema {
        TableSchema::from_parts(
            &["rowId", "username", "age", "payedTaxes", "notes"],
            vec![
                ColumnDef::new("rowId", DataType::Numeric).hidden_from_client(),
                ColumnDef::new("Username", DataType::Text)
                    .header("Username")
                    .frozen(FrozenColumnAlign::Left),
                ColumnDef::new("age", DataType::Numeric)
                    .storage(ValueKind::Integer, true)
                    .hideable(false, true),
                ColumnDef::new("payedTaxes", DataType::Boolean)
                    .overflow(CellOverflowBehaviour::Wrap, true),
                ColumnDef::new("ghost", DataType::Text),
            ],
        )
    }

    #[test]
    fn test_fields_without_metadata_are_skipped() {
        let schema = sample_schema();
        let fields: Vec<&str> = schema.columns().iter().map(|c| c.field()).collect();
        assert_eq!(fields, vec!["rowId", "username", "age", "payedTaxes"]);
    }

    #[test]
    fn test_canonical_field_comes_from_entity() {
        let schema = sample_schema();
        assert_eq!(schema.resolve("USERNAME").unwrap().field(), "username");
        assert!(schema.resolve("notes").is_none());
        assert!(matches!(
            schema.require("missing"),
            Err(TableError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_derived_flags() {
        let schema = sample_schema();

        let username = schema.resolve("username").unwrap().metadata();
        assert!(!username.can_be_resized);
        assert!(!username.can_be_reordered);
        assert_eq!(username.initial_width, 100.0);

        let age = schema.resolve("age").unwrap().metadata();
        assert!(!age.start_hidden);
        assert!(age.can_be_global_filtered);

        let taxes = schema.resolve("payedTaxes").unwrap().metadata();
        assert!(!taxes.can_be_global_filtered);
        assert_eq!(taxes.cell_overflow_behaviour, CellOverflowBehaviour::Hidden);
        assert!(!taxes.cell_overflow_behaviour_allow_user_edit);
    }

    #[test]
    fn test_global_filter_requires_filterable() {
        let schema = TableSchema::from_parts(
            &["name"],
            vec![ColumnDef::new("name", DataType::Text).filterable(false)],
        );
        assert!(!schema.columns()[0].metadata().can_be_global_filtered);
    }

    #[test]
    fn test_tooltip_source_is_lower_first() {
        let schema = TableSchema::from_parts(
            &["name"],
            vec![ColumnDef::new("name", DataType::Text).tooltip(true, "FullName")],
        );
        assert_eq!(
            schema.columns()[0]
                .metadata()
                .data_tooltip_custom_column_source,
            "fullName"
        );
    }

    #[test]
    fn test_configuration_omits_hidden_columns() {
        let schema = sample_schema();
        let config = schema.configuration(&TableOptions::default());
        assert!(config.columns_info.iter().all(|c| c.field != "rowId"));
        assert_eq!(config.columns_info.len(), 3);
        assert_eq!(config.allowed_items_per_page, vec![10, 20, 30, 50, 75, 100]);
        assert_eq!(config.max_views, 10);
        assert_eq!(config.date_timezone, "+00:00");

        let always: Vec<&str> = schema.always_included().map(|c| c.field()).collect();
        assert_eq!(always, vec!["rowId"]);
    }

    #[test]
    fn test_configuration_serializes_camel_case() {
        let schema = sample_schema();
        let json = serde_json::to_value(schema.configuration(&TableOptions::default())).unwrap();
        assert!(json.get("columnsInfo").is_some());
        assert_eq!(json["columnsInfo"][0]["dataType"], "text");
        assert_eq!(json["columnsInfo"][0]["frozenColumnAlign"], "left");
    }

    #[test]
    fn test_overrides_apply_case_insensitively() {
        let schema = sample_schema();
        let mut config = schema.configuration(&TableOptions::default());

        let mut overrides = HashMap::new();
        overrides.insert(
            "AGE".to_string(),
            ColumnMetadataOverride {
                header: Some("Years".into()),
                can_be_sorted: Some(false),
                date_timezone: Some("+02:00".into()),
                ..Default::default()
            },
        );
        overrides.insert("unknown".to_string(), ColumnMetadataOverride::default());
        config.apply_overrides(&overrides);

        let age = config.columns_info.iter().find(|c| c.field == "age").unwrap();
        assert_eq!(age.header, "Years");
        assert!(!age.can_be_sorted);
        assert_eq!(age.date_timezone.as_deref(), Some("+02:00"));
        assert!(age.can_be_filtered);
    }

    #[test]
    fn test_validate_items_per_page_and_cols() {
        let cols = vec!["username".to_string()];
        let none: Vec<String> = Vec::new();
        assert!(validate_items_per_page_and_cols(10, Some(cols.as_slice()), None));
        assert!(!validate_items_per_page_and_cols(15, Some(cols.as_slice()), None));
        assert!(!validate_items_per_page_and_cols(10, Some(none.as_slice()), None));
        assert!(!validate_items_per_page_and_cols(10, None, None));
        let custom = [15_u8];
        assert!(validate_items_per_page_and_cols(
            15,
            Some(cols.as_slice()),
            Some(custom.as_slice())
        ));
    }

    #[test]
    fn test_validation_messages() {
        let err = validate_page_size(15, &[10, 20]).unwrap_err();
        assert_eq!(err.code, "page_size_not_allowed");
        assert!(err.message.unwrap().contains("15"));
        assert_eq!(validate_columns(None).unwrap_err().code, "columns_empty");
    }
}
