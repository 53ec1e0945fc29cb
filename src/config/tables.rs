//! Compile-time allow-lists: which columns each table may be written through, and how its audit columns are stamped.

/// Logical schema a table lives in. Each has its own connection pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Schema {
    Chatbot,
    Scribe,
    EvaaConfig,
}

impl Schema {
    pub const ALL: [Schema; 3] = [Schema::Chatbot, Schema::Scribe, Schema::EvaaConfig];

    pub fn name(self) -> &'static str {
        match self {
            Schema::Chatbot => "chatbot",
            Schema::Scribe => "scribe",
            Schema::EvaaConfig => "evaa_config",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditKind {
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
}

impl AuditKind {
    /// Stamped with the server clock rather than a bound value.
    pub fn is_timestamp(self) -> bool {
        matches!(self, AuditKind::CreatedAt | AuditKind::UpdatedAt)
    }

    /// Whether this column is stamped on insert (`true`) or on every write.
    pub fn on_insert_only(self) -> bool {
        matches!(self, AuditKind::CreatedAt | AuditKind::CreatedBy)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AuditColumn {
    pub name: &'static str,
    pub kind: AuditKind,
}

/// Static description of one writable table.
#[derive(Debug)]
pub struct TableSpec {
    pub schema: Schema,
    pub name: &'static str,
    pub primary_key: &'static str,
    /// Primary key generated by the store (AUTO_INCREMENT).
    pub auto_increment: bool,
    /// Columns callers may write. Excludes audit columns and an auto-generated key.
    pub columns: &'static [&'static str],
    pub audit: &'static [AuditColumn],
    /// Flag column used for soft delete (1 = active, 0 = inactive).
    pub active_column: Option<&'static str>,
    pub unique_columns: &'static [&'static str],
}

impl TableSpec {
    pub fn is_writable(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column))
    }

    pub fn is_audit(&self, column: &str) -> bool {
        self.audit.iter().any(|a| a.name.eq_ignore_ascii_case(column))
    }

    /// Map a unique-index name reported by the store back to the column it guards.
    pub fn unique_column_for_key(&self, key: &str) -> Option<&'static str> {
        let key_upper = key.to_ascii_uppercase();
        self.unique_columns
            .iter()
            .copied()
            .find(|c| c.eq_ignore_ascii_case(key))
            .or_else(|| {
                self.unique_columns
                    .iter()
                    .copied()
                    .find(|c| key_upper.contains(&c.to_ascii_uppercase()))
            })
    }
}

const STANDARD_AUDIT: &[AuditColumn] = &[
    AuditColumn { name: "CREATED_AT", kind: AuditKind::CreatedAt },
    AuditColumn { name: "UPDATED_AT", kind: AuditKind::UpdatedAt },
    AuditColumn { name: "CREATED_BY", kind: AuditKind::CreatedBy },
    AuditColumn { name: "UPDATED_BY", kind: AuditKind::UpdatedBy },
];

pub static ORGANIZATIONS: TableSpec = TableSpec {
    schema: Schema::EvaaConfig,
    name: "organizations",
    primary_key: "ORGANIZATION_ID",
    auto_increment: true,
    columns: &[
        "ORGANIZATION_NAME",
        "ACCOUNT_ID",
        "CONNECTION_STRING",
        "DESCRIPTION",
        "CONTACT_EMAIL",
        "CONTACT_PHONE",
        "TIME_ZONE",
        "SETTINGS",
        "IS_ACTIVE",
    ],
    audit: STANDARD_AUDIT,
    active_column: Some("IS_ACTIVE"),
    unique_columns: &["ACCOUNT_ID", "ORGANIZATION_NAME"],
};

pub static PROVIDERS: TableSpec = TableSpec {
    schema: Schema::Scribe,
    name: "providers",
    primary_key: "PROVIDER_ID",
    auto_increment: true,
    columns: &[
        "ORGANIZATION_ID",
        "FIRST_NAME",
        "MIDDLE_NAME",
        "LAST_NAME",
        "CREDENTIALS",
        "SPECIALTY",
        "NPI",
        "EXTERNAL_PROVIDER_ID",
        "EMAIL",
        "PHONE",
        "PREFERENCES",
        "IS_ACTIVE",
        "IS_ENABLED",
    ],
    audit: STANDARD_AUDIT,
    active_column: Some("IS_ACTIVE"),
    unique_columns: &["NPI", "EXTERNAL_PROVIDER_ID", "EMAIL"],
};

pub static LOCATIONS: TableSpec = TableSpec {
    schema: Schema::EvaaConfig,
    name: "locations",
    primary_key: "LOCATION_ID",
    auto_increment: true,
    columns: &[
        "ORGANIZATION_ID",
        "LOCATION_NAME",
        "ADDRESS_LINE1",
        "ADDRESS_LINE2",
        "CITY",
        "STATE",
        "ZIP_CODE",
        "PHONE",
        "TIME_ZONE",
        "IS_ACTIVE",
    ],
    audit: STANDARD_AUDIT,
    active_column: Some("IS_ACTIVE"),
    unique_columns: &[],
};

/// Every table written through the column-filtered writer.
pub static ALL_TABLES: &[&TableSpec] = &[&ORGANIZATIONS, &PROVIDERS, &LOCATIONS];

/// Stored procedure listing chatbot clients (chatbot schema).
pub const CHATBOT_CLIENTS_PROCEDURE: &str = "CB_GET_CHATBOT_CLIENTS";
