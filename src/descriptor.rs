// Entity descriptors: the single declaration of every persisted column.
// Storage DDL (migrations::ddl) and insert-contract validation (contract)
// are both generated from these, so the two cannot drift apart.

use serde::Serialize;

/// Text formats checked at the validation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextFormat {
    Plain,
    Email,
    Url,
    Phone,
    /// ISO-4217 code, upper case
    Currency,
}

/// Primitive column types understood by both storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Serial,
    Text {
        max_len: Option<usize>,
        format: TextFormat,
    },
    Integer {
        min: Option<i64>,
    },
    Boolean,
    Timestamp,
    Decimal {
        precision: u32,
        scale: u32,
    },
    Json,
    JsonList {
        min_items: usize,
    },
    TextList,
    Enum(&'static [&'static str]),
}

/// Storage-level default applied when a value is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldDefault {
    Now,
    Text(&'static str),
    Integer(i64),
    Boolean(bool),
    Decimal(&'static str),
    EmptyList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OnDelete {
    /// Dependent rows are removed with their parent
    Cascade,
    /// Dependent rows keep existing with the reference nulled
    SetNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub table: &'static str,
    pub on_delete: OnDelete,
}

/// Who fills a column in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Assigned {
    Caller,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: FieldType,
    pub nullable: bool,
    pub default: Option<FieldDefault>,
    pub references: Option<ForeignKey>,
    pub unique: bool,
    pub assigned: Assigned,
}

impl FieldDescriptor {
    /// Nullable, caller-supplied column with no default
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            nullable: true,
            default: None,
            references: None,
            unique: false,
            assigned: Assigned::Caller,
        }
    }

    /// Serial primary key
    pub const fn id() -> Self {
        Self::new("id", FieldType::Serial).not_null().server()
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(
            name,
            FieldType::Text {
                max_len: None,
                format: TextFormat::Plain,
            },
        )
    }

    pub const fn varchar(name: &'static str, max_len: usize) -> Self {
        Self::new(
            name,
            FieldType::Text {
                max_len: Some(max_len),
                format: TextFormat::Plain,
            },
        )
    }

    pub const fn formatted(name: &'static str, max_len: usize, format: TextFormat) -> Self {
        Self::new(
            name,
            FieldType::Text {
                max_len: Some(max_len),
                format,
            },
        )
    }

    pub const fn integer(name: &'static str, min: Option<i64>) -> Self {
        Self::new(name, FieldType::Integer { min })
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    pub const fn decimal(name: &'static str, precision: u32, scale: u32) -> Self {
        Self::new(name, FieldType::Decimal { precision, scale })
    }

    pub const fn json(name: &'static str) -> Self {
        Self::new(name, FieldType::Json)
    }

    pub const fn json_list(name: &'static str, min_items: usize) -> Self {
        Self::new(name, FieldType::JsonList { min_items })
    }

    pub const fn text_list(name: &'static str) -> Self {
        Self::new(name, FieldType::TextList)
    }

    pub const fn enumeration(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, FieldType::Enum(values))
    }

    /// Integer foreign key to `table(id)`
    pub const fn reference(name: &'static str, table: &'static str, on_delete: OnDelete) -> Self {
        let mut field = Self::new(name, FieldType::Integer { min: Some(1) });
        field.references = Some(ForeignKey { table, on_delete });
        field
    }

    /// `created_at` / `updated_at` style column stamped by the server
    pub const fn stamped(name: &'static str) -> Self {
        Self::timestamp(name).not_null().default_to(FieldDefault::Now).server()
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub const fn default_to(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn server(mut self) -> Self {
        self.assigned = Assigned::Server;
        self
    }

    pub fn is_server_assigned(&self) -> bool {
        self.assigned == Assigned::Server
    }

    /// Must be present in every insert payload
    pub fn is_required(&self) -> bool {
        self.assigned == Assigned::Caller && !self.nullable && self.default.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityDescriptor {
    pub table: &'static str,
    pub fields: &'static [FieldDescriptor],
    /// Multi-column uniqueness, e.g. page order within a funnel
    pub unique_together: &'static [&'static [&'static str]],
    /// Column used for owner traversal (`list_by_owner`)
    pub owner: &'static str,
    /// Column listing order within an owner
    pub order_by: &'static str,
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Fields a caller may supply on insert
    pub fn insertable_fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().filter(|f| !f.is_server_assigned())
    }

    /// Server-assigned fields: the insert-contract exclusion set
    pub fn excluded_fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().filter(|f| f.is_server_assigned())
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = (&'static FieldDescriptor, ForeignKey)> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields
            .iter()
            .filter_map(|f| f.references.map(|fk| (f, fk)))
    }
}

/// Every entity, parents before children
pub fn catalog() -> &'static [&'static EntityDescriptor] {
    use crate::models::{email, funnel, user};

    static CATALOG: [&EntityDescriptor; 14] = [
        &user::USERS,
        &user::USER_PROFILES,
        &user::BILLING_HISTORY,
        &user::TEAM_MEMBERS,
        &funnel::FUNNELS,
        &funnel::PAGES,
        &funnel::LEAD_MAGNETS,
        &funnel::LEADS,
        &funnel::TEMPLATES,
        &email::EMAIL_CAMPAIGNS,
        &email::EMAIL_TEMPLATES,
        &email::EMAIL_CONTACTS,
        &email::EMAIL_AUTOMATIONS,
        &email::EMAIL_SENDS,
    ];
    &CATALOG
}

pub fn find_entity(table: &str) -> Option<&'static EntityDescriptor> {
    catalog().iter().copied().find(|d| d.table == table)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
}

/// A traversal edge between two tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub parent: &'static str,
    pub child: &'static str,
    pub column: &'static str,
    pub cardinality: Cardinality,
    pub on_delete: OnDelete,
}

/// Relations derived from the foreign keys; a unique FK is one-to-one
pub fn relations() -> Vec<Relation> {
    catalog()
        .iter()
        .flat_map(|entity| {
            entity.foreign_keys().map(move |(field, fk)| Relation {
                parent: fk.table,
                child: entity.table,
                column: field.name,
                cardinality: if field.unique {
                    Cardinality::OneToOne
                } else {
                    Cardinality::OneToMany
                },
                on_delete: fk.on_delete,
            })
        })
        .collect()
}

/// Relations whose parent is `table`
pub fn dependents_of(table: &str) -> Vec<Relation> {
    relations().into_iter().filter(|r| r.parent == table).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_parents_precede_children() {
        let tables: Vec<&str> = catalog().iter().map(|d| d.table).collect();
        for relation in relations() {
            let parent = tables.iter().position(|t| *t == relation.parent).unwrap();
            let child = tables.iter().position(|t| *t == relation.child).unwrap();
            assert!(
                parent < child,
                "{} must be declared before {}",
                relation.parent,
                relation.child
            );
        }
    }

    #[test]
    fn test_every_entity_has_serial_id_and_valid_owner() {
        for entity in catalog() {
            let id = entity.field("id").expect("id column");
            assert_eq!(id.ty, FieldType::Serial);
            assert!(id.is_server_assigned());
            assert!(entity.field(entity.owner).is_some(), "{}", entity.table);
            assert!(entity.field(entity.order_by).is_some(), "{}", entity.table);
        }
    }

    #[test]
    fn test_profile_is_one_to_one_with_user() {
        let relation = relations()
            .into_iter()
            .find(|r| r.child == "user_profiles")
            .unwrap();
        assert_eq!(relation.parent, "users");
        assert_eq!(relation.cardinality, Cardinality::OneToOne);
        assert_eq!(relation.on_delete, OnDelete::Cascade);
    }

    #[test]
    fn test_user_dependents_split_cascade_and_orphan() {
        let dependents = dependents_of("users");
        let cascade: Vec<&str> = dependents
            .iter()
            .filter(|r| r.on_delete == OnDelete::Cascade)
            .map(|r| r.child)
            .collect();
        assert_eq!(
            cascade,
            vec!["user_profiles", "billing_history", "team_members"]
        );

        for orphaned in ["funnels", "lead_magnets", "leads"] {
            let relation = dependents.iter().find(|r| r.child == orphaned).unwrap();
            assert_eq!(relation.on_delete, OnDelete::SetNull);
        }
    }

    #[test]
    fn test_required_field_rules() {
        let username = find_entity("users").unwrap().field("username").unwrap();
        assert!(username.is_required());

        let account_type = find_entity("users").unwrap().field("account_type").unwrap();
        assert!(!account_type.is_required());

        let created_at = find_entity("users").unwrap().field("created_at").unwrap();
        assert!(!created_at.is_required());
        assert!(created_at.is_server_assigned());
    }
}
