// PostgreSQL DDL rendered from the entity descriptors

use crate::descriptor::{
    catalog, EntityDescriptor, FieldDefault, FieldDescriptor, FieldType, OnDelete,
};

/// Enum columns are plain text; membership is checked by the contract layer
const ENUM_COLUMN_WIDTH: usize = 32;

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn sql_type(field: &FieldDescriptor) -> String {
    match field.ty {
        FieldType::Serial => "SERIAL".to_string(),
        FieldType::Text {
            max_len: Some(max), ..
        } => format!("VARCHAR({})", max),
        FieldType::Text { max_len: None, .. } => "TEXT".to_string(),
        FieldType::Integer { .. } => "INTEGER".to_string(),
        FieldType::Boolean => "BOOLEAN".to_string(),
        FieldType::Timestamp => "TIMESTAMPTZ".to_string(),
        FieldType::Decimal { precision, scale } => format!("NUMERIC({},{})", precision, scale),
        FieldType::Json | FieldType::JsonList { .. } => "JSONB".to_string(),
        FieldType::TextList => "TEXT[]".to_string(),
        FieldType::Enum(_) => format!("VARCHAR({})", ENUM_COLUMN_WIDTH),
    }
}

fn default_expr(field: &FieldDescriptor, default: FieldDefault) -> String {
    match default {
        FieldDefault::Now => "NOW()".to_string(),
        FieldDefault::Text(text) => literal(text),
        FieldDefault::Integer(n) => n.to_string(),
        FieldDefault::Boolean(true) => "TRUE".to_string(),
        FieldDefault::Boolean(false) => "FALSE".to_string(),
        FieldDefault::Decimal(value) => value.to_string(),
        FieldDefault::EmptyList => match field.ty {
            FieldType::TextList => "'{}'".to_string(),
            _ => "'[]'::jsonb".to_string(),
        },
    }
}

fn column_sql(field: &FieldDescriptor) -> String {
    let mut sql = format!("{} {}", quote(field.name), sql_type(field));

    if field.ty == FieldType::Serial {
        sql.push_str(" PRIMARY KEY");
        return sql;
    }
    if !field.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = field.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_expr(field, default));
    }
    if field.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(fk) = field.references {
        let action = match fk.on_delete {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        };
        sql.push_str(&format!(
            " REFERENCES {}({}) ON DELETE {}",
            quote(fk.table),
            quote("id"),
            action
        ));
    }
    sql
}

/// Name of the table-level unique constraint over `columns`
pub fn unique_constraint_name(table: &str, columns: &[&str]) -> String {
    format!("{}_{}_key", table, columns.join("_"))
}

/// `CREATE TABLE IF NOT EXISTS` for one entity
pub fn create_table_sql(entity: &EntityDescriptor) -> String {
    let mut lines: Vec<String> = entity
        .fields
        .iter()
        .map(|field| format!("    {}", column_sql(field)))
        .collect();

    for columns in entity.unique_together {
        let quoted: Vec<String> = columns.iter().map(|c| quote(c)).collect();
        lines.push(format!(
            "    CONSTRAINT {} UNIQUE ({})",
            quote(&unique_constraint_name(entity.table, columns)),
            quoted.join(", ")
        ));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        quote(entity.table),
        lines.join(",\n")
    )
}

/// Indexes backing owner traversal on every foreign key column
pub fn index_statements(entity: &EntityDescriptor) -> Vec<String> {
    entity
        .foreign_keys()
        .filter(|(field, _)| !field.unique)
        .map(|(field, _)| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote(&format!("idx_{}_{}", entity.table, field.name)),
                quote(entity.table),
                quote(field.name)
            )
        })
        .collect()
}

/// Every statement needed to provision the schema, parents first
pub fn schema_statements() -> Vec<String> {
    catalog()
        .iter()
        .flat_map(|entity| {
            std::iter::once(create_table_sql(entity)).chain(index_statements(entity))
        })
        .collect()
}

/// Drop statements, children first
pub fn drop_statements() -> Vec<String> {
    catalog()
        .iter()
        .rev()
        .map(|entity| format!("DROP TABLE IF EXISTS {} CASCADE", quote(entity.table)))
        .collect()
}
