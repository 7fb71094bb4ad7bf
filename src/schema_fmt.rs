//! Purpose: Render a schema definition as line-per-field JSON for review and diffs.
//! Exports: `format_schema`.
//! Role: Backs `dbcycle schema fmt`; output parses back to the same definition.
//! Invariants: Tables and fields keep their order; each field object sits on one line.
use serde_json::json;

use crate::core::schema::{DatabaseDefinition, FieldDefinition, TableDefinition};

pub fn format_schema(db: &DatabaseDefinition) -> String {
    let mut lines = vec!["{".to_string(), "  \"Tables\": [".to_string()];
    for (index, table) in db.tables.iter().enumerate() {
        let last = index + 1 == db.tables.len();
        format_table(table, last, &mut lines);
    }
    lines.push("  ]".to_string());
    lines.push("}".to_string());
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn format_table(table: &TableDefinition, last: bool, lines: &mut Vec<String>) {
    lines.push("    {".to_string());
    lines.push(format!("      \"Name\": {},", json!(table.name)));
    lines.push(format!(
        "      \"Extension\": {},",
        json!(table.container_kind.extension())
    ));
    lines.push("      \"Fields\": [".to_string());
    for (index, field) in table.fields.iter().enumerate() {
        let comma = if index + 1 == table.fields.len() { "" } else { "," };
        lines.push(format!("        {}{comma}", format_field(field)));
    }
    lines.push("      ]".to_string());
    lines.push(if last { "    }" } else { "    }," }.to_string());
}

fn format_field(field: &FieldDefinition) -> String {
    format!(
        "{{\"Name\": {}, \"Type\": {}, \"IsIndex\": {}, \"ArraySize\": {}}}",
        json!(field.name),
        json!(field.scalar_type.as_str()),
        field.is_index,
        json!(field.array_size)
    )
}

#[cfg(test)]
mod tests {
    use super::format_schema;
    use crate::core::schema::DatabaseDefinition;

    const SCHEMA: &str = r#"{"Tables":[
        {"Name":"Spell","Extension":"DBC","Fields":[
            {"Name":"ID","Type":"INT","IsIndex":true},
            {"Name":"Name","Type":"string","ArraySize":8}]},
        {"Name":"Item","Extension":"db2","Fields":[{"Name":"ID","Type":"int","IsIndex":true,"ArraySize":null}]}
    ]}"#;

    #[test]
    fn fields_sit_on_one_line_each() {
        let db = DatabaseDefinition::from_json(SCHEMA).expect("schema");
        let text = format_schema(&db);
        let expected = r#"{
  "Tables": [
    {
      "Name": "Spell",
      "Extension": "dbc",
      "Fields": [
        {"Name": "ID", "Type": "int", "IsIndex": true, "ArraySize": null},
        {"Name": "Name", "Type": "string", "IsIndex": false, "ArraySize": 8}
      ]
    },
    {
      "Name": "Item",
      "Extension": "db2",
      "Fields": [
        {"Name": "ID", "Type": "int", "IsIndex": true, "ArraySize": null}
      ]
    }
  ]
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn output_parses_back_to_the_same_definition() {
        let db = DatabaseDefinition::from_json(SCHEMA).expect("schema");
        let again = DatabaseDefinition::from_json(&format_schema(&db)).expect("reparse");
        assert_eq!(again, db);
    }

    #[test]
    fn empty_schema_is_still_valid_json() {
        let text = format_schema(&DatabaseDefinition::default());
        assert_eq!(text, "{\n  \"Tables\": [\n  ]\n}\n");
        DatabaseDefinition::from_json(&text).expect("reparse");
    }
}
