/*
 * tableset.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Cannocchiale, a TAP/UWS client for astronomical archives.
 *
 * Cannocchiale is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Cannocchiale is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Cannocchiale.  If not, see <http://www.gnu.org/licenses/>.
 */

//! VODataService tableset parser for the TAP `/tables` endpoint.
//!
//! Iterates `schema` > `table` > `column` elements, skipping the reserved
//! schemas. Column documents come in four attribute-set variants (with and
//! without `ucd`/`utype`, with zero or more `flag` elements); absence always
//! normalizes to an empty string, and values are whitespace-stripped because
//! real archive documents contain irregular formatting.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ParseError;
use crate::protocol::tap::metadata::{ColumnMetadata, TableMetadata, RESERVED_SCHEMAS};

/// Nesting level the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Document,
    Schema,
    Table,
    Column,
}

/// Leaf elements carrying text at any level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leaf {
    Name,
    Description,
    Unit,
    Ucd,
    Utype,
    DataType,
    Flag,
}

impl Leaf {
    fn from_name(lower: &[u8]) -> Option<Leaf> {
        match lower {
            b"name" => Some(Leaf::Name),
            b"description" => Some(Leaf::Description),
            b"unit" => Some(Leaf::Unit),
            b"ucd" => Some(Leaf::Ucd),
            b"utype" => Some(Leaf::Utype),
            b"datatype" => Some(Leaf::DataType),
            b"flag" => Some(Leaf::Flag),
            _ => None,
        }
    }
}

/// Parse a tableset document into table metadata, excluding the reserved
/// schemas. Parsing the same document twice yields structurally equal
/// results.
pub fn parse_tableset(bytes: &[u8]) -> Result<Vec<TableMetadata>, ParseError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ParseError::MalformedDocument(format!("not UTF-8: {}", e)))?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut out = Vec::new();
    let mut level = Level::Document;
    let mut leaf: Option<Leaf> = None;
    let mut seen_element = false;

    let mut schema_name = String::new();
    let mut schema_tables: Vec<TableMetadata> = Vec::new();
    let mut table = TableMetadata::default();
    let mut column = ColumnMetadata::default();

    loop {
        match reader.read_event() {
            Err(e) => return Err(ParseError::MalformedDocument(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                seen_element = true;
                let lower = e.local_name().as_ref().to_ascii_lowercase();
                match lower.as_slice() {
                    b"schema" => {
                        level = Level::Schema;
                        schema_name.clear();
                        schema_tables.clear();
                    }
                    b"table" if level == Level::Schema => {
                        level = Level::Table;
                        table = TableMetadata::default();
                    }
                    b"column" if level == Level::Table => {
                        level = Level::Column;
                        column = ColumnMetadata::default();
                    }
                    other => leaf = Leaf::from_name(other),
                }
            }
            Ok(Event::Text(t)) => {
                let value = t
                    .unescape()
                    .map_err(|e| ParseError::MalformedDocument(e.to_string()))?
                    .trim()
                    .to_string();
                if let Some(leaf) = leaf {
                    apply_leaf(level, leaf, value, &mut schema_name, &mut table, &mut column);
                }
            }
            Ok(Event::End(e)) => {
                let lower = e.local_name().as_ref().to_ascii_lowercase();
                match lower.as_slice() {
                    b"column" if level == Level::Column => {
                        table.columns.push(std::mem::take(&mut column));
                        level = Level::Table;
                    }
                    b"table" if level == Level::Table => {
                        schema_tables.push(std::mem::take(&mut table));
                        level = Level::Schema;
                    }
                    b"schema" if level == Level::Schema => {
                        if !RESERVED_SCHEMAS.contains(&schema_name.as_str()) {
                            for mut t in schema_tables.drain(..) {
                                t.schema_name = schema_name.clone();
                                out.push(t);
                            }
                        } else {
                            schema_tables.clear();
                        }
                        level = Level::Document;
                    }
                    _ => leaf = None,
                }
            }
            Ok(Event::Empty(_)) => {
                seen_element = true;
            }
            Ok(_) => {}
        }
    }

    if !seen_element {
        return Err(ParseError::MissingRequiredField("tableset"));
    }
    Ok(out)
}

fn apply_leaf(
    level: Level,
    leaf: Leaf,
    value: String,
    schema_name: &mut String,
    table: &mut TableMetadata,
    column: &mut ColumnMetadata,
) {
    match (level, leaf) {
        (Level::Schema, Leaf::Name) => *schema_name = value,
        (Level::Table, Leaf::Name) => table.name = value,
        (Level::Table, Leaf::Description) => table.description = value,
        (Level::Column, Leaf::Name) => column.name = value,
        (Level::Column, Leaf::Description) => column.description = value,
        (Level::Column, Leaf::Unit) => column.unit = value,
        (Level::Column, Leaf::Ucd) => column.ucd = value,
        (Level::Column, Leaf::Utype) => column.utype = value,
        (Level::Column, Leaf::DataType) => column.datatype = value,
        (Level::Column, Leaf::Flag) => column.flags.push(value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLESET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vod:tableset xmlns:vod="http://www.ivoa.net/xml/VODataService/v1.1">
  <schema>
    <name>tap_schema</name>
    <table><name>tables</name><description>internal</description></table>
  </schema>
  <schema>
    <name>external</name>
    <table><name>ext_cat</name><description>mirror</description></table>
  </schema>
  <schema>
    <name>gaiadr2</name>
    <description>Gaia DR2 catalogue</description>
    <table>
      <name>gaia_source</name>
      <description>
          Main source catalogue
      </description>
      <column>
        <name>source_id</name>
        <description>Unique source identifier</description>
        <unit></unit>
        <ucd>meta.id</ucd>
        <utype>stc:AstroCoords</utype>
        <dataType>long</dataType>
        <flag>indexed</flag>
        <flag>primary</flag>
      </column>
      <column>
        <name> ra </name>
        <description>Right ascension</description>
        <unit>deg</unit>
        <dataType>double</dataType>
      </column>
    </table>
    <table>
      <name>tmass_best_neighbour</name>
      <description>2MASS cross-match</description>
    </table>
  </schema>
</vod:tableset>"#;

    #[test]
    fn reserved_schemas_are_filtered() {
        let tables = parse_tableset(TABLESET.as_bytes()).unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables.iter().all(|t| t.schema_name == "gaiadr2"));
        assert!(!tables.iter().any(|t| t.name == "tables" || t.name == "ext_cat"));
    }

    #[test]
    fn columns_in_document_order() {
        let tables = parse_tableset(TABLESET.as_bytes()).unwrap();
        let source = &tables[0];
        assert_eq!(source.name, "gaia_source");
        assert_eq!(source.columns.len(), 2);
        assert_eq!(source.columns[0].name, "source_id");
        assert_eq!(source.columns[1].name, "ra");
    }

    #[test]
    fn column_variant_with_ucd_utype_and_flags() {
        let tables = parse_tableset(TABLESET.as_bytes()).unwrap();
        let c = &tables[0].columns[0];
        assert_eq!(c.ucd, "meta.id");
        assert_eq!(c.utype, "stc:AstroCoords");
        assert_eq!(c.datatype, "long");
        assert_eq!(c.unit, "");
        assert_eq!(c.flags, vec!["indexed", "primary"]);
    }

    #[test]
    fn column_variant_without_ucd_utype_defaults_to_empty() {
        let tables = parse_tableset(TABLESET.as_bytes()).unwrap();
        let c = &tables[0].columns[1];
        assert_eq!(c.name, "ra");
        assert_eq!(c.unit, "deg");
        assert_eq!(c.ucd, "");
        assert_eq!(c.utype, "");
        assert!(c.flags.is_empty());
    }

    #[test]
    fn irregular_whitespace_is_stripped() {
        let tables = parse_tableset(TABLESET.as_bytes()).unwrap();
        assert_eq!(tables[0].description, "Main source catalogue");
        assert_eq!(tables[0].columns[1].name, "ra");
    }

    #[test]
    fn parsing_twice_is_idempotent() {
        let first = parse_tableset(TABLESET.as_bytes()).unwrap();
        let second = parse_tableset(TABLESET.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn table_without_columns_parses() {
        let tables = parse_tableset(TABLESET.as_bytes()).unwrap();
        assert_eq!(tables[1].name, "tmass_best_neighbour");
        assert!(tables[1].columns.is_empty());
    }

    #[test]
    fn empty_input_is_missing_root() {
        let e = parse_tableset(b"").unwrap_err();
        assert_eq!(e, ParseError::MissingRequiredField("tableset"));
    }

    #[test]
    fn malformed_document_errors() {
        let e = parse_tableset(b"<tableset><schema></table></tableset>").unwrap_err();
        assert!(matches!(e, ParseError::MalformedDocument(_)));
    }
}
