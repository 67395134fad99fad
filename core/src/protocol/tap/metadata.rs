/*
 * metadata.rs
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

//! Archive metadata: schema/table/column records from the `/tables` endpoint.

use std::fmt;

/// Schemas that are server plumbing, not user-queryable data. Tables under
/// them never surface as `TableMetadata`.
pub const RESERVED_SCHEMAS: [&str; 2] = ["tap_schema", "external"];

/// One column of a queryable table. Every attribute defaults to an empty
/// string when the document omits it; `flags` collects the textual `flag`
/// elements (e.g. "indexed", "primary").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMetadata {
    pub name: String,
    pub unit: String,
    pub datatype: String,
    pub description: String,
    pub ucd: String,
    pub utype: String,
    pub flags: Vec<String>,
}

impl ColumnMetadata {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

impl fmt::Display for ColumnMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.datatype)?;
        if !self.unit.is_empty() {
            write!(f, " [{}]", self.unit)?;
        }
        Ok(())
    }
}

/// One queryable table. Columns are in document order (significant for
/// display only).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableMetadata {
    pub name: String,
    pub schema_name: String,
    pub description: String,
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    /// Fully qualified name: `schema.table` (just the table name when the
    /// name already carries the schema prefix or the schema is empty).
    pub fn qualified_name(&self) -> String {
        if self.schema_name.is_empty() || self.name.contains('.') {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema_name, self.name)
        }
    }
}

impl fmt::Display for TableMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} columns", self.qualified_name(), self.columns.len())
    }
}
