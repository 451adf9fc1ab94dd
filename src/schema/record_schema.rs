//! # Record Layout Tables
//!
//! A [`RecordSchema`] is the complete declarative layout of one record kind:
//! an ordered field table plus the constructor for an empty instance of the
//! record it fills. The conversion compiler lowers a schema into a field
//! plan once and caches it, so validation here runs once per registered
//! kind, not once per record.
//!
//! ## Table Rules
//!
//! - field indices are dense and ascending: field `i` is `fields[i]`
//! - flag bytes, array counts, and dependency sources sit at a lower index
//!   than every field that references them
//! - flagged fields carry a pad value and a fixed-size type
//! - property names are unique within a record
//!
//! Violating any of these is a schema-definition bug, so construction fails
//! rather than deferring the problem to the first converted record.

use eyre::{bail, ensure, Result};

use super::descriptor::{FieldDescriptor, FieldKind};
use crate::records::{RecordData, RecordType};

/// Constructor for an empty record of the schema's kind.
pub type MakeRecord = fn() -> RecordData;

/// The validated field layout of one record kind.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    record_type: RecordType,
    name: &'static str,
    fields: Vec<FieldDescriptor>,
    make_record: MakeRecord,
}

impl RecordSchema {
    pub fn new(
        record_type: RecordType,
        name: &'static str,
        make_record: MakeRecord,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self> {
        validate(name, &fields)?;
        Ok(Self {
            record_type,
            name,
            fields,
            make_record,
        })
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Builds an empty record for conversion to fill.
    pub fn make_record(&self) -> RecordData {
        (self.make_record)()
    }

    /// Computes which fields must be read to populate `properties`, marking
    /// every flag byte, array count, and dependency source the requested
    /// fields transitively need. Unknown property names are schema-usage
    /// errors.
    pub fn required_fields(&self, properties: &[&str]) -> Result<Vec<bool>> {
        let mut required = vec![false; self.fields.len()];
        for property in properties {
            let field = self
                .fields
                .iter()
                .find(|f| f.property == Some(*property))
                .ok_or_else(|| {
                    eyre::eyre!("record {} has no property named {property}", self.name)
                })?;
            required[field.index] = true;
        }

        // Sources sit at lower indices, so one reverse sweep reaches the
        // fixpoint: by the time we visit a field its dependents are final.
        for index in (0..self.fields.len()).rev() {
            if !required[index] {
                continue;
            }
            if let Some(source) = self.fields[index].source_index() {
                required[source] = true;
            }
        }
        Ok(required)
    }
}

fn validate(name: &'static str, fields: &[FieldDescriptor]) -> Result<()> {
    for (position, field) in fields.iter().enumerate() {
        ensure!(
            field.index == position,
            "record {name}: field at position {position} declares index {}; indices must be dense and ascending",
            field.index
        );

        if let Some(source) = field.source_index() {
            ensure!(
                source < field.index,
                "record {name} field {position}: references field {source}, which does not precede it"
            );
        }

        match &field.kind {
            FieldKind::Plain => {}
            FieldKind::Flagged { flag_index, flag_mask } => {
                ensure!(
                    *flag_mask != 0,
                    "record {name} field {position}: flagged field has an empty mask"
                );
                ensure!(
                    field.field_type.fixed_size().is_some(),
                    "record {name} field {position}: flagged fields must have a fixed-size type, got {}",
                    field.field_type
                );
                ensure!(
                    field.missing_value.is_some(),
                    "record {name} field {position}: flagged fields need a pad value"
                );
                let flag = &fields[*flag_index];
                ensure!(
                    matches!(flag.kind, FieldKind::Plain)
                        && matches!(flag.field_type, super::FieldType::B1 | super::FieldType::U1),
                    "record {name} field {position}: flag source {flag_index} is not a plain flag byte"
                );
            }
            FieldKind::Array { length_index } | FieldKind::NibbleArray { length_index } => {
                if matches!(field.kind, FieldKind::Array { .. }) {
                    ensure!(
                        field.field_type.supports_array(),
                        "record {name} field {position}: arrays of {} are not supported",
                        field.field_type
                    );
                }
                let length = &fields[*length_index];
                ensure!(
                    matches!(length.kind, FieldKind::Plain) && length.field_type.is_count(),
                    "record {name} field {position}: length source {length_index} is not a plain unsigned field"
                );
            }
            FieldKind::FixedString { width } => {
                ensure!(
                    *width > 0,
                    "record {name} field {position}: fixed strings must have nonzero width"
                );
                if let Some(missing) = &field.missing_value {
                    let text = missing.as_str().map_err(|_| {
                        eyre::eyre!(
                            "record {name} field {position}: fixed-string pad must be a string"
                        )
                    })?;
                    ensure!(
                        text.chars().count() == *width,
                        "record {name} field {position}: fixed-string pad must be exactly {width} chars"
                    );
                }
            }
            FieldKind::Dependency { mask, .. } => {
                ensure!(
                    *mask != 0,
                    "record {name} field {position}: dependency has an empty mask"
                );
                ensure!(
                    field.property.is_some(),
                    "record {name} field {position}: dependency fields must name a property"
                );
            }
        }

        if let Some(missing) = &field.missing_value {
            let compatible = match &field.kind {
                FieldKind::Array { .. } | FieldKind::NibbleArray { .. } => {
                    field.field_type.matches_array(missing)
                }
                FieldKind::FixedString { .. } => missing.as_str().is_ok(),
                _ => field.field_type.matches_scalar(missing),
            };
            ensure!(
                compatible,
                "record {name} field {position}: missing value {} does not match field type {}",
                missing.type_name(),
                field.field_type
            );
        }
    }

    for (position, field) in fields.iter().enumerate() {
        if let Some(property) = field.property {
            let duplicate = fields[..position]
                .iter()
                .any(|earlier| earlier.property == Some(property));
            if duplicate {
                bail!("record {name}: duplicate property name {property}");
            }
        }
    }

    Ok(())
}
