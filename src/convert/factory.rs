//! # Conversion Registry
//!
//! [`ConverterFactory`] owns everything needed to move records between
//! their wire and typed forms: the layout tables, the custom codecs, the
//! property restrictions, and the compiled-plan caches.
//!
//! ```text
//!            register / register_custom / restrict   (&mut, setup phase)
//!                            │
//!                            ▼
//!   UnknownRecord ──▶ ConverterFactory ──▶ Record
//!        bytes            │      │            typed
//!                         │      │
//!            converter cache    unconverter cache    (&self, shared phase)
//!             lower_read_plan    lower_write_plan
//! ```
//!
//! Plans compile on first use per kind and are cached behind an `RwLock`,
//! so a factory shared across threads compiles each kind at most twice in
//! a race and keeps one copy. Setup methods take `&mut self`, which keeps
//! registration and conversion phases from interleaving: a kind cannot be
//! restricted once its plan is compiled, because the cache would keep
//! serving the wider plan.

use std::sync::Arc;

use eyre::{bail, ensure, eyre, Result};
use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::debug;

use super::emit::PlanEmitter;
use super::execute::PlanInterpreter;
use super::lowering::{lower_read_plan, lower_write_plan};
use crate::codec::Endianness;
use crate::ir::{CodeNode, IrPrinter};
use crate::records::{Record, RecordData, RecordType, UnknownRecord};
use crate::schema::RecordSchema;

/// Decode hook for kinds whose layout is self-describing rather than a
/// fixed field table.
pub type ConvertFn = dyn Fn(&UnknownRecord) -> Result<RecordData> + Send + Sync;

/// Encode hook, the mirror of [`ConvertFn`]. Returns the body bytes
/// without the record header.
pub type UnconvertFn = dyn Fn(&RecordData, Endianness) -> Result<Vec<u8>> + Send + Sync;

enum Registration {
    Table(Arc<RecordSchema>),
    Custom {
        convert: Arc<ConvertFn>,
        unconvert: Arc<UnconvertFn>,
    },
}

enum ConverterImpl {
    Plan {
        schema: Arc<RecordSchema>,
        plan: CodeNode,
    },
    Custom(Arc<ConvertFn>),
}

/// A ready-to-run decoder for one record kind.
pub struct Converter {
    kind: ConverterImpl,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ConverterImpl::Plan { schema, plan } => f
                .debug_struct("Converter")
                .field("schema", &schema.name())
                .field("plan", plan)
                .finish(),
            ConverterImpl::Custom(_) => {
                f.debug_struct("Converter").field("kind", &"custom").finish()
            }
        }
    }
}

impl Converter {
    pub fn convert(&self, raw: &UnknownRecord) -> Result<Record> {
        match &self.kind {
            ConverterImpl::Plan { schema, plan } => PlanInterpreter::run(schema, plan, raw),
            ConverterImpl::Custom(convert) => {
                Ok(Record::at_offset(raw.offset(), convert(raw)?))
            }
        }
    }

    /// Printable form of the compiled plan. Custom codecs have none.
    pub fn plan_text(&self) -> Option<String> {
        match &self.kind {
            ConverterImpl::Plan { plan, .. } => Some(IrPrinter::print(plan)),
            ConverterImpl::Custom(_) => None,
        }
    }
}

enum UnconverterImpl {
    Plan {
        schema: Arc<RecordSchema>,
        plan: CodeNode,
    },
    Custom(Arc<UnconvertFn>),
}

/// A ready-to-run encoder for one record kind.
pub struct Unconverter {
    kind: UnconverterImpl,
}

impl Unconverter {
    pub fn unconvert(&self, data: &RecordData, endian: Endianness) -> Result<Vec<u8>> {
        match &self.kind {
            UnconverterImpl::Plan { schema, plan } => {
                PlanEmitter::run(schema, plan, data, endian)
            }
            UnconverterImpl::Custom(unconvert) => unconvert(data, endian),
        }
    }

    /// Printable form of the compiled plan. Custom codecs have none.
    pub fn plan_text(&self) -> Option<String> {
        match &self.kind {
            UnconverterImpl::Plan { plan, .. } => Some(IrPrinter::print(plan)),
            UnconverterImpl::Custom(_) => None,
        }
    }
}

/// Registry of record layouts and the conversion plans compiled from them.
pub struct ConverterFactory {
    registrations: HashMap<RecordType, Registration>,
    restrictions: HashMap<RecordType, Vec<&'static str>>,
    converters: RwLock<HashMap<RecordType, Arc<Converter>>>,
    unconverters: RwLock<HashMap<RecordType, Arc<Unconverter>>>,
}

impl ConverterFactory {
    /// An empty factory. Most callers want [`ConverterFactory::v4`].
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
            restrictions: HashMap::new(),
            converters: RwLock::new(HashMap::new()),
            unconverters: RwLock::new(HashMap::new()),
        }
    }

    /// A factory with every V4 record kind registered.
    pub fn v4() -> Result<Self> {
        let mut factory = Self::new();
        crate::records::v4::register_all(&mut factory)?;
        Ok(factory)
    }

    /// Registers a table-driven record kind.
    pub fn register(&mut self, schema: RecordSchema) -> Result<()> {
        let record_type = schema.record_type();
        ensure!(
            !self.registrations.contains_key(&record_type),
            "{record_type} is already registered"
        );
        self.registrations
            .insert(record_type, Registration::Table(Arc::new(schema)));
        Ok(())
    }

    /// Registers a record kind with hand-written decode and encode hooks.
    pub fn register_custom(
        &mut self,
        record_type: RecordType,
        convert: Box<ConvertFn>,
        unconvert: Box<UnconvertFn>,
    ) -> Result<()> {
        ensure!(
            !self.registrations.contains_key(&record_type),
            "{record_type} is already registered"
        );
        self.registrations.insert(
            record_type,
            Registration::Custom {
                convert: Arc::from(convert),
                unconvert: Arc::from(unconvert),
            },
        );
        Ok(())
    }

    pub fn is_registered(&self, record_type: RecordType) -> bool {
        self.registrations.contains_key(&record_type)
    }

    /// Limits future conversions of `record_type` to `properties`; every
    /// other field lowers to a skip. Must precede the kind's first
    /// conversion, since the compiled plan bakes the restriction in.
    pub fn restrict(
        &mut self,
        record_type: RecordType,
        properties: &[&'static str],
    ) -> Result<()> {
        let Registration::Table(schema) = self.registration(record_type)? else {
            bail!("{record_type} uses a custom codec and cannot be restricted");
        };
        // surface unknown property names here, not at first conversion
        schema.required_fields(properties)?;
        ensure!(
            !self.converters.read().contains_key(&record_type),
            "{record_type} was already converted; restrictions must be set up front"
        );
        self.restrictions
            .insert(record_type, properties.to_vec());
        Ok(())
    }

    /// The decoder for one kind, compiling and caching its plan on first
    /// use.
    pub fn converter(&self, record_type: RecordType) -> Result<Arc<Converter>> {
        if let Some(converter) = self.converters.read().get(&record_type) {
            return Ok(Arc::clone(converter));
        }
        let kind = match self.registration(record_type)? {
            Registration::Table(schema) => {
                let required = match self.restrictions.get(&record_type) {
                    Some(properties) => schema.required_fields(properties)?,
                    None => vec![true; schema.field_count()],
                };
                let plan = lower_read_plan(schema, &required);
                debug!(
                    kind = %record_type,
                    "compiled read plan\n{}",
                    IrPrinter::print(&plan)
                );
                ConverterImpl::Plan {
                    schema: Arc::clone(schema),
                    plan,
                }
            }
            Registration::Custom { convert, .. } => ConverterImpl::Custom(Arc::clone(convert)),
        };
        let mut cache = self.converters.write();
        let converter = cache
            .entry(record_type)
            .or_insert_with(|| Arc::new(Converter { kind }));
        Ok(Arc::clone(converter))
    }

    /// The encoder for one kind, compiling and caching its plan on first
    /// use. Restrictions never apply to writing.
    pub fn unconverter(&self, record_type: RecordType) -> Result<Arc<Unconverter>> {
        if let Some(unconverter) = self.unconverters.read().get(&record_type) {
            return Ok(Arc::clone(unconverter));
        }
        let kind = match self.registration(record_type)? {
            Registration::Table(schema) => {
                let plan = lower_write_plan(schema);
                debug!(
                    kind = %record_type,
                    "compiled write plan\n{}",
                    IrPrinter::print(&plan)
                );
                UnconverterImpl::Plan {
                    schema: Arc::clone(schema),
                    plan,
                }
            }
            Registration::Custom { unconvert, .. } => {
                UnconverterImpl::Custom(Arc::clone(unconvert))
            }
        };
        let mut cache = self.unconverters.write();
        let unconverter = cache
            .entry(record_type)
            .or_insert_with(|| Arc::new(Unconverter { kind }));
        Ok(Arc::clone(unconverter))
    }

    /// Decodes one raw record into its typed form. Kinds nobody registered
    /// pass through as [`RecordData::Unknown`] so foreign records survive a
    /// read-modify-write cycle byte for byte.
    pub fn convert(&self, raw: &UnknownRecord) -> Result<Record> {
        if !self.is_registered(raw.record_type()) {
            return Ok(Record::at_offset(
                raw.offset(),
                RecordData::Unknown(raw.clone()),
            ));
        }
        self.converter(raw.record_type())?.convert(raw)
    }

    /// Encodes one typed record into its body bytes, without the header.
    pub fn unconvert(&self, data: &RecordData, endian: Endianness) -> Result<Vec<u8>> {
        if let RecordData::Unknown(raw) = data {
            ensure!(
                raw.endian() == endian,
                "unknown {} record was captured {} but the output stream is {}",
                raw.record_type(),
                raw.endian(),
                endian
            );
            return Ok(raw.content().to_vec());
        }
        let record_type = data
            .record_type()
            .ok_or_else(|| eyre!("{} records have no wire form", data.kind_name()))?;
        self.unconverter(record_type)?.unconvert(data, endian)
    }

    fn registration(&self, record_type: RecordType) -> Result<&Registration> {
        self.registrations
            .get(&record_type)
            .ok_or_else(|| eyre!("no converter registered for {record_type}"))
    }
}

impl Default for ConverterFactory {
    fn default() -> Self {
        Self::new()
    }
}
