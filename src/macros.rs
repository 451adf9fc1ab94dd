//! # Internal Macros
//!
//! This module provides internal macros for reducing boilerplate in the
//! record layer.
//!
//! ## stdf_record!
//!
//! Defines a record struct with one `Option` field per STDF field and
//! implements [`RecordFields`](crate::records::RecordFields) for it, so the
//! conversion interpreter can assign and read fields by property name.
//!
//! ### Usage
//!
//! ```ignore
//! stdf_record! {
//!     /// Hardware bin summary.
//!     pub struct Hbr {
//!         head_num: u8,
//!         site_num: u8,
//!         hbin_num: u16,
//!         hbin_cnt: u32,
//!         hbin_pf: char,
//!         hbin_nam: str,
//!     }
//! }
//!
//! // Generates:
//! // pub struct Hbr { pub head_num: Option<u8>, ... pub hbin_nam: Option<String> }
//! // impl RecordFields for Hbr {
//! //     fn set_field(&mut self, property: &str, value: FieldValue) -> Result<()> { ... }
//! //     fn field(&self, property: &str) -> Result<Option<FieldValue>> { ... }
//! // }
//! ```
//!
//! The field tokens name the decoded Rust shape: scalar tokens match their
//! Rust type, `str`/`bytes`/`bits` are the variable-length field families,
//! and `u8s`/`u16s`/`f32s` are counted arrays. `bool` is reserved for
//! derived flag-bit properties that never touch the wire.

/// Defines an STDF record struct and its dynamic field plumbing.
#[macro_export]
macro_rules! stdf_record {
    (@ty u8) => { ::core::option::Option<u8> };
    (@ty u16) => { ::core::option::Option<u16> };
    (@ty u32) => { ::core::option::Option<u32> };
    (@ty i8) => { ::core::option::Option<i8> };
    (@ty i16) => { ::core::option::Option<i16> };
    (@ty i32) => { ::core::option::Option<i32> };
    (@ty f32) => { ::core::option::Option<f32> };
    (@ty f64) => { ::core::option::Option<f64> };
    (@ty bool) => { ::core::option::Option<bool> };
    (@ty char) => { ::core::option::Option<char> };
    (@ty str) => { ::core::option::Option<::std::string::String> };
    (@ty bytes) => { ::core::option::Option<::std::vec::Vec<u8>> };
    (@ty bits) => { ::core::option::Option<$crate::codec::BitArray> };
    (@ty u8s) => { ::core::option::Option<::std::vec::Vec<u8>> };
    (@ty u16s) => { ::core::option::Option<::std::vec::Vec<u16>> };
    (@ty f32s) => { ::core::option::Option<::std::vec::Vec<f32>> };

    (@get $self:ident, $field:ident, u8) => { $self.$field.map($crate::records::FieldValue::U8) };
    (@get $self:ident, $field:ident, u16) => { $self.$field.map($crate::records::FieldValue::U16) };
    (@get $self:ident, $field:ident, u32) => { $self.$field.map($crate::records::FieldValue::U32) };
    (@get $self:ident, $field:ident, i8) => { $self.$field.map($crate::records::FieldValue::I8) };
    (@get $self:ident, $field:ident, i16) => { $self.$field.map($crate::records::FieldValue::I16) };
    (@get $self:ident, $field:ident, i32) => { $self.$field.map($crate::records::FieldValue::I32) };
    (@get $self:ident, $field:ident, f32) => { $self.$field.map($crate::records::FieldValue::F32) };
    (@get $self:ident, $field:ident, f64) => { $self.$field.map($crate::records::FieldValue::F64) };
    (@get $self:ident, $field:ident, bool) => { $self.$field.map($crate::records::FieldValue::Bool) };
    (@get $self:ident, $field:ident, char) => { $self.$field.map($crate::records::FieldValue::Char) };
    (@get $self:ident, $field:ident, str) => {
        $self.$field.clone().map($crate::records::FieldValue::Str)
    };
    (@get $self:ident, $field:ident, bytes) => {
        $self.$field.clone().map($crate::records::FieldValue::Bytes)
    };
    (@get $self:ident, $field:ident, bits) => {
        $self.$field.clone().map($crate::records::FieldValue::Bits)
    };
    (@get $self:ident, $field:ident, u8s) => {
        $self.$field.clone().map($crate::records::FieldValue::U8s)
    };
    (@get $self:ident, $field:ident, u16s) => {
        $self.$field.clone().map($crate::records::FieldValue::U16s)
    };
    (@get $self:ident, $field:ident, f32s) => {
        $self.$field.clone().map($crate::records::FieldValue::F32s)
    };

    (@set $self:ident, $value:ident, $field:ident, u8) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_u8(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, u16) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_u16(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, u32) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_u32(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, i8) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_i8(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, i16) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_i16(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, i32) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_i32(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, f32) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_f32(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, f64) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_f64(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, bool) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_bool(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, char) => {
        $self.$field = ::core::option::Option::Some($crate::macros_support::wrap_set(
            $value.as_char(),
            ::core::stringify!($field),
        )?)
    };
    (@set $self:ident, $value:ident, $field:ident, str) => {
        $self.$field = match $value {
            $crate::records::FieldValue::Str(s) => ::core::option::Option::Some(s),
            other => ::eyre::bail!(
                "property {} expects a string, got {}",
                ::core::stringify!($field),
                other.type_name()
            ),
        }
    };
    (@set $self:ident, $value:ident, $field:ident, bytes) => {
        $self.$field = match $value {
            $crate::records::FieldValue::Bytes(b) => ::core::option::Option::Some(b),
            other => ::eyre::bail!(
                "property {} expects bytes, got {}",
                ::core::stringify!($field),
                other.type_name()
            ),
        }
    };
    (@set $self:ident, $value:ident, $field:ident, bits) => {
        $self.$field = match $value {
            $crate::records::FieldValue::Bits(b) => ::core::option::Option::Some(b),
            other => ::eyre::bail!(
                "property {} expects a bit array, got {}",
                ::core::stringify!($field),
                other.type_name()
            ),
        }
    };
    (@set $self:ident, $value:ident, $field:ident, u8s) => {
        $self.$field = match $value {
            $crate::records::FieldValue::U8s(v) => ::core::option::Option::Some(v),
            other => ::eyre::bail!(
                "property {} expects a u8 array, got {}",
                ::core::stringify!($field),
                other.type_name()
            ),
        }
    };
    (@set $self:ident, $value:ident, $field:ident, u16s) => {
        $self.$field = match $value {
            $crate::records::FieldValue::U16s(v) => ::core::option::Option::Some(v),
            other => ::eyre::bail!(
                "property {} expects a u16 array, got {}",
                ::core::stringify!($field),
                other.type_name()
            ),
        }
    };
    (@set $self:ident, $value:ident, $field:ident, f32s) => {
        $self.$field = match $value {
            $crate::records::FieldValue::F32s(v) => ::core::option::Option::Some(v),
            other => ::eyre::bail!(
                "property {} expects an f32 array, got {}",
                ::core::stringify!($field),
                other.type_name()
            ),
        }
    };

    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $kind:tt
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $crate::stdf_record!(@ty $kind),
            )*
        }

        impl $crate::records::RecordFields for $name {
            fn set_field(
                &mut self,
                property: &str,
                value: $crate::records::FieldValue,
            ) -> ::eyre::Result<()> {
                match property {
                    $(
                        ::core::stringify!($field) => {
                            $crate::stdf_record!(@set self, value, $field, $kind);
                        }
                    )*
                    other => ::eyre::bail!(
                        "record {} has no property named {}",
                        ::core::stringify!($name),
                        other
                    ),
                }
                ::core::result::Result::Ok(())
            }

            fn field(
                &self,
                property: &str,
            ) -> ::eyre::Result<::core::option::Option<$crate::records::FieldValue>> {
                match property {
                    $(
                        ::core::stringify!($field) => ::core::result::Result::Ok(
                            $crate::stdf_record!(@get self, $field, $kind),
                        ),
                    )*
                    other => ::eyre::bail!(
                        "record {} has no property named {}",
                        ::core::stringify!($name),
                        other
                    ),
                }
            }
        }
    };
}

/// Support functions for macro expansions. Not part of the public API.
#[doc(hidden)]
pub mod macros_support {
    use eyre::{Result, WrapErr};

    pub fn wrap_set<T>(result: Result<T>, property: &'static str) -> Result<T> {
        result.wrap_err_with(|| format!("setting property {property}"))
    }
}
