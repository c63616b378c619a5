//! Helper macro for declaring port error enums.
//!
//! Each variant gets a snake-case constructor taking `impl Into<_>` for every
//! field, and the enum gets a `kind()` accessor yielding the snake-case variant
//! name for structured log fields.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),+ $(,)? }) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),+) -> Self {
                Self::$variant { $($field: $field.into()),+ }
            }
        }
    };

    (@kind $variant:ident) => {
        ::paste::paste! { stringify!([<$variant:snake>]) }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),+ $(,)? } )? => $message:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),+ } )?,
            )+
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),+ } )?);
            )+

            /// Snake-case variant name, for log fields.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant { .. } => define_port_error!(@kind $variant),
                    )+
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        pub enum SamplePortError {
            Throttled => "store throttled the request",
            Query { message: String } => "query failed: {message}",
            Capacity { table: String, units: u32 } => "{table} exhausted {units} units",
        }
    }

    #[test]
    fn unit_variants_get_plain_constructors() {
        let err = SamplePortError::throttled();
        assert_eq!(err.to_string(), "store throttled the request");
        assert_eq!(err.kind(), "throttled");
    }

    #[test]
    fn string_fields_accept_str() {
        let err = SamplePortError::query("bad key");
        assert_eq!(err.to_string(), "query failed: bad key");
        assert_eq!(err.kind(), "query");
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = SamplePortError::capacity("Receipts", 25_u32);
        assert_eq!(err.to_string(), "Receipts exhausted 25 units");
        assert_eq!(err.kind(), "capacity");
    }
}
