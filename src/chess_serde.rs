//! Serde adapters for shakmaty types that have no serde support of their own.

use std::{fmt, str::FromStr};

use serde::de::{Error, Visitor};
use shakmaty::uci::Uci;

struct UciVisitor;

impl<'de> Visitor<'de> for UciVisitor {
    type Value = Uci;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a move in the UCI format")
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        Uci::from_str(v).map_err(|_| Error::custom(format!("error in parsing move's UCI: {v}")))
    }
}

/// A move as its UCI string, e.g. `"e2e4"`.
pub mod uci_serde {
    use serde::{Deserializer, Serializer};
    use shakmaty::uci::Uci;

    pub fn serialize<S: Serializer>(u: &Uci, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&u.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Uci, D::Error> {
        d.deserialize_str(super::UciVisitor)
    }
}

/// An optional move, `null` when absent.
pub mod opt_uci_serde {
    use serde::{de::Visitor, Deserializer, Serializer};
    use shakmaty::uci::Uci;

    pub fn serialize<S: Serializer>(u: &Option<Uci>, ser: S) -> Result<S::Ok, S::Error> {
        match u {
            Some(u) => ser.serialize_some(&u.to_string()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Uci>, D::Error> {
        struct OptVisitor;
        impl<'de> Visitor<'de> for OptVisitor {
            type Value = Option<Uci>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a UCI move or null")
            }
            fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }
            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }
            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                d.deserialize_str(super::UciVisitor).map(Some)
            }
        }
        d.deserialize_option(OptVisitor)
    }
}
