use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

pub mod mock;
pub mod oid;
pub mod v2c;

pub use mock::{MockReply, MockTransport};
pub use oid::parse_oid;
pub use v2c::SnmpV2cTransport;

/// ASN.1/SNMP теги типов, в которых транспорт отдает значения
pub mod tag {
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    pub const GAUGE32: u8 = 0x42;
    pub const TIMETICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const COUNTER64: u8 = 0x46;
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;
}

/// Один SNMP GET запрос
#[derive(Debug, Clone, Copy)]
pub struct GetRequest<'a> {
    pub host: &'a str,
    pub oid: &'a str,
    /// Таймаут на каждую попытку, количество элементов = количество попыток
    pub timeouts: &'a [Duration],
}

/// Декодированный ответ агента: тег типа и значение в текстовом виде
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpResponse {
    pub tag: u8,
    pub value: String,
}

impl SnmpResponse {
    pub fn new(tag: u8, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::new(tag::INTEGER, value.to_string())
    }

    pub fn octet_string(value: impl Into<String>) -> Self {
        Self::new(tag::OCTET_STRING, value)
    }

    pub fn no_such_instance() -> Self {
        Self::new(tag::NO_SUCH_INSTANCE, "noSuchInstance")
    }
}

/// Транспорт SNMP. Повторы и таймауты - ответственность реализации.
#[async_trait]
pub trait SnmpTransport: Send + Sync {
    async fn get(&self, request: &GetRequest<'_>) -> Result<SnmpResponse>;
}
