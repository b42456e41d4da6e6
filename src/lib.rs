//! Опрос счетчиков МФУ по SNMP.
//!
//! По модели принтера находит в таблице OID счетчиков копирования,
//! печати и факса, читает их и сводит в один отчет.

pub mod collector;
pub mod config;
pub mod formatter;
pub mod snmp;

pub use collector::{CounterCollector, CounterReport, FaultPolicy, FetchPolicy, FetchedValue};
pub use config::{AppConfig, CapabilityTable};
pub use snmp::{SnmpTransport, SnmpV2cTransport};
