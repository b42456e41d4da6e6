use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::FetchedValue;
use crate::snmp::{GetRequest, SnmpResponse, SnmpTransport, tag};

/// Ответ агента на запрос несуществующего экземпляра
pub const NO_SUCH_INSTANCE: &str = "noSuchInstance";

/// Что возвращать вместо значения, если GET не удался
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Ноль, как будто счетчик равен нулю
    #[default]
    Zero,
    /// Отдельное значение `unknown`
    Unknown,
}

impl FaultPolicy {
    pub fn substitute(&self) -> FetchedValue {
        match self {
            FaultPolicy::Zero => FetchedValue::Integer(0),
            FaultPolicy::Unknown => FetchedValue::Unknown,
        }
    }
}

/// Параметры чтения одного значения
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub timeouts: Vec<Duration>,
    pub on_fault: FaultPolicy,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeouts: vec![Duration::from_secs(5); 3],
            on_fault: FaultPolicy::Zero,
        }
    }
}

fn is_integer_tag(t: u8) -> bool {
    matches!(
        t,
        tag::INTEGER | tag::COUNTER32 | tag::GAUGE32 | tag::COUNTER64
    )
}

/// Декодирует ответ агента с учетом тега типа
pub fn decode(response: SnmpResponse) -> Result<FetchedValue> {
    if response.value == NO_SUCH_INSTANCE {
        return Ok(FetchedValue::Absent);
    }

    if is_integer_tag(response.tag) {
        let value = response
            .value
            .trim()
            .parse::<i128>()
            .context(format!(
                "Значение '{}' с тегом 0x{:02x} не является целым",
                response.value, response.tag
            ))?;
        return Ok(FetchedValue::Integer(value));
    }

    Ok(FetchedValue::Text(response.value))
}

/// Читает одно значение. Ошибки не пробрасываются:
/// они пишутся в лог и заменяются по `policy.on_fault`.
pub async fn fetch_value<T>(
    transport: &T,
    host: &str,
    oid: &str,
    policy: &FetchPolicy,
) -> FetchedValue
where
    T: SnmpTransport + ?Sized,
{
    let request = GetRequest {
        host,
        oid,
        timeouts: &policy.timeouts,
    };

    match transport.get(&request).await.and_then(decode) {
        Ok(value) => {
            debug!(host, oid, ?value, "SNMP GET");
            value
        }
        Err(e) => {
            error!(host, oid, "SNMP GET не удался: {:#}", e);
            policy.on_fault.substitute()
        }
    }
}
