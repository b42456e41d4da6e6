use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use snmp2::{AsyncSession, Oid, Value};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use super::{GetRequest, SnmpResponse, SnmpTransport, parse_oid, tag};

/// Исход одной попытки GET
enum Attempt {
    Done(Result<SnmpResponse>),
    Failed(anyhow::Error),
    TimedOut,
}

/// SNMPv2c транспорт. Держит по одной сессии на хост,
/// опросы разных хостов не блокируют друг друга.
pub struct SnmpV2cTransport {
    community: Vec<u8>,
    port: u16,
    sessions: Mutex<HashMap<String, Arc<Mutex<AsyncSession>>>>,
}

impl SnmpV2cTransport {
    pub fn new(community: &[u8], port: u16) -> Self {
        Self {
            community: community.to_vec(),
            port,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Адрес назначения с портом по умолчанию, если он не указан явно
    fn target(&self, host: &str) -> String {
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{}]:{}", ip, self.port),
            Ok(IpAddr::V4(ip)) => format!("{}:{}", ip, self.port),
            Err(_) if host.contains(':') => host.to_string(),
            Err(_) => format!("{}:{}", host, self.port),
        }
    }

    /// Сессия из пула. Пул не блокируется на время создания сессии,
    /// чтобы медленный DNS одного хоста не задерживал опрос остальных.
    async fn session(&self, host: &str) -> Result<Arc<Mutex<AsyncSession>>> {
        let pooled = self.sessions.lock().await.get(host).cloned();
        if let Some(session) = pooled {
            return Ok(session);
        }

        let session = self.connect(host).await?;
        Ok(self.pool(host, session).await)
    }

    async fn connect(&self, host: &str) -> Result<AsyncSession> {
        let target = self.target(host);
        AsyncSession::new_v2c(target.as_str(), &self.community, 1)
            .await
            .context(format!("Не удалось создать SNMP сессию для {}", target))
    }

    /// Кладет сессию в пул. При гонке побеждает уже сохраненная.
    async fn pool(&self, host: &str, session: AsyncSession) -> Arc<Mutex<AsyncSession>> {
        self.sessions
            .lock()
            .await
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(session)))
            .clone()
    }

    /// Сбрасывает сессию хоста, следующая попытка откроет новую
    async fn forget(&self, host: &str) {
        self.sessions.lock().await.remove(host);
    }

    /// Одна попытка GET, включая создание сессии
    async fn attempt(&self, host: &str, oid: &Oid<'_>) -> Attempt {
        let session = match self.session(host).await {
            Ok(session) => session,
            Err(e) => return Attempt::Failed(e),
        };

        let mut session = session.lock().await;
        let outcome = match session.get(oid).await {
            Ok(pdu) => Attempt::Done(
                pdu.varbinds
                    .into_iter()
                    .next()
                    .map(|(_, value)| render_value(&value))
                    .ok_or_else(|| anyhow::anyhow!("SNMP ответ пустой")),
            ),
            Err(e) => Attempt::Failed(anyhow::anyhow!("{:?}", e)),
        };
        outcome
    }
}

#[async_trait]
impl SnmpTransport for SnmpV2cTransport {
    async fn get(&self, request: &GetRequest<'_>) -> Result<SnmpResponse> {
        let oid = parse_oid(request.oid)?;

        for (attempt, wait) in request.timeouts.iter().enumerate() {
            let outcome = timeout(*wait, self.attempt(request.host, &oid))
                .await
                .unwrap_or(Attempt::TimedOut);

            match outcome {
                Attempt::Done(response) => return response,
                Attempt::Failed(e) => {
                    self.forget(request.host).await;
                    return Err(e.context(format!(
                        "SNMP GET {} на {} не удался",
                        request.oid, request.host
                    )));
                }
                Attempt::TimedOut => {
                    debug!(
                        host = request.host,
                        oid = request.oid,
                        attempt = attempt + 1,
                        "SNMP GET timeout"
                    );
                    self.forget(request.host).await;
                }
            }
        }

        anyhow::bail!(
            "Таймаут SNMP GET {} на {} после {} попыток",
            request.oid,
            request.host,
            request.timeouts.len()
        )
    }
}

/// Переводит значение snmp2 в пару (тег, текст)
fn render_value(value: &Value<'_>) -> SnmpResponse {
    match value {
        Value::Integer(v) => SnmpResponse::new(tag::INTEGER, v.to_string()),
        Value::OctetString(bytes) => SnmpResponse::new(tag::OCTET_STRING, octets_to_string(bytes)),
        Value::Null => SnmpResponse::new(tag::NULL, ""),
        Value::ObjectIdentifier(oid) => SnmpResponse::new(tag::OBJECT_IDENTIFIER, oid.to_string()),
        Value::IpAddress(ip) => SnmpResponse::new(
            tag::IP_ADDRESS,
            format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]),
        ),
        Value::Counter32(v) => SnmpResponse::new(tag::COUNTER32, v.to_string()),
        Value::Unsigned32(v) => SnmpResponse::new(tag::GAUGE32, v.to_string()),
        Value::Timeticks(v) => SnmpResponse::new(tag::TIMETICKS, v.to_string()),
        Value::Opaque(bytes) => SnmpResponse::new(tag::OPAQUE, octets_to_string(bytes)),
        Value::Counter64(v) => SnmpResponse::new(tag::COUNTER64, v.to_string()),
        Value::NoSuchObject => SnmpResponse::new(tag::NO_SUCH_OBJECT, "noSuchObject"),
        Value::NoSuchInstance => SnmpResponse::no_such_instance(),
        Value::EndOfMibView => SnmpResponse::new(tag::END_OF_MIB_VIEW, "endOfMibView"),
        other => SnmpResponse::new(tag::OCTET_STRING, format!("{:?}", other)),
    }
}

/// Принтеры часто дополняют строки нулевыми байтами
fn octets_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}
