//! Программируемый транспорт для тестов.
//!
//! Отвечает по заранее заданной таблице (хост, OID) -> ответ и
//! записывает все запросы, чтобы тесты могли проверить порядок опроса.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::{GetRequest, SnmpResponse, SnmpTransport};

/// Заготовленный ответ на запрос
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(SnmpResponse),
    /// Исчерпаны все попытки
    Timeout,
    /// Ошибка транспорта с текстом
    Error(String),
}

/// Записанный запрос
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub host: String,
    pub oid: String,
    pub attempts: usize,
}

#[derive(Default)]
struct MockState {
    replies: HashMap<(String, String), MockReply>,
    requests: Vec<RecordedRequest>,
}

/// Транспорт без сети. OID без заготовки отвечает noSuchInstance,
/// как настоящий агент на неизвестный экземпляр.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, host: &str, oid: &str, reply: MockReply) -> &Self {
        self.lock()
            .replies
            .insert((host.to_string(), normalize(oid)), reply);
        self
    }

    pub fn respond(&self, host: &str, oid: &str, response: SnmpResponse) -> &Self {
        self.reply(host, oid, MockReply::Response(response))
    }

    pub fn respond_integer(&self, host: &str, oid: &str, value: i64) -> &Self {
        self.respond(host, oid, SnmpResponse::integer(value))
    }

    pub fn respond_string(&self, host: &str, oid: &str, value: &str) -> &Self {
        self.respond(host, oid, SnmpResponse::octet_string(value))
    }

    /// Все запросы в порядке поступления
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// OID запросов к хосту в порядке поступления
    pub fn requested_oids(&self, host: &str) -> Vec<String> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.host == host)
            .map(|r| r.oid.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // Паника в тесте не должна ломать остальные проверки
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SnmpTransport for MockTransport {
    async fn get(&self, request: &GetRequest<'_>) -> Result<SnmpResponse> {
        let oid = normalize(request.oid);
        let reply = {
            let mut state = self.lock();
            state.requests.push(RecordedRequest {
                host: request.host.to_string(),
                oid: oid.clone(),
                attempts: request.timeouts.len(),
            });
            state
                .replies
                .get(&(request.host.to_string(), oid.clone()))
                .cloned()
        };

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Timeout) => anyhow::bail!(
                "Таймаут SNMP GET {} на {} после {} попыток",
                oid,
                request.host,
                request.timeouts.len()
            ),
            Some(MockReply::Error(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(SnmpResponse::no_such_instance()),
        }
    }
}

fn normalize(oid: &str) -> String {
    oid.trim().trim_start_matches('.').to_string()
}
