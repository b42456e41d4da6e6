use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collector::FaultPolicy;

/// Базовые настройки опроса
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Настройки подключения
    pub connection: ConnectionSettings,
    /// Настройки аутентификации
    pub auth: AuthSettings,
    /// Что подставлять вместо значения при ошибке транспорта
    pub fault_mode: FaultPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Таймаут одной попытки (секунды)
    pub timeout: u64,
    /// Количество попыток
    pub retries: u32,
    /// UDP порт агента
    pub port: u16,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            timeout: 5,
            retries: 3,
            port: 161,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Настройки SNMPv2c
    pub v2c: SnmpV2cSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpV2cSettings {
    /// Community string
    pub community: String,
}

impl Default for SnmpV2cSettings {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
        }
    }
}

/// Таймауты всех попыток одного GET
pub fn attempt_timeouts(timeout_secs: u64, retries: u32) -> Vec<Duration> {
    vec![Duration::from_secs(timeout_secs); retries.max(1) as usize]
}
