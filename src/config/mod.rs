use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub mod capability;
pub mod settings;

pub use capability::{CapabilityTable, ColorTag, CounterAddressSet, CounterFunction, property_name};
pub use settings::Settings;

/// Главная конфигурация приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Таблица моделей и OID счетчиков
    #[serde(flatten)]
    pub table: CapabilityTable,
    /// Базовые настройки
    #[serde(default)]
    pub settings: Settings,
}

impl AppConfig {
    /// Загружает конфигурацию из YAML или JSON файла (по расширению)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Не удалось прочитать файл: {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
        .context(format!("Ошибка в конфигурации {}", path.display()))?;

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yml::from_str(content).context("Не удалось распарсить YAML")?;
        config.validated()
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(content).context("Не удалось распарсить JSON")?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        let table = self.table.validated()?;
        if table.counters.is_empty() {
            tracing::warn!("Таблица моделей пуста, будут опрошены только модель и серийный номер");
        }
        Ok(Self {
            table,
            settings: self.settings,
        })
    }

    /// Хосты из переменной окружения SNMP_TARGET (через запятую)
    pub fn get_targets(&self) -> Vec<String> {
        env::var("SNMP_TARGET")
            .map(|s| split_targets(&s))
            .unwrap_or_default()
    }

    /// Получает timeout из переменной окружения или из настроек
    pub fn get_timeout(&self) -> u64 {
        env::var("SNMP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.settings.connection.timeout)
    }

    /// Получает количество попыток из переменной окружения или из настроек
    pub fn get_retries(&self) -> u32 {
        env::var("SNMP_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.settings.connection.retries)
    }

    pub fn get_port(&self) -> u16 {
        env::var("SNMP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.settings.connection.port)
    }

    /// Получает community для SNMPv2c
    pub fn get_community(&self) -> Vec<u8> {
        env::var("SNMP_COMMUNITY")
            .unwrap_or_else(|_| self.settings.auth.v2c.community.clone())
            .into_bytes()
    }

    /// Таймауты попыток с учетом переменных окружения
    pub fn get_timeouts(&self) -> Vec<Duration> {
        settings::attempt_timeouts(self.get_timeout(), self.get_retries())
    }
}

fn split_targets(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
