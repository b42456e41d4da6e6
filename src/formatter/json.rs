use serde::Serialize;

use crate::collector::CounterReport;

/// JSON структура результата опроса нескольких принтеров
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResultJson<'a> {
    pub timestamp: String,
    pub summary: PollSummary,
    pub reports: Vec<&'a CounterReport>,
    pub failures: Vec<FailureInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSummary {
    pub total_hosts: usize,
    pub successful_hosts: usize,
    /// Хосты, модель которых есть в таблице
    pub supported_hosts: usize,
    pub failed_hosts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureInfo {
    pub host: String,
    pub error_message: String,
}

/// Результат опроса одного хоста: отчет или его отсутствие
pub type HostResult = (String, Option<CounterReport>);

/// JSON форматтер для результатов опроса
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_poll(results: &[HostResult]) -> PollResultJson<'_> {
        let timestamp = chrono::Utc::now().to_rfc3339();

        let reports: Vec<&CounterReport> =
            results.iter().filter_map(|(_, r)| r.as_ref()).collect();

        let failures: Vec<FailureInfo> = results
            .iter()
            .filter(|(_, r)| r.is_none())
            .map(|(host, _)| FailureInfo {
                host: host.clone(),
                error_message: "Опрос не удался, подробности в логе".to_string(),
            })
            .collect();

        let summary = PollSummary {
            total_hosts: results.len(),
            successful_hosts: reports.len(),
            supported_hosts: reports.iter().filter(|r| r.has_counter_config()).count(),
            failed_hosts: failures.len(),
        };

        PollResultJson {
            timestamp,
            summary,
            reports,
            failures,
        }
    }

    /// Сериализует результат в JSON строку
    pub fn to_json_string(results: &[HostResult]) -> anyhow::Result<String> {
        let json_result = Self::format_poll(results);
        serde_json::to_string_pretty(&json_result)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }

    /// Сериализует результат в компактный JSON
    pub fn to_json_compact(results: &[HostResult]) -> anyhow::Result<String> {
        let json_result = Self::format_poll(results);
        serde_json::to_string(&json_result)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }
}
