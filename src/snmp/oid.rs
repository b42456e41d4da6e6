use anyhow::{Context, Result};
use snmp2::Oid;

/// Парсит строку OID ("1.3.6.1..." или ".1.3.6.1...") в объект Oid
pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let parts = split_oid(s)?;
    Oid::from(&parts).map_err(|e| anyhow::anyhow!("Не удалось создать Oid из '{}': {:?}", s, e))
}

/// Проверяет, что строка является числовым OID, и возвращает ее компоненты
pub fn split_oid(s: &str) -> Result<Vec<u64>> {
    let parts: Result<Vec<u64>, _> = s
        .trim()
        .trim_start_matches('.')
        .split('.')
        .map(|p| p.parse::<u64>())
        .collect();

    let parts = parts.context(format!("Невалидный OID: {}", s))?;
    if parts.is_empty() {
        anyhow::bail!("Пустой OID");
    }
    Ok(parts)
}
