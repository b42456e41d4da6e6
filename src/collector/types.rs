use serde::{Serialize, Serializer};

/// Результат чтения одного OID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedValue {
    /// Counter64 не помещается в i64
    Integer(i128),
    Text(String),
    /// Агент ответил noSuchInstance
    Absent,
    /// Ошибка транспорта при `FaultPolicy::Unknown`
    Unknown,
}

impl FetchedValue {
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            FetchedValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FetchedValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FetchedValue::Absent)
    }
}

impl Serialize for FetchedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FetchedValue::Integer(v) => serializer.serialize_i128(*v),
            FetchedValue::Text(s) => serializer.serialize_str(s),
            FetchedValue::Absent => serializer.serialize_none(),
            FetchedValue::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// Черно-белый и цветной счетчики одной функции
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorCounters {
    pub black: FetchedValue,
    pub color: FetchedValue,
}

/// Факс считается только черно-белым
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlackCounter {
    pub black: FetchedValue,
}

/// Сырые значения пяти счетчиков модели
#[derive(Debug, Clone)]
pub struct RawCounters {
    pub copy_black: FetchedValue,
    pub print_black: FetchedValue,
    pub fax_black: FetchedValue,
    pub copy_color: FetchedValue,
    pub print_color: FetchedValue,
}

/// Счетчики по функциям и итоги
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub copy: ColorCounters,
    pub print: ColorCounters,
    pub fax: BlackCounter,
    /// None, если хотя бы одно слагаемое не число
    pub black_total: Option<i128>,
    pub color_total: Option<i128>,
}

impl From<RawCounters> for Counters {
    fn from(raw: RawCounters) -> Self {
        let black_total = total(&[&raw.copy_black, &raw.print_black, &raw.fax_black]);
        let color_total = total(&[&raw.copy_color, &raw.print_color]);

        Self {
            copy: ColorCounters {
                black: raw.copy_black,
                color: raw.copy_color,
            },
            print: ColorCounters {
                black: raw.print_black,
                color: raw.print_color,
            },
            fax: BlackCounter {
                black: raw.fax_black,
            },
            black_total,
            color_total,
        }
    }
}

fn total(values: &[&FetchedValue]) -> Option<i128> {
    values
        .iter()
        .try_fold(0i128, |acc, v| acc.checked_add(v.as_integer()?))
}

/// Итог опроса одного принтера.
/// Счетчики есть тогда и только тогда, когда модель есть в таблице.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterReport {
    host: String,
    model_name: FetchedValue,
    serial: FetchedValue,
    has_counter_config: bool,
    #[serde(flatten)]
    counters: Option<Counters>,
}

impl CounterReport {
    /// Отчет для модели без конфигурации счетчиков
    pub fn identity_only(host: &str, model_name: FetchedValue, serial: FetchedValue) -> Self {
        Self {
            host: host.to_string(),
            model_name,
            serial,
            has_counter_config: false,
            counters: None,
        }
    }

    pub fn with_counters(
        host: &str,
        model_name: FetchedValue,
        serial: FetchedValue,
        counters: Counters,
    ) -> Self {
        Self {
            host: host.to_string(),
            model_name,
            serial,
            has_counter_config: true,
            counters: Some(counters),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn model_name(&self) -> &FetchedValue {
        &self.model_name
    }

    pub fn serial(&self) -> &FetchedValue {
        &self.serial
    }

    pub fn has_counter_config(&self) -> bool {
        self.has_counter_config
    }

    pub fn counters(&self) -> Option<&Counters> {
        self.counters.as_ref()
    }

    pub fn black_total(&self) -> Option<i128> {
        self.counters.as_ref().and_then(|c| c.black_total)
    }

    pub fn color_total(&self) -> Option<i128> {
        self.counters.as_ref().and_then(|c| c.color_total)
    }

    /// Есть счетчики и оба итога посчитаны
    pub fn is_complete(&self) -> bool {
        self.black_total().is_some() && self.color_total().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(values: [FetchedValue; 5]) -> RawCounters {
        let [copy_black, print_black, fax_black, copy_color, print_color] = values;
        RawCounters {
            copy_black,
            print_black,
            fax_black,
            copy_color,
            print_color,
        }
    }

    #[test]
    fn totals_sum_numeric_counters() {
        let counters = Counters::from(raw([
            FetchedValue::Integer(100),
            FetchedValue::Integer(50),
            FetchedValue::Integer(10),
            FetchedValue::Integer(20),
            FetchedValue::Integer(5),
        ]));
        assert_eq!(counters.black_total, Some(160));
        assert_eq!(counters.color_total, Some(25));
    }

    #[test]
    fn absent_operand_makes_total_null() {
        let counters = Counters::from(raw([
            FetchedValue::Integer(100),
            FetchedValue::Integer(50),
            FetchedValue::Absent,
            FetchedValue::Integer(20),
            FetchedValue::Integer(5),
        ]));
        assert_eq!(counters.black_total, None);
        assert_eq!(counters.color_total, Some(25));
    }

    #[test]
    fn text_or_unknown_operand_makes_total_null() {
        let counters = Counters::from(raw([
            FetchedValue::Integer(1),
            FetchedValue::Integer(1),
            FetchedValue::Integer(1),
            FetchedValue::Text("n/a".to_string()),
            FetchedValue::Unknown,
        ]));
        assert_eq!(counters.black_total, Some(3));
        assert_eq!(counters.color_total, None);
    }

    #[test]
    fn identity_only_report_has_four_keys() {
        let report = CounterReport::identity_only(
            "10.0.0.5",
            FetchedValue::Text("UnknownModel".to_string()),
            FetchedValue::Text("E123".to_string()),
        );
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "host": "10.0.0.5",
                "modelName": "UnknownModel",
                "serial": "E123",
                "hasCounterConfig": false
            })
        );
        assert!(!report.is_complete());
    }

    #[test]
    fn full_report_serializes_nested_groups() {
        let counters = Counters::from(raw([
            FetchedValue::Integer(100),
            FetchedValue::Integer(50),
            FetchedValue::Absent,
            FetchedValue::Integer(20),
            FetchedValue::Unknown,
        ]));
        let report = CounterReport::with_counters(
            "10.0.0.5",
            FetchedValue::Text("MP2501".to_string()),
            FetchedValue::Text("E123".to_string()),
            counters,
        );
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "host": "10.0.0.5",
                "modelName": "MP2501",
                "serial": "E123",
                "hasCounterConfig": true,
                "copy": { "black": 100, "color": 20 },
                "print": { "black": 50, "color": "unknown" },
                "fax": { "black": null },
                "blackTotal": null,
                "colorTotal": null
            })
        );
    }
}
