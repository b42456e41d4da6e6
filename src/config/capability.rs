use std::collections::HashMap;
use std::fmt;

use anyhow::{Context, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::snmp::oid::split_oid;

/// Функция МФУ, для которой ведется счетчик
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterFunction {
    Copy,
    Print,
    Fax,
}

impl CounterFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterFunction::Copy => "copy",
            CounterFunction::Print => "print",
            CounterFunction::Fax => "fax",
        }
    }
}

impl fmt::Display for CounterFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Цветность счетчика
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTag {
    Black,
    Color,
}

impl ColorTag {
    /// "black" - черно-белый, любое другое значение считается цветным
    pub fn from_tag(tag: &str) -> Self {
        if tag == "black" {
            ColorTag::Black
        } else {
            ColorTag::Color
        }
    }

    fn capitalized(&self) -> &'static str {
        match self {
            ColorTag::Black => "Black",
            ColorTag::Color => "Color",
        }
    }
}

/// Имя поля в наборе адресов: "copy" + "Black" -> "copyBlack"
pub fn property_name(function: CounterFunction, color: ColorTag) -> String {
    format!("{}{}", function.as_str(), color.capitalized())
}

/// Суффиксы OID счетчиков одной модели
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterAddressSet {
    pub copy_black: String,
    pub copy_color: String,
    pub print_black: String,
    pub print_color: String,
    pub fax_black: String,
}

impl CounterAddressSet {
    /// Факс в цвете не учитывается, для него суффикса нет
    pub fn suffix(&self, function: CounterFunction, color: ColorTag) -> Option<&str> {
        match (function, color) {
            (CounterFunction::Copy, ColorTag::Black) => Some(self.copy_black.as_str()),
            (CounterFunction::Copy, ColorTag::Color) => Some(self.copy_color.as_str()),
            (CounterFunction::Print, ColorTag::Black) => Some(self.print_black.as_str()),
            (CounterFunction::Print, ColorTag::Color) => Some(self.print_color.as_str()),
            (CounterFunction::Fax, ColorTag::Black) => Some(self.fax_black.as_str()),
            (CounterFunction::Fax, ColorTag::Color) => None,
        }
    }

    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("copyBlack", self.copy_black.as_str()),
            ("copyColor", self.copy_color.as_str()),
            ("printBlack", self.print_black.as_str()),
            ("printColor", self.print_color.as_str()),
            ("faxBlack", self.fax_black.as_str()),
        ]
    }
}

/// Таблица поддерживаемых моделей: модель -> адреса счетчиков
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityTable {
    /// Общий префикс OID счетчиков
    pub counter_oid: String,
    pub model_oid: String,
    pub serial_oid: String,
    #[serde(default, deserialize_with = "model_keys")]
    pub counters: HashMap<String, CounterAddressSet>,
}

/// Имя модели. В YAML оно может быть записано числом без кавычек (`2501:`).
#[derive(PartialEq, Eq, Hash)]
struct ModelName(String);

impl<'de> Deserialize<'de> for ModelName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModelNameVisitor;

        impl Visitor<'_> for ModelNameVisitor {
            type Value = ModelName;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("имя модели (строка или число)")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ModelName, E> {
                Ok(ModelName(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<ModelName, E> {
                Ok(ModelName(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ModelName, E> {
                Ok(ModelName(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ModelName, E> {
                Ok(ModelName(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ModelName, E> {
                Ok(ModelName(v.to_string()))
            }
        }

        deserializer.deserialize_any(ModelNameVisitor)
    }
}

fn model_keys<'de, D>(deserializer: D) -> Result<HashMap<String, CounterAddressSet>, D::Error>
where
    D: Deserializer<'de>,
{
    let counters = HashMap::<ModelName, CounterAddressSet>::deserialize(deserializer)?;
    Ok(counters
        .into_iter()
        .map(|(ModelName(name), set)| (name, set))
        .collect())
}

impl CapabilityTable {
    /// Проверяет таблицу и приводит OID к виду без ведущей точки
    pub fn validated(mut self) -> Result<Self> {
        for (name, oid) in [
            ("counterOid", &mut self.counter_oid),
            ("modelOid", &mut self.model_oid),
            ("serialOid", &mut self.serial_oid),
        ] {
            split_oid(oid).context(format!("Поле {} содержит невалидный OID", name))?;
            *oid = oid.trim().trim_start_matches('.').to_string();
        }

        for (model, set) in &self.counters {
            for (name, suffix) in set.entries() {
                if suffix.trim().is_empty() {
                    anyhow::bail!("Модель '{}': пустой суффикс {}", model, name);
                }
                split_oid(suffix)
                    .context(format!("Модель '{}': невалидный суффикс {}", model, name))?;
            }
        }

        Ok(self)
    }

    /// Поддерживается ли модель. Сравнение точное, с учетом регистра.
    pub fn has_capability(&self, model_name: &str) -> bool {
        self.counters.contains_key(model_name)
    }

    /// Полный OID счетчика: префикс + "." + суффикс модели.
    /// Перед вызовом нужно проверить `has_capability`.
    pub fn address_for(
        &self,
        model_name: &str,
        function: CounterFunction,
        color: ColorTag,
    ) -> Result<String> {
        let set = self
            .counters
            .get(model_name)
            .ok_or_else(|| anyhow::anyhow!("Нет конфигурации счетчиков для модели '{}'", model_name))?;

        let suffix = set.suffix(function, color).ok_or_else(|| {
            anyhow::anyhow!(
                "Модель '{}': счетчик {} не поддерживается",
                model_name,
                property_name(function, color)
            )
        })?;

        Ok([self.counter_oid.as_str(), suffix.trim_start_matches('.')].join("."))
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.counters.keys().map(String::as_str)
    }
}
