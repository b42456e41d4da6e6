use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::{CapabilityTable, ColorTag, CounterFunction};
use crate::snmp::SnmpTransport;

pub mod fetch;
pub mod types;

pub use fetch::{FaultPolicy, FetchPolicy, decode, fetch_value};
pub use types::{BlackCounter, ColorCounters, CounterReport, Counters, FetchedValue, RawCounters};

/// Коллектор счетчиков МФУ.
///
/// Таблица и транспорт разделяются между всеми опросами,
/// поэтому разные хосты можно опрашивать параллельно.
pub struct CounterCollector<T: ?Sized> {
    table: Arc<CapabilityTable>,
    transport: Arc<T>,
    policy: FetchPolicy,
}

impl<T: SnmpTransport + ?Sized> CounterCollector<T> {
    pub fn new(table: Arc<CapabilityTable>, transport: Arc<T>, policy: FetchPolicy) -> Self {
        Self {
            table,
            transport,
            policy,
        }
    }

    /// Читает одно значение, ошибки транспорта маскируются
    pub async fn fetch_value(&self, host: &str, oid: &str) -> FetchedValue {
        fetch_value(self.transport.as_ref(), host, oid, &self.policy).await
    }

    /// Опрашивает принтер. Никогда не возвращает ошибку:
    /// непредвиденный сбой пишется в лог, результатом будет `None`.
    pub async fn get_counters(&self, host: &str) -> Option<CounterReport> {
        finish(host, self.collect(host).await)
    }

    async fn collect(&self, host: &str) -> Result<CounterReport> {
        // Строго последовательно: модель, серийный номер, затем счетчики
        let model_name = self.fetch_value(host, &self.table.model_oid).await;
        let serial = self.fetch_value(host, &self.table.serial_oid).await;

        let model = match model_name.as_text() {
            Some(model) if self.table.has_capability(model) => model.to_string(),
            _ => {
                warn!(host, model = ?model_name, "Нет конфигурации счетчиков для модели");
                return Ok(CounterReport::identity_only(host, model_name, serial));
            }
        };

        let fetch = |function, color| self.fetch_counter(host, &model, function, color);
        let raw = RawCounters {
            copy_black: fetch(CounterFunction::Copy, ColorTag::Black).await?,
            print_black: fetch(CounterFunction::Print, ColorTag::Black).await?,
            fax_black: fetch(CounterFunction::Fax, ColorTag::Black).await?,
            copy_color: fetch(CounterFunction::Copy, ColorTag::Color).await?,
            print_color: fetch(CounterFunction::Print, ColorTag::Color).await?,
        };

        Ok(CounterReport::with_counters(host, model_name, serial, raw.into()))
    }

    async fn fetch_counter(
        &self,
        host: &str,
        model: &str,
        function: CounterFunction,
        color: ColorTag,
    ) -> Result<FetchedValue> {
        let oid = self.table.address_for(model, function, color)?;
        Ok(self.fetch_value(host, &oid).await)
    }
}

fn finish(host: &str, result: Result<CounterReport>) -> Option<CounterReport> {
    match result {
        Ok(report) => {
            info!(
                host,
                supported = report.has_counter_config(),
                black_total = ?report.black_total(),
                color_total = ?report.color_total(),
                "Опрос завершен"
            );
            Some(report)
        }
        Err(e) => {
            error!(host, "Опрос не удался: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CounterAddressSet;
    use crate::snmp::{MockReply, MockTransport, SnmpResponse};
    use std::collections::HashMap;

    const HOST: &str = "10.0.0.5";
    const PREFIX: &str = "1.3.6.1.4.1.367.3.2.1.2.19.5.1.9";
    const MODEL_OID: &str = "1.3.6.1.2.1.25.3.2.1.3.1";
    const SERIAL_OID: &str = "1.3.6.1.4.1.367.3.2.1.2.1.4.0";

    fn table() -> Arc<CapabilityTable> {
        let mut counters = HashMap::new();
        counters.insert(
            "MP2501".to_string(),
            CounterAddressSet {
                copy_black: "1.1".to_string(),
                print_black: "1.2".to_string(),
                fax_black: "1.3".to_string(),
                copy_color: "2.1".to_string(),
                print_color: "2.2".to_string(),
            },
        );
        Arc::new(CapabilityTable {
            counter_oid: PREFIX.to_string(),
            model_oid: MODEL_OID.to_string(),
            serial_oid: SERIAL_OID.to_string(),
            counters,
        })
    }

    fn counter_oid(suffix: &str) -> String {
        format!("{}.{}", PREFIX, suffix)
    }

    fn collector(
        transport: Arc<MockTransport>,
        on_fault: FaultPolicy,
    ) -> CounterCollector<MockTransport> {
        let policy = FetchPolicy {
            on_fault,
            ..FetchPolicy::default()
        };
        CounterCollector::new(table(), transport, policy)
    }

    fn mp2501(transport: &MockTransport) {
        transport
            .respond_string(HOST, MODEL_OID, "MP2501")
            .respond_string(HOST, SERIAL_OID, "E1234567890");
    }

    #[tokio::test]
    async fn supported_model_is_fully_polled() {
        let transport = Arc::new(MockTransport::new());
        mp2501(&transport);
        transport
            .respond_integer(HOST, &counter_oid("1.1"), 100)
            .respond_integer(HOST, &counter_oid("1.2"), 50)
            .respond_integer(HOST, &counter_oid("1.3"), 10)
            .respond_integer(HOST, &counter_oid("2.1"), 20)
            .respond_integer(HOST, &counter_oid("2.2"), 5);

        let report = collector(transport.clone(), FaultPolicy::Zero)
            .get_counters(HOST)
            .await
            .unwrap();

        assert!(report.has_counter_config());
        assert_eq!(report.black_total(), Some(160));
        assert_eq!(report.color_total(), Some(25));
        assert_eq!(report.serial(), &FetchedValue::Text("E1234567890".to_string()));

        let counters = report.counters().unwrap();
        assert_eq!(counters.copy.black, FetchedValue::Integer(100));
        assert_eq!(counters.print.color, FetchedValue::Integer(5));
        assert_eq!(counters.fax.black, FetchedValue::Integer(10));
    }

    #[tokio::test]
    async fn fetch_order_is_fixed() {
        let transport = Arc::new(MockTransport::new());
        mp2501(&transport);

        collector(transport.clone(), FaultPolicy::Zero)
            .get_counters(HOST)
            .await
            .unwrap();

        assert_eq!(
            transport.requested_oids(HOST),
            vec![
                MODEL_OID.to_string(),
                SERIAL_OID.to_string(),
                counter_oid("1.1"),
                counter_oid("1.2"),
                counter_oid("1.3"),
                counter_oid("2.1"),
                counter_oid("2.2"),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_model_skips_counters() {
        let transport = Arc::new(MockTransport::new());
        transport
            .respond_string(HOST, MODEL_OID, "UnknownModel")
            .respond_string(HOST, SERIAL_OID, "X1")
            .respond_integer(HOST, &counter_oid("1.1"), 999);

        let report = collector(transport.clone(), FaultPolicy::Zero)
            .get_counters(HOST)
            .await
            .unwrap();

        assert!(!report.has_counter_config());
        assert!(report.counters().is_none());
        assert_eq!(transport.requested_oids(HOST).len(), 2);
    }

    #[tokio::test]
    async fn model_fault_means_no_capability() {
        let transport = Arc::new(MockTransport::new());
        transport
            .reply(HOST, MODEL_OID, MockReply::Timeout)
            .respond_string(HOST, SERIAL_OID, "X1");

        let report = collector(transport.clone(), FaultPolicy::Zero)
            .get_counters(HOST)
            .await
            .unwrap();

        assert_eq!(report.model_name(), &FetchedValue::Integer(0));
        assert!(!report.has_counter_config());
    }

    #[tokio::test]
    async fn masked_fault_counts_as_zero() {
        let transport = Arc::new(MockTransport::new());
        mp2501(&transport);
        transport
            .respond_integer(HOST, &counter_oid("1.1"), 100)
            .reply(HOST, &counter_oid("1.2"), MockReply::Timeout)
            .respond_integer(HOST, &counter_oid("1.3"), 10)
            .respond_integer(HOST, &counter_oid("2.1"), 20)
            .respond_integer(HOST, &counter_oid("2.2"), 5);

        let report = collector(transport, FaultPolicy::Zero)
            .get_counters(HOST)
            .await
            .unwrap();

        assert_eq!(report.black_total(), Some(110));
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn unknown_fault_policy_leaves_total_empty() {
        let transport = Arc::new(MockTransport::new());
        mp2501(&transport);
        transport
            .respond_integer(HOST, &counter_oid("1.1"), 100)
            .reply(HOST, &counter_oid("1.2"), MockReply::Timeout)
            .respond_integer(HOST, &counter_oid("1.3"), 10)
            .respond_integer(HOST, &counter_oid("2.1"), 20)
            .respond_integer(HOST, &counter_oid("2.2"), 5);

        let report = collector(transport, FaultPolicy::Unknown)
            .get_counters(HOST)
            .await
            .unwrap();

        assert_eq!(report.counters().unwrap().print.black, FetchedValue::Unknown);
        assert_eq!(report.black_total(), None);
        assert_eq!(report.color_total(), Some(25));
    }

    #[tokio::test]
    async fn absent_counter_is_reported_as_absent() {
        let transport = Arc::new(MockTransport::new());
        mp2501(&transport);
        transport
            .respond_integer(HOST, &counter_oid("1.1"), 100)
            .respond_integer(HOST, &counter_oid("1.2"), 50)
            .respond(HOST, &counter_oid("1.3"), SnmpResponse::no_such_instance())
            .respond_integer(HOST, &counter_oid("2.1"), 20)
            .respond_integer(HOST, &counter_oid("2.2"), 5);

        let report = collector(transport, FaultPolicy::Zero)
            .get_counters(HOST)
            .await
            .unwrap();

        assert!(report.counters().unwrap().fax.black.is_absent());
        assert_eq!(report.black_total(), None);
        assert!(!report.is_complete());
    }

    #[test]
    fn internal_error_yields_no_report() {
        let result = finish(HOST, Err(anyhow::anyhow!("boom")));
        assert!(result.is_none());
    }
}
