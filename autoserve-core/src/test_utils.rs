//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use autoserve_provider::{
    normalize_domain_name, DnsRecord, DnsRecordType, DnsRegistrar, NewDnsRecord, ProviderError,
    RecordFilter, RegistrarCapabilities, Result, Zone,
};
use tokio::sync::{Mutex, RwLock};

use crate::error::{CoreError, CoreResult};
use crate::ip::IpResolver;
use crate::retry::RetryPolicy;
use crate::services::{DnsService, LifecycleOptions};

const BASE_DOMAIN: &str = "example.com";

/// When the mock reports a name conflict
#[derive(Debug, Clone, Copy)]
enum ConflictMode {
    /// Only when the name already exists
    Existing,
    /// For the first `n` create calls
    First(usize),
    /// On every create call
    Always,
}

// ===== MockRegistrar =====

pub struct MockRegistrar {
    records: RwLock<Vec<DnsRecord>>,
    capabilities: RegistrarCapabilities,
    conflict_mode: ConflictMode,
    scripted_errors: Mutex<VecDeque<ProviderError>>,
    next_id: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MockRegistrar {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            capabilities: RegistrarCapabilities {
                supports_comments: true,
                ordered_listing: true,
            },
            conflict_mode: ConflictMode::Existing,
            scripted_errors: Mutex::new(VecDeque::new()),
            next_id: AtomicUsize::new(1),
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn conflict_always(mut self) -> Self {
        self.conflict_mode = ConflictMode::Always;
        self
    }

    pub fn conflict_first(mut self, n: usize) -> Self {
        self.conflict_mode = ConflictMode::First(n);
        self
    }

    pub fn unordered(mut self) -> Self {
        self.capabilities.ordered_listing = false;
        self
    }

    pub fn without_comments(mut self) -> Self {
        self.capabilities.supports_comments = false;
        self
    }

    pub async fn seed(&self, record: DnsRecord) {
        self.records.write().await.push(record);
    }

    /// 下一次 create 返回该错误
    pub async fn fail_next_create(&self, err: ProviderError) {
        self.scripted_errors.lock().await.push_back(err);
    }

    fn exists(name: &str) -> ProviderError {
        ProviderError::RecordExists {
            provider: "mock".to_string(),
            record_name: name.to_string(),
            raw_message: Some("The record already exists.".to_string()),
        }
    }

    fn not_found(record_id: &str) -> ProviderError {
        ProviderError::RecordNotFound {
            provider: "mock".to_string(),
            record_id: record_id.to_string(),
            raw_message: None,
        }
    }
}

#[async_trait]
impl DnsRegistrar for MockRegistrar {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn base_domain(&self) -> &str {
        BASE_DOMAIN
    }

    fn capabilities(&self) -> RegistrarCapabilities {
        self.capabilities
    }

    async fn lookup_zone(&self) -> Result<Zone> {
        Ok(Zone {
            id: "zone".to_string(),
            name: BASE_DOMAIN.to_string(),
            status: "active".to_string(),
        })
    }

    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<DnsRecord>> {
        let name = filter.name.as_deref().map(normalize_domain_name);
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| name.as_ref().is_none_or(|n| &r.name == n))
            .filter(|r| filter.record_type.is_none_or(|t| r.record_type == t))
            .cloned()
            .collect())
    }

    async fn get_record(&self, record_id: &str) -> Result<DnsRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == record_id)
            .cloned()
            .ok_or_else(|| Self::not_found(record_id))
    }

    async fn create_record(&self, record: &NewDnsRecord) -> Result<DnsRecord> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.scripted_errors.lock().await.pop_front() {
            return Err(err);
        }
        let conflict = match self.conflict_mode {
            ConflictMode::Always => true,
            ConflictMode::First(n) => call < n,
            ConflictMode::Existing => false,
        };
        let mut records = self.records.write().await;
        if conflict || records.iter().any(|r| r.name == record.name) {
            return Err(Self::exists(&record.name));
        }

        let created = DnsRecord {
            id: format!("rec{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: record.name.clone(),
            record_type: record.record_type,
            content: record.content.clone(),
            proxied: record.proxied,
            ttl: record.ttl,
            comment: if self.capabilities.supports_comments {
                record.comment.clone()
            } else {
                None
            },
            created_at: None,
            updated_at: None,
        };
        records.push(created.clone());
        Ok(created)
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Err(Self::not_found(record_id));
        }
        Ok(())
    }
}

// ===== StaticIpResolver =====

pub struct StaticIpResolver {
    fail: bool,
}

impl StaticIpResolver {
    pub const ADDRESS: &'static str = "203.0.113.10";

    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl IpResolver for StaticIpResolver {
    async fn resolve(&self, _prefer_public: bool) -> CoreResult<IpAddr> {
        if self.fail {
            return Err(CoreError::IpResolution("no endpoints reachable".to_string()));
        }
        Self::ADDRESS
            .parse()
            .map_err(|_| CoreError::IpResolution("bad test address".to_string()))
    }
}

// ===== 工厂方法 =====

/// 不等待的重试策略
pub fn fast_options() -> LifecycleOptions {
    LifecycleOptions {
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            max_retry_after: Duration::from_millis(5),
        },
        ..LifecycleOptions::default()
    }
}

pub fn service(registrar: MockRegistrar) -> (DnsService, Arc<MockRegistrar>) {
    service_with(registrar, fast_options())
}

pub fn service_with(
    registrar: MockRegistrar,
    options: LifecycleOptions,
) -> (DnsService, Arc<MockRegistrar>) {
    let registrar = Arc::new(registrar);
    let svc = DnsService::new(registrar.clone(), Arc::new(StaticIpResolver::new()), options);
    (svc, registrar)
}

/// 一条非本工具创建的记录
pub fn foreign_record(id: &str, name: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        name: name.to_string(),
        record_type: DnsRecordType::A,
        content: "198.51.100.1".to_string(),
        proxied: false,
        ttl: 300,
        comment: Some("mail server".to_string()),
        created_at: None,
        updated_at: None,
    }
}
