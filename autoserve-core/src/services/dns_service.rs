//! DNS 记录生命周期管理服务

use std::collections::HashMap;
use std::sync::Arc;

use autoserve_provider::{qualify, DnsRegistrar};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::allocator::{validate_label, SubdomainAllocator};
use crate::error::{CoreError, CoreResult};
use crate::ip::IpResolver;
use crate::ownership::OwnershipPolicy;
use crate::services::LifecycleOptions;
use crate::types::{
    CleanupFailure, CleanupReport, CreateOutcome, CreateRecordRequest, DeleteOutcome, DnsRecord,
    ManagedRecord, NewDnsRecord, RecordFilter,
};

/// DNS 记录生命周期管理服务
///
/// Composes the subdomain allocator, IP resolver, ownership policy and the
/// registrar client. The registrar stays the source of truth; the only local
/// state is a per-session cache of records created by this instance.
pub struct DnsService {
    registrar: Arc<dyn DnsRegistrar>,
    resolver: Arc<dyn IpResolver>,
    options: LifecycleOptions,
    ownership: OwnershipPolicy,
    allocator: Mutex<SubdomainAllocator>,
    /// 同名创建串行化
    name_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// 本次会话创建的记录（name -> record）
    session: RwLock<HashMap<String, DnsRecord>>,
}

impl DnsService {
    /// 创建 DNS 服务实例
    #[must_use]
    pub fn new(
        registrar: Arc<dyn DnsRegistrar>,
        resolver: Arc<dyn IpResolver>,
        options: LifecycleOptions,
    ) -> Self {
        let ownership = options
            .ownership
            .clone()
            .unwrap_or_else(|| OwnershipPolicy::for_capabilities(registrar.capabilities()));
        log::debug!(
            "DnsService for {} ({}) using {ownership:?}",
            registrar.base_domain(),
            registrar.id()
        );
        Self {
            registrar,
            resolver,
            options,
            ownership,
            allocator: Mutex::new(SubdomainAllocator::new()),
            name_locks: Mutex::new(HashMap::new()),
            session: RwLock::new(HashMap::new()),
        }
    }

    /// Ownership policy in effect.
    pub fn ownership(&self) -> &OwnershipPolicy {
        &self.ownership
    }

    /// Base domain of the registrar zone.
    pub fn base_domain(&self) -> &str {
        self.registrar.base_domain()
    }

    fn classify(&self, record: DnsRecord) -> ManagedRecord {
        let owned_by_tool = self.ownership.is_owned(&record);
        ManagedRecord {
            record,
            owned_by_tool,
        }
    }

    async fn lock_name(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.name_locks.lock().await;
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// 创建 DNS 记录
    ///
    /// A user-supplied subdomain that is already taken fails immediately with
    /// [`CoreError::Conflict`]. Generated subdomains are re-drawn on conflict up
    /// to `max_conflict_attempts` times, then [`CoreError::ExhaustedRetries`].
    pub async fn create_record(&self, request: CreateRecordRequest) -> CoreResult<CreateOutcome> {
        let user_label = request
            .subdomain
            .as_deref()
            .map(|s| {
                validate_label(s).and_then(|label| self.ownership.prepare_label(&label, false))
            })
            .transpose()?;

        if let Some(label) = &user_label {
            let name = qualify(label, self.base_domain());
            if let Some(existing) = self.session.read().await.get(&name).cloned() {
                log::info!("{name} already created in this session, reusing {}", existing.id);
                return Ok(CreateOutcome {
                    managed: self.classify(existing),
                    conflicts: 0,
                    reused: true,
                });
            }
        }

        let ip = match request.ip {
            Some(ip) => ip,
            None => self.resolver.resolve(request.prefer_public).await?,
        };

        if let Some(label) = user_label {
            let record = self.try_create(&label, ip, &request).await?;
            return Ok(CreateOutcome {
                managed: self.classify(record),
                conflicts: 0,
                reused: false,
            });
        }

        let max_attempts = self.options.max_conflict_attempts.max(1);
        let mut last_conflict = None;
        for attempt in 0..max_attempts {
            let generated = self.allocator.lock().await.generate(request.length)?;
            let label = self.ownership.prepare_label(&generated, true)?;
            match self.try_create(&label, ip, &request).await {
                Ok(record) => {
                    return Ok(CreateOutcome {
                        managed: self.classify(record),
                        conflicts: attempt,
                        reused: false,
                    });
                }
                Err(e @ CoreError::Conflict { .. }) => {
                    log::warn!(
                        "generated subdomain {label} is taken (attempt {}/{max_attempts})",
                        attempt + 1
                    );
                    last_conflict = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::ExhaustedRetries {
            attempts: max_attempts,
            last: Box::new(last_conflict.unwrap_or_else(|| CoreError::Conflict {
                name: self.base_domain().to_string(),
                raw_message: None,
            })),
        })
    }

    async fn try_create(
        &self,
        label: &str,
        ip: std::net::IpAddr,
        request: &CreateRecordRequest,
    ) -> CoreResult<DnsRecord> {
        let name = qualify(label, self.base_domain());
        let _guard = self.lock_name(&name).await;

        // 等锁期间另一个任务可能已创建同名记录
        if let Some(existing) = self.session.read().await.get(&name).cloned() {
            return Ok(existing);
        }

        let mut new_record = NewDnsRecord::address(&name, ip, request.proxied, request.ttl);
        new_record.comment.clone_from(&request.comment);
        let tagged = self.ownership.tag(new_record);

        let registrar = &self.registrar;
        let tagged_ref = &tagged;
        let record = self
            .options
            .retry
            .run("create_record", move || async move {
                registrar
                    .create_record(tagged_ref)
                    .await
                    .map_err(CoreError::from)
            })
            .await?;

        log::info!("created {} {} -> {}", record.record_type, record.name, record.content);
        self.session
            .write()
            .await
            .insert(name, record.clone());
        Ok(record)
    }

    /// 列出 DNS 记录
    ///
    /// Tool-owned records only unless `show_all`. Registrar order is kept when
    /// the registrar documents one, otherwise records are sorted by name.
    pub async fn list_records(&self, show_all: bool) -> CoreResult<Vec<ManagedRecord>> {
        let registrar = &self.registrar;
        let filter = RecordFilter::default();
        let filter_ref = &filter;
        let records = self
            .options
            .retry
            .run("list_records", move || async move {
                registrar
                    .list_records(filter_ref)
                    .await
                    .map_err(CoreError::from)
            })
            .await?;

        let mut managed: Vec<ManagedRecord> = records
            .into_iter()
            .map(|r| self.classify(r))
            .filter(|m| show_all || m.owned_by_tool)
            .collect();

        if !self.registrar.capabilities().ordered_listing {
            managed.sort_by(|a, b| a.record.name.cmp(&b.record.name));
        }
        Ok(managed)
    }

    /// 删除 DNS 记录
    ///
    /// The record is fetched first to learn its ownership. Deleting a record
    /// this tool does not own is allowed but logged as a warning.
    pub async fn delete_record(&self, record_id: &str) -> CoreResult<DeleteOutcome> {
        let registrar = &self.registrar;
        let record = self
            .options
            .retry
            .run("get_record", move || async move {
                registrar
                    .get_record(record_id)
                    .await
                    .map_err(CoreError::from)
            })
            .await?;

        let owned_by_tool = self.ownership.is_owned(&record);
        if !owned_by_tool {
            log::warn!(
                "record {} ({}) was not created by autoserve; deleting anyway",
                record.id,
                record.name
            );
        }

        self.options
            .retry
            .run("delete_record", move || async move {
                registrar
                    .delete_record(record_id)
                    .await
                    .map_err(CoreError::from)
            })
            .await?;

        self.session.write().await.retain(|_, r| r.id != record.id);
        log::info!("deleted {} ({})", record.name, record.id);
        Ok(DeleteOutcome {
            record,
            owned_by_tool,
        })
    }

    /// 删除所有本工具创建的记录（并行），逐条汇报失败
    pub async fn purge_owned(&self) -> CoreResult<CleanupReport> {
        let owned = self.list_records(false).await?;

        let delete_futures = owned.into_iter().map(|managed| async move {
            let record = managed.record;
            match self.delete_record(&record.id).await {
                Ok(_) => Ok(record),
                Err(e) => Err((record, e)),
            }
        });
        let results = futures::future::join_all(delete_futures).await;

        let mut report = CleanupReport::default();
        for result in results {
            match result {
                Ok(record) => report.deleted.push(record),
                Err((record, e)) => {
                    if e.is_expected() {
                        log::warn!("failed to delete {}: {e}", record.name);
                    } else {
                        log::error!("failed to delete {}: {e}", record.name);
                    }
                    report.failures.push(CleanupFailure {
                        record_id: record.id,
                        name: record.name,
                        kind: e.kind().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }
}
