//! Cloudflare `DnsRegistrar` trait 实现

use async_trait::async_trait;
use reqwest::Method;

use crate::error::Result;
use crate::providers::common::{normalize_domain_name, parse_record_type};
use crate::traits::{DnsRegistrar, ErrorContext, ProviderErrorMapper};
use crate::types::{DnsRecord, NewDnsRecord, RecordFilter, RegistrarCapabilities, Zone};
use crate::utils::datetime::parse_lenient;
use crate::validation::{validate_name, validate_new_record, validate_record_id};

use super::types::{CreateRecordBody, DeletedRecord};
use super::{CloudflareDnsRecord, CloudflareProvider, CloudflareZone, MAX_PAGE_SIZE_RECORDS, MAX_PAGES};

impl CloudflareProvider {
    /// 将 Cloudflare 记录转换为 `DnsRecord`
    pub(crate) fn cf_record_to_dns_record(&self, cf_record: CloudflareDnsRecord) -> Result<DnsRecord> {
        let record_type = parse_record_type(&cf_record.record_type, self.provider_name())?;

        Ok(DnsRecord {
            id: cf_record.id,
            name: normalize_domain_name(&cf_record.name),
            record_type,
            content: cf_record.content,
            proxied: cf_record.proxied.unwrap_or(false),
            ttl: cf_record.ttl,
            comment: cf_record.comment.filter(|c| !c.is_empty()),
            created_at: parse_lenient(cf_record.created_on.as_deref()),
            updated_at: parse_lenient(cf_record.modified_on.as_deref()),
        })
    }

    fn records_path(&self) -> String {
        format!("/zones/{}/dns_records", self.zone_id)
    }

    fn list_query(filter: &RecordFilter, page: u32) -> String {
        let mut query = format!("?page={page}&per_page={MAX_PAGE_SIZE_RECORDS}&order=name&direction=asc");
        if let Some(name) = &filter.name {
            query.push_str(&format!(
                "&name={}",
                urlencoding::encode(&normalize_domain_name(name))
            ));
        }
        if let Some(record_type) = filter.record_type {
            query.push_str(&format!("&type={}", record_type.as_str()));
        }
        query
    }
}

#[async_trait]
impl DnsRegistrar for CloudflareProvider {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    fn base_domain(&self) -> &str {
        &self.base_domain
    }

    fn capabilities(&self) -> RegistrarCapabilities {
        RegistrarCapabilities {
            supports_comments: true,
            ordered_listing: true,
        }
    }

    async fn lookup_zone(&self) -> Result<Zone> {
        let zone = self
            .get::<CloudflareZone>(
                &format!("/zones/{}", self.zone_id),
                ErrorContext::zone(&self.zone_id),
            )
            .await?
            .result;
        Ok(Zone {
            id: zone.id,
            name: normalize_domain_name(&zone.name),
            status: zone.status,
        })
    }

    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<DnsRecord>> {
        if let Some(name) = &filter.name {
            validate_name(name, &self.base_domain, self.provider_name())?;
        }

        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let path = format!("{}{}", self.records_path(), Self::list_query(filter, page));
            let response = self
                .get::<Vec<CloudflareDnsRecord>>(&path, ErrorContext::zone(&self.zone_id))
                .await?;
            let fetched = response.result.len();

            for cf_record in response.result {
                // 非 A/AAAA/CNAME 记录不归本工具管理，跳过而不是报错
                match self.cf_record_to_dns_record(cf_record) {
                    Ok(record) => records.push(record),
                    Err(e) => log::debug!("[cloudflare] skipping record: {e}"),
                }
            }

            let total_pages = response
                .result_info
                .as_ref()
                .and_then(|info| info.total_pages)
                .unwrap_or(page);
            if page >= total_pages || fetched == 0 || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        log::debug!("[cloudflare] listed {} records over {page} page(s)", records.len());
        Ok(records)
    }

    async fn get_record(&self, record_id: &str) -> Result<DnsRecord> {
        validate_record_id(record_id, self.provider_name())?;
        let cf_record = self
            .get::<CloudflareDnsRecord>(
                &format!("{}/{record_id}", self.records_path()),
                ErrorContext::record_id(record_id),
            )
            .await?
            .result;
        self.cf_record_to_dns_record(cf_record)
    }

    async fn create_record(&self, record: &NewDnsRecord) -> Result<DnsRecord> {
        validate_new_record(record, &self.base_domain, self.provider_name())?;

        let name = normalize_domain_name(&record.name);
        let body = CreateRecordBody {
            record_type: record.record_type.as_str(),
            name: &name,
            content: &record.content,
            ttl: record.ttl,
            proxied: record.proxied,
            comment: record.comment.as_deref(),
        };

        let cf_record = self
            .request::<CloudflareDnsRecord, _>(
                Method::POST,
                &self.records_path(),
                Some(&body),
                ErrorContext::record_name(&name),
            )
            .await?
            .result;

        log::info!("[cloudflare] created {} {} -> {}", record.record_type, name, record.content);
        self.cf_record_to_dns_record(cf_record)
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        validate_record_id(record_id, self.provider_name())?;
        self.request::<DeletedRecord, ()>(
            Method::DELETE,
            &format!("{}/{record_id}", self.records_path()),
            None,
            ErrorContext::record_id(record_id),
        )
        .await?;
        log::info!("[cloudflare] deleted record {record_id}");
        Ok(())
    }
}
