//! Cloudflare HTTP 请求方法

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::types::CloudflareResultInfo;
use super::{CloudflareProvider, CloudflareResponse};

/// 一次成功调用的结果
pub(crate) struct CfPage<T> {
    pub result: T,
    pub result_info: Option<CloudflareResultInfo>,
}

impl CloudflareProvider {
    /// 执行请求并解包 Cloudflare 响应信封
    ///
    /// `path` 相对于 API 根，可带查询串。`body` 为 `None` 时不发送请求体。
    pub(crate) async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        context: ErrorContext,
    ) -> Result<CfPage<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.api_base, path);
        let mut builder = self.auth.apply(self.client.request(method.clone(), &url));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let (status, response_text) =
            HttpUtils::execute_request(builder, self.provider_name(), method.as_str(), &url)
                .await?;

        let cf_response: CloudflareResponse<T> = match HttpUtils::parse_json(
            &response_text,
            self.provider_name(),
        ) {
            Ok(parsed) => parsed,
            // 非 2xx 且响应体不是标准信封（如网关返回的 HTML），按状态码映射
            Err(_) if !(200..300).contains(&status) => {
                return Err(self.map_error(RawApiError::new(response_text).status(status), context));
            }
            Err(e) => return Err(e),
        };

        if !cf_response.success || !(200..300).contains(&status) {
            let raw = cf_response.errors.first().map_or_else(
                || RawApiError::new(format!("HTTP {status}")),
                |e| RawApiError::with_code(e.code.to_string(), e.message.clone()),
            );
            log::error!("[{}] API 错误: {}", self.provider_name(), raw.message);
            return Err(self.map_error(raw.status(status), context));
        }

        let result = cf_response
            .result
            .ok_or_else(|| self.parse_error("响应中缺少 result 字段"))?;

        Ok(CfPage {
            result,
            result_info: cf_response.result_info,
        })
    }

    /// 执行 GET 请求
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        context: ErrorContext,
    ) -> Result<CfPage<T>> {
        self.request::<T, ()>(Method::GET, path, None, context).await
    }
}
